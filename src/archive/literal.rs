//! Binary-to-source encoding of the blob
//!
//! The compressed blob is embedded in generated Rust source either as a
//! byte-string literal (`b"..."`) or as a numeric array (`&[0x78, ...]`).
//! The literal form keeps printable ASCII as-is, uses two-character escapes
//! for newline, tab, backslash and double quote, and `\xHH` for everything
//! else, so the output never contains a raw control character.

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Bytes per line in the numeric array form
const ARRAY_BYTES_PER_LINE: usize = 16;

/// How the blob is written into the release unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlobEncoding {
    /// `b"..."` with minimal escaping
    #[default]
    StringLiteral,
    /// `&[0x78, 0x9c, ...]`
    ByteArray,
}

impl BlobEncoding {
    fn prefix(self) -> &'static str {
        match self {
            BlobEncoding::StringLiteral => "b\"",
            BlobEncoding::ByteArray => "&[\n",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            BlobEncoding::StringLiteral => "\"",
            BlobEncoding::ByteArray => "\n]",
        }
    }
}

/// Append the escaped form of one byte
pub fn escape_byte(byte: u8, out: &mut String) {
    match byte {
        b'\n' => out.push_str("\\n"),
        b'\t' => out.push_str("\\t"),
        b'\\' => out.push_str("\\\\"),
        b'"' => out.push_str("\\\""),
        32..=126 => out.push(byte as char),
        _ => {
            out.push_str("\\x");
            out.push_str(&hex::encode([byte]));
        }
    }
}

/// Escape a byte slice into the body of a byte-string literal (no quotes)
pub fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        escape_byte(byte, &mut out);
    }
    out
}

/// Invert [`escape`]: decode the body of a byte-string literal
///
/// Accepts the full set of byte escapes a Rust byte string may contain, not
/// only the ones [`escape`] produces.
pub fn unescape(body: &str) -> Result<Vec<u8>> {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'\\' {
            if byte == b'"' {
                return Err(VaultError::InvalidLiteral(format!(
                    "unescaped quote at byte {}",
                    i
                )));
            }
            out.push(byte);
            i += 1;
            continue;
        }

        let escape = *bytes
            .get(i + 1)
            .ok_or_else(|| VaultError::InvalidLiteral("trailing backslash".to_string()))?;
        match escape {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'0' => out.push(0),
            b'\\' => out.push(b'\\'),
            b'"' => out.push(b'"'),
            b'\'' => out.push(b'\''),
            b'x' => {
                // Exactly two hex digits follow, either case
                let digits = bytes.get(i + 2..i + 4).and_then(|d| hex::decode(d).ok());
                match digits.as_deref() {
                    Some(&[value]) => out.push(value),
                    _ => {
                        return Err(VaultError::InvalidLiteral(format!(
                            "malformed hex escape at byte {}",
                            i
                        )))
                    }
                }
                i += 2;
            }
            other => {
                return Err(VaultError::InvalidLiteral(format!(
                    "unknown escape '\\{}' at byte {}",
                    other as char, i
                )))
            }
        }
        i += 2;
    }

    Ok(out)
}

/// Parse the body of a numeric byte array (`0x78, 0x9c, ...`)
pub fn parse_byte_array(body: &str) -> Result<Vec<u8>> {
    body.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let digits = item.strip_prefix("0x").unwrap_or(item);
            u8::from_str_radix(digits, 16).map_err(|e| {
                VaultError::InvalidLiteral(format!("bad array item '{}': {}", item, e))
            })
        })
        .collect()
}

/// Decode a complete literal as written by [`LiteralWriter`], delimiters included
pub fn decode_literal(text: &str, encoding: BlobEncoding) -> Result<Vec<u8>> {
    let body = text
        .trim()
        .strip_prefix(encoding.prefix().trim_end())
        .and_then(|rest| rest.strip_suffix(encoding.suffix().trim_start()))
        .ok_or_else(|| VaultError::InvalidLiteral(format!("missing {:?} delimiters", encoding)))?;
    match encoding {
        BlobEncoding::StringLiteral => unescape(body),
        BlobEncoding::ByteArray => parse_byte_array(body),
    }
}

/// Writer that encodes every byte it receives into source text
///
/// The byte count returned from `write` is the raw (unescaped) count, so an
/// `ArchiveWriter` on top of it tracks blob offsets, not text length.
pub struct LiteralWriter<W: Write> {
    inner: W,
    encoding: BlobEncoding,
    raw_len: u64,
    scratch: String,
}

impl<W: Write> LiteralWriter<W> {
    /// Start a literal; writes the opening delimiter
    pub fn begin(mut inner: W, encoding: BlobEncoding) -> Result<Self> {
        inner.write_all(encoding.prefix().as_bytes())?;
        Ok(Self {
            inner,
            encoding,
            raw_len: 0,
            scratch: String::new(),
        })
    }

    /// Raw bytes encoded so far
    pub fn raw_len(&self) -> u64 {
        self.raw_len
    }

    /// Close the literal and hand back the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.inner.write_all(self.encoding.suffix().as_bytes())?;
        Ok(self.inner)
    }

    fn encode_array(&mut self, buf: &[u8]) {
        for &byte in buf {
            let column = (self.raw_len as usize) % ARRAY_BYTES_PER_LINE;
            if column == 0 {
                if self.raw_len > 0 {
                    self.scratch.push('\n');
                }
                self.scratch.push_str("    ");
            } else {
                self.scratch.push(' ');
            }
            self.scratch.push_str("0x");
            self.scratch.push_str(&hex::encode([byte]));
            self.scratch.push(',');
            self.raw_len += 1;
        }
    }
}

impl<W: Write> Write for LiteralWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.scratch.clear();
        match self.encoding {
            BlobEncoding::StringLiteral => {
                for &byte in buf {
                    escape_byte(byte, &mut self.scratch);
                }
                self.raw_len += buf.len() as u64;
            }
            BlobEncoding::ByteArray => self.encode_array(buf),
        }
        self.inner.write_all(self.scratch.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_set() {
        assert_eq!(escape(b"a\nb"), "a\\nb");
        assert_eq!(escape(b"\t"), "\\t");
        assert_eq!(escape(b"\\\""), "\\\\\\\"");
        assert_eq!(escape(b" ~"), " ~");
        assert_eq!(
            escape(&[0x00, 0x1f, 0x7f, 0xff, b'\r']),
            "\\x00\\x1f\\x7f\\xff\\x0d"
        );
    }

    #[test]
    fn test_unescape_inverts_every_byte() {
        let all: Vec<u8> = (0..=255u8).collect();
        assert_eq!(unescape(&escape(&all)).unwrap(), all);
    }

    #[test]
    fn test_unescape_accepts_either_hex_case() {
        assert_eq!(unescape("\\xAB\\xab\\x0D").unwrap(), vec![0xab, 0xab, 0x0d]);
    }

    #[test]
    fn test_unescape_rejects_malformed() {
        assert!(unescape("abc\\").is_err());
        assert!(unescape("\\xZZ").is_err());
        assert!(unescape("ab\\x4").is_err());
        assert!(unescape("\\q").is_err());
        assert!(unescape("a\"b").is_err());
    }

    #[test]
    fn test_writer_counts_raw_bytes() {
        let mut writer = LiteralWriter::begin(Vec::new(), BlobEncoding::StringLiteral).unwrap();
        assert_eq!(writer.write(&[0x78, 0x9c, b'\n']).unwrap(), 3);
        assert_eq!(writer.raw_len(), 3);
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(text, "b\"x\\x9c\\n\"");
        assert_eq!(
            decode_literal(&text, BlobEncoding::StringLiteral).unwrap(),
            vec![0x78, 0x9c, b'\n']
        );
    }

    #[test]
    fn test_byte_array_encoding() {
        let data: Vec<u8> = (0..40u8).collect();
        let mut writer = LiteralWriter::begin(Vec::new(), BlobEncoding::ByteArray).unwrap();
        writer.write_all(&data[..7]).unwrap();
        writer.write_all(&data[7..]).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();

        assert!(text.starts_with("&[\n    0x00, 0x01,"));
        assert_eq!(text.lines().count(), 5);
        assert_eq!(
            decode_literal(&text, BlobEncoding::ByteArray).unwrap(),
            data
        );
    }

    #[test]
    fn test_empty_literal() {
        let writer = LiteralWriter::begin(Vec::new(), BlobEncoding::StringLiteral).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(text, "b\"\"");
        assert!(decode_literal(&text, BlobEncoding::StringLiteral).unwrap().is_empty());
    }
}
