//! Source generation for embedding a directory into a Rust program
//!
//! A run writes three units into the destination directory:
//!
//! - `shared_<name>_vault.rs`: re-exports of the lookup types and `include!`s
//!   of the two units below. Written once and left alone afterwards, so it
//!   can be edited by hand.
//! - `debug_<name>_vault.rs`: a [`DebugFs`](crate::vfs::DebugFs) loader,
//!   active when the `vault_debug` cfg flag is set.
//! - `release_<name>_vault.rs`: the blob, the record table and an
//!   [`EmbeddedFs`](crate::vfs::EmbeddedFs) loader, active otherwise.
//!
//! Both loaders are exposed through the same `new_<name>_loader()` function.
//! The release unit is written to a temporary file and renamed into place
//! only after the whole tree was encoded.

use crate::archive::{
    encode_tree, ArchiveWriter, AssetRecord, BlobEncoding, CompressionLevel, LiteralWriter,
};
use crate::error::{Result, VaultError};
use crate::walker::WalkConfig;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Crate path the generated code refers to
const RUNTIME_CRATE: &str = "::vault_rs";

/// cfg flag selecting the debug unit
pub const DEBUG_CFG: &str = "vault_debug";

/// Reserved words that can't be used as a resource or module name
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "gen", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Generator options
///
/// Can be built in code with the `with_*` methods or loaded from TOML:
///
/// ```toml
/// src = "assets"
/// dest = "src/assets"
/// recurse = true
/// compression = 9
/// exclude = ["\\.psd$"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Directory whose files are embedded
    pub src: PathBuf,
    /// Directory receiving the generated units
    pub dest: PathBuf,
    pub recurse: bool,
    pub compression: CompressionLevel,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Apply include/exclude to directories too
    pub filter_dirs: bool,
    /// Resource name; defaults to the last segment of `src`
    pub name: Option<String>,
    /// Module name; defaults to the last segment of `dest`
    pub module: Option<String>,
    /// Directory the debug loader reads from; defaults to `src`
    pub base_path: Option<String>,
    pub blob_encoding: BlobEncoding,
    /// Also write a `<name>_vault.json` index sidecar
    pub manifest: bool,
}

impl GeneratorConfig {
    pub fn new<S: Into<PathBuf>, D: Into<PathBuf>>(src: S, dest: D) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    pub fn with_compression(mut self, level: CompressionLevel) -> Self {
        self.compression = level;
        self
    }

    /// Best compression when `compress` is set, none otherwise
    pub fn with_compress(self, compress: bool) -> Self {
        self.with_compression(CompressionLevel::from_flag(compress))
    }

    pub fn with_include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_filter_dirs(mut self, filter_dirs: bool) -> Self {
        self.filter_dirs = filter_dirs;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_blob_encoding(mut self, encoding: BlobEncoding) -> Self {
        self.blob_encoding = encoding;
        self
    }

    pub fn with_manifest(mut self, manifest: bool) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn walk_config(&self) -> WalkConfig {
        WalkConfig {
            recurse: self.recurse,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            filter_dirs: self.filter_dirs,
        }
    }
}

/// Index sidecar written next to the generated units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultManifest {
    pub resource: String,
    pub module: String,
    pub blob_length: u64,
    pub blob_sha256: String,
    pub files: Vec<AssetRecord>,
}

/// What a generation run produced
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub name: String,
    pub module: String,
    pub files: usize,
    pub blob_length: u64,
    pub digest: String,
    pub shared_file: PathBuf,
    pub debug_file: PathBuf,
    pub release_file: PathBuf,
    pub manifest_file: Option<PathBuf>,
}

/// Validated generator, ready to run
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    name: String,
    module: String,
    shared_file: PathBuf,
    debug_file: PathBuf,
    release_file: PathBuf,
}

impl Generator {
    /// Resolve default names and validate the configuration
    ///
    /// Nothing is written to disk here; every configuration error surfaces
    /// before a run starts.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let module = match &config.module {
            Some(module) => module.clone(),
            None => last_segment(&config.dest).ok_or_else(|| {
                VaultError::Config(
                    "could not determine module name: try to set module name manually".to_string(),
                )
            })?,
        };
        let name = match &config.name {
            Some(name) => name.clone(),
            None => last_segment(&config.src).unwrap_or_else(|| module.clone()),
        };

        validate_identifier(&module, "module")?;
        validate_identifier(&name, "resource")?;

        if !config.src.is_dir() {
            return Err(VaultError::MissingSource(config.src.display().to_string()));
        }
        if config.dest.exists() && !config.dest.is_dir() {
            return Err(VaultError::Config(format!(
                "destination {} is not a directory",
                config.dest.display()
            )));
        }

        Ok(Self {
            shared_file: config.dest.join(format!("shared_{}_vault.rs", name)),
            debug_file: config.dest.join(format!("debug_{}_vault.rs", name)),
            release_file: config.dest.join(format!("release_{}_vault.rs", name)),
            config,
            name,
            module,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn shared_file(&self) -> &Path {
        &self.shared_file
    }

    pub fn debug_file(&self) -> &Path {
        &self.debug_file
    }

    pub fn release_file(&self) -> &Path {
        &self.release_file
    }

    /// Directory the debug loader resolves paths against
    pub fn base_path(&self) -> String {
        let base = match &self.config.base_path {
            Some(base) => base.clone(),
            None => self.config.src.to_string_lossy().into_owned(),
        };
        clean_slashes(&base)
    }

    /// Generate all units
    pub fn run(&self) -> Result<GenerationSummary> {
        info!(
            name = %self.name,
            src = %self.config.src.display(),
            dest = %self.config.dest.display(),
            "starting vault generation"
        );
        fs::create_dir_all(&self.config.dest)?;

        if self.shared_file.exists() {
            debug!(file = %self.shared_file.display(), "keeping existing shared unit");
        } else {
            info!(file = %self.shared_file.display(), "creating file");
            fs::write(&self.shared_file, self.shared_unit())?;
        }

        info!(file = %self.debug_file.display(), "creating file");
        fs::write(&self.debug_file, self.debug_unit())?;

        let (files, blob_length, digest, records) = self.write_release()?;

        let manifest_file = if self.config.manifest {
            let path = self.config.dest.join(format!("{}_vault.json", self.name));
            let manifest = VaultManifest {
                resource: self.name.clone(),
                module: self.module.clone(),
                blob_length,
                blob_sha256: digest.clone(),
                files: records,
            };
            info!(file = %path.display(), "creating file");
            fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
            Some(path)
        } else {
            None
        };

        info!(files, blob_length, "vault generation finished");
        Ok(GenerationSummary {
            name: self.name.clone(),
            module: self.module.clone(),
            files,
            blob_length,
            digest,
            shared_file: self.shared_file.clone(),
            debug_file: self.debug_file.clone(),
            release_file: self.release_file.clone(),
            manifest_file,
        })
    }

    fn write_release(&self) -> Result<(usize, u64, String, Vec<AssetRecord>)> {
        let tmp = self.release_file.with_extension("rs.tmp");
        info!(file = %self.release_file.display(), "creating file");

        match self.encode_release(&tmp) {
            Ok(outcome) => {
                fs::rename(&tmp, &self.release_file)?;
                Ok(outcome)
            }
            Err(e) => {
                // Never leave a half-written unit behind
                if let Err(cleanup) = fs::remove_file(&tmp) {
                    warn!(
                        file = %tmp.display(),
                        error = %cleanup,
                        "could not remove partial output"
                    );
                }
                Err(e)
            }
        }
    }

    fn encode_release(&self, tmp: &Path) -> Result<(usize, u64, String, Vec<AssetRecord>)> {
        let suffix = self.name.to_uppercase();
        let mut out = BufWriter::new(File::create(tmp)?);

        writeln!(out, "{}", self.header())?;
        writeln!(out, "#[cfg(not({}))]", DEBUG_CFG)?;
        write!(out, "static VAULT_BLOB_{}: &[u8] = ", suffix)?;

        // The blob is streamed straight into the literal as files are encoded
        let literal = LiteralWriter::begin(out, self.config.blob_encoding)?;
        let writer = ArchiveWriter::new(literal, self.config.compression);
        let encoded = encode_tree(&self.config.src, &self.config.walk_config(), writer)?;
        let mut out = encoded.sink.finish()?;
        writeln!(out, ";")?;
        writeln!(out)?;

        writeln!(out, "#[cfg(not({}))]", DEBUG_CFG)?;
        writeln!(
            out,
            "static VAULT_RECORDS_{}: &[{}::AssetRecord] = &[",
            suffix, RUNTIME_CRATE
        )?;
        // name, path, size, offset, length, mod_time, crc32
        for r in encoded.index.records() {
            writeln!(
                out,
                "    {}::AssetRecord::from_static({:?}, {:?}, {}, {}, {}, {}, 0x{:08x}),",
                RUNTIME_CRATE, r.name, r.path, r.size, r.offset, r.length, r.mod_time, r.crc32
            )?;
        }
        writeln!(out, "];")?;
        writeln!(out)?;

        writeln!(out, "#[cfg(not({}))]", DEBUG_CFG)?;
        writeln!(
            out,
            "static VAULT_INDEX_{s}: {c}::Lazy<{c}::AssetIndex> =\n    \
             {c}::Lazy::new(|| {c}::AssetIndex::from_static(VAULT_RECORDS_{s}));",
            s = suffix,
            c = RUNTIME_CRATE
        )?;
        writeln!(out)?;

        writeln!(out, "/// Loader over the embedded `{}` files", self.name)?;
        writeln!(out, "#[cfg(not({}))]", DEBUG_CFG)?;
        writeln!(
            out,
            "pub fn new_{n}_loader() -> {c}::EmbeddedFs<'static> {{\n    \
             {c}::EmbeddedFs::new(&VAULT_INDEX_{s}, VAULT_BLOB_{s})\n}}",
            n = self.name,
            s = suffix,
            c = RUNTIME_CRATE
        )?;
        writeln!(out)?;
        writeln!(
            out,
            "// {} files, {} blob bytes, sha256 {}",
            encoded.index.len(),
            encoded.index.blob_len(),
            encoded.digest
        )?;

        // Flush and sync before the caller renames the file into place
        let file = out.into_inner().map_err(|e| VaultError::Io(e.into_error()))?;
        file.sync_all()?;

        let records = encoded.index.records().to_vec();
        let blob_len = encoded.index.blob_len();
        Ok((records.len(), blob_len, encoded.digest, records))
    }

    fn header(&self) -> String {
        format!(
            "// Code generated by vault-cli {} for module `{}`, resource `{}`. DO NOT EDIT.\n",
            env!("CARGO_PKG_VERSION"),
            self.module,
            self.name
        )
    }

    fn shared_unit(&self) -> String {
        format!(
            "// Shared vault types for resource `{name}` in module `{module}`.\n\
             // Generated once by vault-cli; safe to edit.\n\
             //\n\
             // Build with `--cfg {cfg}` to read files from disk instead of the\n\
             // embedded archive. Declare the flag in the consuming crate's\n\
             // Cargo.toml so rustc does not report it as unexpected:\n\
             //\n\
             //     [lints.rust]\n\
             //     unexpected_cfgs = {{ level = \"warn\", check-cfg = ['cfg({cfg})'] }}\n\
             \n\
             #[allow(unused_imports)]\n\
             pub use {c}::{{AssetLoader, FileInfo, Handle, VaultError}};\n\
             \n\
             include!(\"debug_{name}_vault.rs\");\n\
             include!(\"release_{name}_vault.rs\");\n",
            name = self.name,
            module = self.module,
            cfg = DEBUG_CFG,
            c = RUNTIME_CRATE
        )
    }

    fn debug_unit(&self) -> String {
        format!(
            "{header}\n\
             /// Loader reading `{name}` files from `{base}` on disk\n\
             #[cfg({cfg})]\n\
             pub fn new_{name}_loader() -> {c}::DebugFs {{\n    {c}::DebugFs::new({base:?})\n}}\n",
            header = self.header(),
            name = self.name,
            base = self.base_path(),
            cfg = DEBUG_CFG,
            c = RUNTIME_CRATE
        )
    }
}

/// Check that `ident` can be used as a Rust identifier in generated code
pub fn validate_identifier(ident: &str, kind: &'static str) -> Result<()> {
    let mut chars = ident.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_start || !valid_rest || ident == "_" || KEYWORDS.contains(&ident) {
        return Err(VaultError::InvalidIdentifier(ident.to_string(), kind));
    }
    Ok(())
}

fn last_segment(path: &Path) -> Option<String> {
    let text = path.to_string_lossy().replace('\\', "/");
    text.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .map(str::to_string)
}

/// Forward slashes, no doubled or trailing separators
fn clean_slashes(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    match (absolute, segments.is_empty()) {
        (true, _) => format!("/{}", segments.join("/")),
        (false, true) => ".".to_string(),
        (false, false) => segments.join("/"),
    }
}
