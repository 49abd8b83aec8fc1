use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vault_rs::{BlobEncoding, CompressionLevel, Generator, GeneratorConfig};

/// Embed a directory of assets into Rust source files
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory whose files are embedded
    #[arg(value_name = "SRC", required_unless_present = "config")]
    src: Option<PathBuf>,

    /// Directory receiving the generated files
    #[arg(value_name = "DEST", required_unless_present = "config")]
    dest: Option<PathBuf>,

    /// Load options from a TOML file; flags given here override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Walk into subdirectories
    #[arg(short = 's', long)]
    subdirs: bool,

    /// Resource name (defaults to the last segment of SRC)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Module name (defaults to the last segment of DEST)
    #[arg(short = 'p', long)]
    module: Option<String>,

    /// Only embed paths matching one of these regular expressions
    #[arg(short = 'i', long = "include", value_name = "REGEX")]
    include: Vec<String>,

    /// Skip paths matching any of these regular expressions
    #[arg(short = 'e', long = "exclude", value_name = "REGEX")]
    exclude: Vec<String>,

    /// Apply include/exclude to directories as well
    #[arg(long)]
    filter_dirs: bool,

    /// Store files without compression
    #[arg(long, conflicts_with = "level")]
    no_compress: bool,

    /// zlib compression level (0-9)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
    level: Option<u32>,

    /// Directory the debug loader reads from (defaults to SRC)
    #[arg(short = 'r', long = "rel-path", value_name = "PATH")]
    rel_path: Option<String>,

    /// Emit the blob as a numeric array instead of a byte string
    #[arg(long)]
    byte_array: bool,

    /// Also write a JSON index next to the generated files
    #[arg(long)]
    manifest: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_toml_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => GeneratorConfig::default(),
        };

        if let Some(src) = self.src {
            config.src = src;
        }
        if let Some(dest) = self.dest {
            config.dest = dest;
        }
        config.recurse |= self.subdirs;
        config.filter_dirs |= self.filter_dirs;
        config.manifest |= self.manifest;
        config.include.extend(self.include);
        config.exclude.extend(self.exclude);

        if self.no_compress {
            config.compression = CompressionLevel::NONE;
        } else if let Some(level) = self.level {
            config.compression = CompressionLevel::new(level)?;
        }
        if self.byte_array {
            config.blob_encoding = BlobEncoding::ByteArray;
        }
        if self.name.is_some() {
            config.name = self.name;
        }
        if self.module.is_some() {
            config.module = self.module;
        }
        if self.rel_path.is_some() {
            config.base_path = self.rel_path;
        }

        Ok(config)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = Cli::parse().into_config()?;

    let generator = Generator::new(config)?;
    let summary = generator
        .run()
        .with_context(|| format!("failed to generate vault '{}'", generator.name()))?;

    println!(
        "{}: {} files, {} bytes -> {}",
        summary.name,
        summary.files,
        summary.blob_length,
        summary.release_file.display()
    );
    Ok(())
}
