//! Generator output: unit layout, blob literal fidelity, rerun behaviour.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vault_rs::archive::literal::decode_literal;
use vault_rs::{
    Archive, BlobEncoding, CompressionLevel, Generator, GeneratorConfig, VaultError, WalkConfig,
};

/// Helper: asset tree including bytes that need escaping in a literal
fn create_assets() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let assets = dir.path().join("assets");
    fs::create_dir_all(assets.join("img")).unwrap();
    let html = "<html>\n\t<body>\"quoted\" \\ path</body>\n</html>\n";
    fs::write(assets.join("index.html"), html).unwrap();
    let logo: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
    fs::write(assets.join("img/logo.bin"), logo).unwrap();
    fs::write(assets.join("img/skip.psd"), "layers").unwrap();
    dir
}

fn config(dir: &Path) -> GeneratorConfig {
    GeneratorConfig::new(dir.join("assets"), dir.join("out/web"))
        .with_recurse(true)
        .with_exclude([r"\.psd$"])
}

/// Pull the blob literal out of a release unit
fn blob_literal(release: &str) -> &str {
    let start = release.find("static VAULT_BLOB_").unwrap();
    let rest = &release[start..];
    let body = &rest[rest.find("= ").unwrap() + 2..];
    let end = body.find(";\n").unwrap();
    &body[..end]
}

#[test]
fn test_generates_three_units() {
    let dir = create_assets();
    let summary = Generator::new(config(dir.path())).unwrap().run().unwrap();

    assert_eq!(summary.name, "assets");
    assert_eq!(summary.module, "web");
    assert_eq!(summary.files, 2);
    let units = [&summary.shared_file, &summary.debug_file, &summary.release_file];
    for file in units {
        assert!(file.is_file(), "{} missing", file.display());
    }
    assert!(summary.manifest_file.is_none());

    let release = fs::read_to_string(&summary.release_file).unwrap();
    assert!(release.contains("#[cfg(not(vault_debug))]"));
    assert!(release.contains(
        "::vault_rs::Lazy::new(|| ::vault_rs::AssetIndex::from_static(VAULT_RECORDS_ASSETS))"
    ));
    assert!(!release.contains("skip.psd"));
    assert!(release.contains(&summary.digest));
}

#[test]
fn test_blob_literal_matches_in_memory_archive() {
    let dir = create_assets();
    let summary = Generator::new(config(dir.path())).unwrap().run().unwrap();
    let release = fs::read_to_string(&summary.release_file).unwrap();

    let walk = WalkConfig {
        recurse: true,
        exclude: vec![r"\.psd$".to_string()],
        ..WalkConfig::default()
    };
    let archive =
        Archive::build(dir.path().join("assets"), &walk, CompressionLevel::BEST).unwrap();

    let literal = blob_literal(&release);
    assert!(literal.starts_with("b\""));
    assert!(!literal.contains('\n'));
    let blob = decode_literal(literal, BlobEncoding::StringLiteral).unwrap();
    assert_eq!(blob, archive.blob());
    assert_eq!(summary.digest, archive.digest());
    assert_eq!(summary.blob_length, blob.len() as u64);
}

#[test]
fn test_byte_array_encoding() {
    let dir = create_assets();
    let cfg = config(dir.path())
        .with_blob_encoding(BlobEncoding::ByteArray)
        .with_compress(false);
    let summary = Generator::new(cfg).unwrap().run().unwrap();
    let release = fs::read_to_string(&summary.release_file).unwrap();

    let literal = blob_literal(&release);
    assert!(literal.starts_with("&["));
    let blob = decode_literal(literal, BlobEncoding::ByteArray).unwrap();
    assert_eq!(blob.len() as u64, summary.blob_length);
}

#[test]
fn test_shared_unit_is_never_overwritten() {
    let dir = create_assets();
    let generator = Generator::new(config(dir.path())).unwrap();
    generator.run().unwrap();

    let custom = "// edited by hand\n\
                  include!(\"debug_assets_vault.rs\");\n\
                  include!(\"release_assets_vault.rs\");\n";
    fs::write(generator.shared_file(), custom).unwrap();
    fs::write(dir.path().join("assets/new.txt"), "added later").unwrap();

    let summary = generator.run().unwrap();
    assert_eq!(fs::read_to_string(generator.shared_file()).unwrap(), custom);
    assert_eq!(summary.files, 3);
    assert!(fs::read_to_string(generator.release_file()).unwrap().contains("\"new.txt\""));
}

#[test]
fn test_rerun_is_deterministic() {
    let dir = create_assets();
    let generator = Generator::new(config(dir.path())).unwrap();
    generator.run().unwrap();
    let first = fs::read(generator.release_file()).unwrap();
    generator.run().unwrap();
    assert_eq!(fs::read(generator.release_file()).unwrap(), first);
}

#[test]
fn test_debug_unit_base_path() {
    let dir = create_assets();
    let generator = Generator::new(config(dir.path()).with_base_path("static/assets")).unwrap();
    generator.run().unwrap();
    let debug = fs::read_to_string(generator.debug_file()).unwrap();
    assert!(debug.contains("pub fn new_assets_loader() -> ::vault_rs::DebugFs"));
    assert!(debug.contains("::vault_rs::DebugFs::new(\"static/assets\")"));
}

#[test]
fn test_manifest_sidecar() {
    let dir = create_assets();
    let summary = Generator::new(config(dir.path()).with_manifest(true))
        .unwrap()
        .run()
        .unwrap();
    let path = summary.manifest_file.unwrap();
    assert!(path.ends_with("assets_vault.json"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["resource"], "assets");
    assert_eq!(json["module"], "web");
    assert_eq!(json["files"].as_array().unwrap().len(), 2);
    assert_eq!(json["files"][0]["name"], "logo.bin");
    assert_eq!(json["files"][0]["path"], "/img");
}

#[test]
fn test_invalid_module_name() {
    let dir = create_assets();
    let cfg = GeneratorConfig::new(dir.path().join("assets"), dir.path().join("out/my-site"));
    let err = Generator::new(cfg).unwrap_err();
    assert!(matches!(
        err,
        VaultError::InvalidIdentifier(ref name, "module") if name == "my-site"
    ));
    assert!(!dir.path().join("out").exists());
}
