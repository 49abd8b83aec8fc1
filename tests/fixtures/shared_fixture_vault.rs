// Shared vault types for resource `fixture` in module `fixtures`.
// Generated once by vault-cli; safe to edit.
//
// Build with `--cfg vault_debug` to read files from disk instead of the
// embedded archive. Declare the flag in the consuming crate's
// Cargo.toml so rustc does not report it as unexpected:
//
//     [lints.rust]
//     unexpected_cfgs = { level = "warn", check-cfg = ['cfg(vault_debug)'] }

#[allow(unused_imports)]
pub use ::vault_rs::{AssetLoader, FileInfo, Handle, VaultError};

include!("debug_fixture_vault.rs");
include!("release_fixture_vault.rs");
