// Code generated by vault-cli 1.0.1 for module `fixtures`, resource `fixture`. DO NOT EDIT.

/// Loader reading `fixture` files from `tests/fixtures/assets` on disk
#[cfg(vault_debug)]
pub fn new_fixture_loader() -> ::vault_rs::DebugFs {
    ::vault_rs::DebugFs::new("tests/fixtures/assets")
}
