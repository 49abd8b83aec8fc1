// Code generated by vault-cli 1.0.1 for module `fixtures`, resource `fixture`. DO NOT EDIT.

#[cfg(not(vault_debug))]
static VAULT_BLOB_FIXTURE: &[u8] = b"x\xdac`T\x8a\xe1\xe2\xe4\xfd\x0f\x00\x04\x03\x01\x9fx\xdaK\xcaO\xa9T\xa8\xe6\xe2\xccM,J\xcf\xcc\xb3R0\xb0\xe6\xe2L\xcb\xcf+\xd1MK\xcc\xcd\xcc\xa9\xb4RPr\xcb,JT\x08N\xcc+V\xd2Q(\x06R\xba\xc5\xa9E\x99i\xd6\\\xb5\\\x00D\xa2\x13\x01x\xda\x0d\xc9\xb1\x11\x80 \x0c\x05\xd0\x9e)\xfe9\x00s\xd8\xdb\xdaD\x0c\x07g$'$\xea\xf8\xfa\xda7\xb3\x88\"w=a\x85\x91\xebk\xde\x197\xb9X\x0c\x0b'm;\xa46\xc6S\xad\x80\xb0Q:\x86\xd0(XA\xff\x11.WcL1|\x1dz\x1a:";

#[cfg(not(vault_debug))]
static VAULT_RECORDS_FIXTURE: &[::vault_rs::AssetRecord] = &[
    ::vault_rs::AssetRecord::from_static("bin.dat", "/data", 8, 0, 16, 1760000000, 0x8c121801),
    ::vault_rs::AssetRecord::from_static("style.css", "/data", 60, 16, 66, 1760000000, 0xa0b5f3e6),
    ::vault_rs::AssetRecord::from_static("text.txt", "/", 76, 82, 78, 1760000000, 0x224ad951),
];

#[cfg(not(vault_debug))]
static VAULT_INDEX_FIXTURE: ::vault_rs::Lazy<::vault_rs::AssetIndex> =
    ::vault_rs::Lazy::new(|| ::vault_rs::AssetIndex::from_static(VAULT_RECORDS_FIXTURE));

/// Loader over the embedded `fixture` files
#[cfg(not(vault_debug))]
pub fn new_fixture_loader() -> ::vault_rs::EmbeddedFs<'static> {
    ::vault_rs::EmbeddedFs::new(&VAULT_INDEX_FIXTURE, VAULT_BLOB_FIXTURE)
}

// 3 files, 160 blob bytes, sha256 61a0dcf6cdb920596a3ad64e1f131d8bb96038389f246a51a96f863ff1e491c8
