/// Current version of the blob layout written by this crate.
pub const VERSION: u8 = 0x1;

// Make some attempt to not accidentally decode arbitrary section data,
// and also make it break almost immediately in any UTF-8 compliant text parser.
pub(crate) const MAGIC_BYTES: &[u8; 4] = b"\xffRBX";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BoxHeader {
    pub(crate) magic_bytes: [u8; 4],
    pub(crate) version: u8,
}

impl BoxHeader {
    pub(crate) fn new() -> BoxHeader {
        BoxHeader {
            magic_bytes: *MAGIC_BYTES,
            version: VERSION,
        }
    }
}

impl Default for BoxHeader {
    fn default() -> Self {
        BoxHeader::new()
    }
}
