pub const FORMAT_NAME: &str = "WPLS canvas history";
pub const FILE_EXT: &str = "wpls";

pub const MAGIC_HEADER: [u8; 4] = *b"WPLS";
pub const FORMAT_VERSION: u16 = 2;

/// Header: magic, version, width, height, origin x, origin y.
pub const HEADER_SIZE: usize = 14;
/// Block header: type, timestamp, payload length.
pub const BLOCK_HEADER_SIZE: usize = 9;

/// Upper bound on width and height, imposed by the 10-bit record coordinates.
pub const MAX_DIMENSION: u16 = 1024;
pub const PALETTE_SIZE: usize = 64;
