use crate::constants::{FORMAT_VERSION, HEADER_SIZE, MAGIC_HEADER, MAX_DIMENSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub width: u16,
    pub height: u16,
    pub origin_x: u16,
    pub origin_y: u16,
}

impl FileHeader {
    pub const MAGIC_SIZE: usize = 4;

    pub fn new(width: u16, height: u16, origin_x: u16, origin_y: u16) -> Self {
        Self {
            magic: MAGIC_HEADER,
            version: FORMAT_VERSION,
            width,
            height,
            origin_x,
            origin_y,
        }
    }

    /// Number of cells in the canvas grid.
    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn has_valid_dimensions(&self) -> bool {
        valid_dimensions(self.width, self.height)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..4].copy_from_slice(&self.magic);
        bytes[4..6].copy_from_slice(&self.version.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.width.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.height.to_be_bytes());
        bytes[10..12].copy_from_slice(&self.origin_x.to_be_bytes());
        bytes[12..14].copy_from_slice(&self.origin_y.to_be_bytes());
        bytes
    }
}

/// Both sides must be non-zero and addressable by a 10-bit record coordinate.
pub fn valid_dimensions(width: u16, height: u16) -> bool {
    (1..=MAX_DIMENSION).contains(&width) && (1..=MAX_DIMENSION).contains(&height)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Base = 0,
    Delta = 1,
}

impl TryFrom<u8> for BlockKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BlockKind::Base),
            1 => Ok(BlockKind::Delta),
            other => Err(other),
        }
    }
}
