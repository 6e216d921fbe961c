pub mod decoder;
pub mod encoder;
pub mod header;

pub use decoder::{decode, DecodeError, DecodedFile};
pub use encoder::{encode, EncodeError};
pub use header::{BlockKind, FileHeader};

use flate2::Compression;

use crate::compression::delta::ChangeRecord;

/// Full snapshot stored in the Base block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSnapshot {
    pub timestamp: u32,
    /// Row-major palette ids, `width * height` entries.
    pub indices: Vec<u8>,
}

/// One entry of the delta log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaBlock {
    pub timestamp: u32,
    pub records: Vec<ChangeRecord>,
}

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Deflate level used for every block payload.
    pub level: Compression,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl WriteOptions {
    /// Deflate level from 0 (store) to 9 (best). Higher values are clamped to 9.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}
