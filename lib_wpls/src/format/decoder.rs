use log::{debug, error, info};
use thiserror::Error;

use super::header::{BlockKind, FileHeader};
use super::{BaseSnapshot, DeltaBlock};
use crate::compression::{decompress_grid, decompress_records, DecompressionError};
use crate::constants::{FORMAT_VERSION, HEADER_SIZE, MAGIC_HEADER, PALETTE_SIZE};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid magic number, not a WPLS file")]
    BadMagic,
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u16),
    #[error("Unexpected end of data inside the file header")]
    TruncatedHeader,
    #[error("Invalid canvas dimensions {width}x{height}")]
    InvalidDimensions { width: u16, height: u16 },
    #[error("Unknown block type {0}")]
    UnknownBlockType(u8),
    #[error("Unexpected end of data in block starting at offset {offset}")]
    TruncatedBlock { offset: usize },
    #[error("File contains no base block before its first delta")]
    MissingBaseBlock,
    #[error("Second base block at offset {offset}")]
    UnexpectedBaseBlock { offset: usize },
    #[error("Base snapshot holds {actual} cells, expected {expected}")]
    BaseSizeMismatch { expected: usize, actual: usize },
    #[error("Base snapshot contains palette id {0}, palette has 64 entries")]
    InvalidPaletteId(u8),
    #[error("Change record ({dx}, {dy}) lies outside the canvas")]
    RecordOutOfBounds { dx: u16, dy: u16 },
    #[error("Block timestamp {found} precedes earlier timestamp {previous}")]
    TimestampOutOfOrder { previous: u32, found: u32 },

    #[error("Decompression failed")]
    DecompressionFailed(#[from] DecompressionError),
}

/// Everything read from a file, with the delta log already replayed.
#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub header: FileHeader,
    pub base: BaseSnapshot,
    pub deltas: Vec<DeltaBlock>,
    /// Base with every delta applied in stored order.
    pub materialized: Vec<u8>,
    /// Maximum timestamp over all blocks.
    pub latest_timestamp: u32,
}

struct ByteReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8], cursor: usize) -> Self {
        Self { data, cursor }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.remaining() < len {
            return None;
        }
        let bytes = &self.data[self.cursor..self.cursor + len];
        self.cursor += len;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    fn read_u16(&mut self) -> Option<u16> {
        self.read_bytes(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_bytes(4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

pub fn decode_header(encoded_data: &[u8]) -> Result<FileHeader, DecodeError> {
    if encoded_data.len() < FileHeader::MAGIC_SIZE || !encoded_data.starts_with(&MAGIC_HEADER) {
        error!("Invalid format or missing magic number in header");
        return Err(DecodeError::BadMagic);
    }
    if encoded_data.len() < HEADER_SIZE {
        error!("Header truncated at {} bytes", encoded_data.len());
        return Err(DecodeError::TruncatedHeader);
    }

    let mut reader = ByteReader::new(encoded_data, FileHeader::MAGIC_SIZE);
    let mut field = || reader.read_u16().ok_or(DecodeError::TruncatedHeader);
    let version = field()?;
    let width = field()?;
    let height = field()?;
    let origin_x = field()?;
    let origin_y = field()?;

    if version != FORMAT_VERSION {
        error!("Unsupported version {}", version);
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let header = FileHeader::new(width, height, origin_x, origin_y);
    if !header.has_valid_dimensions() {
        error!("Invalid dimensions {}x{}", width, height);
        return Err(DecodeError::InvalidDimensions { width, height });
    }
    debug!(
        "Header read: {}x{} at ({}, {})",
        width, height, origin_x, origin_y
    );

    Ok(header)
}

/// Parses a whole file. Any malformed block aborts the parse.
pub fn decode(encoded_data: &[u8]) -> Result<DecodedFile, DecodeError> {
    info!("Starting decoding of {} bytes", encoded_data.len());

    let header = decode_header(encoded_data)?;
    let width = header.width;
    let height = header.height;

    let mut reader = ByteReader::new(encoded_data, HEADER_SIZE);
    let mut base: Option<BaseSnapshot> = None;
    let mut materialized = Vec::new();
    let mut deltas = Vec::new();
    let mut latest_timestamp = 0u32;

    while reader.remaining() > 0 {
        let offset = reader.cursor;
        let truncated = || {
            error!("Block at offset {} is truncated", offset);
            DecodeError::TruncatedBlock { offset }
        };

        let tag = reader.read_u8().ok_or_else(truncated)?;
        let kind = BlockKind::try_from(tag).map_err(|tag| {
            error!("Unknown block type {} at offset {}", tag, offset);
            DecodeError::UnknownBlockType(tag)
        })?;
        let timestamp = reader.read_u32().ok_or_else(truncated)?;
        let length = reader.read_u32().ok_or_else(truncated)? as usize;
        let payload = reader.read_bytes(length).ok_or_else(truncated)?;
        debug!(
            "Block {:?} at offset {}: timestamp={} length={}",
            kind, offset, timestamp, length
        );

        if timestamp < latest_timestamp {
            error!(
                "Block at offset {} goes back in time: {} < {}",
                offset, timestamp, latest_timestamp
            );
            return Err(DecodeError::TimestampOutOfOrder {
                previous: latest_timestamp,
                found: timestamp,
            });
        }
        latest_timestamp = timestamp;

        match kind {
            BlockKind::Base => {
                if base.is_some() {
                    error!("Second base block at offset {}", offset);
                    return Err(DecodeError::UnexpectedBaseBlock { offset });
                }
                let indices = decompress_grid(payload, header.cells())?;
                if indices.len() != header.cells() {
                    error!(
                        "Base snapshot has {} cells, expected {}",
                        indices.len(),
                        header.cells()
                    );
                    return Err(DecodeError::BaseSizeMismatch {
                        expected: header.cells(),
                        actual: indices.len(),
                    });
                }
                if let Some(&id) = indices.iter().find(|&&id| id as usize >= PALETTE_SIZE) {
                    error!("Base snapshot contains invalid palette id {}", id);
                    return Err(DecodeError::InvalidPaletteId(id));
                }
                materialized = indices.clone();
                base = Some(BaseSnapshot { timestamp, indices });
            }
            BlockKind::Delta => {
                if base.is_none() {
                    error!("Delta block at offset {} precedes the base block", offset);
                    return Err(DecodeError::MissingBaseBlock);
                }
                let records = decompress_records(payload, header.cells())?;
                for record in &records {
                    if record.dx >= width || record.dy >= height {
                        error!("Record ({}, {}) outside canvas", record.dx, record.dy);
                        return Err(DecodeError::RecordOutOfBounds {
                            dx: record.dx,
                            dy: record.dy,
                        });
                    }
                    materialized[record.cell(width)] = record.id;
                }
                deltas.push(DeltaBlock { timestamp, records });
            }
        }
    }

    let base = base.ok_or_else(|| {
        error!("File contains no base block");
        DecodeError::MissingBaseBlock
    })?;

    info!(
        "Decoding completed: {} delta blocks, latest timestamp {}",
        deltas.len(),
        latest_timestamp
    );

    Ok(DecodedFile {
        header,
        base,
        deltas,
        materialized,
        latest_timestamp,
    })
}
