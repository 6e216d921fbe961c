//! Bit-packed per-cell change records.
//!
//! Layout of one record: bits 0-5 palette id, bits 6-15 row (`dy`),
//! bits 16-25 column (`dx`). Records are stored as little-endian `u32`s.

use thiserror::Error;

use crate::constants::{MAX_DIMENSION, PALETTE_SIZE};

const ID_BITS: u32 = 6;
const COORD_BITS: u32 = 10;
const ID_MASK: u32 = (1 << ID_BITS) - 1;
const COORD_MASK: u32 = (1 << COORD_BITS) - 1;
const DY_SHIFT: u32 = ID_BITS;
const DX_SHIFT: u32 = ID_BITS + COORD_BITS;

pub const RECORD_SIZE: usize = std::mem::size_of::<u32>();

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeltaError {
    #[error("coordinates ({dx}, {dy}) do not fit the 10-bit record fields")]
    CoordinateOutOfRange { dx: u16, dy: u16 },
    #[error("palette id {0} does not fit the 6-bit record field")]
    InvalidId(u8),
    #[error("Invalid payload length: expected multiple of 4 bytes, got {0}")]
    InvalidPayloadLength(usize),
}

/// One cell overwrite: column, row and the new palette id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeRecord {
    pub dx: u16,
    pub dy: u16,
    pub id: u8,
}

impl ChangeRecord {
    pub fn new(dx: u16, dy: u16, id: u8) -> Result<Self, DeltaError> {
        if dx >= MAX_DIMENSION || dy >= MAX_DIMENSION {
            return Err(DeltaError::CoordinateOutOfRange { dx, dy });
        }
        if id as usize >= PALETTE_SIZE {
            return Err(DeltaError::InvalidId(id));
        }
        Ok(Self { dx, dy, id })
    }

    pub fn pack(&self) -> Result<u32, DeltaError> {
        // Fields are public, so re-check before they can bleed into neighbours.
        let checked = Self::new(self.dx, self.dy, self.id)?;
        Ok((checked.dx as u32) << DX_SHIFT
            | (checked.dy as u32) << DY_SHIFT
            | checked.id as u32)
    }

    /// Bits above the `dx` field are ignored.
    pub fn unpack(packed: u32) -> Self {
        Self {
            dx: ((packed >> DX_SHIFT) & COORD_MASK) as u16,
            dy: ((packed >> DY_SHIFT) & COORD_MASK) as u16,
            id: (packed & ID_MASK) as u8,
        }
    }

    /// Row-major offset of this cell in a grid `width` cells wide.
    pub fn cell(&self, width: u16) -> usize {
        self.dy as usize * width as usize + self.dx as usize
    }
}

pub fn records_to_bytes(records: &[ChangeRecord]) -> Result<Vec<u8>, DeltaError> {
    let mut bytes = Vec::with_capacity(records.len() * RECORD_SIZE);
    for record in records {
        bytes.extend_from_slice(&record.pack()?.to_le_bytes());
    }
    Ok(bytes)
}

pub fn bytes_to_records(bytes: &[u8]) -> Result<Vec<ChangeRecord>, DeltaError> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(DeltaError::InvalidPayloadLength(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| {
            ChangeRecord::unpack(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        })
        .collect())
}
