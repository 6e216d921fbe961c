use log::{debug, error, info};
use thiserror::Error;

use super::header::{BlockKind, FileHeader};
use super::{BaseSnapshot, DeltaBlock, WriteOptions};
use crate::compression::{compress_grid, compress_records, CompressionError};
use crate::constants::{BLOCK_HEADER_SIZE, HEADER_SIZE};

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Failed to compress block payload")]
    CompressionFailed(#[from] CompressionError),
    #[error("Compressed payload of {0} bytes does not fit a 32-bit length field")]
    PayloadTooLarge(usize),
}

fn write_block(
    out: &mut Vec<u8>,
    kind: BlockKind,
    timestamp: u32,
    payload: &[u8],
) -> Result<(), EncodeError> {
    let length = u32::try_from(payload.len()).map_err(|_| {
        error!("Payload of {} bytes is too large", payload.len());
        EncodeError::PayloadTooLarge(payload.len())
    })?;

    out.reserve(BLOCK_HEADER_SIZE + payload.len());
    out.push(kind as u8);
    out.extend_from_slice(&timestamp.to_be_bytes());
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(payload);

    debug!(
        "Block {:?} written: timestamp={} length={}",
        kind, timestamp, length
    );
    Ok(())
}

/// Writes the header, one Base block and one Delta block per log entry.
pub fn encode(
    header: &FileHeader,
    base: &BaseSnapshot,
    deltas: &[DeltaBlock],
    options: &WriteOptions,
) -> Result<Vec<u8>, EncodeError> {
    info!(
        "Starting encoding: {}x{} with {} delta blocks",
        header.width,
        header.height,
        deltas.len()
    );

    let mut encoded_data: Vec<u8> = Vec::with_capacity(HEADER_SIZE);

    // Step 1: Write header
    encoded_data.extend_from_slice(&header.to_bytes());

    // Step 2: Base snapshot
    let base_payload = compress_grid(&base.indices, options.level)?;
    write_block(&mut encoded_data, BlockKind::Base, base.timestamp, &base_payload)?;

    // Step 3: Delta log, in stored order
    for delta in deltas {
        let payload = compress_records(&delta.records, options.level)?;
        write_block(&mut encoded_data, BlockKind::Delta, delta.timestamp, &payload)?;
    }

    info!("Encoding completed: {} bytes", encoded_data.len());
    Ok(encoded_data)
}
