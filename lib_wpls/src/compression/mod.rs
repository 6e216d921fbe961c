pub mod deflate;
pub mod delta;
pub mod palette;
pub mod rle;

use deflate::DeflateError;
use delta::{ChangeRecord, DeltaError};
use flate2::Compression;
use log::{debug, info};
use rle::{RleCompressionError, RleDecompressionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("RLE compression failed")]
    RleCompressionFailed(#[from] RleCompressionError),
    #[error("Delta record packing failed")]
    DeltaPackingFailed(#[from] DeltaError),
    #[error("Deflate compression failed")]
    DeflateFailed(#[from] DeflateError),
}

#[derive(Error, Debug)]
pub enum DecompressionError {
    #[error("Deflate decompression failed")]
    InflateFailed(#[from] DeflateError),
    #[error("RLE decompression failed")]
    RleDecompressionFailed(#[from] RleDecompressionError),
    #[error("Delta record unpacking failed")]
    DeltaUnpackingFailed(#[from] DeltaError),
}

/// Base snapshot pipeline: palette ids -> RLE pairs -> zlib.
pub fn compress_grid(indices: &[u8], level: Compression) -> Result<Vec<u8>, CompressionError> {
    info!("Compressing index grid of {} cells", indices.len());

    let rle_encoded = rle::rle_compression(indices)?;
    debug!("RLE encoding: {} bytes", rle_encoded.len());

    let deflated = deflate::deflate(&rle_encoded, level)?;
    debug!("Deflate: {} bytes", deflated.len());

    Ok(deflated)
}

/// Inverse of [`compress_grid`] for a grid of `cells` entries.
///
/// A well-formed stream holds at most one pair per cell, so inflation stops
/// at `2 * cells` bytes and RLE expansion at `cells` values.
pub fn decompress_grid(data: &[u8], cells: usize) -> Result<Vec<u8>, DecompressionError> {
    let inflated = deflate::inflate(data, cells.saturating_mul(2))?;
    debug!("Inflate: {} -> {} bytes", data.len(), inflated.len());

    let indices = rle::rle_decompression(&inflated, cells)?;
    debug!("RLE decoding: {} cells", indices.len());

    Ok(indices)
}

/// Delta pipeline: records -> packed little-endian u32s -> zlib.
pub fn compress_records(
    records: &[ChangeRecord],
    level: Compression,
) -> Result<Vec<u8>, CompressionError> {
    let packed = delta::records_to_bytes(records)?;
    let deflated = deflate::deflate(&packed, level)?;
    debug!(
        "Packed {} change records into {} bytes",
        records.len(),
        deflated.len()
    );
    Ok(deflated)
}

/// Inverse of [`compress_records`], accepting at most `max_records` records.
pub fn decompress_records(
    data: &[u8],
    max_records: usize,
) -> Result<Vec<ChangeRecord>, DecompressionError> {
    let inflated = deflate::inflate(data, max_records.saturating_mul(delta::RECORD_SIZE))?;
    let records = delta::bytes_to_records(&inflated)?;
    debug!("Unpacked {} change records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_pipeline() {
        let mut indices = vec![2u8; 600];
        indices[17] = 5;
        indices[599] = 0;
        let compressed = compress_grid(&indices, Compression::default()).unwrap();
        assert_eq!(decompress_grid(&compressed, indices.len()).unwrap(), indices);
    }

    #[test]
    fn test_grid_pipeline_empty() {
        assert!(matches!(
            compress_grid(&[], Compression::default()),
            Err(CompressionError::RleCompressionFailed(_))
        ));
    }

    #[test]
    fn test_grid_pipeline_rejects_oversized_stream() {
        let indices = vec![3u8; 5000];
        let compressed = compress_grid(&indices, Compression::default()).unwrap();
        assert!(matches!(
            decompress_grid(&compressed, 100),
            Err(DecompressionError::RleDecompressionFailed(
                RleDecompressionError::LimitExceeded { limit: 100 }
            ))
        ));
    }

    #[test]
    fn test_records_pipeline_rejects_too_many_records() {
        let records = vec![ChangeRecord::new(1, 1, 1).unwrap(); 10];
        let compressed = compress_records(&records, Compression::default()).unwrap();
        assert!(matches!(
            decompress_records(&compressed, 4),
            Err(DecompressionError::InflateFailed(DeflateError::LimitExceeded {
                limit: 16
            }))
        ));
    }

    #[test]
    fn test_records_pipeline() {
        let records = vec![
            ChangeRecord::new(0, 0, 1).unwrap(),
            ChangeRecord::new(1023, 4, 63).unwrap(),
        ];
        let compressed = compress_records(&records, Compression::fast()).unwrap();
        assert_eq!(decompress_records(&compressed, 2).unwrap(), records);
    }

    #[test]
    fn test_records_pipeline_rejects_forged_record() {
        let records = vec![ChangeRecord { dx: 4096, dy: 0, id: 1 }];
        assert!(matches!(
            compress_records(&records, Compression::default()),
            Err(CompressionError::DeltaPackingFailed(
                DeltaError::CoordinateOutOfRange { .. }
            ))
        ));
    }

    #[test]
    fn test_records_pipeline_misaligned_payload() {
        let compressed = deflate::deflate(&[1, 2, 3, 4, 5], Compression::default()).unwrap();
        assert!(matches!(
            decompress_records(&compressed, 4),
            Err(DecompressionError::DeltaUnpackingFailed(
                DeltaError::InvalidPayloadLength(5)
            ))
        ));
    }
}
