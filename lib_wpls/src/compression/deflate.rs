use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeflateError {
    #[error("zlib stream error: {0}")]
    Stream(#[from] io::Error),
    #[error("Inflated data exceeds the limit of {limit} bytes")]
    LimitExceeded { limit: usize },
}

/// Compresses `data` into a zlib stream.
pub fn deflate(data: &[u8], level: Compression) -> Result<Vec<u8>, DeflateError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), level);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inflates a zlib stream produced by [`deflate`] or any zlib-compatible writer.
///
/// Stops reading after `limit` bytes and fails if the stream holds more.
pub fn inflate(data: &[u8], limit: usize) -> Result<Vec<u8>, DeflateError> {
    let mut decoder = ZlibDecoder::new(data).take(limit as u64 + 1);
    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated)?;
    if inflated.len() > limit {
        return Err(DeflateError::LimitExceeded { limit });
    }
    Ok(inflated)
}
