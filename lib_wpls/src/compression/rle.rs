use thiserror::Error;

#[derive(Error, Debug)]
pub enum RleCompressionError {
    #[error("Invalid input length: data is empty")]
    EmptyInput,
}

#[derive(Error, Debug)]
pub enum RleDecompressionError {
    #[error("Invalid input length: expected multiple of 2 bytes, got {0}")]
    InvalidInputLength(usize),
    #[error("Decoded length exceeds the limit of {limit} values")]
    LimitExceeded { limit: usize },
}

/// Longest run a single `(count, value)` pair can describe.
pub const MAX_RUN: u8 = u8::MAX;

/// Run-length encodes a byte sequence into flattened `(count, value)` pairs.
///
/// Runs longer than 255 are split, so 256 equal bytes become `(255, v), (1, v)`.
///
/// # Arguments
/// * `data` - Slice of bytes to compress, must not be empty
///
/// # Returns
/// * `Result<Vec<u8>, RleCompressionError>` - Encoded pairs or error
pub fn rle_compression(data: &[u8]) -> Result<Vec<u8>, RleCompressionError> {
    let (&first, rest) = data.split_first().ok_or(RleCompressionError::EmptyInput)?;

    let mut encoded = Vec::new();
    let mut value = first;
    let mut count = 1u8;

    for &byte in rest {
        if byte == value && count < MAX_RUN {
            count += 1;
        } else {
            encoded.push(count);
            encoded.push(value);
            value = byte;
            count = 1;
        }
    }

    // Final run
    encoded.push(count);
    encoded.push(value);

    Ok(encoded)
}

/// Expands data produced by `rle_compression`.
///
/// # Arguments
/// * `data` - Flattened `(count, value)` pairs
/// * `max_len` - Largest decoded length accepted; checked before allocating
///
/// # Returns
/// * `Result<Vec<u8>, RleDecompressionError>` - Decoded bytes or error
pub fn rle_decompression(data: &[u8], max_len: usize) -> Result<Vec<u8>, RleDecompressionError> {
    if data.len() % 2 != 0 {
        return Err(RleDecompressionError::InvalidInputLength(data.len()));
    }

    let mut total = 0usize;
    for pair in data.chunks_exact(2) {
        total += pair[0] as usize;
        if total > max_len {
            return Err(RleDecompressionError::LimitExceeded { limit: max_len });
        }
    }

    let mut decoded = Vec::with_capacity(total);

    for pair in data.chunks_exact(2) {
        let (count, value) = (pair[0] as usize, pair[1]);
        decoded.resize(decoded.len() + count, value);
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rle_empty_input() {
        assert!(matches!(
            rle_compression(&[]),
            Err(RleCompressionError::EmptyInput)
        ));
    }

    #[test]
    fn test_rle_single_value() {
        let compressed = rle_compression(&[42]).unwrap();
        assert_eq!(compressed, vec![1, 42]);
        assert_eq!(rle_decompression(&compressed, 1).unwrap(), vec![42]);
    }

    #[test]
    fn test_rle_repeated_values() {
        let input = vec![10, 10, 10, 10, 10, 10];
        let compressed = rle_compression(&input).unwrap();
        assert_eq!(compressed, vec![6, 10]);
        let decompressed = rle_decompression(&compressed, input.len()).unwrap();
        assert_eq!(input, decompressed);
    }

    #[test]
    fn test_rle_run_of_255_fits_one_pair() {
        let input = vec![3; 255];
        let compressed = rle_compression(&input).unwrap();
        assert_eq!(compressed, vec![255, 3]);
    }

    #[test]
    fn test_rle_run_of_256_splits() {
        let input = vec![7; 256];
        let compressed = rle_compression(&input).unwrap();
        assert_eq!(compressed, vec![255, 7, 1, 7]);
        let decompressed = rle_decompression(&compressed, input.len()).unwrap();
        assert_eq!(input, decompressed);
    }

    #[test]
    fn test_rle_alternating_pattern() {
        let input = vec![0, 1, 0, 1, 0, 1];
        let compressed = rle_compression(&input).unwrap();
        assert_eq!(compressed.len(), 12);
        let decompressed = rle_decompression(&compressed, input.len()).unwrap();
        assert_eq!(input, decompressed);
    }

    #[test]
    fn test_rle_mixed_runs() {
        let input = vec![1, 2, 3, 3, 3, 3, 3, 3, 4, 5, 63, 63, 63, 63, 0, 0, 10];
        let compressed = rle_compression(&input).unwrap();
        assert_eq!(
            compressed,
            vec![1, 1, 1, 2, 6, 3, 1, 4, 1, 5, 4, 63, 2, 0, 1, 10]
        );
        let decompressed = rle_decompression(&compressed, input.len()).unwrap();
        assert_eq!(input, decompressed);
    }

    #[test]
    fn test_rle_long_canvas_row() {
        let mut input = vec![5; 1024 * 3];
        input.extend_from_slice(&[9; 700]);
        let compressed = rle_compression(&input).unwrap();
        let decompressed = rle_decompression(&compressed, input.len()).unwrap();
        assert_eq!(input, decompressed);
    }

    #[test]
    fn test_rle_decomp_limit() {
        let compressed = [255u8, 0].repeat(1000);
        assert!(matches!(
            rle_decompression(&compressed, 300),
            Err(RleDecompressionError::LimitExceeded { limit: 300 })
        ));
        assert_eq!(rle_decompression(&[255, 1, 45, 1], 300).unwrap(), vec![1; 300]);
    }

    #[test]
    fn test_rle_decomp_empty() {
        assert!(rle_decompression(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn test_rle_invalid_compressed_data() {
        assert!(matches!(
            rle_decompression(&[1, 2, 3], 16),
            Err(RleDecompressionError::InvalidInputLength(3))
        ));
    }
}
