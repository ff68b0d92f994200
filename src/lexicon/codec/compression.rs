//! Compression of individual data records.
//!
//! Records are compressed independently so a lookup only ever inflates the
//! one record it needs:
//! - None (type 0): stored as-is
//! - Zlib (type 2): standard deflate stream via flate2

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use log::trace;

use crate::lexicon::types::error::{LexiconError, Result};
use crate::lexicon::types::models::CompressionType;

/// Compresses a serialized record for storage.
pub fn compress_payload(payload: &[u8], compression_type: CompressionType) -> Result<Vec<u8>> {
    match compression_type {
        CompressionType::None => Ok(payload.to_vec()),
        CompressionType::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::with_capacity(payload.len() / 2 + 16), Compression::best());
            encoder
                .write_all(payload)
                .map_err(|e| LexiconError::CompressionError(format!("Zlib compression failed: {}", e)))?;
            let compressed = encoder
                .finish()
                .map_err(|e| LexiconError::CompressionError(format!("Zlib compression failed: {}", e)))?;
            trace!("Compressed record with Zlib: {} bytes -> {} bytes", payload.len(), compressed.len());
            Ok(compressed)
        }
    }
}

/// Decompresses a stored record into `output`.
///
/// # Validation
/// The inflated record may not exceed `max_size` bytes; a larger result means
/// the stored stream is corrupt.
///
/// # Errors
/// Returns an error if decompression fails or the size check fails.
pub fn decompress_payload_into(
    output: &mut Vec<u8>,
    payload: &[u8],
    compression_type: CompressionType,
    max_size: u64,
) -> Result<()> {
    output.clear();

    match compression_type {
        CompressionType::None => {
            trace!("No compression, copying {} bytes", payload.len());
            output.extend_from_slice(payload);
        }
        CompressionType::Zlib => {
            trace!("Decompressing with Zlib: {} bytes", payload.len());
            let decoder = ZlibDecoder::new(payload);
            decoder
                .take(max_size + 1)
                .read_to_end(output)
                .map_err(|e| LexiconError::CompressionError(format!("Zlib decompression failed: {}", e)))?;
        }
    };

    if output.len() as u64 > max_size {
        return Err(LexiconError::SizeMismatch {
            context: "decompressed record".to_string(),
            expected: max_size,
            found: output.len() as u64,
        });
    }

    Ok(())
}
