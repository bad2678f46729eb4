//! Compression support for VGM files
//!
//! VGM files are frequently distributed gzip-compressed under the `.vgz` extension. This module
//! detects the gzip member header and inflates it with the `flate2` crate. Uncompressed data
//! passes through unchanged, so callers can hand over whatever they read from disk.
//!
//! Decompression enforces a hard output limit. A VGM that drives only the PSG is a few hundred
//! kilobytes at most; anything inflating past the limit is treated as corrupt.

use crate::{Result, Sn76489Error};
use flate2::read::GzDecoder;
use std::io::Read;

/// gzip member magic (ID1, ID2)
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Compression method byte for deflate, the only method gzip defines
const GZIP_METHOD_DEFLATE: u8 = 0x08;

/// Maximum decompressed size: 64MB
const MAX_DECOMPRESSED_SIZE: usize = 64 * 1024 * 1024;

/// Decompress gzip data if it is gzip, otherwise return a copy unchanged
///
/// # Errors
/// - [`Sn76489Error::DecompressionError`] if the gzip stream is corrupt or inflates past the
///   size limit
///
/// # Examples
/// ```
/// use sn76489::compression::decompress_if_needed;
///
/// let plain = b"Vgm \x00\x00\x00\x00";
/// assert_eq!(decompress_if_needed(plain).unwrap(), plain.to_vec());
/// ```
pub fn decompress_if_needed(data: &[u8]) -> Result<Vec<u8>> {
    if !is_gzip_compressed(data) {
        return Ok(data.to_vec());
    }

    let decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();

    // One byte past the limit tells a file exactly at the limit from an oversized one
    let mut limited = decoder.take(MAX_DECOMPRESSED_SIZE as u64 + 1);
    limited.read_to_end(&mut decompressed).map_err(|e| {
        Sn76489Error::DecompressionError(format!("gzip decompression failed: {}", e))
    })?;

    if decompressed.len() > MAX_DECOMPRESSED_SIZE {
        return Err(Sn76489Error::DecompressionError(format!(
            "Decompressed data exceeded maximum safe size ({}MB). \
             The file may be corrupted.",
            MAX_DECOMPRESSED_SIZE / (1024 * 1024)
        )));
    }

    Ok(decompressed)
}

/// Detect gzip framing by its member header
///
/// Checks the two magic bytes and the deflate method byte.
///
/// ```
/// use sn76489::compression::is_gzip_compressed;
///
/// assert!(is_gzip_compressed(&[0x1F, 0x8B, 0x08, 0x00]));
/// assert!(!is_gzip_compressed(b"Vgm "));
/// ```
pub fn is_gzip_compressed(data: &[u8]) -> bool {
    data.len() >= 3 && data[0..2] == GZIP_MAGIC && data[2] == GZIP_METHOD_DEFLATE
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_uncompressed_passthrough() {
        let data = b"Vgm \x10\x00\x00\x00";
        assert_eq!(decompress_if_needed(data).unwrap(), data.to_vec());
    }

    #[test]
    fn test_gzip_round_trip() {
        let original: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let packed = gzip(&original);
        assert!(is_gzip_compressed(&packed));
        assert_eq!(decompress_if_needed(&packed).unwrap(), original);
    }

    #[test]
    fn test_corrupt_gzip() {
        let mut packed = gzip(b"Vgm some payload that compresses");
        let len = packed.len();
        packed.truncate(len / 2);
        let err = decompress_if_needed(&packed).unwrap_err();
        assert!(matches!(err, Sn76489Error::DecompressionError(_)));
    }

    #[test]
    fn test_detection_needs_method_byte() {
        assert!(!is_gzip_compressed(&[0x1F, 0x8B]));
        assert!(!is_gzip_compressed(&[0x1F, 0x8B, 0x07]));
        assert!(!is_gzip_compressed(&[]));
    }
}
