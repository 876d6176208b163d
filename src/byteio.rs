//! Byte-level primitives shared by the region and NBT layers: big-endian
//! integers of non-power-of-two widths (the region directory's 3-byte
//! sector offset), and the zlib/gzip wrappers chunk payloads are stored
//! under.

use std::io::{self, Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

use crate::error::{CompressError, CompressionMode};

/// Reads an `n`-byte (1 ≤ n ≤ 8) big-endian unsigned integer. Used for the
/// region directory's 3-byte sector offset as well as ordinary 1/2/4/8-byte
/// reads, so callers don't need a separate code path per width.
pub fn read_be<R: Read>(mut src: R, n: usize) -> io::Result<u64> {
    src.read_uint::<BigEndian>(n)
}

/// Writes `value`'s low `n` bytes (1 ≤ n ≤ 8) as big-endian.
pub fn write_be<W: Write>(mut dst: W, value: u64, n: usize) -> io::Result<()> {
    dst.write_uint::<BigEndian>(value, n)
}

/// Inflates `src` under the given compression mode.
pub fn inflate(src: &[u8], mode: CompressionMode) -> Result<Vec<u8>, CompressError> {
    let mut out = Vec::new();
    let result = match mode {
        CompressionMode::Zlib => ZlibDecoder::new(Cursor::new(src)).read_to_end(&mut out),
        CompressionMode::Gzip => GzDecoder::new(Cursor::new(src)).read_to_end(&mut out),
    };
    result
        .map(|_| out)
        .map_err(|source| CompressError::Inflate { mode, source })
}

/// Deflates `src` under the given compression mode at `level` (0-9, as in
/// the zlib effort scale; see [`crate::world::WorldConfig::compression_level`]).
pub fn deflate(src: &[u8], mode: CompressionMode, level: u32) -> Result<Vec<u8>, CompressError> {
    let compression = Compression::new(level);
    let result = match mode {
        CompressionMode::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), compression);
            encoder
                .write_all(src)
                .and_then(|_| encoder.finish())
        }
        CompressionMode::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), compression);
            encoder
                .write_all(src)
                .and_then(|_| encoder.finish())
        }
    };
    result.map_err(|source| CompressError::Deflate { mode, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_be_reads_three_byte_sector_offsets() {
        let bytes = [0x00u8, 0x01, 0x02];
        let value = read_be(&bytes[..], 3).unwrap();
        assert_eq!(value, 0x000102);
    }

    #[test]
    fn write_be_then_read_be_round_trips() {
        let mut buf = Vec::new();
        write_be(&mut buf, 0xABCDEF, 3).unwrap();
        assert_eq!(buf, vec![0xAB, 0xCD, 0xEF]);
        assert_eq!(read_be(&buf[..], 3).unwrap(), 0xABCDEF);
    }

    #[test]
    fn zlib_round_trip() {
        let original = b"the quick brown fox jumps over the lazy dog".to_vec();
        let compressed = deflate(&original, CompressionMode::Zlib, 6).unwrap();
        let decompressed = inflate(&compressed, CompressionMode::Zlib).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn gzip_round_trip() {
        let original = b"level.dat payload".to_vec();
        let compressed = deflate(&original, CompressionMode::Gzip, 6).unwrap();
        let decompressed = inflate(&compressed, CompressionMode::Gzip).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn inflate_rejects_garbage() {
        let garbage = vec![1, 2, 3, 4, 5];
        assert!(inflate(&garbage, CompressionMode::Zlib).is_err());
    }
}
