//! The Anvil region engine: parses and rewrites a region file's 4 KiB
//! sector directory, locates and decompresses chunk payloads, and relocates
//! them in place when a rewritten chunk no longer fits its old sectors.
//!
//! `Region` holds the entire file in memory as a single growable buffer —
//! the natural shape for an algorithm that works by shifting byte ranges
//! within it, rather than by issuing a sequence of seeks against a file
//! handle.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};

use crate::byteio::{deflate, inflate, read_be, write_be};
use crate::coords::{chunk_in_region, directory_index};
use crate::error::{CompressionMode, Error};
use crate::nbt::{decode_root, encode_root, Compound};
use crate::schema::Schema;

const SECTOR_BYTES: usize = 4096;
const DIRECTORY_BYTES: usize = SECTOR_BYTES;
const TIMESTAMP_BYTES: usize = SECTOR_BYTES;
const HEADER_SECTORS: u32 = (DIRECTORY_BYTES + TIMESTAMP_BYTES) as u32 / SECTOR_BYTES as u32;
const DIRECTORY_ENTRIES: usize = 1024;
const CHUNK_HEADER_BYTES: usize = 5; // 4-byte length + 1-byte compression id

/// Padding appended to a freshly-read buffer so in-place growth during
/// `update_region` rarely needs a fresh allocation.
const REGION_BUFFER_PADDING: usize = 10_000;
/// Starting buffer size for a region that doesn't exist on disk yet.
const NEW_REGION_BUFFER_SIZE: usize = 2_000_000;

fn compression_id(mode: CompressionMode) -> u8 {
    match mode {
        CompressionMode::Gzip => 1,
        CompressionMode::Zlib => 2,
    }
}

fn compression_mode(id: u8) -> Option<CompressionMode> {
    match id {
        1 => Some(CompressionMode::Gzip),
        2 => Some(CompressionMode::Zlib),
        _ => None,
    }
}

/// One directory entry: the sector offset and sector count for a chunk
/// slot. `(0, 0)` means the slot is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirectoryEntry {
    offset: u32,
    sectors: u8,
}

impl DirectoryEntry {
    fn is_present(&self) -> bool {
        self.offset != 0 || self.sectors != 0
    }
}

/// An in-memory region file: the 8 KiB header plus packed chunk sectors.
pub struct Region {
    pub x: i32,
    pub z: i32,
    buffer: Vec<u8>,
    current_size: usize,
}

impl Region {
    /// Loads `path` if it exists, otherwise starts a fresh, empty region
    /// buffer. Does not require `path`'s parent directory to exist yet;
    /// that is `save`'s concern.
    pub fn load(path: &Path, x: i32, z: i32) -> Result<Region, Error> {
        if path.exists() {
            let mut contents = fs::read(path)?;
            let current_size = contents.len();
            contents.resize(current_size + REGION_BUFFER_PADDING, 0);
            debug!(
                "loaded region ({}, {}) from {}: {} bytes",
                x,
                z,
                path.display(),
                current_size
            );
            Ok(Region {
                x,
                z,
                buffer: contents,
                current_size,
            })
        } else {
            debug!("creating new region ({}, {}) at {}", x, z, path.display());
            Ok(Region {
                x,
                z,
                buffer: vec![0u8; NEW_REGION_BUFFER_SIZE],
                current_size: 0,
            })
        }
    }

    fn read_entry(&self, index: usize) -> DirectoryEntry {
        let at = index * 4;
        let offset = read_be(&self.buffer[at..at + 3], 3).expect("in-memory read cannot fail") as u32;
        DirectoryEntry {
            offset,
            sectors: self.buffer[at + 3],
        }
    }

    fn write_entry(&mut self, index: usize, entry: DirectoryEntry) {
        let at = index * 4;
        write_be(&mut self.buffer[at..at + 3], entry.offset as u64, 3)
            .expect("in-memory write cannot fail");
        self.buffer[at + 3] = entry.sectors;
    }

    /// `true` if chunk `(chunk_x, chunk_z)` (in chunk-space, not region-
    /// local) has a non-empty directory entry.
    pub fn has_chunk(&self, chunk_x: i32, chunk_z: i32) -> bool {
        let index = directory_index(chunk_in_region(chunk_x), chunk_in_region(chunk_z));
        self.read_entry(index).is_present()
    }

    /// Every non-empty directory slot, as chunk coordinates in this region.
    pub fn list_chunks(&self) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for iz in 0..32i32 {
            for ix in 0..32i32 {
                let index = directory_index(ix as u8, iz as u8);
                if self.read_entry(index).is_present() {
                    out.push((self.x * 32 + ix, self.z * 32 + iz));
                }
            }
        }
        out
    }

    /// Decompresses and decodes the chunk at `(chunk_x, chunk_z)`, if
    /// present.
    pub fn read_chunk(&self, chunk_x: i32, chunk_z: i32) -> Result<Option<Compound>, Error> {
        let index = directory_index(chunk_in_region(chunk_x), chunk_in_region(chunk_z));
        let entry = self.read_entry(index);
        if !entry.is_present() {
            return Ok(None);
        }

        let start = entry.offset as usize * SECTOR_BYTES;
        let length = read_be(&self.buffer[start..start + 4], 4)? as u32;
        if length == 0 {
            return Err(Error::InvalidChunkLength {
                region_x: self.x,
                region_z: self.z,
                length,
            });
        }
        let compression_byte = self.buffer[start + 4];
        let mode = compression_mode(compression_byte)
            .ok_or(Error::InvalidCompressionId { id: compression_byte })?;
        let payload_start = start + CHUNK_HEADER_BYTES;
        let payload_len = length as usize - 1;
        let payload = &self.buffer[payload_start..payload_start + payload_len];
        let uncompressed = inflate(payload, mode)?;
        Ok(Some(decode_root(&uncompressed)?))
    }

    fn scan_last_used(&self) -> (u32, u8) {
        // A brand-new region's header occupies sectors [0, 2); every slot
        // beyond that is "last" only once something has actually been
        // written there.
        let mut last_offset = HEADER_SECTORS;
        let mut last_sectors = 0u8;
        for index in 0..DIRECTORY_ENTRIES {
            let entry = self.read_entry(index);
            if entry.offset > last_offset {
                last_offset = entry.offset;
                last_sectors = entry.sectors;
            }
        }
        (last_offset, last_sectors)
    }

    fn ensure_capacity(&mut self, needed_bytes: usize, extra_sectors: i64) {
        if needed_bytes >= self.buffer.len() {
            let grown = self.current_size + (extra_sectors + 4) as usize * SECTOR_BYTES;
            warn!(
                "region ({}, {}) buffer grown to {} bytes",
                self.x, self.z, grown
            );
            self.buffer.resize(grown.max(needed_bytes + SECTOR_BYTES), 0);
        }
    }

    /// Encodes, compresses, and writes `chunk` into this region's buffer,
    /// relocating any sectors that fall after it if its size changed.
    /// Matches §4.4's `update_region`.
    pub fn write_chunk(
        &mut self,
        chunk_x: i32,
        chunk_z: i32,
        chunk: &Compound,
        schema: &Schema,
        compression_level: u32,
    ) -> Result<(), Error> {
        let index = directory_index(chunk_in_region(chunk_x), chunk_in_region(chunk_z));
        let entry = self.read_entry(index);

        let uncompressed = encode_root(chunk, schema)?;
        let compressed = deflate(&uncompressed, CompressionMode::Zlib, compression_level)?;
        let compressed_size = compressed.len();
        let new_sector_count =
            ((compressed_size + CHUNK_HEADER_BYTES) + SECTOR_BYTES - 1) / SECTOR_BYTES;

        let (last_offset, last_sectors) = self.scan_last_used();
        let difference = new_sector_count as i64 - entry.sectors as i64;

        let mut location = entry.offset;
        let mut shifted_tail_end = 0usize;

        if difference != 0 {
            let needed_bytes = self.current_size + (difference.max(0) as usize) * SECTOR_BYTES;
            self.ensure_capacity(needed_bytes, difference.max(0));

            if entry.is_present() {
                let tail_start = (location as usize + entry.sectors as usize) * SECTOR_BYTES;
                let tail_end = (last_offset as usize + last_sectors as usize) * SECTOR_BYTES;
                let shift_len = tail_end.saturating_sub(tail_start);
                if shift_len > 0 {
                    let dst_start = (tail_start as i64 + difference * SECTOR_BYTES as i64) as usize;
                    trace!(
                        "region ({}, {}) relocating {} bytes from {} to {}",
                        self.x,
                        self.z,
                        shift_len,
                        tail_start,
                        dst_start
                    );
                    let max_end = (dst_start + shift_len).max(tail_end);
                    if max_end > self.buffer.len() {
                        self.buffer.resize(max_end + REGION_BUFFER_PADDING, 0);
                    }
                    self.buffer.copy_within(tail_start..tail_start + shift_len, dst_start);
                    shifted_tail_end = dst_start + shift_len;
                }

                for i in 0..DIRECTORY_ENTRIES {
                    let mut e = self.read_entry(i);
                    if e.offset > location {
                        e.offset = (e.offset as i64 + difference) as u32;
                        self.write_entry(i, e);
                    }
                }
            }
        }

        if !entry.is_present() {
            location = last_offset + last_sectors as u32;
        }

        let write_start = location as usize * SECTOR_BYTES;
        let write_end = write_start + CHUNK_HEADER_BYTES + compressed_size;
        if write_end > self.buffer.len() {
            self.buffer.resize(write_end + REGION_BUFFER_PADDING, 0);
        }

        write_be(
            &mut self.buffer[write_start..write_start + 4],
            (compressed_size + 1) as u64,
            4,
        )?;
        self.buffer[write_start + 4] = compression_id(CompressionMode::Zlib);
        self.buffer[write_start + CHUNK_HEADER_BYTES..write_end].copy_from_slice(&compressed);

        self.write_entry(
            index,
            DirectoryEntry {
                offset: location,
                sectors: new_sector_count as u8,
            },
        );

        self.current_size = self.current_size.max(write_end).max(shifted_tail_end);
        Ok(())
    }

    /// Writes `current_size` bytes of the buffer to `path`, overwriting
    /// whatever was there.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.buffer[..self.current_size])?;
        debug!(
            "saved region ({}, {}) to {}: {} bytes",
            self.x,
            self.z,
            path.display(),
            self.current_size
        );
        Ok(())
    }
}

/// The on-disk file name for region `(x, z)`.
pub fn region_file_name(x: i32, z: i32) -> String {
    format!("r.{}.{}.mca", x, z)
}

pub fn region_path(world_dir: &Path, x: i32, z: i32) -> PathBuf {
    world_dir.join("region").join(region_file_name(x, z))
}

/// Parses a region file name matching `^.*\.(-?\d+)\.(-?\d+)\.mca$`,
/// rejecting anything that isn't a strict, fully-consumed integer in each
/// capture (no partial matches, no stray whitespace).
pub fn parse_region_file_name(name: &str) -> Option<(i32, i32)> {
    let stem = name.strip_suffix(".mca")?;
    let mut parts = stem.rsplitn(3, '.');
    let z_str = parts.next()?;
    let x_str = parts.next()?;
    parts.next()?; // the `.*` prefix; may be empty

    Some((strict_parse_i32(x_str)?, strict_parse_i32(z_str)?))
}

fn strict_parse_i32(s: &str) -> Option<i32> {
    if s.is_empty() {
        return None;
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::value::CompoundExt;
    use crate::schema::chunk_schema;
    use tempfile::TempDir;

    fn sample_chunk(x: i32, z: i32) -> Compound {
        let mut level = Compound::new();
        level.insert_i32("xPos", x);
        level.insert_i32("zPos", z);
        let mut root = Compound::new();
        root.insert_compound_tag("Level", level);
        root
    }

    #[test]
    fn write_then_read_round_trips() {
        let schema = chunk_schema();
        let mut region = Region {
            x: 0,
            z: 0,
            buffer: vec![0u8; NEW_REGION_BUFFER_SIZE],
            current_size: 0,
        };

        let chunk = sample_chunk(3, 5);
        region.write_chunk(3, 5, &chunk, &schema, 6).unwrap();

        assert!(region.has_chunk(3, 5));
        let read_back = region.read_chunk(3, 5).unwrap().unwrap();
        assert_eq!(read_back, chunk);
    }

    #[test]
    fn absent_chunk_reads_as_none() {
        let region = Region {
            x: 0,
            z: 0,
            buffer: vec![0u8; NEW_REGION_BUFFER_SIZE],
            current_size: 0,
        };
        assert!(!region.has_chunk(1, 1));
        assert!(region.read_chunk(1, 1).unwrap().is_none());
    }

    #[test]
    fn zero_length_chunk_header_is_a_decode_error_not_a_panic() {
        let mut region = Region {
            x: 0,
            z: 0,
            buffer: vec![0u8; NEW_REGION_BUFFER_SIZE],
            current_size: 0,
        };
        // Present directory entry pointing at sector 2, whose length
        // field (left zeroed) a corrupted file might plausibly carry.
        region.write_entry(0, DirectoryEntry { offset: 2, sectors: 1 });

        let err = region.read_chunk(0, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidChunkLength { length: 0, .. }));
    }

    #[test]
    fn growing_a_chunk_shifts_the_following_chunk() {
        let schema = chunk_schema();
        let mut region = Region {
            x: 0,
            z: 0,
            buffer: vec![0u8; NEW_REGION_BUFFER_SIZE],
            current_size: 0,
        };

        let a = sample_chunk(0, 0);
        let b = sample_chunk(1, 0);
        region.write_chunk(0, 0, &a, &schema, 6).unwrap();
        region.write_chunk(1, 0, &b, &schema, 6).unwrap();

        // Rewrite `a` with a much larger payload so it needs extra sectors.
        let mut bigger_a = Compound::new();
        let mut level = Compound::new();
        level.insert_i32("xPos", 0);
        level.insert_i32("zPos", 0);
        level.insert_byte_array("Biomes", vec![0u8; 20_000]);
        bigger_a.insert_compound_tag("Level", level);
        region.write_chunk(0, 0, &bigger_a, &schema, 6).unwrap();

        assert_eq!(region.read_chunk(0, 0).unwrap().unwrap(), bigger_a);
        assert_eq!(region.read_chunk(1, 0).unwrap().unwrap(), b);
    }

    #[test]
    fn save_then_load_round_trips() {
        let schema = chunk_schema();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.0.0.mca");

        let mut region = Region {
            x: 0,
            z: 0,
            buffer: vec![0u8; NEW_REGION_BUFFER_SIZE],
            current_size: 0,
        };
        let chunk = sample_chunk(2, 2);
        region.write_chunk(2, 2, &chunk, &schema, 6).unwrap();
        region.save(&path).unwrap();

        let reloaded = Region::load(&path, 0, 0).unwrap();
        assert_eq!(reloaded.read_chunk(2, 2).unwrap().unwrap(), chunk);
    }

    #[test]
    fn parses_region_file_names() {
        assert_eq!(parse_region_file_name("r.0.0.mca"), Some((0, 0)));
        assert_eq!(parse_region_file_name("r.1.-2.mca"), Some((1, -2)));
        assert_eq!(parse_region_file_name("r.0.0.mca "), None);
        assert_eq!(parse_region_file_name("r.0.0.mca.backup"), None);
        assert_eq!(parse_region_file_name("r. 0.0.mca"), None);
    }
}
