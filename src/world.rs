//! The world root: the decoded `level.dat`, a bounded LRU of loaded
//! regions, and a direct-mapped chunk table. Orchestrates coordinate
//! resolution and save/flush ordering; the region and chunk engines below
//! it don't know about each other.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use flate2::Compression;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::byteio::{deflate, inflate};
use crate::chunk::{Block, Chunk};
use crate::coords::{block_in_chunk, block_to_chunk, chunk_hash, chunk_to_region};
use crate::error::{CompressionMode, Error};
use crate::nbt::{decode_root, encode_root, Compound};
use crate::region::{self, Region};
use crate::schema::{chunk_schema, leveldat_schema};

/// Cache bounds and compression effort, the only behavior this crate lets
/// a caller tune. Does not affect wire format or schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub max_regions: usize,
    pub max_chunks: usize,
    pub compression_level: u32,
}

impl Default for WorldConfig {
    fn default() -> WorldConfig {
        WorldConfig {
            max_regions: 8,
            max_chunks: 100,
            compression_level: Compression::default().level(),
        }
    }
}

/// A Minecraft Anvil world: `level.dat` plus a directory of region files,
/// with bounded in-memory caches for both.
pub struct World {
    path: PathBuf,
    level: Compound,
    regions: VecDeque<Region>,
    chunks: Vec<Option<Chunk>>,
    config: WorldConfig,
}

impl World {
    pub fn open(path: impl Into<PathBuf>) -> Result<World, Error> {
        World::open_with_config(path, WorldConfig::default())
    }

    pub fn open_with_config(path: impl Into<PathBuf>, config: WorldConfig) -> Result<World, Error> {
        let path = path.into();
        let compressed = fs::read(path.join("level.dat"))?;
        let uncompressed = inflate(&compressed, CompressionMode::Gzip)?;
        let level = decode_root(&uncompressed)?;

        debug!("opened world at {}", path.display());

        Ok(World {
            path,
            level,
            regions: VecDeque::new(),
            chunks: (0..config.max_chunks).map(|_| None).collect(),
            config,
        })
    }

    pub fn level(&self) -> &Compound {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Compound {
        &mut self.level
    }

    /// Re-encodes `level.dat` and writes it to disk, gzip-compressed.
    pub fn save(&self) -> Result<(), Error> {
        let schema = leveldat_schema();
        let uncompressed = encode_root(&self.level, &schema)?;
        let compressed = deflate(&uncompressed, CompressionMode::Gzip, self.config.compression_level)?;
        fs::create_dir_all(&self.path)?;
        fs::write(self.path.join("level.dat"), &compressed)?;
        debug!("saved level.dat: {} bytes", compressed.len());
        Ok(())
    }

    /// Flushes every dirty in-memory chunk belonging to region `(rx, rz)`
    /// and writes the region file to disk.
    pub fn save_region(&mut self, rx: i32, rz: i32) -> Result<(), Error> {
        self.load_region(rx, rz)?;

        let schema = chunk_schema();
        let level = self.config.compression_level;
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.x == rx && r.z == rz)
            .ok_or(Error::RegionNotFound {
                region_x: rx,
                region_z: rz,
            })?;

        for slot in self.chunks.iter_mut() {
            if let Some(chunk) = slot {
                if chunk_to_region(chunk.x) == rx && chunk_to_region(chunk.z) == rz && chunk.is_dirty() {
                    region.write_chunk(chunk.x, chunk.z, chunk.root(), &schema, level)?;
                    chunk.mark_clean();
                }
            }
        }

        region.save(&region::region_path(&self.path, rx, rz))
    }

    /// Ensures region `(rx, rz)` is resident in the cache, at the front
    /// (most-recently-used). Evicting the least-recently-used region
    /// flushes its dirty chunks first.
    pub fn load_region(&mut self, rx: i32, rz: i32) -> Result<(), Error> {
        if let Some(pos) = self.regions.iter().position(|r| r.x == rx && r.z == rz) {
            if pos != 0 {
                let region = self.regions.remove(pos).expect("position just found");
                self.regions.push_front(region);
            }
            return Ok(());
        }

        if self.regions.len() >= self.config.max_regions {
            if let Some(mut lru) = self.regions.pop_back() {
                debug!("evicting region ({}, {}) from cache", lru.x, lru.z);
                self.flush_chunks_into(&mut lru)?;
                lru.save(&region::region_path(&self.path, lru.x, lru.z))?;
            }
        }

        let region = Region::load(&region::region_path(&self.path, rx, rz), rx, rz)?;
        self.regions.push_front(region);
        Ok(())
    }

    fn flush_chunks_into(&mut self, region: &mut Region) -> Result<(), Error> {
        let schema = chunk_schema();
        let level = self.config.compression_level;
        for slot in self.chunks.iter_mut() {
            if let Some(chunk) = slot {
                if chunk_to_region(chunk.x) == region.x
                    && chunk_to_region(chunk.z) == region.z
                    && chunk.is_dirty()
                {
                    region.write_chunk(chunk.x, chunk.z, chunk.root(), &schema, level)?;
                    chunk.mark_clean();
                }
            }
        }
        Ok(())
    }

    fn flush_chunk(&mut self, chunk: &Chunk) -> Result<(), Error> {
        let rx = chunk_to_region(chunk.x);
        let rz = chunk_to_region(chunk.z);
        self.load_region(rx, rz)?;

        let schema = chunk_schema();
        let level = self.config.compression_level;
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.x == rx && r.z == rz)
            .expect("just loaded");
        region.write_chunk(chunk.x, chunk.z, chunk.root(), &schema, level)
    }

    /// Returns the chunk at `(cx, cz)`, loading it (from its region, or
    /// freshly created if absent there) into the direct-mapped cache if
    /// it isn't already resident. A dirty occupant of the target slot is
    /// flushed to its region before being evicted.
    pub fn get_chunk(&mut self, cx: i32, cz: i32) -> Result<&mut Chunk, Error> {
        let idx = chunk_hash(cx, cz).rem_euclid(self.config.max_chunks as i64) as usize;

        let needs_replace = match &self.chunks[idx] {
            Some(c) => c.x != cx || c.z != cz,
            None => true,
        };

        if needs_replace {
            if let Some(old) = self.chunks[idx].take() {
                if old.is_dirty() {
                    debug!(
                        "evicting dirty chunk ({}, {}) from slot {}",
                        old.x, old.z, idx
                    );
                    self.flush_chunk(&old)?;
                } else {
                    debug!("evicting clean chunk ({}, {}) from slot {}", old.x, old.z, idx);
                }
            }

            let rx = chunk_to_region(cx);
            let rz = chunk_to_region(cz);
            self.load_region(rx, rz)?;
            let region = self
                .regions
                .iter_mut()
                .find(|r| r.x == rx && r.z == rz)
                .expect("just loaded");
            let chunk = match region.read_chunk(cx, cz)? {
                Some(root) => Chunk::from_root(cx, cz, root),
                None => Chunk::empty(cx, cz),
            };
            self.chunks[idx] = Some(chunk);
        }

        Ok(self.chunks[idx].as_mut().expect("slot just populated"))
    }

    pub fn get_block(&mut self, x: i32, y: i32, z: i32) -> Result<Block, Error> {
        let cx = block_to_chunk(x);
        let cz = block_to_chunk(z);
        let y_local = y.rem_euclid(256) as u8;
        let chunk = self.get_chunk(cx, cz)?;
        chunk.get_block(block_in_chunk(x), y_local, block_in_chunk(z))
    }

    pub fn put_block(&mut self, x: i32, y: i32, z: i32, block: Block) -> Result<(), Error> {
        let cx = block_to_chunk(x);
        let cz = block_to_chunk(z);
        let y_local = y.rem_euclid(256) as u8;
        let chunk = self.get_chunk(cx, cz)?;
        chunk.put_block(block_in_chunk(x), y_local, block_in_chunk(z), block)
    }

    /// Flushes chunk `(cx, cz)` to its region's in-memory buffer and writes
    /// just that region's file to disk, without touching any other dirty
    /// chunk that may share the region (unlike `save_region`, which flushes
    /// every dirty chunk in the region at once).
    pub fn save_chunk(&mut self, cx: i32, cz: i32) -> Result<(), Error> {
        let rx = chunk_to_region(cx);
        let rz = chunk_to_region(cz);

        self.get_chunk(cx, cz)?;

        let schema = chunk_schema();
        let level = self.config.compression_level;
        let idx = chunk_hash(cx, cz).rem_euclid(self.config.max_chunks as i64) as usize;

        let region = self
            .regions
            .iter_mut()
            .find(|r| r.x == rx && r.z == rz)
            .expect("just loaded by get_chunk");

        if let Some(chunk) = self.chunks[idx].as_mut() {
            if chunk.x == cx && chunk.z == cz {
                region.write_chunk(chunk.x, chunk.z, chunk.root(), &schema, level)?;
                chunk.mark_clean();
            }
        }

        region.save(&region::region_path(&self.path, rx, rz))
    }

    /// Enumerates on-disk regions by scanning `path/region/` without
    /// loading any of them into the cache.
    pub fn list_regions(&self) -> Result<Vec<(i32, i32)>, Error> {
        let region_dir = self.path.join("region");
        let mut out = Vec::new();
        if !region_dir.exists() {
            return Ok(out);
        }
        for entry in fs::read_dir(&region_dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some((x, z)) = region::parse_region_file_name(name) {
                    out.push((x, z));
                }
            }
        }
        Ok(out)
    }

    /// Enumerates every non-empty chunk slot in every on-disk region,
    /// without loading anything into the cache.
    pub fn list_chunks(&self) -> Result<Vec<(i32, i32)>, Error> {
        let mut out = Vec::new();
        for (rx, rz) in self.list_regions()? {
            let region = Region::load(&region::region_path(&self.path, rx, rz), rx, rz)?;
            out.extend(region.list_chunks());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::value::CompoundExt;
    use tempfile::TempDir;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn new_world(dir: &TempDir) -> World {
        let mut root = Compound::new();
        let mut data = Compound::new();
        data.insert_str("LevelName", "Test World");
        data.insert_i64("RandomSeed", 42);
        root.insert_compound_tag("Data", data);

        let world = World {
            path: dir.path().to_path_buf(),
            level: root,
            regions: VecDeque::new(),
            chunks: (0..WorldConfig::default().max_chunks).map(|_| None).collect(),
            config: WorldConfig::default(),
        };
        world.save().unwrap();
        world
    }

    #[test]
    fn open_missing_level_dat_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = World::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn put_block_then_reopen_round_trips() {
        init_logging();
        let dir = TempDir::new().unwrap();
        {
            let mut world = new_world(&dir);
            world.put_block(0, 64, 0, Block::new(1, 0, 0, 15)).unwrap();
            world.save_region(0, 0).unwrap();
        }

        let mut world = World::open(dir.path()).unwrap();
        let block = world.get_block(0, 64, 0).unwrap();
        assert_eq!(block, Block::new(1, 0, 0, 15));
    }

    #[test]
    fn put_block_with_add_extended_id_round_trips() {
        let dir = TempDir::new().unwrap();
        {
            let mut world = new_world(&dir);
            world.put_block(1, 64, 2, Block::new(256, 0, 0, 0)).unwrap();
            world.save_region(0, 0).unwrap();
        }

        let mut world = World::open(dir.path()).unwrap();
        assert_eq!(world.get_block(1, 64, 2).unwrap().id, 256);
    }

    #[test]
    fn region_cache_evicts_oldest_beyond_capacity() {
        init_logging();
        let dir = TempDir::new().unwrap();
        let mut world = new_world(&dir);
        world.config.max_regions = 8;

        for i in 0..9 {
            world.load_region(i, 0).unwrap();
        }

        assert_eq!(world.regions.len(), 8);
        assert!(!world.regions.iter().any(|r| r.x == 0 && r.z == 0));
        assert!(dir.path().join("region").join("r.0.0.mca").exists());
    }

    #[test]
    fn save_chunk_flushes_only_that_chunk_not_the_whole_region() {
        init_logging();
        let dir = TempDir::new().unwrap();
        let mut world = new_world(&dir);

        world.put_block(0, 64, 0, Block::new(1, 0, 0, 15)).unwrap();
        world.put_block(16, 64, 0, Block::new(2, 0, 0, 15)).unwrap();
        world.save_chunk(0, 0).unwrap();

        assert!(!world.get_chunk(0, 0).unwrap().is_dirty());
        assert!(world.get_chunk(1, 0).unwrap().is_dirty());

        let region = Region::load(&region::region_path(dir.path(), 0, 0), 0, 0).unwrap();
        assert!(region.has_chunk(0, 0));
        assert!(!region.has_chunk(1, 0));
    }
}
