//! Block-level access to Minecraft Anvil worlds: the NBT tag codec, the
//! `.mca` region file engine, and a chunk/block accessor sitting behind a
//! bounded world-level cache.
//!
//! More on the on-disk formats: <https://wiki.vg/Region_Files>,
//! <https://wiki.vg/NBT>.
//!
//! # Example
//!
//! ```no_run
//! use anvil_world::{Block, World};
//!
//! let mut world = World::open("test/world")?;
//! world.put_block(0, 64, 0, Block::new(1, 0, 0, 15))?;
//! world.save_region(0, 0)?;
//! # Ok::<(), anvil_world::Error>(())
//! ```

pub mod byteio;
pub mod chunk;
pub mod coords;
pub mod error;
pub mod nbt;
pub mod region;
pub mod schema;
pub mod world;

pub use chunk::{Block, Chunk};
pub use error::Error;
pub use nbt::{Compound, CompoundExt, Tag, TagId};
pub use region::Region;
pub use schema::Schema;
pub use world::{World, WorldConfig};
