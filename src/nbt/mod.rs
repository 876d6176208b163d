//! The NBT (Named Binary Tag) codec: [`value`] defines the tag tree itself,
//! [`decode`] turns bytes into a tree, [`encode`] turns a tree back into
//! bytes under a [`crate::schema::Schema`].

pub mod decode;
pub mod encode;
pub mod value;

pub use decode::decode_root;
pub use encode::{encode_root, encode_root_unchecked};
pub use value::{Compound, CompoundExt, Tag, TagId};
