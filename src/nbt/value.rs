//! The tag tree: [`Tag`], the sum type with one variant per NBT wire type,
//! and [`Compound`], the ordered name → tag mapping every Compound tag and
//! every document root is built from.

use indexmap::IndexMap;

use crate::error::TagAccessError;

/// The wire type id of a tag, shared between the decoder, the encoder, and
/// the schema tables. `0` (TAG_End) has no payload and is never carried in a
/// [`Tag`] value; it only appears as a sentinel while decoding/encoding a
/// [`Compound`]'s tag sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagId {
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagId {
    pub fn from_u8(id: u8) -> Option<TagId> {
        Some(match id {
            1 => TagId::Byte,
            2 => TagId::Short,
            3 => TagId::Int,
            4 => TagId::Long,
            5 => TagId::Float,
            6 => TagId::Double,
            7 => TagId::ByteArray,
            8 => TagId::String,
            9 => TagId::List,
            10 => TagId::Compound,
            11 => TagId::IntArray,
            12 => TagId::LongArray,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// An ordered name → [`Tag`] mapping. Backed by an `IndexMap` so that
/// encoding a freshly-decoded compound reproduces the original tag order —
/// the wire format itself does not require this, but byte-identical
/// round-trips (§8 property 1) do.
pub type Compound = IndexMap<String, Tag>;

/// A decoded NBT value. Exactly one variant per wire type, plus `Boolean`:
/// a `String` tag whose payload is the literal byte sequence `"true"` or
/// `"false"` is surfaced as `Boolean` rather than `String` (see
/// `DESIGN.md`'s note on the string/boolean collapse bug). Both variants
/// share the `String` wire type; [`Tag::wire_id`] reports `TagId::String`
/// for both.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    Boolean(bool),
    List(TagId, Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    /// The wire type this value is encoded as.
    pub fn wire_id(&self) -> TagId {
        match self {
            Tag::Byte(_) => TagId::Byte,
            Tag::Short(_) => TagId::Short,
            Tag::Int(_) => TagId::Int,
            Tag::Long(_) => TagId::Long,
            Tag::Float(_) => TagId::Float,
            Tag::Double(_) => TagId::Double,
            Tag::ByteArray(_) => TagId::ByteArray,
            Tag::String(_) | Tag::Boolean(_) => TagId::String,
            Tag::List(_, _) => TagId::List,
            Tag::Compound(_) => TagId::Compound,
            Tag::IntArray(_) => TagId::IntArray,
            Tag::LongArray(_) => TagId::LongArray,
        }
    }
}

fn wrong_type(name: &str, expected: TagId, actual: TagId) -> TagAccessError {
    TagAccessError::WrongType {
        name: name.to_owned(),
        expected,
        actual,
    }
}

fn missing(name: &str) -> TagAccessError {
    TagAccessError::Missing {
        name: name.to_owned(),
    }
}

/// Convenience accessors mirroring the reference crate's `CompoundTag` API,
/// so callers building or reading a tree rarely need to match on [`Tag`] by
/// hand.
pub trait CompoundExt {
    fn get_i8(&self, name: &str) -> Result<i8, TagAccessError>;
    fn get_i16(&self, name: &str) -> Result<i16, TagAccessError>;
    fn get_i32(&self, name: &str) -> Result<i32, TagAccessError>;
    fn get_i64(&self, name: &str) -> Result<i64, TagAccessError>;
    fn get_f32(&self, name: &str) -> Result<f32, TagAccessError>;
    fn get_f64(&self, name: &str) -> Result<f64, TagAccessError>;
    fn get_bool(&self, name: &str) -> Result<bool, TagAccessError>;
    fn get_str(&self, name: &str) -> Result<&str, TagAccessError>;
    fn get_byte_array(&self, name: &str) -> Result<&[u8], TagAccessError>;
    fn get_byte_array_mut(&mut self, name: &str) -> Result<&mut Vec<u8>, TagAccessError>;
    fn get_i32_array(&self, name: &str) -> Result<&[i32], TagAccessError>;
    fn get_i64_array(&self, name: &str) -> Result<&[i64], TagAccessError>;
    fn get_compound_tag(&self, name: &str) -> Result<&Compound, TagAccessError>;
    fn get_compound_tag_mut(&mut self, name: &str) -> Result<&mut Compound, TagAccessError>;
    fn get_list(&self, name: &str) -> Result<&[Tag], TagAccessError>;
    fn get_list_mut(&mut self, name: &str) -> Result<&mut Vec<Tag>, TagAccessError>;

    fn insert_i8(&mut self, name: &str, value: i8);
    fn insert_i16(&mut self, name: &str, value: i16);
    fn insert_i32(&mut self, name: &str, value: i32);
    fn insert_i64(&mut self, name: &str, value: i64);
    fn insert_f32(&mut self, name: &str, value: f32);
    fn insert_f64(&mut self, name: &str, value: f64);
    fn insert_bool(&mut self, name: &str, value: bool);
    fn insert_str(&mut self, name: &str, value: impl Into<String>);
    fn insert_byte_array(&mut self, name: &str, value: Vec<u8>);
    fn insert_i32_array(&mut self, name: &str, value: Vec<i32>);
    fn insert_i64_array(&mut self, name: &str, value: Vec<i64>);
    fn insert_compound_tag(&mut self, name: &str, value: Compound);
    fn insert_list(&mut self, name: &str, element: TagId, value: Vec<Tag>);
}

macro_rules! scalar_getter {
    ($fn_name:ident, $variant:ident, $ty:ty, $tag_id:expr) => {
        fn $fn_name(&self, name: &str) -> Result<$ty, TagAccessError> {
            match self.get(name) {
                Some(Tag::$variant(v)) => Ok(*v),
                Some(other) => Err(wrong_type(name, $tag_id, other.wire_id())),
                None => Err(missing(name)),
            }
        }
    };
}

macro_rules! scalar_setter {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        fn $fn_name(&mut self, name: &str, value: $ty) {
            self.insert(name.to_owned(), Tag::$variant(value));
        }
    };
}

impl CompoundExt for Compound {
    scalar_getter!(get_i8, Byte, i8, TagId::Byte);
    scalar_getter!(get_i16, Short, i16, TagId::Short);
    scalar_getter!(get_i32, Int, i32, TagId::Int);
    scalar_getter!(get_i64, Long, i64, TagId::Long);
    scalar_getter!(get_f32, Float, f32, TagId::Float);
    scalar_getter!(get_f64, Double, f64, TagId::Double);
    scalar_getter!(get_bool, Boolean, bool, TagId::String);

    fn get_str(&self, name: &str) -> Result<&str, TagAccessError> {
        match self.get(name) {
            Some(Tag::String(v)) => Ok(v.as_str()),
            Some(other) => Err(wrong_type(name, TagId::String, other.wire_id())),
            None => Err(missing(name)),
        }
    }

    fn get_byte_array(&self, name: &str) -> Result<&[u8], TagAccessError> {
        match self.get(name) {
            Some(Tag::ByteArray(v)) => Ok(v.as_slice()),
            Some(other) => Err(wrong_type(name, TagId::ByteArray, other.wire_id())),
            None => Err(missing(name)),
        }
    }

    fn get_byte_array_mut(&mut self, name: &str) -> Result<&mut Vec<u8>, TagAccessError> {
        match self.get_mut(name) {
            Some(Tag::ByteArray(v)) => Ok(v),
            Some(other) => Err(wrong_type(name, TagId::ByteArray, other.wire_id())),
            None => Err(missing(name)),
        }
    }

    fn get_i32_array(&self, name: &str) -> Result<&[i32], TagAccessError> {
        match self.get(name) {
            Some(Tag::IntArray(v)) => Ok(v.as_slice()),
            Some(other) => Err(wrong_type(name, TagId::IntArray, other.wire_id())),
            None => Err(missing(name)),
        }
    }

    fn get_i64_array(&self, name: &str) -> Result<&[i64], TagAccessError> {
        match self.get(name) {
            Some(Tag::LongArray(v)) => Ok(v.as_slice()),
            Some(other) => Err(wrong_type(name, TagId::LongArray, other.wire_id())),
            None => Err(missing(name)),
        }
    }

    fn get_compound_tag(&self, name: &str) -> Result<&Compound, TagAccessError> {
        match self.get(name) {
            Some(Tag::Compound(v)) => Ok(v),
            Some(other) => Err(wrong_type(name, TagId::Compound, other.wire_id())),
            None => Err(missing(name)),
        }
    }

    fn get_compound_tag_mut(&mut self, name: &str) -> Result<&mut Compound, TagAccessError> {
        match self.get_mut(name) {
            Some(Tag::Compound(v)) => Ok(v),
            Some(other) => Err(wrong_type(name, TagId::Compound, other.wire_id())),
            None => Err(missing(name)),
        }
    }

    fn get_list(&self, name: &str) -> Result<&[Tag], TagAccessError> {
        match self.get(name) {
            Some(Tag::List(_, v)) => Ok(v.as_slice()),
            Some(other) => Err(wrong_type(name, TagId::List, other.wire_id())),
            None => Err(missing(name)),
        }
    }

    fn get_list_mut(&mut self, name: &str) -> Result<&mut Vec<Tag>, TagAccessError> {
        match self.get_mut(name) {
            Some(Tag::List(_, v)) => Ok(v),
            Some(other) => Err(wrong_type(name, TagId::List, other.wire_id())),
            None => Err(missing(name)),
        }
    }

    scalar_setter!(insert_i8, Byte, i8);
    scalar_setter!(insert_i16, Short, i16);
    scalar_setter!(insert_i32, Int, i32);
    scalar_setter!(insert_i64, Long, i64);
    scalar_setter!(insert_f32, Float, f32);
    scalar_setter!(insert_f64, Double, f64);
    scalar_setter!(insert_bool, Boolean, bool);

    fn insert_str(&mut self, name: &str, value: impl Into<String>) {
        self.insert(name.to_owned(), Tag::String(value.into()));
    }

    fn insert_byte_array(&mut self, name: &str, value: Vec<u8>) {
        self.insert(name.to_owned(), Tag::ByteArray(value));
    }

    fn insert_i32_array(&mut self, name: &str, value: Vec<i32>) {
        self.insert(name.to_owned(), Tag::IntArray(value));
    }

    fn insert_i64_array(&mut self, name: &str, value: Vec<i64>) {
        self.insert(name.to_owned(), Tag::LongArray(value));
    }

    fn insert_compound_tag(&mut self, name: &str, value: Compound) {
        self.insert(name.to_owned(), Tag::Compound(value));
    }

    fn insert_list(&mut self, name: &str, element: TagId, value: Vec<Tag>) {
        self.insert(name.to_owned(), Tag::List(element, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip_through_accessors() {
        let mut c = Compound::new();
        c.insert_i32("xPos", 31);
        c.insert_bool("raining", true);
        c.insert_str("LevelName", "World");

        assert_eq!(c.get_i32("xPos").unwrap(), 31);
        assert!(c.get_bool("raining").unwrap());
        assert_eq!(c.get_str("LevelName").unwrap(), "World");
    }

    #[test]
    fn missing_key_is_an_error_not_a_panic() {
        let c = Compound::new();
        assert!(matches!(
            c.get_i32("xPos"),
            Err(TagAccessError::Missing { .. })
        ));
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut c = Compound::new();
        c.insert_i32("xPos", 1);
        assert!(matches!(
            c.get_str("xPos"),
            Err(TagAccessError::WrongType { .. })
        ));
    }
}
