//! Tag tree encoding. The schema-validated path (`encode_root`) is what
//! `Region`/`World` use: every compound entry's name must be recognized by
//! a [`crate::schema::Schema`] table, and its tag id must match, before a
//! single byte is written. `encode_root_unchecked` skips validation and
//! exists for the codec's own tests and for callers (like `World`'s
//! `level.dat` writer) that already trust the compound they built.

use crate::error::SchemaError;
use crate::nbt::value::{Compound, Tag, TagId};
use crate::schema::{Schema, SchemaEntry};

fn write_name(out: &mut Vec<u8>, name: &str) {
    out.extend_from_slice(&(name.len() as u16).to_be_bytes());
    out.extend_from_slice(name.as_bytes());
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Encodes a tag's payload, recursing into lists and compounds. `schema` is
/// threaded through so that nested compounds (chunk `Level`, section
/// entries, ...) are themselves schema-checked.
fn write_payload(out: &mut Vec<u8>, value: &Tag, schema: Option<&Schema>) -> Result<(), SchemaError> {
    match value {
        Tag::Byte(v) => out.push(*v as u8),
        Tag::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Float(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
        Tag::Double(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
        Tag::ByteArray(v) => {
            out.extend_from_slice(&(v.len() as i32).to_be_bytes());
            out.extend_from_slice(v);
        }
        Tag::String(s) => write_string(out, s),
        Tag::Boolean(b) => write_string(out, if *b { "true" } else { "false" }),
        Tag::IntArray(v) => {
            out.extend_from_slice(&(v.len() as i32).to_be_bytes());
            for i in v {
                out.extend_from_slice(&i.to_be_bytes());
            }
        }
        Tag::LongArray(v) => {
            out.extend_from_slice(&(v.len() as i32).to_be_bytes());
            for i in v {
                out.extend_from_slice(&i.to_be_bytes());
            }
        }
        Tag::List(elem, items) => {
            out.push(elem.as_u8());
            out.extend_from_slice(&(items.len() as i32).to_be_bytes());
            for item in items {
                write_payload(out, item, schema)?;
            }
        }
        Tag::Compound(c) => {
            write_compound_body(out, c, schema)?;
            out.push(0);
        }
    }
    Ok(())
}

/// Writes one `[type][name][payload]` entry for a compound key, applying
/// the `Entities`/`TileEntities`-style quirk: when the schema entry is
/// flagged `empty_list_as_byte_array` and the value is an empty list (or
/// already an empty byte array, as a freshly-decoded document would carry
/// it), a zero-length `TAG_Byte_Array` is emitted in place of a `TAG_List`
/// header. See `DESIGN.md`.
fn write_entry(
    out: &mut Vec<u8>,
    entry: &SchemaEntry,
    value: &Tag,
    schema: &Schema,
) -> Result<(), SchemaError> {
    let emits_as_empty_byte_array = entry.empty_list_as_byte_array
        && matches!(value, Tag::List(_, items) if items.is_empty())
        || entry.empty_list_as_byte_array
            && matches!(value, Tag::ByteArray(items) if items.is_empty());

    if emits_as_empty_byte_array {
        out.push(TagId::ByteArray.as_u8());
        write_name(out, entry.name);
        out.extend_from_slice(&0i32.to_be_bytes());
        return Ok(());
    }

    if value.wire_id() != entry.id {
        return Err(SchemaError::BadType {
            name: entry.name.to_owned(),
            expected: entry.id,
            actual: value.wire_id(),
        });
    }

    out.push(entry.id.as_u8());
    write_name(out, entry.name);
    write_payload(out, value, Some(schema)).map_err(|e| e)?;
    Ok(())
}

fn write_compound_body(
    out: &mut Vec<u8>,
    compound: &Compound,
    schema: Option<&Schema>,
) -> Result<(), SchemaError> {
    match schema {
        Some(schema) => {
            for (name, value) in compound {
                let entry = schema
                    .lookup(name)
                    .ok_or_else(|| SchemaError::UnknownKey { name: name.clone() })?;
                write_entry(out, entry, value, schema)?;
            }
        }
        None => {
            for (name, value) in compound {
                out.push(value.wire_id().as_u8());
                write_name(out, name);
                write_payload(out, value, None)?;
            }
        }
    }
    Ok(())
}

/// Encodes `compound` as a root tag tree, validating every entry (at every
/// nesting depth) against `schema`. Matches §4.2's encode algorithm: root
/// envelope `[TAG_Compound][name_len=0][]`, then the compound body, then a
/// single `TAG_End` byte.
pub fn encode_root(compound: &Compound, schema: &Schema) -> Result<Vec<u8>, SchemaError> {
    let mut out = Vec::new();
    out.push(TagId::Compound.as_u8());
    out.extend_from_slice(&0u16.to_be_bytes());
    write_compound_body(&mut out, compound, Some(schema))?;
    out.push(0);
    Ok(out)
}

/// Encodes `compound` without schema validation. Used by the codec's own
/// round-trip tests and by callers that already trust their tree shape.
pub fn encode_root_unchecked(compound: &Compound) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(TagId::Compound.as_u8());
    out.extend_from_slice(&0u16.to_be_bytes());
    // `write_compound_body` only returns `Err` when a schema is supplied.
    write_compound_body(&mut out, compound, None).expect("unchecked encode never validates");
    out.push(0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::decode::decode_root;
    use crate::nbt::value::CompoundExt;
    use crate::schema::leveldat_schema;

    #[test]
    fn unchecked_round_trip_preserves_values() {
        let mut c = Compound::new();
        c.insert_i32("xPos", -5);
        c.insert_str("LevelName", "hello");
        c.insert_list(
            "Sections",
            TagId::Compound,
            vec![Tag::Compound(Compound::new())],
        );

        let bytes = encode_root_unchecked(&c);
        let decoded = decode_root(&bytes).unwrap();
        assert_eq!(decoded, c);
    }

    #[test]
    fn schema_rejects_unknown_key() {
        let mut c = Compound::new();
        c.insert_i32("NotARealKey", 1);
        let schema = leveldat_schema();
        let err = encode_root(&c, &schema).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownKey { .. }));
    }

    #[test]
    fn schema_rejects_wrong_type_for_known_key() {
        let mut c = Compound::new();
        c.insert_str("RandomSeed", "not a long");
        let schema = leveldat_schema();
        let err = encode_root(&c, &schema).unwrap_err();
        assert!(matches!(err, SchemaError::BadType { .. }));
    }

    #[test]
    fn empty_entity_lists_encode_as_zero_length_byte_arrays() {
        use crate::schema::chunk_schema;

        let chunk_schema = chunk_schema();
        let mut level = Compound::new();
        level.insert_i32("xPos", 0);
        level.insert_i32("zPos", 0);
        level.insert_list("Entities", TagId::Compound, vec![]);
        level.insert_list("TileEntities", TagId::Compound, vec![]);
        level.insert_list("Sections", TagId::Compound, vec![]);

        let bytes = encode_root(&level, &chunk_schema).unwrap();
        let decoded = decode_root(&bytes).unwrap();
        assert_eq!(decoded.get("Entities"), Some(&Tag::ByteArray(vec![])));
        assert_eq!(decoded.get("TileEntities"), Some(&Tag::ByteArray(vec![])));
        assert_eq!(decoded.get("Sections"), Some(&Tag::List(TagId::Compound, vec![])));
    }
}
