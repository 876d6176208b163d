//! Tag tree decoding. Mirrors the reference implementation's `get_tag`:
//! walk a byte buffer, switching on the wire type id, recursing into lists
//! and compounds, and reporting precisely how far a truncated buffer got.

use crate::error::NbtDecodeError;
use crate::nbt::value::{Compound, Tag, TagId};

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn need(&self, n: usize) -> Result<(), NbtDecodeError> {
        if self.pos + n > self.buf.len() {
            Err(NbtDecodeError::Truncated {
                offset: self.pos,
                needed: n,
                available: self.buf.len().saturating_sub(self.pos),
            })
        } else {
            Ok(())
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], NbtDecodeError> {
        self.need(n)?;
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, NbtDecodeError> {
        Ok(self.take(1)?[0])
    }

    fn read_i8(&mut self) -> Result<i8, NbtDecodeError> {
        Ok(self.read_u8()? as i8)
    }

    fn read_u16(&mut self) -> Result<u16, NbtDecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_i16(&mut self) -> Result<i16, NbtDecodeError> {
        Ok(self.read_u16()? as i16)
    }

    fn read_u32(&mut self) -> Result<u32, NbtDecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_i32(&mut self) -> Result<i32, NbtDecodeError> {
        Ok(self.read_u32()? as i32)
    }

    fn read_u64(&mut self) -> Result<u64, NbtDecodeError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_be_bytes(arr))
    }

    fn read_i64(&mut self) -> Result<i64, NbtDecodeError> {
        Ok(self.read_u64()? as i64)
    }

    fn read_f32(&mut self) -> Result<f32, NbtDecodeError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    fn read_f64(&mut self) -> Result<f64, NbtDecodeError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    fn read_utf8(&mut self, len: usize) -> Result<String, NbtDecodeError> {
        let offset = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| NbtDecodeError::InvalidUtf8 { offset })
    }

    /// Reads a `[name_len:u16][name:utf8]` pair, as found before every named
    /// tag's payload.
    fn read_name(&mut self) -> Result<String, NbtDecodeError> {
        let len = self.read_u16()? as usize;
        self.read_utf8(len)
    }

    /// Reads the payload for a tag whose type id has already been consumed.
    fn read_payload(&mut self, id: u8) -> Result<Tag, NbtDecodeError> {
        match id {
            1 => Ok(Tag::Byte(self.read_i8()?)),
            2 => Ok(Tag::Short(self.read_i16()?)),
            3 => Ok(Tag::Int(self.read_i32()?)),
            4 => Ok(Tag::Long(self.read_i64()?)),
            5 => Ok(Tag::Float(self.read_f32()?)),
            6 => Ok(Tag::Double(self.read_f64()?)),
            7 => {
                let len = self.read_i32()?.max(0) as usize;
                Ok(Tag::ByteArray(self.take(len)?.to_vec()))
            }
            8 => {
                let len = self.read_u16()? as usize;
                let s = self.read_utf8(len)?;
                Ok(surface_boolean(s))
            }
            9 => {
                let elem_id = self.read_u8()?;
                let len = self.read_i32()?.max(0) as usize;
                let mut items = Vec::with_capacity(len.min(1 << 16));
                for _ in 0..len {
                    items.push(self.read_payload(elem_id)?);
                }
                let elem = if len == 0 {
                    // An empty list still names an element type on the
                    // wire; fall back to Byte (TAG_End-adjacent) only if
                    // that id is itself unrecognized, so an empty list
                    // never fails to decode.
                    TagId::from_u8(elem_id).unwrap_or(TagId::Byte)
                } else {
                    TagId::from_u8(elem_id).ok_or(NbtDecodeError::UnknownTagId {
                        id: elem_id,
                        offset: self.pos,
                    })?
                };
                Ok(Tag::List(elem, items))
            }
            10 => {
                let mut compound = Compound::new();
                loop {
                    let sub_id = self.read_u8()?;
                    if sub_id == 0 {
                        break;
                    }
                    let name_offset = self.pos;
                    let name = self.read_name()?;
                    if name.is_empty() {
                        return Err(NbtDecodeError::ZeroLengthName { offset: name_offset });
                    }
                    let value = self.read_payload(sub_id)?;
                    compound.insert(name, value);
                }
                Ok(Tag::Compound(compound))
            }
            11 => {
                let len = self.read_i32()?.max(0) as usize;
                let mut items = Vec::with_capacity(len.min(1 << 16));
                for _ in 0..len {
                    items.push(self.read_i32()?);
                }
                Ok(Tag::IntArray(items))
            }
            12 => {
                let len = self.read_i32()?.max(0) as usize;
                let mut items = Vec::with_capacity(len.min(1 << 16));
                for _ in 0..len {
                    items.push(self.read_i64()?);
                }
                Ok(Tag::LongArray(items))
            }
            other => Err(NbtDecodeError::UnknownTagId {
                id: other,
                offset: self.pos.saturating_sub(1),
            }),
        }
    }
}

/// A string tag whose payload is exactly `"true"` or `"false"` decodes as a
/// logical boolean rather than a string (see `DESIGN.md`). Any other string,
/// including ones that merely contain those words, decodes unchanged.
fn surface_boolean(s: String) -> Tag {
    match s.as_str() {
        "true" => Tag::Boolean(true),
        "false" => Tag::Boolean(false),
        _ => Tag::String(s),
    }
}

/// Decodes a root tag tree: `[type][name_len][name][payload]`, per §4.2.
/// Returns the root compound (the name itself, normally empty, is
/// discarded — `level.dat` and chunk roots never use it).
pub fn decode_root(buf: &[u8]) -> Result<Compound, NbtDecodeError> {
    let mut reader = Reader::new(buf);
    let id = reader.read_u8()?;
    let _name = reader.read_name()?;
    match reader.read_payload(id)? {
        Tag::Compound(c) => Ok(c),
        other => {
            // A root that isn't a compound is still a legal tag stream by
            // the grammar in §4.2, but every document this crate reads is
            // rooted in a compound; report it the same way an unexpected
            // wire type anywhere else would be reported.
            Err(NbtDecodeError::UnknownTagId {
                id: other.wire_id().as_u8(),
                offset: 0,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::encode::encode_root_unchecked;

    #[test]
    fn decodes_a_flat_compound() {
        let mut c = Compound::new();
        c.insert("xPos".to_owned(), Tag::Int(31));
        c.insert("zPos".to_owned(), Tag::Int(16));

        let bytes = encode_root_unchecked(&c);
        let decoded = decode_root(&bytes).unwrap();

        assert_eq!(decoded.get("xPos"), Some(&Tag::Int(31)));
        assert_eq!(decoded.get("zPos"), Some(&Tag::Int(16)));
    }

    #[test]
    fn truncated_buffer_reports_offset() {
        let bytes = [10u8, 0, 0, 1]; // compound header + one byte of a Byte tag name length
        let err = decode_root(&bytes).unwrap_err();
        assert!(matches!(err, NbtDecodeError::Truncated { .. }));
    }

    #[test]
    fn unknown_tag_id_is_rejected() {
        let bytes = [10u8, 0, 0, 99, 0, 1, b'a', 0, 0];
        let err = decode_root(&bytes).unwrap_err();
        assert!(matches!(err, NbtDecodeError::UnknownTagId { id: 99, .. }));
    }

    #[test]
    fn exact_true_false_strings_surface_as_boolean() {
        let mut c = Compound::new();
        c.insert("mobGriefing".to_owned(), Tag::String("true".to_owned()));
        c.insert("notABool".to_owned(), Tag::String("truely".to_owned()));

        let bytes = encode_root_unchecked(&c);
        let decoded = decode_root(&bytes).unwrap();

        assert_eq!(decoded.get("mobGriefing"), Some(&Tag::Boolean(true)));
        assert_eq!(
            decoded.get("notABool"),
            Some(&Tag::String("truely".to_owned()))
        );
    }
}
