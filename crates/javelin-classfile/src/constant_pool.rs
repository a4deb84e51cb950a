use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::reader::Reader;

pub(crate) const CONSTANT_UTF8: u8 = 1;
pub(crate) const CONSTANT_INTEGER: u8 = 3;
pub(crate) const CONSTANT_FLOAT: u8 = 4;
pub(crate) const CONSTANT_LONG: u8 = 5;
pub(crate) const CONSTANT_DOUBLE: u8 = 6;
pub(crate) const CONSTANT_CLASS: u8 = 7;
pub(crate) const CONSTANT_STRING: u8 = 8;
pub(crate) const CONSTANT_FIELDREF: u8 = 9;
pub(crate) const CONSTANT_METHODREF: u8 = 10;
pub(crate) const CONSTANT_INTERFACE_METHODREF: u8 = 11;
pub(crate) const CONSTANT_NAME_AND_TYPE: u8 = 12;
pub(crate) const CONSTANT_METHOD_HANDLE: u8 = 15;
pub(crate) const CONSTANT_METHOD_TYPE: u8 = 16;
pub(crate) const CONSTANT_INVOKE_DYNAMIC: u8 = 18;

/// Attributes the indexer understands. Utf8 pool entries are classified once
/// at pool-parse time so attribute dispatch is a table lookup instead of a
/// string comparison per attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttributeKind {
    RuntimeVisibleAnnotations,
    RuntimeVisibleParameterAnnotations,
    RuntimeVisibleTypeAnnotations,
    Signature,
    Exceptions,
    InnerClasses,
    EnclosingMethod,
    MethodParameters,
    AnnotationDefault,
    Record,
    Unknown,
}

impl AttributeKind {
    fn classify(bytes: &[u8]) -> AttributeKind {
        match bytes {
            b"RuntimeVisibleAnnotations" => AttributeKind::RuntimeVisibleAnnotations,
            b"RuntimeVisibleParameterAnnotations" => {
                AttributeKind::RuntimeVisibleParameterAnnotations
            }
            b"RuntimeVisibleTypeAnnotations" => AttributeKind::RuntimeVisibleTypeAnnotations,
            b"Signature" => AttributeKind::Signature,
            b"Exceptions" => AttributeKind::Exceptions,
            b"InnerClasses" => AttributeKind::InnerClasses,
            b"EnclosingMethod" => AttributeKind::EnclosingMethod,
            b"MethodParameters" => AttributeKind::MethodParameters,
            b"AnnotationDefault" => AttributeKind::AnnotationDefault,
            b"Record" => AttributeKind::Record,
            _ => AttributeKind::Unknown,
        }
    }
}

/// The constant pool, re-packed into one contiguous payload buffer with
/// per-entry tag and offset tables. Entry 0 is unused, per the format; the
/// upper halves of long and double entries get tag 0.
#[derive(Debug)]
pub(crate) struct ConstantPool {
    tags: Vec<u8>,
    offsets: Vec<u32>,
    attr_kinds: Vec<AttributeKind>,
    buf: Vec<u8>,
}

impl ConstantPool {
    pub(crate) fn parse(r: &mut Reader<'_>) -> Result<ConstantPool> {
        let count = r.read_u2()? as usize;
        let mut pool = ConstantPool {
            tags: Vec::with_capacity(count),
            offsets: Vec::with_capacity(count),
            attr_kinds: Vec::with_capacity(count),
            buf: Vec::new(),
        };
        pool.push_slot(0, 0, AttributeKind::Unknown);

        let mut index = 1usize;
        while index < count {
            let tag = r.read_u1()?;
            let offset = pool.buf.len() as u32;
            let mut attr_kind = AttributeKind::Unknown;
            let mut extra_slot = false;
            match tag {
                CONSTANT_UTF8 => {
                    let len = r.read_u2()?;
                    let bytes = r.read_bytes(len as usize)?;
                    pool.buf.extend_from_slice(&len.to_be_bytes());
                    pool.buf.extend_from_slice(bytes);
                    attr_kind = AttributeKind::classify(bytes);
                }
                CONSTANT_CLASS | CONSTANT_STRING | CONSTANT_METHOD_TYPE => {
                    pool.buf.extend_from_slice(r.read_bytes(2)?);
                }
                CONSTANT_METHOD_HANDLE => {
                    pool.buf.extend_from_slice(r.read_bytes(3)?);
                }
                CONSTANT_INTEGER
                | CONSTANT_FLOAT
                | CONSTANT_FIELDREF
                | CONSTANT_METHODREF
                | CONSTANT_INTERFACE_METHODREF
                | CONSTANT_NAME_AND_TYPE
                | CONSTANT_INVOKE_DYNAMIC => {
                    pool.buf.extend_from_slice(r.read_bytes(4)?);
                }
                CONSTANT_LONG | CONSTANT_DOUBLE => {
                    pool.buf.extend_from_slice(r.read_bytes(8)?);
                    extra_slot = true;
                }
                _ => {
                    return Err(Error::InvalidConstantPoolTag {
                        tag,
                        index: index as u16,
                    })
                }
            }
            pool.push_slot(tag, offset, attr_kind);
            index += 1;
            if extra_slot {
                // Longs and doubles occupy two pool slots.
                pool.push_slot(0, offset, AttributeKind::Unknown);
                index += 1;
            }
        }
        Ok(pool)
    }

    fn push_slot(&mut self, tag: u8, offset: u32, attr_kind: AttributeKind) {
        self.tags.push(tag);
        self.offsets.push(offset);
        self.attr_kinds.push(attr_kind);
    }

    fn slot(&self, index: u16, expected_tag: u8, expected: &'static str) -> Result<usize> {
        match self.tags.get(index as usize) {
            None => Err(Error::BadConstantPoolIndex(index)),
            Some(&tag) if tag != expected_tag => {
                Err(Error::ConstantPoolTypeMismatch { index, expected })
            }
            Some(_) => Ok(self.offsets[index as usize] as usize),
        }
    }

    pub(crate) fn attribute_kind(&self, name_index: u16) -> AttributeKind {
        self.attr_kinds
            .get(name_index as usize)
            .copied()
            .unwrap_or(AttributeKind::Unknown)
    }

    pub(crate) fn utf8_bytes(&self, index: u16) -> Result<&[u8]> {
        let offset = self.slot(index, CONSTANT_UTF8, "Utf8")?;
        let len = u16::from_be_bytes([self.buf[offset], self.buf[offset + 1]]) as usize;
        Ok(&self.buf[offset + 2..offset + 2 + len])
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<Cow<'_, str>> {
        decode_modified_utf8(self.utf8_bytes(index)?)
    }

    /// The internal (slash-delimited) name of a Class entry.
    pub(crate) fn class_name(&self, index: u16) -> Result<Cow<'_, str>> {
        let offset = self.slot(index, CONSTANT_CLASS, "Class")?;
        let name_index = u16::from_be_bytes([self.buf[offset], self.buf[offset + 1]]);
        self.utf8(name_index)
    }

    pub(crate) fn integer(&self, index: u16) -> Result<i32> {
        let offset = self.slot(index, CONSTANT_INTEGER, "Integer")?;
        Ok(self.u4_at(offset) as i32)
    }

    pub(crate) fn long(&self, index: u16) -> Result<i64> {
        let offset = self.slot(index, CONSTANT_LONG, "Long")?;
        Ok(((self.u4_at(offset) as u64) << 32 | self.u4_at(offset + 4) as u64) as i64)
    }

    pub(crate) fn float(&self, index: u16) -> Result<f32> {
        let offset = self.slot(index, CONSTANT_FLOAT, "Float")?;
        Ok(f32::from_bits(self.u4_at(offset)))
    }

    pub(crate) fn double(&self, index: u16) -> Result<f64> {
        let offset = self.slot(index, CONSTANT_DOUBLE, "Double")?;
        Ok(f64::from_bits(
            (self.u4_at(offset) as u64) << 32 | self.u4_at(offset + 4) as u64,
        ))
    }

    fn u4_at(&self, offset: usize) -> u32 {
        u32::from_be_bytes([
            self.buf[offset],
            self.buf[offset + 1],
            self.buf[offset + 2],
            self.buf[offset + 3],
        ])
    }

    /// Name and descriptor indices of a NameAndType entry.
    pub(crate) fn name_and_type(&self, index: u16) -> Result<(u16, u16)> {
        let offset = self.slot(index, CONSTANT_NAME_AND_TYPE, "NameAndType")?;
        let name = u16::from_be_bytes([self.buf[offset], self.buf[offset + 1]]);
        let descriptor = u16::from_be_bytes([self.buf[offset + 2], self.buf[offset + 3]]);
        Ok((name, descriptor))
    }
}

/// Decodes the JVM's modified UTF-8: no NUL byte (NUL is encoded as
/// `C0 80`), no four-byte sequences, and supplementary characters appear as
/// CESU-8 surrogate pairs. ASCII-only constants borrow from the pool buffer.
pub(crate) fn decode_modified_utf8(bytes: &[u8]) -> Result<Cow<'_, str>> {
    if bytes.iter().all(|&b| b != 0 && b < 0x80) {
        // Safe: all bytes are 0x01..=0x7F.
        return Ok(Cow::Borrowed(
            std::str::from_utf8(bytes).map_err(|_| Error::InvalidModifiedUtf8)?,
        ));
    }

    let mut out = String::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        let unit = decode_unit(bytes, &mut i)?;
        let c = if (0xD800..0xDC00).contains(&unit) {
            // High surrogate; a low surrogate must follow.
            let low = decode_unit(bytes, &mut i)?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(Error::InvalidModifiedUtf8);
            }
            let combined = 0x10000 + (((unit - 0xD800) << 10) | (low - 0xDC00));
            char::from_u32(combined).ok_or(Error::InvalidModifiedUtf8)?
        } else if (0xDC00..0xE000).contains(&unit) {
            return Err(Error::InvalidModifiedUtf8);
        } else {
            char::from_u32(unit).ok_or(Error::InvalidModifiedUtf8)?
        };
        out.push(c);
    }
    Ok(Cow::Owned(out))
}

/// Decodes one UTF-16 code unit (1-3 bytes), advancing the position.
fn decode_unit(bytes: &[u8], i: &mut usize) -> Result<u32> {
    let b0 = *bytes.get(*i).ok_or(Error::InvalidModifiedUtf8)?;
    if b0 == 0 {
        return Err(Error::InvalidModifiedUtf8);
    }
    if b0 < 0x80 {
        *i += 1;
        return Ok(b0 as u32);
    }
    let cont = |offset: usize| -> Result<u32> {
        let b = *bytes.get(*i + offset).ok_or(Error::InvalidModifiedUtf8)?;
        if b & 0xC0 != 0x80 {
            return Err(Error::InvalidModifiedUtf8);
        }
        Ok((b & 0x3F) as u32)
    };
    match b0 {
        0xC0..=0xDF => {
            let unit = ((b0 as u32 & 0x1F) << 6) | cont(1)?;
            *i += 2;
            Ok(unit)
        }
        0xE0..=0xEF => {
            let unit = ((b0 as u32 & 0x0F) << 12) | (cont(1)? << 6) | cont(2)?;
            *i += 3;
            Ok(unit)
        }
        _ => Err(Error::InvalidModifiedUtf8),
    }
}
