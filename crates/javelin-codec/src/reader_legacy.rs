//! Reader for the flat container (versions 1 through 3).
//!
//! These files carry class names, flags, hierarchy edges, and annotation
//! instances, nothing else. Members come back empty, nesting comes back
//! top-level, and type-use targets point at a void placeholder because the
//! format never stored type trees.

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use byteorder::{BigEndian, ReadBytesExt};
use javelin_core::{
    AnnotationInstance, AnnotationTarget, AnnotationValue, ClassInfo, DotName, EnclosingTarget,
    FieldRef, Index, MethodRef, NestingInfo, RecordComponentRef, Type, TypeUseTarget, Value,
};

use crate::error::{Error, Result};
use crate::packed::read_packed_u32;
use crate::reader::build_index;
use crate::reader_current::{read_len, read_pooled_string, read_u16, read_usage};
use crate::tags;

pub(crate) fn read_index<R: Read>(input: &mut R) -> Result<Index> {
    let mut state = ReadState::default();
    state.read_names(input)?;

    let string_count = read_len(input)?;
    state.strings.reserve(string_count);
    for _ in 0..string_count {
        state.strings.push(read_pooled_string(input)?);
    }

    let class_count = read_len(input)?;
    let mut classes = Vec::with_capacity(class_count);
    for _ in 0..class_count {
        classes.push(Arc::new(state.read_class(input)?));
    }
    Ok(build_index(classes))
}

#[derive(Default)]
struct ReadState {
    names: Vec<DotName>,
    strings: Vec<Arc<str>>,
}

impl ReadState {
    /// Rows are sorted with every prefix present, so a row's prefix is the
    /// most recent row one level up the stack.
    fn read_names<R: Read>(&mut self, input: &mut R) -> Result<()> {
        let count = read_len(input)?;
        self.names.reserve(count);
        let mut stack: Vec<DotName> = Vec::new();
        for _ in 0..count {
            let encoded = read_packed_u32(input)?;
            let depth = (encoded >> 1) as usize;
            let inner = encoded & 1 == 1;
            let local = read_pooled_string(input)?;
            if depth > stack.len() {
                return Err(Error::Corrupt("name row out of order"));
            }
            let prefix = if depth == 0 { None } else { stack.get(depth - 1) };
            let name = DotName::component(prefix, &*local, inner);
            stack.truncate(depth);
            stack.push(name.clone());
            self.names.push(name);
        }
        Ok(())
    }

    fn name(&self, pos: u32) -> Result<DotName> {
        if pos == 0 {
            return Err(Error::Corrupt("null name reference"));
        }
        self.names
            .get(pos as usize - 1)
            .cloned()
            .ok_or(Error::Corrupt("name reference out of range"))
    }

    fn opt_name(&self, pos: u32) -> Result<Option<DotName>> {
        if pos == 0 {
            Ok(None)
        } else {
            self.name(pos).map(Some)
        }
    }

    fn string(&self, pos: u32) -> Result<Arc<str>> {
        if pos == 0 {
            return Err(Error::Corrupt("null string reference"));
        }
        self.strings
            .get(pos as usize - 1)
            .cloned()
            .ok_or(Error::Corrupt("string reference out of range"))
    }

    fn read_class<R: Read>(&self, input: &mut R) -> Result<ClassInfo> {
        let name = self.name(read_packed_u32(input)?)?;
        let flags = read_u16(input)?;
        let super_type = self
            .opt_name(read_packed_u32(input)?)?
            .map(|n| Arc::new(Type::class(n)));
        let interface_count = read_len(input)?;
        let mut interface_types = Vec::with_capacity(interface_count);
        for _ in 0..interface_count {
            let interface = self.name(read_packed_u32(input)?)?;
            interface_types.push(Arc::new(Type::class(interface)));
        }

        let instance_count = read_len(input)?;
        let mut annotations: BTreeMap<DotName, Vec<AnnotationInstance>> = BTreeMap::new();
        for _ in 0..instance_count {
            let instance = self.read_annotation(input)?;
            annotations
                .entry(instance.name.clone())
                .or_default()
                .push(instance);
        }

        Ok(ClassInfo {
            name,
            flags,
            super_type,
            interface_types,
            type_parameters: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            record_components: Vec::new(),
            annotations,
            nesting: NestingInfo::default(),
            has_no_args_constructor: false,
        })
    }

    fn read_annotation<R: Read>(&self, input: &mut R) -> Result<AnnotationInstance> {
        let name = self.name(read_packed_u32(input)?)?;
        let target = self.read_target(input)?;
        let value_count = read_len(input)?;
        let mut values = Vec::with_capacity(value_count);
        for _ in 0..value_count {
            let value_name = self.string(read_packed_u32(input)?)?;
            let value = self.read_value(input)?;
            values.push(AnnotationValue::new(value_name, value));
        }
        Ok(AnnotationInstance::new(name, target, values))
    }

    fn read_target<R: Read>(&self, input: &mut R) -> Result<Option<AnnotationTarget>> {
        let target = match input.read_u8()? {
            tags::TARGET_NONE => return Ok(None),
            tags::TARGET_CLASS => AnnotationTarget::Class(self.name(read_packed_u32(input)?)?),
            tags::TARGET_FIELD => AnnotationTarget::Field(FieldRef {
                class: self.name(read_packed_u32(input)?)?,
                name: self.string(read_packed_u32(input)?)?,
            }),
            tags::TARGET_METHOD => AnnotationTarget::Method(self.read_method_ref(input)?),
            tags::TARGET_METHOD_PARAMETER => {
                let method = self.read_method_ref(input)?;
                let position = input.read_u8()?;
                AnnotationTarget::MethodParameter { method, position }
            }
            tags::TARGET_RECORD_COMPONENT => {
                AnnotationTarget::RecordComponent(RecordComponentRef {
                    class: self.name(read_packed_u32(input)?)?,
                    name: self.string(read_packed_u32(input)?)?,
                })
            }
            tags::TARGET_TYPE_USE => {
                let enclosing = match input.read_u8()? {
                    tags::ENCLOSING_CLASS => {
                        EnclosingTarget::Class(self.name(read_packed_u32(input)?)?)
                    }
                    tags::ENCLOSING_FIELD => EnclosingTarget::Field(FieldRef {
                        class: self.name(read_packed_u32(input)?)?,
                        name: self.string(read_packed_u32(input)?)?,
                    }),
                    tags::ENCLOSING_METHOD => {
                        EnclosingTarget::Method(self.read_method_ref(input)?)
                    }
                    tags::ENCLOSING_RECORD_COMPONENT => {
                        EnclosingTarget::RecordComponent(RecordComponentRef {
                            class: self.name(read_packed_u32(input)?)?,
                            name: self.string(read_packed_u32(input)?)?,
                        })
                    }
                    _ => return Err(Error::Corrupt("unknown enclosing target kind")),
                };
                let usage = read_usage(input)?;
                // The annotated node was never stored.
                AnnotationTarget::TypeUse(TypeUseTarget {
                    enclosing,
                    ty: Arc::new(Type::void()),
                    usage,
                })
            }
            _ => return Err(Error::Corrupt("unknown annotation target kind")),
        };
        Ok(Some(target))
    }

    fn read_method_ref<R: Read>(&self, input: &mut R) -> Result<MethodRef> {
        Ok(MethodRef {
            class: self.name(read_packed_u32(input)?)?,
            name: self.string(read_packed_u32(input)?)?,
            position: read_u16(input)?,
        })
    }

    fn read_value<R: Read>(&self, input: &mut R) -> Result<Value> {
        let value = match input.read_u8()? {
            tags::VALUE_BYTE => Value::Byte(input.read_i8()?),
            tags::VALUE_CHAR => Value::Char(input.read_u16::<BigEndian>()?),
            tags::VALUE_SHORT => Value::Short(input.read_i16::<BigEndian>()?),
            tags::VALUE_INT => Value::Int(input.read_i32::<BigEndian>()?),
            tags::VALUE_LONG => Value::Long(input.read_i64::<BigEndian>()?),
            tags::VALUE_FLOAT => Value::Float(f32::from_bits(input.read_u32::<BigEndian>()?)),
            tags::VALUE_DOUBLE => Value::Double(f64::from_bits(input.read_u64::<BigEndian>()?)),
            tags::VALUE_BOOLEAN => Value::Boolean(input.read_u8()? != 0),
            tags::VALUE_STRING => Value::String(self.string(read_packed_u32(input)?)?),
            tags::VALUE_ENUM => Value::Enum {
                type_name: self.name(read_packed_u32(input)?)?,
                constant: self.string(read_packed_u32(input)?)?,
            },
            tags::VALUE_CLASS => {
                // Stored erased; only the name survives.
                let name = self.name(read_packed_u32(input)?)?;
                Value::Class(Arc::new(Type::class(name)))
            }
            tags::VALUE_NESTED => Value::Nested(Arc::new(self.read_annotation(input)?)),
            tags::VALUE_ARRAY => {
                let len = read_len(input)?;
                let mut elements = Vec::with_capacity(len);
                for _ in 0..len {
                    let name = self.string(read_packed_u32(input)?)?;
                    let value = self.read_value(input)?;
                    elements.push(AnnotationValue::new(name, value));
                }
                Value::Array(elements)
            }
            _ => return Err(Error::Corrupt("unknown annotation value kind")),
        };
        Ok(value)
    }
}
