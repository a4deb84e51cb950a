//! Reader for the cross-referenced container (versions 6 through 9).
//!
//! Pools are rebuilt in the order the writer emitted them, so every
//! reference resolves to an entry that has already been read. Reference-or-
//! full entities (type lists and annotation instances) are appended to
//! their pool after their body, which keeps the position assignment in step
//! with the writer.

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use byteorder::{BigEndian, ReadBytesExt};
use javelin_core::{
    AnnotationInstance, AnnotationTarget, AnnotationValue, ArrayType, ClassInfo, ClassType,
    DotName, EnclosingMethod, EnclosingTarget, FieldInfo, FieldRef, Index, MethodInfo, MethodRef,
    NestingInfo, NestingKind, ParameterizedType, Primitive, PrimitiveType, RecordComponentInfo,
    RecordComponentRef, Type, TypeUsage, TypeUseTarget, TypeVariable, UnresolvedTypeVariable,
    Value, VoidType, WildcardType,
};

use crate::error::{Error, Result};
use crate::packed::read_packed_u32;
use crate::reader::build_index;
use crate::tags;

pub(crate) fn read_index<R: Read>(input: &mut R, version: u8) -> Result<Index> {
    let mut state = ReadState::new(version);

    // Map sizes are derivable; the counts are only capacity hints.
    let _annotation_names = read_len(input)?;
    let _implementor_entries = read_len(input)?;
    let _subclass_entries = read_len(input)?;

    state.bytes = read_string_pool(input)?;
    state.strings = read_string_pool(input)?;
    state.read_names(input)?;

    let type_count = read_len(input)?;
    let list_count = read_len(input)?;
    let annotation_count = read_len(input)?;
    state.types.reserve(type_count);
    state.lists.reserve(list_count);
    state.annotations.reserve(annotation_count);

    for _ in 0..type_count {
        let ty = state.read_type(input)?;
        state.types.push(ty);
    }

    let remaining_lists = read_len(input)?;
    for _ in 0..remaining_lists {
        state.read_list_body(input)?;
    }

    let method_count = read_len(input)?;
    for _ in 0..method_count {
        let method = state.read_method(input)?;
        state.methods.push(Arc::new(method));
    }
    let field_count = read_len(input)?;
    for _ in 0..field_count {
        let field = state.read_field(input)?;
        state.fields.push(Arc::new(field));
    }

    let class_count = read_len(input)?;
    let mut classes = Vec::with_capacity(class_count);
    for _ in 0..class_count {
        classes.push(Arc::new(state.read_class(input)?));
    }
    Ok(build_index(classes))
}

struct ReadState {
    version: u8,
    bytes: Vec<Arc<str>>,
    strings: Vec<Arc<str>>,
    names: Vec<DotName>,
    types: Vec<Arc<Type>>,
    lists: Vec<Vec<Arc<Type>>>,
    annotations: Vec<AnnotationInstance>,
    fields: Vec<Arc<FieldInfo>>,
    methods: Vec<Arc<MethodInfo>>,
}

impl ReadState {
    fn new(version: u8) -> ReadState {
        ReadState {
            version,
            bytes: Vec::new(),
            strings: Vec::new(),
            names: Vec::new(),
            types: Vec::new(),
            lists: Vec::new(),
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    // ----- pool lookups (positions are 1-based, 0 is null) -----

    fn byte_str(&self, pos: u32) -> Result<&Arc<str>> {
        lookup(&self.bytes, pos)
    }

    fn string(&self, pos: u32) -> Result<Arc<str>> {
        lookup(&self.strings, pos).cloned()
    }

    fn opt_string(&self, pos: u32) -> Result<Option<Arc<str>>> {
        if pos == 0 {
            Ok(None)
        } else {
            self.string(pos).map(Some)
        }
    }

    fn name(&self, pos: u32) -> Result<DotName> {
        lookup(&self.names, pos).cloned()
    }

    fn opt_name(&self, pos: u32) -> Result<Option<DotName>> {
        if pos == 0 {
            Ok(None)
        } else {
            self.name(pos).map(Some)
        }
    }

    fn ty(&self, pos: u32) -> Result<Arc<Type>> {
        lookup(&self.types, pos).cloned()
    }

    fn opt_ty(&self, pos: u32) -> Result<Option<Arc<Type>>> {
        if pos == 0 {
            Ok(None)
        } else {
            self.ty(pos).map(Some)
        }
    }

    // ----- sections -----

    fn read_names<R: Read>(&mut self, input: &mut R) -> Result<()> {
        let count = read_len(input)?;
        self.names.reserve(count);
        for _ in 0..count {
            let encoded = read_packed_u32(input)?;
            let prefix_pos = encoded >> 1;
            let inner = encoded & 1 == 1;
            let local_pos = read_packed_u32(input)?;
            let local = self.byte_str(local_pos)?.clone();
            let prefix = if prefix_pos == 0 {
                None
            } else {
                Some(lookup(&self.names, prefix_pos)?.clone())
            };
            self.names
                .push(DotName::component(prefix.as_ref(), &*local, inner));
        }
        Ok(())
    }

    fn read_type<R: Read>(&mut self, input: &mut R) -> Result<Arc<Type>> {
        let tag = input.read_u8()?;
        let ty = match tag {
            tags::TYPE_CLASS => {
                let name = self.name(read_packed_u32(input)?)?;
                let annotations = self.read_annotation_list(input)?;
                Type::Class(ClassType { name, annotations })
            }
            tags::TYPE_ARRAY => {
                let dimensions = u8::try_from(read_packed_u32(input)?)
                    .map_err(|_| Error::Corrupt("array dimensions out of range"))?;
                let component = self.ty(read_packed_u32(input)?)?;
                let annotations = self.read_annotation_list(input)?;
                Type::Array(ArrayType {
                    component,
                    dimensions,
                    annotations,
                })
            }
            tags::TYPE_PRIMITIVE => {
                let primitive = Primitive::from_index(input.read_u8()?)
                    .ok_or(Error::Corrupt("unknown primitive kind"))?;
                let annotations = self.read_annotation_list(input)?;
                Type::Primitive(PrimitiveType {
                    primitive,
                    annotations,
                })
            }
            tags::TYPE_VOID => {
                let annotations = self.read_annotation_list(input)?;
                Type::Void(VoidType { annotations })
            }
            tags::TYPE_VARIABLE => {
                let identifier = self.string(read_packed_u32(input)?)?;
                let bounds = self.read_list_ref(input)?;
                let annotations = self.read_annotation_list(input)?;
                Type::TypeVariable(TypeVariable {
                    identifier,
                    bounds,
                    annotations,
                })
            }
            tags::TYPE_UNRESOLVED_VARIABLE => {
                let identifier = self.string(read_packed_u32(input)?)?;
                let annotations = self.read_annotation_list(input)?;
                Type::UnresolvedTypeVariable(UnresolvedTypeVariable {
                    identifier,
                    annotations,
                })
            }
            tags::TYPE_WILDCARD => {
                let extends = input.read_u8()? != 0;
                let bound = self.opt_ty(read_packed_u32(input)?)?;
                let annotations = self.read_annotation_list(input)?;
                Type::Wildcard(WildcardType {
                    extends,
                    bound,
                    annotations,
                })
            }
            tags::TYPE_PARAMETERIZED => {
                let name = self.name(read_packed_u32(input)?)?;
                let owner = self.opt_ty(read_packed_u32(input)?)?;
                let arguments = self.read_list_ref(input)?;
                let annotations = self.read_annotation_list(input)?;
                Type::Parameterized(ParameterizedType {
                    name,
                    arguments,
                    owner,
                    annotations,
                })
            }
            _ => return Err(Error::Corrupt("unknown type kind")),
        };
        Ok(Arc::new(ty))
    }

    fn read_list_ref<R: Read>(&mut self, input: &mut R) -> Result<Vec<Arc<Type>>> {
        let pos = read_packed_u32(input)?;
        if pos > 0 {
            return lookup(&self.lists, pos).cloned();
        }
        self.read_list_body(input)
    }

    fn read_list_body<R: Read>(&mut self, input: &mut R) -> Result<Vec<Arc<Type>>> {
        let len = read_len(input)?;
        let mut list = Vec::with_capacity(len);
        for _ in 0..len {
            list.push(self.ty(read_packed_u32(input)?)?);
        }
        self.lists.push(list.clone());
        Ok(list)
    }

    fn read_annotation_list<R: Read>(&mut self, input: &mut R) -> Result<Vec<AnnotationInstance>> {
        let count = read_len(input)?;
        let mut instances = Vec::with_capacity(count);
        for _ in 0..count {
            instances.push(self.read_annotation_ref(input)?);
        }
        Ok(instances)
    }

    fn read_annotation_ref<R: Read>(&mut self, input: &mut R) -> Result<AnnotationInstance> {
        let pos = read_packed_u32(input)?;
        if pos > 0 {
            return lookup(&self.annotations, pos).cloned();
        }
        let name = self.name(read_packed_u32(input)?)?;
        let target = self.read_target(input)?;
        let value_count = read_len(input)?;
        let mut values = Vec::with_capacity(value_count);
        for _ in 0..value_count {
            let value_name = self.string(read_packed_u32(input)?)?;
            let value = self.read_value(input)?;
            values.push(AnnotationValue::new(value_name, value));
        }
        let instance = AnnotationInstance::new(name, target, values);
        self.annotations.push(instance.clone());
        Ok(instance)
    }

    fn read_target<R: Read>(&mut self, input: &mut R) -> Result<Option<AnnotationTarget>> {
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
                let ty = self.ty(read_packed_u32(input)?)?;
                let usage = read_usage(input)?;
                AnnotationTarget::TypeUse(TypeUseTarget {
                    enclosing,
                    ty,
                    usage,
                })
            }
            _ => return Err(Error::Corrupt("unknown annotation target kind")),
        };
        Ok(Some(target))
    }

    fn read_method_ref<R: Read>(&mut self, input: &mut R) -> Result<MethodRef> {
        Ok(MethodRef {
            class: self.name(read_packed_u32(input)?)?,
            name: self.string(read_packed_u32(input)?)?,
            position: read_u16(input)?,
        })
    }

    fn read_value<R: Read>(&mut self, input: &mut R) -> Result<Value> {
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
            tags::VALUE_CLASS => Value::Class(self.ty(read_packed_u32(input)?)?),
            tags::VALUE_NESTED => Value::Nested(Arc::new(self.read_annotation_ref(input)?)),
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

    fn read_method<R: Read>(&mut self, input: &mut R) -> Result<MethodInfo> {
        let name = self.string(read_packed_u32(input)?)?;
        let flags = read_u16(input)?;
        let type_parameters = self.read_list_ref(input)?;
        let parameters = self.read_list_ref(input)?;
        let return_type = self.ty(read_packed_u32(input)?)?;
        let exceptions = self.read_list_ref(input)?;
        let receiver_type = self.opt_ty(read_packed_u32(input)?)?;
        let parameter_names = if self.version >= 8 {
            let count = read_len(input)?;
            let mut names = Vec::with_capacity(count);
            for _ in 0..count {
                names.push(self.opt_string(read_packed_u32(input)?)?);
            }
            names
        } else {
            Vec::new()
        };
        let default_value = if self.version >= 7 && input.read_u8()? != 0 {
            let name = self.string(read_packed_u32(input)?)?;
            let value = self.read_value(input)?;
            Some(AnnotationValue::new(name, value))
        } else {
            None
        };
        let annotations = self.read_annotation_list(input)?;
        Ok(MethodInfo {
            name,
            flags,
            type_parameters,
            parameters,
            return_type,
            exceptions,
            receiver_type,
            parameter_names,
            default_value,
            annotations,
        })
    }

    fn read_field<R: Read>(&mut self, input: &mut R) -> Result<FieldInfo> {
        let name = self.string(read_packed_u32(input)?)?;
        let flags = read_u16(input)?;
        let ty = self.ty(read_packed_u32(input)?)?;
        let annotations = self.read_annotation_list(input)?;
        Ok(FieldInfo {
            name,
            flags,
            ty,
            annotations,
        })
    }

    fn read_class<R: Read>(&mut self, input: &mut R) -> Result<ClassInfo> {
        let name = self.name(read_packed_u32(input)?)?;
        let flags = read_u16(input)?;
        let super_type = self.opt_ty(read_packed_u32(input)?)?;
        let type_parameters = self.read_list_ref(input)?;
        let interface_types = self.read_list_ref(input)?;

        let mut nesting = NestingInfo::default();
        let mut has_no_args_constructor = false;
        if self.version >= 9 {
            let kind = input.read_u8()?;
            nesting.kind = match kind {
                tags::NESTING_TOP => NestingKind::Top,
                tags::NESTING_INNER => NestingKind::Inner,
                tags::NESTING_LOCAL => NestingKind::Local,
                tags::NESTING_ANONYMOUS => NestingKind::Anonymous,
                _ => return Err(Error::Corrupt("unknown nesting kind")),
            };
            if kind != tags::NESTING_TOP {
                self.read_nesting_fields(input, &mut nesting)?;
            }
            has_no_args_constructor = input.read_u8()? != 0;
        } else {
            self.read_nesting_fields(input, &mut nesting)?;
            // Older versions store no explicit kind; initializer-scoped
            // local and anonymous classes read back as top-level.
            nesting.kind = if nesting.enclosing_class.is_some() {
                NestingKind::Inner
            } else if nesting.enclosing_method.is_some() {
                if nesting.simple_name.is_none() {
                    NestingKind::Anonymous
                } else {
                    NestingKind::Local
                }
            } else {
                NestingKind::Top
            };
        }

        let component_count = read_len(input)?;
        let mut record_components = Vec::with_capacity(component_count);
        for _ in 0..component_count {
            let name = self.string(read_packed_u32(input)?)?;
            let ty = self.ty(read_packed_u32(input)?)?;
            let annotations = self.read_annotation_list(input)?;
            record_components.push(Arc::new(RecordComponentInfo {
                name,
                ty,
                annotations,
            }));
        }

        let field_count = read_len(input)?;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            fields.push(lookup(&self.fields, read_packed_u32(input)?)?.clone());
        }
        let method_count = read_len(input)?;
        let mut methods = Vec::with_capacity(method_count);
        for _ in 0..method_count {
            methods.push(lookup(&self.methods, read_packed_u32(input)?)?.clone());
        }
        if self.version < 9 {
            has_no_args_constructor = methods
                .iter()
                .any(|m| m.is_constructor() && m.parameters.is_empty());
        }

        let owned = self.read_annotation_list(input)?;
        let mut annotations: BTreeMap<DotName, Vec<AnnotationInstance>> = BTreeMap::new();
        let member_instances = fields
            .iter()
            .flat_map(|f| f.annotations.iter())
            .chain(methods.iter().flat_map(|m| m.annotations.iter()))
            .chain(record_components.iter().flat_map(|c| c.annotations.iter()));
        for instance in member_instances.chain(owned.iter()) {
            annotations
                .entry(instance.name.clone())
                .or_default()
                .push(instance.clone());
        }

        Ok(ClassInfo {
            name,
            flags,
            super_type,
            interface_types,
            type_parameters,
            fields,
            methods,
            record_components,
            annotations,
            nesting,
            has_no_args_constructor,
        })
    }

    fn read_nesting_fields<R: Read>(
        &mut self,
        input: &mut R,
        nesting: &mut NestingInfo,
    ) -> Result<()> {
        nesting.enclosing_class = self.opt_name(read_packed_u32(input)?)?;
        nesting.simple_name = self.opt_string(read_packed_u32(input)?)?;
        if input.read_u8()? != 0 {
            nesting.enclosing_method = Some(EnclosingMethod {
                class: self.name(read_packed_u32(input)?)?,
                name: self.string(read_packed_u32(input)?)?,
                parameters: self.read_list_ref(input)?,
                return_type: self.ty(read_packed_u32(input)?)?,
            });
        }
        Ok(())
    }
}

fn lookup<T>(pool: &[T], pos: u32) -> Result<&T> {
    if pos == 0 {
        return Err(Error::Corrupt("null reference where a value is required"));
    }
    pool.get(pos as usize - 1)
        .ok_or(Error::Corrupt("reference out of range"))
}

pub(crate) fn read_len<R: Read>(input: &mut R) -> Result<usize> {
    Ok(read_packed_u32(input)? as usize)
}

pub(crate) fn read_u16<R: Read>(input: &mut R) -> Result<u16> {
    u16::try_from(read_packed_u32(input)?).map_err(|_| Error::Corrupt("value out of range"))
}

pub(crate) fn read_usage<R: Read>(input: &mut R) -> Result<TypeUsage> {
    let usage = match input.read_u8()? {
        tags::USAGE_EMPTY => TypeUsage::Empty,
        tags::USAGE_RECEIVER => TypeUsage::Receiver,
        tags::USAGE_CLASS_EXTENDS => TypeUsage::ClassExtends {
            position: read_u16(input)?,
        },
        tags::USAGE_METHOD_PARAMETER => TypeUsage::MethodParameter {
            position: read_u16(input)?,
        },
        tags::USAGE_TYPE_PARAMETER => TypeUsage::TypeParameter {
            position: read_u16(input)?,
        },
        tags::USAGE_TYPE_PARAMETER_BOUND => TypeUsage::TypeParameterBound {
            position: read_u16(input)?,
            bound: read_u16(input)?,
        },
        tags::USAGE_THROWS => TypeUsage::Throws {
            position: read_u16(input)?,
        },
        _ => return Err(Error::Corrupt("unknown type usage kind")),
    };
    Ok(usage)
}

fn read_string_pool<R: Read>(input: &mut R) -> Result<Vec<Arc<str>>> {
    let count = read_len(input)?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(read_pooled_string(input)?);
    }
    Ok(entries)
}

pub(crate) fn read_pooled_string<R: Read>(input: &mut R) -> Result<Arc<str>> {
    let len = read_len(input)?;
    let mut buf = vec![0u8; len];
    input.read_exact(&mut buf)?;
    let s = String::from_utf8(buf).map_err(|_| Error::Corrupt("invalid utf-8 in pool"))?;
    Ok(Arc::from(s))
}
