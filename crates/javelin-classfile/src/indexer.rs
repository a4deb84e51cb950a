//! The class-file indexer. Feed it class files one at a time, then call
//! [`Indexer::complete`] to obtain the queryable [`Index`].

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::Arc;

use javelin_core::{
    AnnotationInstance, AnnotationTarget, AnnotationValue, ClassInfo, DotName, EnclosingMethod,
    EnclosingTarget, FieldInfo, FieldRef, Index, MethodInfo, MethodRef, NestingInfo, NestingKind,
    RecordComponentInfo, RecordComponentRef, Type, TypeUsage, Value,
};
use tracing::debug;

use crate::constant_pool::{AttributeKind, ConstantPool};
use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
use crate::error::{Error, Result};
use crate::interners::Interners;
use crate::reader::Reader;
use crate::signature::{Scope, SignatureParser};
use crate::type_annotation::{read_target, read_type_path, PathStep, TypePathResolver};

const MAGIC: u32 = 0xCAFE_BABE;

/// Class files older than this (pre-Java-5) cannot carry the attributes the
/// index cares about and are skipped rather than rejected.
const MIN_MAJOR_VERSION: u16 = 49;

/// Accumulates class records across many class files. All interning pools
/// are shared for the lifetime of the indexer, so everything reachable from
/// the completed index is maximally shared.
#[derive(Debug, Default)]
pub struct Indexer {
    pools: Interners,
    signature_cache: HashMap<Box<str>, Arc<Type>>,
    annotations: HashMap<DotName, Vec<AnnotationInstance>>,
    subclasses: HashMap<DotName, Vec<Arc<ClassInfo>>>,
    implementors: HashMap<DotName, Vec<Arc<ClassInfo>>>,
    classes: HashMap<DotName, Arc<ClassInfo>>,
}

/// Which member of the class under construction an attribute belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MemberSlot {
    Class,
    Field(usize),
    Method(usize),
    RecordComponent(usize),
}

#[derive(Debug)]
pub(crate) struct InnerClassEntry {
    pub(crate) enclosing_class: Option<DotName>,
    /// Source simple name; `None` for anonymous classes.
    pub(crate) simple_name: Option<Arc<str>>,
    pub(crate) flags: u16,
}

#[derive(Debug)]
pub(crate) struct PendingTypeAnnotation {
    pub(crate) slot: MemberSlot,
    pub(crate) usage: TypeUsage,
    pub(crate) path: Vec<PathStep>,
    /// Target-less; the final target is attached during resolution.
    pub(crate) annotation: AnnotationInstance,
    pub(crate) applied: bool,
}

#[derive(Debug)]
pub(crate) struct FieldState {
    pub(crate) name: Arc<str>,
    pub(crate) flags: u16,
    pub(crate) ty: Arc<Type>,
    pub(crate) signature: Option<String>,
    pub(crate) annotations: Vec<AnnotationInstance>,
}

#[derive(Debug)]
pub(crate) struct MethodState {
    pub(crate) name: Arc<str>,
    pub(crate) flags: u16,
    pub(crate) type_parameters: Vec<Arc<Type>>,
    pub(crate) parameters: Vec<Arc<Type>>,
    pub(crate) return_type: Arc<Type>,
    pub(crate) exceptions: Vec<Arc<Type>>,
    pub(crate) receiver: Option<Arc<Type>>,
    pub(crate) parameter_names: Vec<Option<Arc<str>>>,
    pub(crate) default_value: Option<AnnotationValue>,
    pub(crate) signature: Option<String>,
    pub(crate) annotations: Vec<AnnotationInstance>,
}

#[derive(Debug)]
pub(crate) struct RecordState {
    pub(crate) name: Arc<str>,
    pub(crate) ty: Arc<Type>,
    pub(crate) signature: Option<String>,
    pub(crate) annotations: Vec<AnnotationInstance>,
}

/// Mutable working state for the class currently being parsed.
#[derive(Debug)]
pub(crate) struct ClassState {
    pub(crate) name: DotName,
    pub(crate) flags: u16,
    pub(crate) raw_super: Option<DotName>,
    pub(crate) raw_interfaces: Vec<DotName>,
    pub(crate) super_type: Option<Arc<Type>>,
    pub(crate) interfaces: Vec<Arc<Type>>,
    pub(crate) type_parameters: Vec<Arc<Type>>,
    pub(crate) fields: Vec<FieldState>,
    pub(crate) methods: Vec<MethodState>,
    pub(crate) record_components: Vec<RecordState>,
    /// Every annotation found anywhere in this class, keyed by name.
    pub(crate) class_annotations: BTreeMap<DotName, Vec<AnnotationInstance>>,
    pub(crate) class_signature: Option<String>,
    pub(crate) nesting: NestingInfo,
    /// The class's view of the InnerClasses table: every entry, keyed by the
    /// inner class's name.
    pub(crate) inner_classes: HashMap<DotName, InnerClassEntry>,
    pub(crate) pending: Vec<PendingTypeAnnotation>,
}

impl ClassState {
    /// Records a fully targeted annotation instance on its member and in the
    /// per-class map.
    pub(crate) fn record_annotation(&mut self, slot: &MemberSlot, instance: AnnotationInstance) {
        self.class_annotations
            .entry(instance.name.clone())
            .or_default()
            .push(instance.clone());
        match slot {
            MemberSlot::Class => {}
            MemberSlot::Field(i) => self.fields[*i].annotations.push(instance),
            MemberSlot::Method(i) => self.methods[*i].annotations.push(instance),
            MemberSlot::RecordComponent(i) => {
                self.record_components[*i].annotations.push(instance)
            }
        }
    }

    pub(crate) fn declaration_target(&self, slot: &MemberSlot) -> AnnotationTarget {
        match slot {
            MemberSlot::Class => AnnotationTarget::Class(self.name.clone()),
            MemberSlot::Field(i) => AnnotationTarget::Field(FieldRef {
                class: self.name.clone(),
                name: self.fields[*i].name.clone(),
            }),
            MemberSlot::Method(i) => AnnotationTarget::Method(self.method_ref(*i)),
            MemberSlot::RecordComponent(i) => {
                AnnotationTarget::RecordComponent(RecordComponentRef {
                    class: self.name.clone(),
                    name: self.record_components[*i].name.clone(),
                })
            }
        }
    }

    pub(crate) fn enclosing_target(&self, slot: &MemberSlot) -> EnclosingTarget {
        match slot {
            MemberSlot::Class => EnclosingTarget::Class(self.name.clone()),
            MemberSlot::Field(i) => EnclosingTarget::Field(FieldRef {
                class: self.name.clone(),
                name: self.fields[*i].name.clone(),
            }),
            MemberSlot::Method(i) => EnclosingTarget::Method(self.method_ref(*i)),
            MemberSlot::RecordComponent(i) => {
                EnclosingTarget::RecordComponent(RecordComponentRef {
                    class: self.name.clone(),
                    name: self.record_components[*i].name.clone(),
                })
            }
        }
    }

    pub(crate) fn method_ref(&self, position: usize) -> MethodRef {
        MethodRef {
            class: self.name.clone(),
            name: self.methods[position].name.clone(),
            position: position as u16,
        }
    }

    fn set_signature(&mut self, slot: &MemberSlot, signature: String) {
        match slot {
            MemberSlot::Class => self.class_signature = Some(signature),
            MemberSlot::Field(i) => self.fields[*i].signature = Some(signature),
            MemberSlot::Method(i) => self.methods[*i].signature = Some(signature),
            MemberSlot::RecordComponent(i) => {
                self.record_components[*i].signature = Some(signature)
            }
        }
    }
}

impl Indexer {
    pub fn new() -> Indexer {
        Indexer::default()
    }

    /// Parses one class file and adds it to the index under construction.
    /// Returns `None` (without indexing anything) for class files older than
    /// major version 49, which predate every attribute the index records.
    pub fn index(&mut self, data: &[u8]) -> Result<Option<Arc<ClassInfo>>> {
        let mut r = Reader::new(data);
        let magic = r.read_u4()?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }
        let _minor = r.read_u2()?;
        let major = r.read_u2()?;
        if major < MIN_MAJOR_VERSION {
            debug!(major, "skipping pre-generics class file");
            return Ok(None);
        }

        let pool = ConstantPool::parse(&mut r)?;
        let flags = r.read_u2()?;
        let name = self.pools.name(&pool.class_name(r.read_u2()?)?);
        let super_index = r.read_u2()?;
        let raw_super = if super_index == 0 {
            None
        } else {
            Some(self.pools.name(&pool.class_name(super_index)?))
        };
        let interface_count = r.read_u2()?;
        let mut raw_interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            raw_interfaces.push(self.pools.name(&pool.class_name(r.read_u2()?)?));
        }

        let super_type = raw_super
            .clone()
            .map(|n| self.pools.ty(Type::class(n)));
        let interfaces: Vec<Arc<Type>> = raw_interfaces
            .iter()
            .map(|n| self.pools.ty(Type::class(n.clone())))
            .collect();
        let interfaces = self.pools.type_list(interfaces);

        let mut state = ClassState {
            name,
            flags,
            raw_super,
            raw_interfaces,
            super_type,
            interfaces,
            type_parameters: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            record_components: Vec::new(),
            class_annotations: BTreeMap::new(),
            class_signature: None,
            nesting: NestingInfo::default(),
            inner_classes: HashMap::new(),
            pending: Vec::new(),
        };

        let field_count = r.read_u2()?;
        for i in 0..field_count as usize {
            self.parse_field(&mut state, &pool, &mut r, i)?;
        }
        let method_count = r.read_u2()?;
        for i in 0..method_count as usize {
            self.parse_method(&mut state, &pool, &mut r, i)?;
        }
        self.parse_attributes(&mut state, &pool, &mut r, MemberSlot::Class)?;

        self.apply_signatures(&mut state)?;
        self.resolve_nesting(&mut state);
        TypePathResolver::new(&mut self.pools).resolve_all(&mut state);

        Ok(Some(self.freeze(state)))
    }

    /// Reads a whole class file from `reader` and indexes it.
    pub fn index_reader<R: Read>(&mut self, reader: &mut R) -> Result<Option<Arc<ClassInfo>>> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.index(&data)
    }

    /// Finishes indexing and returns the immutable index.
    pub fn complete(self) -> Index {
        Index::create(
            self.annotations,
            self.subclasses,
            self.implementors,
            self.classes,
        )
    }

    fn parse_field(
        &mut self,
        state: &mut ClassState,
        pool: &ConstantPool,
        r: &mut Reader<'_>,
        position: usize,
    ) -> Result<()> {
        let flags = r.read_u2()?;
        let name = self.pools.str(&pool.utf8(r.read_u2()?)?);
        let ty = parse_field_descriptor(&mut self.pools, &pool.utf8(r.read_u2()?)?)?;
        state.fields.push(FieldState {
            name,
            flags,
            ty,
            signature: None,
            annotations: Vec::new(),
        });
        self.parse_attributes(state, pool, r, MemberSlot::Field(position))
    }

    fn parse_method(
        &mut self,
        state: &mut ClassState,
        pool: &ConstantPool,
        r: &mut Reader<'_>,
        position: usize,
    ) -> Result<()> {
        let flags = r.read_u2()?;
        let name = self.pools.str(&pool.utf8(r.read_u2()?)?);
        let (parameters, return_type) =
            parse_method_descriptor(&mut self.pools, &pool.utf8(r.read_u2()?)?)?;
        state.methods.push(MethodState {
            name,
            flags,
            type_parameters: Vec::new(),
            parameters,
            return_type,
            exceptions: Vec::new(),
            receiver: None,
            parameter_names: Vec::new(),
            default_value: None,
            signature: None,
            annotations: Vec::new(),
        });
        self.parse_attributes(state, pool, r, MemberSlot::Method(position))
    }

    fn parse_attributes(
        &mut self,
        state: &mut ClassState,
        pool: &ConstantPool,
        r: &mut Reader<'_>,
        slot: MemberSlot,
    ) -> Result<()> {
        let count = r.read_u2()?;
        for _ in 0..count {
            let name_index = r.read_u2()?;
            let length = r.read_u4()? as usize;
            let data = r.read_bytes(length)?;
            let mut ar = Reader::new(data);
            match pool.attribute_kind(name_index) {
                AttributeKind::RuntimeVisibleAnnotations => {
                    let n = ar.read_u2()?;
                    for _ in 0..n {
                        let target = state.declaration_target(&slot);
                        let instance = self.parse_annotation(&mut ar, pool, Some(target))?;
                        state.record_annotation(&slot, instance);
                    }
                }
                AttributeKind::RuntimeVisibleParameterAnnotations => {
                    if let MemberSlot::Method(m) = slot {
                        let parameter_count = ar.read_u1()?;
                        for p in 0..parameter_count {
                            let n = ar.read_u2()?;
                            for _ in 0..n {
                                let target = AnnotationTarget::MethodParameter {
                                    method: state.method_ref(m),
                                    position: p,
                                };
                                let instance =
                                    self.parse_annotation(&mut ar, pool, Some(target))?;
                                state.record_annotation(&slot, instance);
                            }
                        }
                    }
                }
                AttributeKind::RuntimeVisibleTypeAnnotations => {
                    let n = ar.read_u2()?;
                    for _ in 0..n {
                        let usage = read_target(&mut ar)?;
                        let path = read_type_path(&mut ar)?;
                        let annotation = self.parse_annotation(&mut ar, pool, None)?;
                        state.pending.push(PendingTypeAnnotation {
                            slot: slot.clone(),
                            usage,
                            path,
                            annotation,
                            applied: false,
                        });
                    }
                }
                AttributeKind::Signature => {
                    let signature = pool.utf8(ar.read_u2()?)?.into_owned();
                    state.set_signature(&slot, signature);
                }
                AttributeKind::Exceptions => {
                    if let MemberSlot::Method(m) = slot {
                        let n = ar.read_u2()?;
                        let mut exceptions = Vec::with_capacity(n as usize);
                        for _ in 0..n {
                            let name = self.pools.name(&pool.class_name(ar.read_u2()?)?);
                            exceptions.push(self.pools.ty(Type::class(name)));
                        }
                        state.methods[m].exceptions = self.pools.type_list(exceptions);
                    }
                }
                AttributeKind::InnerClasses => {
                    if slot == MemberSlot::Class {
                        self.parse_inner_classes(state, pool, &mut ar)?;
                    }
                }
                AttributeKind::EnclosingMethod => {
                    if slot == MemberSlot::Class {
                        let class_index = ar.read_u2()?;
                        let method_index = ar.read_u2()?;
                        // Index 0 means "directly in an initializer", which
                        // the index does not model as a method.
                        if method_index != 0 {
                            let class = self.pools.name(&pool.class_name(class_index)?);
                            let (name_index, desc_index) = pool.name_and_type(method_index)?;
                            let name = self.pools.str(&pool.utf8(name_index)?);
                            let (parameters, return_type) = parse_method_descriptor(
                                &mut self.pools,
                                &pool.utf8(desc_index)?,
                            )?;
                            state.nesting.enclosing_method = Some(EnclosingMethod {
                                class,
                                name,
                                parameters,
                                return_type,
                            });
                        }
                    }
                }
                AttributeKind::MethodParameters => {
                    if let MemberSlot::Method(m) = slot {
                        let n = ar.read_u1()?;
                        let mut names = Vec::with_capacity(n as usize);
                        for _ in 0..n {
                            let name_index = ar.read_u2()?;
                            let _flags = ar.read_u2()?;
                            names.push(if name_index == 0 {
                                None
                            } else {
                                Some(self.pools.str(&pool.utf8(name_index)?))
                            });
                        }
                        state.methods[m].parameter_names = names;
                    }
                }
                AttributeKind::AnnotationDefault => {
                    if let MemberSlot::Method(m) = slot {
                        let value = self.parse_element_value(&mut ar, pool)?;
                        let name = state.methods[m].name.clone();
                        state.methods[m].default_value = Some(AnnotationValue::new(name, value));
                    }
                }
                AttributeKind::Record => {
                    if slot == MemberSlot::Class {
                        let n = ar.read_u2()?;
                        for _ in 0..n {
                            let position = state.record_components.len();
                            let name = self.pools.str(&pool.utf8(ar.read_u2()?)?);
                            let ty = parse_field_descriptor(
                                &mut self.pools,
                                &pool.utf8(ar.read_u2()?)?,
                            )?;
                            state.record_components.push(RecordState {
                                name,
                                ty,
                                signature: None,
                                annotations: Vec::new(),
                            });
                            self.parse_attributes(
                                state,
                                pool,
                                &mut ar,
                                MemberSlot::RecordComponent(position),
                            )?;
                        }
                    }
                }
                AttributeKind::Unknown => {}
            }
        }
        Ok(())
    }

    fn parse_inner_classes(
        &mut self,
        state: &mut ClassState,
        pool: &ConstantPool,
        r: &mut Reader<'_>,
    ) -> Result<()> {
        let n = r.read_u2()?;
        for _ in 0..n {
            let inner_index = r.read_u2()?;
            let outer_index = r.read_u2()?;
            let name_index = r.read_u2()?;
            let entry_flags = r.read_u2()?;
            if inner_index == 0 {
                return Err(Error::MalformedAttribute("InnerClasses"));
            }
            let inner = self.pools.name(&pool.class_name(inner_index)?);
            let enclosing_class = if outer_index == 0 {
                None
            } else {
                Some(self.pools.name(&pool.class_name(outer_index)?))
            };
            let simple_name = if name_index == 0 {
                None
            } else {
                Some(self.pools.str(&pool.utf8(name_index)?))
            };
            state.inner_classes.insert(
                inner,
                InnerClassEntry {
                    enclosing_class,
                    simple_name,
                    flags: entry_flags,
                },
            );
        }
        Ok(())
    }

    fn parse_annotation(
        &mut self,
        r: &mut Reader<'_>,
        pool: &ConstantPool,
        target: Option<AnnotationTarget>,
    ) -> Result<AnnotationInstance> {
        let descriptor = pool.utf8(r.read_u2()?)?;
        let name = self.class_descriptor_name(&descriptor)?;
        let n = r.read_u2()?;
        let mut values = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let member = self.pools.str(&pool.utf8(r.read_u2()?)?);
            let value = self.parse_element_value(r, pool)?;
            values.push(AnnotationValue::new(member, value));
        }
        Ok(AnnotationInstance::new(name, target, values))
    }

    fn parse_element_value(&mut self, r: &mut Reader<'_>, pool: &ConstantPool) -> Result<Value> {
        Ok(match r.read_u1()? {
            b'B' => Value::Byte(pool.integer(r.read_u2()?)? as i8),
            b'C' => Value::Char(pool.integer(r.read_u2()?)? as u16),
            b'S' => Value::Short(pool.integer(r.read_u2()?)? as i16),
            b'I' => Value::Int(pool.integer(r.read_u2()?)?),
            b'Z' => Value::Boolean(pool.integer(r.read_u2()?)? != 0),
            b'J' => Value::Long(pool.long(r.read_u2()?)?),
            b'F' => Value::Float(pool.float(r.read_u2()?)?),
            b'D' => Value::Double(pool.double(r.read_u2()?)?),
            b's' => Value::String(self.pools.str(&pool.utf8(r.read_u2()?)?)),
            b'e' => {
                let type_name = {
                    let descriptor = pool.utf8(r.read_u2()?)?;
                    self.class_descriptor_name(&descriptor)?
                };
                let constant = self.pools.str(&pool.utf8(r.read_u2()?)?);
                Value::Enum {
                    type_name,
                    constant,
                }
            }
            b'c' => {
                let descriptor = pool.utf8(r.read_u2()?)?;
                Value::Class(parse_field_descriptor(&mut self.pools, &descriptor)?)
            }
            b'@' => Value::Nested(Arc::new(self.parse_annotation(r, pool, None)?)),
            b'[' => {
                let n = r.read_u2()?;
                let empty = self.pools.str("");
                let mut elements = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    let value = self.parse_element_value(r, pool)?;
                    elements.push(AnnotationValue::new(empty.clone(), value));
                }
                Value::Array(elements)
            }
            _ => return Err(Error::MalformedAttribute("annotation element value")),
        })
    }

    /// `Lcom/example/Foo;` to an interned name.
    fn class_descriptor_name(&mut self, descriptor: &str) -> Result<DotName> {
        let inner = descriptor
            .strip_prefix('L')
            .and_then(|s| s.strip_suffix(';'))
            .ok_or_else(|| Error::InvalidDescriptor(descriptor.to_string()))?;
        Ok(self.pools.name(inner))
    }

    /// Replaces descriptor-derived member types with their generic forms.
    /// Deferred to after member parsing so the class's own signature (whose
    /// attribute trails the members) is in scope for all of them.
    fn apply_signatures(&mut self, state: &mut ClassState) -> Result<()> {
        let mut parser = SignatureParser::new(&mut self.pools, &mut self.signature_cache);
        let class_scope = match &state.class_signature {
            Some(signature) => {
                let parsed = parser.parse_class_signature(signature)?;
                state.type_parameters = parsed.type_parameters;
                state.super_type = Some(parsed.super_type);
                state.interfaces = parsed.interfaces;
                parsed.scope
            }
            None => Scope::new(),
        };
        for field in &mut state.fields {
            if let Some(signature) = &field.signature {
                field.ty = parser.parse_field_signature(signature, &class_scope)?;
            }
        }
        for component in &mut state.record_components {
            if let Some(signature) = &component.signature {
                component.ty = parser.parse_field_signature(signature, &class_scope)?;
            }
        }
        for method in &mut state.methods {
            if let Some(signature) = &method.signature {
                let parsed = parser.parse_method_signature(signature, &class_scope)?;
                method.type_parameters = parsed.type_parameters;
                method.parameters = parsed.parameters;
                method.return_type = parsed.return_type;
                // The signature's throws clause is optional even when the
                // Exceptions attribute is present.
                if !parsed.exceptions.is_empty() {
                    method.exceptions = parsed.exceptions;
                }
            }
        }
        Ok(())
    }

    fn resolve_nesting(&mut self, state: &mut ClassState) {
        if let Some(entry) = state.inner_classes.get(&state.name) {
            state.nesting.kind = if entry.simple_name.is_none() {
                NestingKind::Anonymous
            } else if entry.enclosing_class.is_some() {
                NestingKind::Inner
            } else {
                NestingKind::Local
            };
            state.nesting.enclosing_class = entry.enclosing_class.clone();
            state.nesting.simple_name = entry.simple_name.clone();
        }
    }

    /// Turns the working state into an immutable record and registers it in
    /// the cross-class maps, keyed by the raw (pre-signature) names.
    fn freeze(&mut self, state: ClassState) -> Arc<ClassInfo> {
        let fields: Vec<Arc<FieldInfo>> = state
            .fields
            .into_iter()
            .map(|f| {
                Arc::new(FieldInfo {
                    name: f.name,
                    flags: f.flags,
                    ty: f.ty,
                    annotations: f.annotations,
                })
            })
            .collect();
        let methods: Vec<Arc<MethodInfo>> = state
            .methods
            .into_iter()
            .map(|m| {
                Arc::new(MethodInfo {
                    name: m.name,
                    flags: m.flags,
                    type_parameters: m.type_parameters,
                    parameters: m.parameters,
                    return_type: m.return_type,
                    exceptions: m.exceptions,
                    receiver_type: m.receiver,
                    parameter_names: m.parameter_names,
                    default_value: m.default_value,
                    annotations: m.annotations,
                })
            })
            .collect();
        let record_components: Vec<Arc<RecordComponentInfo>> = state
            .record_components
            .into_iter()
            .map(|c| {
                Arc::new(RecordComponentInfo {
                    name: c.name,
                    ty: c.ty,
                    annotations: c.annotations,
                })
            })
            .collect();

        let has_no_args_constructor = methods
            .iter()
            .any(|m| m.is_constructor() && m.parameters.is_empty());

        let info = Arc::new(ClassInfo {
            name: state.name,
            flags: state.flags,
            super_type: state.super_type,
            interface_types: state.interfaces,
            type_parameters: state.type_parameters,
            fields,
            methods,
            record_components,
            annotations: state.class_annotations,
            nesting: state.nesting,
            has_no_args_constructor,
        });

        self.classes.insert(info.name.clone(), info.clone());
        if let Some(super_name) = state.raw_super {
            self.subclasses
                .entry(super_name)
                .or_default()
                .push(info.clone());
        }
        for interface in state.raw_interfaces {
            self.implementors
                .entry(interface)
                .or_default()
                .push(info.clone());
        }
        for (name, instances) in &info.annotations {
            self.annotations
                .entry(name.clone())
                .or_default()
                .extend(instances.iter().cloned());
        }
        info
    }
}
