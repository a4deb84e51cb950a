//! The cross-referenced container (versions 6 through 9).
//!
//! Every name, type tree, type list, annotation instance, field, and method
//! is pooled and referenced by a 1-based position; 0 is the null reference.
//! Types are emitted children-first, so a type entry only ever references
//! earlier positions. Type lists and annotation instances are emitted
//! *reference-or-full*: the first occurrence writes reference 0 followed by
//! the full body and is assigned the next position (after its body, so
//! instances nested in the body come first); later occurrences write the
//! position alone. Lists still unwritten after the type pool get their own
//! section, so member and class records reference them by position only.
//!
//! Version gates: 7 adds annotation-member default values, 8 adds the
//! parameter-name table, 9 adds the explicit nesting block and the
//! no-args-constructor flag (older readers infer both).

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use byteorder::WriteBytesExt;
use javelin_core::{
    AnnotationInstance, AnnotationTarget, ClassInfo, DotName, EnclosingMethod, EnclosingTarget,
    FieldInfo, Index, InternPool, MethodInfo, MethodRef, NestingKind, Type, TypeUsage, Value,
};

use crate::error::{Error, Result};
use crate::packed::{write_packed_u32, write_packed_usize};
use crate::tags;

pub(crate) fn write_index<W: Write>(out: &mut W, index: &Index, version: u8) -> Result<()> {
    let mut writer = Writer::new(version);
    writer.collect(index);
    writer.emit(out, index)
}

struct Writer {
    version: u8,
    classes: Vec<Arc<ClassInfo>>,
    bytes: InternPool<Arc<str>>,
    strings: InternPool<Arc<str>>,
    names: InternPool<DotName>,
    types: InternPool<Arc<Type>>,
    lists: InternPool<Vec<Arc<Type>>>,
    annotations: InternPool<AnnotationInstance>,
    fields: InternPool<Arc<FieldInfo>>,
    methods: InternPool<Arc<MethodInfo>>,
    // Emission-order positions, assigned at first write.
    list_positions: HashMap<Vec<Arc<Type>>, u32>,
    annotation_positions: HashMap<AnnotationInstance, u32>,
}

impl Writer {
    fn new(version: u8) -> Writer {
        Writer {
            version,
            classes: Vec::new(),
            bytes: InternPool::new(),
            strings: InternPool::new(),
            names: InternPool::new(),
            types: InternPool::new(),
            lists: InternPool::new(),
            annotations: InternPool::new(),
            fields: InternPool::new(),
            methods: InternPool::new(),
            list_positions: HashMap::new(),
            annotation_positions: HashMap::new(),
        }
    }

    // ----- collection -----

    fn collect(&mut self, index: &Index) {
        let mut classes: Vec<Arc<ClassInfo>> = index.classes().cloned().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        for class in &classes {
            self.collect_class(class);
        }
        self.classes = classes;
    }

    fn collect_class(&mut self, class: &ClassInfo) {
        self.collect_name(&class.name);
        if let Some(super_type) = &class.super_type {
            self.collect_type(super_type);
        }
        self.collect_list(&class.interface_types);
        self.collect_list(&class.type_parameters);
        for field in &class.fields {
            self.collect_string(&field.name);
            self.collect_type(&field.ty);
            for a in &field.annotations {
                self.collect_annotation(a);
            }
            self.fields.intern(field.clone());
        }
        for method in &class.methods {
            self.collect_method(method);
        }
        for component in &class.record_components {
            self.collect_string(&component.name);
            self.collect_type(&component.ty);
            for a in &component.annotations {
                self.collect_annotation(a);
            }
        }
        if let Some(name) = &class.nesting.enclosing_class {
            self.collect_name(name);
        }
        if let Some(simple) = &class.nesting.simple_name {
            self.collect_string(simple);
        }
        if let Some(enclosing) = &class.nesting.enclosing_method {
            self.collect_name(&enclosing.class);
            self.collect_string(&enclosing.name);
            self.collect_list(&enclosing.parameters);
            self.collect_type(&enclosing.return_type);
        }
        for instances in class.annotations.values() {
            for instance in instances {
                self.collect_annotation(instance);
            }
        }
    }

    fn collect_method(&mut self, method: &Arc<MethodInfo>) {
        self.collect_string(&method.name);
        self.collect_list(&method.type_parameters);
        self.collect_list(&method.parameters);
        self.collect_type(&method.return_type);
        self.collect_list(&method.exceptions);
        if let Some(receiver) = &method.receiver_type {
            self.collect_type(receiver);
        }
        if self.version >= 8 {
            for name in method.parameter_names.iter().flatten() {
                self.collect_string(name);
            }
        }
        if self.version >= 7 {
            if let Some(default) = &method.default_value {
                self.collect_string(&default.name);
                self.collect_value(&default.value);
            }
        }
        for a in &method.annotations {
            self.collect_annotation(a);
        }
        self.methods.intern(method.clone());
    }

    fn collect_name(&mut self, name: &DotName) {
        if self.names.contains(name) {
            return;
        }
        if let Some(prefix) = name.prefix() {
            self.collect_name(prefix);
        }
        self.bytes.intern(Arc::from(name.local()));
        self.names.intern(name.clone());
    }

    fn collect_string(&mut self, s: &Arc<str>) {
        self.strings.intern(s.clone());
    }

    fn collect_type(&mut self, ty: &Arc<Type>) {
        if self.types.contains(ty) {
            return;
        }
        match &**ty {
            Type::Class(t) => self.collect_name(&t.name),
            Type::Parameterized(t) => {
                self.collect_name(&t.name);
                if let Some(owner) = &t.owner {
                    self.collect_type(owner);
                }
                self.collect_list(&t.arguments);
            }
            Type::Array(t) => self.collect_type(&t.component),
            Type::Primitive(_) | Type::Void(_) => {}
            Type::TypeVariable(t) => {
                self.collect_string(&t.identifier);
                self.collect_list(&t.bounds);
            }
            Type::UnresolvedTypeVariable(t) => self.collect_string(&t.identifier),
            Type::Wildcard(t) => {
                if let Some(bound) = &t.bound {
                    self.collect_type(bound);
                }
            }
        }
        for a in ty.annotations() {
            self.collect_annotation(a);
        }
        self.types.intern(ty.clone());
    }

    fn collect_list(&mut self, list: &Vec<Arc<Type>>) {
        for ty in list {
            self.collect_type(ty);
        }
        self.lists.intern(list.clone());
    }

    fn collect_annotation(&mut self, instance: &AnnotationInstance) {
        if self.annotations.contains(instance) {
            return;
        }
        self.collect_name(&instance.name);
        match instance.target() {
            None => {}
            Some(AnnotationTarget::Class(name)) => self.collect_name(name),
            Some(AnnotationTarget::Field(f)) => {
                self.collect_name(&f.class);
                self.collect_string(&f.name);
            }
            Some(AnnotationTarget::Method(m)) => self.collect_method_ref(m),
            Some(AnnotationTarget::MethodParameter { method, .. }) => {
                self.collect_method_ref(method)
            }
            Some(AnnotationTarget::RecordComponent(r)) => {
                self.collect_name(&r.class);
                self.collect_string(&r.name);
            }
            Some(AnnotationTarget::TypeUse(t)) => {
                match &t.enclosing {
                    EnclosingTarget::Class(name) => self.collect_name(name),
                    EnclosingTarget::Field(f) => {
                        self.collect_name(&f.class);
                        self.collect_string(&f.name);
                    }
                    EnclosingTarget::Method(m) => self.collect_method_ref(m),
                    EnclosingTarget::RecordComponent(r) => {
                        self.collect_name(&r.class);
                        self.collect_string(&r.name);
                    }
                }
                self.collect_type(&t.ty);
            }
        }
        for value in instance.values() {
            self.collect_string(&value.name);
            self.collect_value(&value.value);
        }
        self.annotations.intern(instance.clone());
    }

    fn collect_method_ref(&mut self, m: &MethodRef) {
        self.collect_name(&m.class);
        self.collect_string(&m.name);
    }

    fn collect_value(&mut self, value: &Value) {
        match value {
            Value::String(s) => self.collect_string(s),
            Value::Enum {
                type_name,
                constant,
            } => {
                self.collect_name(type_name);
                self.collect_string(constant);
            }
            Value::Class(ty) => self.collect_type(ty),
            Value::Nested(nested) => self.collect_annotation(nested),
            Value::Array(elements) => {
                for element in elements {
                    self.collect_string(&element.name);
                    self.collect_value(&element.value);
                }
            }
            _ => {}
        }
    }

    // ----- position lookups -----

    fn byte_pos(&mut self, local: &str) -> Result<u32> {
        self.bytes
            .index()
            .position_of(&Arc::from(local))
            .ok_or(Error::Corrupt("unpooled byte string"))
    }

    fn string_pos(&mut self, s: &Arc<str>) -> Result<u32> {
        self.strings
            .index()
            .position_of(s)
            .ok_or(Error::Corrupt("unpooled string"))
    }

    fn name_pos(&mut self, name: &DotName) -> Result<u32> {
        self.names
            .index()
            .position_of(name)
            .ok_or(Error::Corrupt("unpooled name"))
    }

    fn type_pos(&mut self, ty: &Arc<Type>) -> Result<u32> {
        self.types
            .index()
            .position_of(ty)
            .ok_or(Error::Corrupt("unpooled type"))
    }

    // ----- emission -----

    fn emit<W: Write>(&mut self, out: &mut W, index: &Index) -> Result<()> {
        write_packed_usize(out, index.annotation_name_count())?;
        write_packed_usize(out, index.implementor_entry_count())?;
        write_packed_usize(out, index.subclass_entry_count())?;

        let bytes: Vec<Arc<str>> = self.bytes.iter().cloned().collect();
        write_string_pool(out, &bytes)?;
        let strings: Vec<Arc<str>> = self.strings.iter().cloned().collect();
        write_string_pool(out, &strings)?;

        let names: Vec<DotName> = self.names.iter().cloned().collect();
        write_packed_usize(out, names.len())?;
        for name in &names {
            let prefix_pos = match name.prefix() {
                Some(prefix) => self.name_pos(prefix)?,
                None => 0,
            };
            write_packed_u32(out, (prefix_pos << 1) | name.is_inner_class() as u32)?;
            let local = self.byte_pos(name.local())?;
            write_packed_u32(out, local)?;
        }

        write_packed_usize(out, self.types.len())?;
        write_packed_usize(out, self.lists.len())?;
        write_packed_usize(out, self.annotations.len())?;

        let types: Vec<Arc<Type>> = self.types.iter().cloned().collect();
        for ty in &types {
            self.write_type(out, ty)?;
        }

        let lists: Vec<Vec<Arc<Type>>> = self.lists.iter().cloned().collect();
        let remaining: Vec<Vec<Arc<Type>>> = lists
            .into_iter()
            .filter(|l| !self.list_positions.contains_key(l))
            .collect();
        write_packed_usize(out, remaining.len())?;
        for list in &remaining {
            self.write_list_body(out, list)?;
        }

        let methods: Vec<Arc<MethodInfo>> = self.methods.iter().cloned().collect();
        write_packed_usize(out, methods.len())?;
        for method in &methods {
            self.write_method(out, method)?;
        }

        let fields: Vec<Arc<FieldInfo>> = self.fields.iter().cloned().collect();
        write_packed_usize(out, fields.len())?;
        for field in &fields {
            self.write_field(out, field)?;
        }

        let classes = self.classes.clone();
        write_packed_usize(out, classes.len())?;
        for class in &classes {
            self.write_class(out, class)?;
        }
        Ok(())
    }

    fn write_type<W: Write>(&mut self, out: &mut W, ty: &Arc<Type>) -> Result<()> {
        match &**ty {
            Type::Class(t) => {
                out.write_u8(tags::TYPE_CLASS)?;
                let pos = self.name_pos(&t.name)?;
                write_packed_u32(out, pos)?;
            }
            Type::Array(t) => {
                out.write_u8(tags::TYPE_ARRAY)?;
                write_packed_u32(out, t.dimensions as u32)?;
                let pos = self.type_pos(&t.component)?;
                write_packed_u32(out, pos)?;
            }
            Type::Primitive(t) => {
                out.write_u8(tags::TYPE_PRIMITIVE)?;
                out.write_u8(t.primitive as u8)?;
            }
            Type::Void(_) => {
                out.write_u8(tags::TYPE_VOID)?;
            }
            Type::TypeVariable(t) => {
                out.write_u8(tags::TYPE_VARIABLE)?;
                let pos = self.string_pos(&t.identifier)?;
                write_packed_u32(out, pos)?;
                self.write_list_ref(out, &t.bounds)?;
            }
            Type::UnresolvedTypeVariable(t) => {
                out.write_u8(tags::TYPE_UNRESOLVED_VARIABLE)?;
                let pos = self.string_pos(&t.identifier)?;
                write_packed_u32(out, pos)?;
            }
            Type::Wildcard(t) => {
                out.write_u8(tags::TYPE_WILDCARD)?;
                out.write_u8(t.extends as u8)?;
                let pos = match &t.bound {
                    Some(bound) => self.type_pos(bound)?,
                    None => 0,
                };
                write_packed_u32(out, pos)?;
            }
            Type::Parameterized(t) => {
                out.write_u8(tags::TYPE_PARAMETERIZED)?;
                let pos = self.name_pos(&t.name)?;
                write_packed_u32(out, pos)?;
                let owner = match &t.owner {
                    Some(owner) => self.type_pos(owner)?,
                    None => 0,
                };
                write_packed_u32(out, owner)?;
                self.write_list_ref(out, &t.arguments)?;
            }
        }
        self.write_annotations(out, ty.annotations())
    }

    fn write_list_ref<W: Write>(&mut self, out: &mut W, list: &Vec<Arc<Type>>) -> Result<()> {
        if let Some(&pos) = self.list_positions.get(list) {
            write_packed_u32(out, pos)?;
            return Ok(());
        }
        write_packed_u32(out, 0)?;
        self.write_list_body(out, list)
    }

    fn write_list_body<W: Write>(&mut self, out: &mut W, list: &Vec<Arc<Type>>) -> Result<()> {
        write_packed_usize(out, list.len())?;
        for ty in list {
            let pos = self.type_pos(ty)?;
            write_packed_u32(out, pos)?;
        }
        let position = self.list_positions.len() as u32 + 1;
        self.list_positions.insert(list.clone(), position);
        Ok(())
    }

    fn write_annotations<W: Write>(
        &mut self,
        out: &mut W,
        instances: &[AnnotationInstance],
    ) -> Result<()> {
        write_packed_usize(out, instances.len())?;
        for instance in instances {
            self.write_annotation_ref(out, instance)?;
        }
        Ok(())
    }

    fn write_annotation_ref<W: Write>(
        &mut self,
        out: &mut W,
        instance: &AnnotationInstance,
    ) -> Result<()> {
        if let Some(&pos) = self.annotation_positions.get(instance) {
            write_packed_u32(out, pos)?;
            return Ok(());
        }
        write_packed_u32(out, 0)?;
        let pos = self.name_pos(&instance.name)?;
        write_packed_u32(out, pos)?;
        self.write_target(out, instance.target())?;
        write_packed_usize(out, instance.values().len())?;
        for value in instance.values() {
            let name = self.string_pos(&value.name)?;
            write_packed_u32(out, name)?;
            self.write_value(out, &value.value)?;
        }
        // Position is assigned after the body so that instances nested in
        // the body come first, mirroring the reader's append order.
        let position = self.annotation_positions.len() as u32 + 1;
        self.annotation_positions.insert(instance.clone(), position);
        Ok(())
    }

    fn write_target<W: Write>(
        &mut self,
        out: &mut W,
        target: Option<&AnnotationTarget>,
    ) -> Result<()> {
        match target {
            None => out.write_u8(tags::TARGET_NONE)?,
            Some(AnnotationTarget::Class(name)) => {
                out.write_u8(tags::TARGET_CLASS)?;
                let pos = self.name_pos(name)?;
                write_packed_u32(out, pos)?;
            }
            Some(AnnotationTarget::Field(f)) => {
                out.write_u8(tags::TARGET_FIELD)?;
                let class = self.name_pos(&f.class)?;
                write_packed_u32(out, class)?;
                let name = self.string_pos(&f.name)?;
                write_packed_u32(out, name)?;
            }
            Some(AnnotationTarget::Method(m)) => {
                out.write_u8(tags::TARGET_METHOD)?;
                self.write_method_ref(out, m)?;
            }
            Some(AnnotationTarget::MethodParameter { method, position }) => {
                out.write_u8(tags::TARGET_METHOD_PARAMETER)?;
                self.write_method_ref(out, method)?;
                out.write_u8(*position)?;
            }
            Some(AnnotationTarget::RecordComponent(r)) => {
                out.write_u8(tags::TARGET_RECORD_COMPONENT)?;
                let class = self.name_pos(&r.class)?;
                write_packed_u32(out, class)?;
                let name = self.string_pos(&r.name)?;
                write_packed_u32(out, name)?;
            }
            Some(AnnotationTarget::TypeUse(t)) => {
                out.write_u8(tags::TARGET_TYPE_USE)?;
                match &t.enclosing {
                    EnclosingTarget::Class(name) => {
                        out.write_u8(tags::ENCLOSING_CLASS)?;
                        let pos = self.name_pos(name)?;
                        write_packed_u32(out, pos)?;
                    }
                    EnclosingTarget::Field(f) => {
                        out.write_u8(tags::ENCLOSING_FIELD)?;
                        let class = self.name_pos(&f.class)?;
                        write_packed_u32(out, class)?;
                        let name = self.string_pos(&f.name)?;
                        write_packed_u32(out, name)?;
                    }
                    EnclosingTarget::Method(m) => {
                        out.write_u8(tags::ENCLOSING_METHOD)?;
                        self.write_method_ref(out, m)?;
                    }
                    EnclosingTarget::RecordComponent(r) => {
                        out.write_u8(tags::ENCLOSING_RECORD_COMPONENT)?;
                        let class = self.name_pos(&r.class)?;
                        write_packed_u32(out, class)?;
                        let name = self.string_pos(&r.name)?;
                        write_packed_u32(out, name)?;
                    }
                }
                let ty = self.type_pos(&t.ty)?;
                write_packed_u32(out, ty)?;
                write_usage(out, &t.usage)?;
            }
        }
        Ok(())
    }

    fn write_method_ref<W: Write>(&mut self, out: &mut W, m: &MethodRef) -> Result<()> {
        let class = self.name_pos(&m.class)?;
        write_packed_u32(out, class)?;
        let name = self.string_pos(&m.name)?;
        write_packed_u32(out, name)?;
        write_packed_u32(out, m.position as u32)?;
        Ok(())
    }

    fn write_value<W: Write>(&mut self, out: &mut W, value: &Value) -> Result<()> {
        use byteorder::BigEndian;
        match value {
            Value::Byte(v) => {
                out.write_u8(tags::VALUE_BYTE)?;
                out.write_i8(*v)?;
            }
            Value::Char(v) => {
                out.write_u8(tags::VALUE_CHAR)?;
                out.write_u16::<BigEndian>(*v)?;
            }
            Value::Short(v) => {
                out.write_u8(tags::VALUE_SHORT)?;
                out.write_i16::<BigEndian>(*v)?;
            }
            Value::Int(v) => {
                out.write_u8(tags::VALUE_INT)?;
                out.write_i32::<BigEndian>(*v)?;
            }
            Value::Long(v) => {
                out.write_u8(tags::VALUE_LONG)?;
                out.write_i64::<BigEndian>(*v)?;
            }
            Value::Float(v) => {
                out.write_u8(tags::VALUE_FLOAT)?;
                out.write_u32::<BigEndian>(v.to_bits())?;
            }
            Value::Double(v) => {
                out.write_u8(tags::VALUE_DOUBLE)?;
                out.write_u64::<BigEndian>(v.to_bits())?;
            }
            Value::Boolean(v) => {
                out.write_u8(tags::VALUE_BOOLEAN)?;
                out.write_u8(*v as u8)?;
            }
            Value::String(s) => {
                out.write_u8(tags::VALUE_STRING)?;
                let pos = self.string_pos(s)?;
                write_packed_u32(out, pos)?;
            }
            Value::Enum {
                type_name,
                constant,
            } => {
                out.write_u8(tags::VALUE_ENUM)?;
                let pos = self.name_pos(type_name)?;
                write_packed_u32(out, pos)?;
                let constant = self.string_pos(constant)?;
                write_packed_u32(out, constant)?;
            }
            Value::Class(ty) => {
                out.write_u8(tags::VALUE_CLASS)?;
                let pos = self.type_pos(ty)?;
                write_packed_u32(out, pos)?;
            }
            Value::Nested(nested) => {
                out.write_u8(tags::VALUE_NESTED)?;
                self.write_annotation_ref(out, nested)?;
            }
            Value::Array(elements) => {
                out.write_u8(tags::VALUE_ARRAY)?;
                write_packed_usize(out, elements.len())?;
                for element in elements {
                    let name = self.string_pos(&element.name)?;
                    write_packed_u32(out, name)?;
                    self.write_value(out, &element.value)?;
                }
            }
        }
        Ok(())
    }

    fn write_method<W: Write>(&mut self, out: &mut W, method: &Arc<MethodInfo>) -> Result<()> {
        let name = self.string_pos(&method.name)?;
        write_packed_u32(out, name)?;
        write_packed_u32(out, method.flags as u32)?;
        self.write_list_ref(out, &method.type_parameters)?;
        self.write_list_ref(out, &method.parameters)?;
        let ret = self.type_pos(&method.return_type)?;
        write_packed_u32(out, ret)?;
        self.write_list_ref(out, &method.exceptions)?;
        let receiver = match &method.receiver_type {
            Some(receiver) => self.type_pos(receiver)?,
            None => 0,
        };
        write_packed_u32(out, receiver)?;
        if self.version >= 8 {
            write_packed_usize(out, method.parameter_names.len())?;
            for name in &method.parameter_names {
                let pos = match name {
                    Some(name) => self.string_pos(name)?,
                    None => 0,
                };
                write_packed_u32(out, pos)?;
            }
        }
        if self.version >= 7 {
            match &method.default_value {
                Some(default) => {
                    out.write_u8(1)?;
                    let name = self.string_pos(&default.name)?;
                    write_packed_u32(out, name)?;
                    self.write_value(out, &default.value)?;
                }
                None => out.write_u8(0)?,
            }
        }
        self.write_annotations(out, &method.annotations)
    }

    fn write_field<W: Write>(&mut self, out: &mut W, field: &Arc<FieldInfo>) -> Result<()> {
        let name = self.string_pos(&field.name)?;
        write_packed_u32(out, name)?;
        write_packed_u32(out, field.flags as u32)?;
        let ty = self.type_pos(&field.ty)?;
        write_packed_u32(out, ty)?;
        self.write_annotations(out, &field.annotations)
    }

    fn write_class<W: Write>(&mut self, out: &mut W, class: &Arc<ClassInfo>) -> Result<()> {
        let name = self.name_pos(&class.name)?;
        write_packed_u32(out, name)?;
        write_packed_u32(out, class.flags as u32)?;
        let super_pos = match &class.super_type {
            Some(super_type) => self.type_pos(super_type)?,
            None => 0,
        };
        write_packed_u32(out, super_pos)?;
        self.write_list_ref(out, &class.type_parameters)?;
        self.write_list_ref(out, &class.interface_types)?;

        if self.version >= 9 {
            let kind = match class.nesting.kind {
                NestingKind::Top => tags::NESTING_TOP,
                NestingKind::Inner => tags::NESTING_INNER,
                NestingKind::Local => tags::NESTING_LOCAL,
                NestingKind::Anonymous => tags::NESTING_ANONYMOUS,
            };
            out.write_u8(kind)?;
            if kind != tags::NESTING_TOP {
                self.write_nesting_fields(out, class)?;
            }
            out.write_u8(class.has_no_args_constructor as u8)?;
        } else {
            self.write_nesting_fields(out, class)?;
        }

        write_packed_usize(out, class.record_components.len())?;
        for component in &class.record_components {
            let name = self.string_pos(&component.name)?;
            write_packed_u32(out, name)?;
            let ty = self.type_pos(&component.ty)?;
            write_packed_u32(out, ty)?;
            self.write_annotations(out, &component.annotations)?;
        }

        write_packed_usize(out, class.fields.len())?;
        for field in &class.fields {
            let pos = self
                .fields
                .index()
                .position_of(field)
                .ok_or(Error::Corrupt("unpooled field"))?;
            write_packed_u32(out, pos)?;
        }
        write_packed_usize(out, class.methods.len())?;
        for method in &class.methods {
            let pos = self
                .methods
                .index()
                .position_of(method)
                .ok_or(Error::Corrupt("unpooled method"))?;
            write_packed_u32(out, pos)?;
        }

        // Only annotations owned by the class declaration itself; member
        // annotations are reconstituted from the member records.
        let owned: Vec<&AnnotationInstance> = class
            .annotations
            .values()
            .flatten()
            .filter(|a| is_class_owned(a))
            .collect();
        write_packed_usize(out, owned.len())?;
        for instance in owned {
            self.write_annotation_ref(out, instance)?;
        }
        Ok(())
    }

    fn write_nesting_fields<W: Write>(&mut self, out: &mut W, class: &Arc<ClassInfo>) -> Result<()> {
        let enclosing = match &class.nesting.enclosing_class {
            Some(name) => self.name_pos(name)?,
            None => 0,
        };
        write_packed_u32(out, enclosing)?;
        let simple = match &class.nesting.simple_name {
            Some(simple) => self.string_pos(simple)?,
            None => 0,
        };
        write_packed_u32(out, simple)?;
        match &class.nesting.enclosing_method {
            Some(method) => {
                out.write_u8(1)?;
                self.write_enclosing_method(out, method)?;
            }
            None => out.write_u8(0)?,
        }
        Ok(())
    }

    fn write_enclosing_method<W: Write>(
        &mut self,
        out: &mut W,
        method: &EnclosingMethod,
    ) -> Result<()> {
        let class = self.name_pos(&method.class)?;
        write_packed_u32(out, class)?;
        let name = self.string_pos(&method.name)?;
        write_packed_u32(out, name)?;
        self.write_list_ref(out, &method.parameters)?;
        let ret = self.type_pos(&method.return_type)?;
        write_packed_u32(out, ret)?;
        Ok(())
    }
}

pub(crate) fn write_usage<W: Write>(out: &mut W, usage: &TypeUsage) -> Result<()> {
    match usage {
        TypeUsage::Empty => out.write_u8(tags::USAGE_EMPTY)?,
        TypeUsage::Receiver => out.write_u8(tags::USAGE_RECEIVER)?,
        TypeUsage::ClassExtends { position } => {
            out.write_u8(tags::USAGE_CLASS_EXTENDS)?;
            write_packed_u32(out, *position as u32)?;
        }
        TypeUsage::MethodParameter { position } => {
            out.write_u8(tags::USAGE_METHOD_PARAMETER)?;
            write_packed_u32(out, *position as u32)?;
        }
        TypeUsage::TypeParameter { position } => {
            out.write_u8(tags::USAGE_TYPE_PARAMETER)?;
            write_packed_u32(out, *position as u32)?;
        }
        TypeUsage::TypeParameterBound { position, bound } => {
            out.write_u8(tags::USAGE_TYPE_PARAMETER_BOUND)?;
            write_packed_u32(out, *position as u32)?;
            write_packed_u32(out, *bound as u32)?;
        }
        TypeUsage::Throws { position } => {
            out.write_u8(tags::USAGE_THROWS)?;
            write_packed_u32(out, *position as u32)?;
        }
    }
    Ok(())
}

pub(crate) fn is_class_owned(instance: &AnnotationInstance) -> bool {
    match instance.target() {
        Some(AnnotationTarget::Class(_)) => true,
        Some(AnnotationTarget::TypeUse(t)) => matches!(t.enclosing, EnclosingTarget::Class(_)),
        _ => false,
    }
}

fn write_string_pool<W: Write>(out: &mut W, entries: &[Arc<str>]) -> Result<()> {
    write_packed_usize(out, entries.len())?;
    for entry in entries {
        write_packed_usize(out, entry.len())?;
        out.write_all(entry.as_bytes())?;
    }
    Ok(())
}
