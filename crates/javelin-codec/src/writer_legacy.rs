//! The flat container used by format versions 1 through 3.
//!
//! Only the class table survives in this shape: name, flags, superclass,
//! interfaces, and annotation instances written fully inline. There are no
//! type trees, so class-literal values erase to their name and type-use
//! targets lose the annotated node. Members are not stored at all.
//!
//! Names are sorted with every prefix present as its own row, so the reader
//! can rebuild the componentized forms with a stack: a row carries its depth
//! and only the local segment, and its prefix is the most recent row one
//! level up.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::sync::Arc;

use byteorder::WriteBytesExt;
use javelin_core::{
    AnnotationInstance, AnnotationTarget, ClassInfo, DotName, EnclosingTarget, Index, MethodRef,
    Value,
};

use crate::error::{Error, Result};
use crate::packed::{write_packed_u32, write_packed_usize};
use crate::tags;
use crate::writer_current::write_usage;

pub(crate) fn write_index<W: Write>(out: &mut W, index: &Index) -> Result<()> {
    let mut writer = Writer::default();
    let mut classes: Vec<Arc<ClassInfo>> = index.classes().cloned().collect();
    classes.sort_by(|a, b| a.name.cmp(&b.name));
    for class in &classes {
        writer.collect_class(class);
    }
    writer.emit(out, &classes)
}

#[derive(Default)]
struct Writer {
    names: BTreeSet<DotName>,
    strings: BTreeSet<Arc<str>>,
    name_positions: HashMap<DotName, u32>,
    string_positions: HashMap<Arc<str>, u32>,
}

impl Writer {
    // ----- collection -----

    fn collect_class(&mut self, class: &ClassInfo) {
        self.collect_name(&class.name);
        if let Some(super_name) = class.super_name() {
            self.collect_name(&super_name);
        }
        for interface in class.interface_names() {
            self.collect_name(&interface);
        }
        for instances in class.annotations.values() {
            for instance in instances {
                self.collect_annotation(instance);
            }
        }
    }

    fn collect_name(&mut self, name: &DotName) {
        if self.names.contains(name) {
            return;
        }
        if let Some(prefix) = name.prefix() {
            self.collect_name(prefix);
        }
        self.names.insert(name.clone());
    }

    fn collect_string(&mut self, s: &Arc<str>) {
        if !self.strings.contains(s) {
            self.strings.insert(s.clone());
        }
    }

    fn collect_annotation(&mut self, instance: &AnnotationInstance) {
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
            Some(AnnotationTarget::TypeUse(t)) => match &t.enclosing {
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
            },
        }
        for value in instance.values() {
            self.collect_string(&value.name);
            self.collect_value(&value.value);
        }
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
            Value::Class(ty) => self.collect_name(&ty.name()),
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

    // ----- emission -----

    fn emit<W: Write>(&mut self, out: &mut W, classes: &[Arc<ClassInfo>]) -> Result<()> {
        let names: Vec<DotName> = self.names.iter().cloned().collect();
        for (i, name) in names.iter().enumerate() {
            self.name_positions.insert(name.clone(), i as u32 + 1);
        }
        let strings: Vec<Arc<str>> = self.strings.iter().cloned().collect();
        for (i, s) in strings.iter().enumerate() {
            self.string_positions.insert(s.clone(), i as u32 + 1);
        }

        write_packed_usize(out, names.len())?;
        for name in &names {
            write_packed_u32(out, ((name.depth() as u32) << 1) | name.is_inner_class() as u32)?;
            let local = name.local().as_bytes();
            write_packed_usize(out, local.len())?;
            out.write_all(local)?;
        }

        write_packed_usize(out, strings.len())?;
        for s in &strings {
            write_packed_usize(out, s.len())?;
            out.write_all(s.as_bytes())?;
        }

        write_packed_usize(out, classes.len())?;
        for class in classes {
            self.write_class(out, class)?;
        }
        Ok(())
    }

    fn name_pos(&self, name: &DotName) -> Result<u32> {
        self.name_positions
            .get(name)
            .copied()
            .ok_or(Error::Corrupt("unpooled name"))
    }

    fn string_pos(&self, s: &Arc<str>) -> Result<u32> {
        self.string_positions
            .get(s)
            .copied()
            .ok_or(Error::Corrupt("unpooled string"))
    }

    fn write_class<W: Write>(&self, out: &mut W, class: &ClassInfo) -> Result<()> {
        write_packed_u32(out, self.name_pos(&class.name)?)?;
        write_packed_u32(out, class.flags as u32)?;
        let super_pos = match class.super_name() {
            Some(name) => self.name_pos(&name)?,
            None => 0,
        };
        write_packed_u32(out, super_pos)?;
        let interfaces: Vec<DotName> = class.interface_names().collect();
        write_packed_usize(out, interfaces.len())?;
        for interface in &interfaces {
            write_packed_u32(out, self.name_pos(interface)?)?;
        }

        let instances: Vec<&AnnotationInstance> = class.annotations.values().flatten().collect();
        write_packed_usize(out, instances.len())?;
        for instance in instances {
            self.write_annotation(out, instance)?;
        }
        Ok(())
    }

    fn write_annotation<W: Write>(&self, out: &mut W, instance: &AnnotationInstance) -> Result<()> {
        write_packed_u32(out, self.name_pos(&instance.name)?)?;
        self.write_target(out, instance.target())?;
        write_packed_usize(out, instance.values().len())?;
        for value in instance.values() {
            write_packed_u32(out, self.string_pos(&value.name)?)?;
            self.write_value(out, &value.value)?;
        }
        Ok(())
    }

    fn write_target<W: Write>(&self, out: &mut W, target: Option<&AnnotationTarget>) -> Result<()> {
        match target {
            None => out.write_u8(tags::TARGET_NONE)?,
            Some(AnnotationTarget::Class(name)) => {
                out.write_u8(tags::TARGET_CLASS)?;
                write_packed_u32(out, self.name_pos(name)?)?;
            }
            Some(AnnotationTarget::Field(f)) => {
                out.write_u8(tags::TARGET_FIELD)?;
                write_packed_u32(out, self.name_pos(&f.class)?)?;
                write_packed_u32(out, self.string_pos(&f.name)?)?;
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
                write_packed_u32(out, self.name_pos(&r.class)?)?;
                write_packed_u32(out, self.string_pos(&r.name)?)?;
            }
            Some(AnnotationTarget::TypeUse(t)) => {
                out.write_u8(tags::TARGET_TYPE_USE)?;
                match &t.enclosing {
                    EnclosingTarget::Class(name) => {
                        out.write_u8(tags::ENCLOSING_CLASS)?;
                        write_packed_u32(out, self.name_pos(name)?)?;
                    }
                    EnclosingTarget::Field(f) => {
                        out.write_u8(tags::ENCLOSING_FIELD)?;
                        write_packed_u32(out, self.name_pos(&f.class)?)?;
                        write_packed_u32(out, self.string_pos(&f.name)?)?;
                    }
                    EnclosingTarget::Method(m) => {
                        out.write_u8(tags::ENCLOSING_METHOD)?;
                        self.write_method_ref(out, m)?;
                    }
                    EnclosingTarget::RecordComponent(r) => {
                        out.write_u8(tags::ENCLOSING_RECORD_COMPONENT)?;
                        write_packed_u32(out, self.name_pos(&r.class)?)?;
                        write_packed_u32(out, self.string_pos(&r.name)?)?;
                    }
                }
                // The annotated type node has no representation here; only
                // the usage survives.
                write_usage(out, &t.usage)?;
            }
        }
        Ok(())
    }

    fn write_method_ref<W: Write>(&self, out: &mut W, m: &MethodRef) -> Result<()> {
        write_packed_u32(out, self.name_pos(&m.class)?)?;
        write_packed_u32(out, self.string_pos(&m.name)?)?;
        write_packed_u32(out, m.position as u32)?;
        Ok(())
    }

    fn write_value<W: Write>(&self, out: &mut W, value: &Value) -> Result<()> {
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
                write_packed_u32(out, self.string_pos(s)?)?;
            }
            Value::Enum {
                type_name,
                constant,
            } => {
                out.write_u8(tags::VALUE_ENUM)?;
                write_packed_u32(out, self.name_pos(type_name)?)?;
                write_packed_u32(out, self.string_pos(constant)?)?;
            }
            Value::Class(ty) => {
                // Class literals erase to their name in this format.
                out.write_u8(tags::VALUE_CLASS)?;
                write_packed_u32(out, self.name_pos(&ty.name())?)?;
            }
            Value::Nested(nested) => {
                out.write_u8(tags::VALUE_NESTED)?;
                self.write_annotation(out, nested)?;
            }
            Value::Array(elements) => {
                out.write_u8(tags::VALUE_ARRAY)?;
                write_packed_usize(out, elements.len())?;
                for element in elements {
                    write_packed_u32(out, self.string_pos(&element.name)?)?;
                    self.write_value(out, &element.value)?;
                }
            }
        }
        Ok(())
    }
}
