//! A hand-rolled class-file byte builder, so fixtures need no JDK at test
//! time. Only the structures the indexer reads are supported.

use std::collections::HashMap;

/// Constant pool under construction. Indices are handed out on demand and
/// Utf8/Class entries are deduplicated.
#[derive(Default)]
pub struct ConstPool {
    entries: Vec<u8>,
    next: u16,
    utf8_cache: HashMap<String, u16>,
    class_cache: HashMap<String, u16>,
}

impl ConstPool {
    fn new() -> ConstPool {
        ConstPool {
            next: 1,
            ..ConstPool::default()
        }
    }

    fn add(&mut self, bytes: &[u8], slots: u16) -> u16 {
        let index = self.next;
        self.entries.extend_from_slice(bytes);
        self.next += slots;
        index
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        if let Some(&index) = self.utf8_cache.get(s) {
            return index;
        }
        let mut bytes = vec![1];
        bytes.extend_from_slice(&(s.len() as u16).to_be_bytes());
        bytes.extend_from_slice(s.as_bytes());
        let index = self.add(&bytes, 1);
        self.utf8_cache.insert(s.to_owned(), index);
        index
    }

    pub fn class(&mut self, internal: &str) -> u16 {
        if let Some(&index) = self.class_cache.get(internal) {
            return index;
        }
        let name = self.utf8(internal);
        let mut bytes = vec![7];
        bytes.extend_from_slice(&name.to_be_bytes());
        let index = self.add(&bytes, 1);
        self.class_cache.insert(internal.to_owned(), index);
        index
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let mut bytes = vec![12];
        bytes.extend_from_slice(&name.to_be_bytes());
        bytes.extend_from_slice(&descriptor.to_be_bytes());
        self.add(&bytes, 1)
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut bytes = vec![3];
        bytes.extend_from_slice(&value.to_be_bytes());
        self.add(&bytes, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut bytes = vec![5];
        bytes.extend_from_slice(&value.to_be_bytes());
        self.add(&bytes, 2)
    }

    pub fn double(&mut self, value: f64) -> u16 {
        let mut bytes = vec![6];
        bytes.extend_from_slice(&value.to_bits().to_be_bytes());
        self.add(&bytes, 2)
    }
}

/// One class file under construction.
pub struct ClassFile {
    pub pool: ConstPool,
    pub access: u16,
    pub major: u16,
    this_index: u16,
    super_index: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
}

impl ClassFile {
    pub fn new(internal_name: &str, super_internal: &str) -> ClassFile {
        let mut pool = ConstPool::new();
        let this_index = pool.class(internal_name);
        let super_index = pool.class(super_internal);
        ClassFile {
            pool,
            access: 0x0021, // public super
            major: 52,
            this_index,
            super_index,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn add_interface(&mut self, internal: &str) {
        let index = self.pool.class(internal);
        self.interfaces.push(index);
    }

    /// Encodes a full attribute (name index, length, body).
    pub fn attr(&mut self, name: &str, body: Vec<u8>) -> Vec<u8> {
        let name = self.pool.utf8(name);
        let mut out = Vec::with_capacity(body.len() + 6);
        out.extend_from_slice(&name.to_be_bytes());
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
        out
    }

    pub fn signature_attr(&mut self, signature: &str) -> Vec<u8> {
        let index = self.pool.utf8(signature);
        self.attr("Signature", index.to_be_bytes().to_vec())
    }

    pub fn add_field(&mut self, access: u16, name: &str, descriptor: &str, attrs: Vec<Vec<u8>>) {
        let encoded = self.member(access, name, descriptor, attrs);
        self.fields.push(encoded);
    }

    pub fn add_method(&mut self, access: u16, name: &str, descriptor: &str, attrs: Vec<Vec<u8>>) {
        let encoded = self.member(access, name, descriptor, attrs);
        self.methods.push(encoded);
    }

    pub fn add_class_attr(&mut self, attr: Vec<u8>) {
        self.attributes.push(attr);
    }

    fn member(&mut self, access: u16, name: &str, descriptor: &str, attrs: Vec<Vec<u8>>) -> Vec<u8> {
        let name = self.pool.utf8(name);
        let descriptor = self.pool.utf8(descriptor);
        let mut out = Vec::new();
        out.extend_from_slice(&access.to_be_bytes());
        out.extend_from_slice(&name.to_be_bytes());
        out.extend_from_slice(&descriptor.to_be_bytes());
        out.extend_from_slice(&(attrs.len() as u16).to_be_bytes());
        for attr in attrs {
            out.extend_from_slice(&attr);
        }
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&self.major.to_be_bytes());
        out.extend_from_slice(&self.pool.next.to_be_bytes());
        out.extend_from_slice(&self.pool.entries);
        out.extend_from_slice(&self.access.to_be_bytes());
        out.extend_from_slice(&self.this_index.to_be_bytes());
        out.extend_from_slice(&self.super_index.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }
        out.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            out.extend_from_slice(field);
        }
        out.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            out.extend_from_slice(method);
        }
        out.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            out.extend_from_slice(attribute);
        }
        out
    }
}

/// An element value, encoded on demand against a pool.
pub enum Ev<'a> {
    Int(i32),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Str(&'a str),
    Enum(&'a str, &'a str),
    ClassLit(&'a str),
    Nested(Vec<u8>),
    Array(Vec<Ev<'a>>),
}

fn element_value(pool: &mut ConstPool, value: Ev<'_>) -> Vec<u8> {
    let mut out = Vec::new();
    match value {
        Ev::Int(v) => {
            out.push(b'I');
            let index = pool.integer(v);
            out.extend_from_slice(&index.to_be_bytes());
        }
        Ev::Long(v) => {
            out.push(b'J');
            let index = pool.long(v);
            out.extend_from_slice(&index.to_be_bytes());
        }
        Ev::Double(v) => {
            out.push(b'D');
            let index = pool.double(v);
            out.extend_from_slice(&index.to_be_bytes());
        }
        Ev::Boolean(v) => {
            out.push(b'Z');
            let index = pool.integer(v as i32);
            out.extend_from_slice(&index.to_be_bytes());
        }
        Ev::Str(v) => {
            out.push(b's');
            let index = pool.utf8(v);
            out.extend_from_slice(&index.to_be_bytes());
        }
        Ev::Enum(type_descriptor, constant) => {
            out.push(b'e');
            let ty = pool.utf8(type_descriptor);
            let constant = pool.utf8(constant);
            out.extend_from_slice(&ty.to_be_bytes());
            out.extend_from_slice(&constant.to_be_bytes());
        }
        Ev::ClassLit(descriptor) => {
            out.push(b'c');
            let index = pool.utf8(descriptor);
            out.extend_from_slice(&index.to_be_bytes());
        }
        Ev::Nested(annotation) => {
            out.push(b'@');
            out.extend_from_slice(&annotation);
        }
        Ev::Array(elements) => {
            out.push(b'[');
            out.extend_from_slice(&(elements.len() as u16).to_be_bytes());
            for element in elements {
                let encoded = element_value(pool, element);
                out.extend_from_slice(&encoded);
            }
        }
    }
    out
}

/// Encodes an `annotation` structure (JVMS 4.7.16).
pub fn annotation(pool: &mut ConstPool, descriptor: &str, pairs: Vec<(&str, Ev<'_>)>) -> Vec<u8> {
    let mut out = Vec::new();
    let ty = pool.utf8(descriptor);
    out.extend_from_slice(&ty.to_be_bytes());
    out.extend_from_slice(&(pairs.len() as u16).to_be_bytes());
    for (name, value) in pairs {
        let name = pool.utf8(name);
        out.extend_from_slice(&name.to_be_bytes());
        let encoded = element_value(pool, value);
        out.extend_from_slice(&encoded);
    }
    out
}

/// Body of a `RuntimeVisibleAnnotations` attribute.
pub fn runtime_annotations(annotations: Vec<Vec<u8>>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(annotations.len() as u16).to_be_bytes());
    for annotation in annotations {
        out.extend_from_slice(&annotation);
    }
    out
}

/// Body of a `RuntimeVisibleParameterAnnotations` attribute.
pub fn parameter_annotations(parameters: Vec<Vec<Vec<u8>>>) -> Vec<u8> {
    let mut out = vec![parameters.len() as u8];
    for annotations in parameters {
        out.extend_from_slice(&runtime_annotations(annotations));
    }
    out
}

/// One entry of a `RuntimeVisibleTypeAnnotations` attribute: an encoded
/// target, a type path, and an encoded annotation.
pub struct TypeAnnotation {
    pub target: Vec<u8>,
    pub path: Vec<(u8, u8)>,
    pub annotation: Vec<u8>,
}

pub fn type_annotations(entries: Vec<TypeAnnotation>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    for entry in entries {
        out.extend_from_slice(&entry.target);
        out.push(entry.path.len() as u8);
        for (kind, argument) in entry.path {
            out.push(kind);
            out.push(argument);
        }
        out.extend_from_slice(&entry.annotation);
    }
    out
}

pub fn target_empty_field() -> Vec<u8> {
    vec![0x13]
}

pub fn target_empty_return() -> Vec<u8> {
    vec![0x14]
}

pub fn target_receiver() -> Vec<u8> {
    vec![0x15]
}

pub fn target_class_extends(index: u16) -> Vec<u8> {
    let mut out = vec![0x10];
    out.extend_from_slice(&index.to_be_bytes());
    out
}

pub fn target_method_parameter(index: u8) -> Vec<u8> {
    vec![0x16, index]
}

pub fn target_class_type_parameter_bound(parameter: u8, bound: u8) -> Vec<u8> {
    vec![0x11, parameter, bound]
}

/// Body of an `InnerClasses` attribute. Entries are (inner class, enclosing
/// class, simple name, flags); `None` encodes index zero.
pub fn inner_classes(
    pool: &mut ConstPool,
    entries: Vec<(&str, Option<&str>, Option<&str>, u16)>,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    for (inner, outer, name, flags) in entries {
        let inner = pool.class(inner);
        let outer = outer.map_or(0, |o| pool.class(o));
        let name = name.map_or(0, |n| pool.utf8(n));
        out.extend_from_slice(&inner.to_be_bytes());
        out.extend_from_slice(&outer.to_be_bytes());
        out.extend_from_slice(&name.to_be_bytes());
        out.extend_from_slice(&flags.to_be_bytes());
    }
    out
}

/// Body of an `EnclosingMethod` attribute.
pub fn enclosing_method(
    pool: &mut ConstPool,
    class: &str,
    method: Option<(&str, &str)>,
) -> Vec<u8> {
    let class = pool.class(class);
    let method = method.map_or(0, |(name, descriptor)| pool.name_and_type(name, descriptor));
    let mut out = Vec::new();
    out.extend_from_slice(&class.to_be_bytes());
    out.extend_from_slice(&method.to_be_bytes());
    out
}

/// Body of an `Exceptions` attribute.
pub fn exceptions(pool: &mut ConstPool, classes: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(classes.len() as u16).to_be_bytes());
    for class in classes {
        let index = pool.class(class);
        out.extend_from_slice(&index.to_be_bytes());
    }
    out
}

/// Body of a `MethodParameters` attribute; `None` encodes a missing name.
pub fn method_parameters(pool: &mut ConstPool, names: &[Option<&str>]) -> Vec<u8> {
    let mut out = vec![names.len() as u8];
    for name in names {
        let index = name.map_or(0, |n| pool.utf8(n));
        out.extend_from_slice(&index.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // access flags
    }
    out
}

/// Body of an `AnnotationDefault` attribute.
pub fn annotation_default(pool: &mut ConstPool, value: Ev<'_>) -> Vec<u8> {
    element_value(pool, value)
}

/// Body of a `Record` attribute. Components are (name, descriptor, attrs).
pub fn record(components: Vec<(u16, u16, Vec<Vec<u8>>)>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(components.len() as u16).to_be_bytes());
    for (name, descriptor, attrs) in components {
        out.extend_from_slice(&name.to_be_bytes());
        out.extend_from_slice(&descriptor.to_be_bytes());
        out.extend_from_slice(&(attrs.len() as u16).to_be_bytes());
        for attr in attrs {
            out.extend_from_slice(&attr);
        }
    }
    out
}
