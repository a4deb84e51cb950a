use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::name::DotName;
use crate::types::Type;

/// One annotation usage: the annotation type name, where it was found, and
/// its member values sorted by member name so lookups can binary-search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationInstance {
    pub name: DotName,
    /// Absent for instances nested inside another annotation value or spliced
    /// into a type tree.
    pub target: Option<Box<AnnotationTarget>>,
    values: Vec<AnnotationValue>,
}

impl AnnotationInstance {
    pub fn new(
        name: DotName,
        target: Option<AnnotationTarget>,
        mut values: Vec<AnnotationValue>,
    ) -> AnnotationInstance {
        values.sort_by(|a, b| a.name.cmp(&b.name));
        AnnotationInstance {
            name,
            target: target.map(Box::new),
            values,
        }
    }

    /// A copy of this instance with a different (or no) target. Values keep
    /// their existing order.
    pub fn with_target(&self, target: Option<AnnotationTarget>) -> AnnotationInstance {
        AnnotationInstance {
            name: self.name.clone(),
            target: target.map(Box::new),
            values: self.values.clone(),
        }
    }

    pub fn target(&self) -> Option<&AnnotationTarget> {
        self.target.as_deref()
    }

    pub fn values(&self) -> &[AnnotationValue] {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&AnnotationValue> {
        self.values
            .binary_search_by(|v| (*v.name).cmp(name))
            .ok()
            .map(|i| &self.values[i])
    }
}

/// A single named member of an annotation instance. Array elements carry an
/// empty name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationValue {
    pub name: Arc<str>,
    pub value: Value,
}

impl AnnotationValue {
    pub fn new(name: Arc<str>, value: Value) -> AnnotationValue {
        AnnotationValue { name, value }
    }
}

/// The payload of an annotation member.
#[derive(Debug, Clone)]
pub enum Value {
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(Arc<str>),
    /// Enum constant: the enum type plus the constant's name.
    Enum { type_name: DotName, constant: Arc<str> },
    /// Class literal.
    Class(Arc<Type>),
    Nested(Arc<AnnotationInstance>),
    /// Homogeneous array. The component kind is derived from the first
    /// element and is [`ValueKind::Unknown`] only when the array is empty.
    Array(Vec<AnnotationValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    String,
    Enum,
    Class,
    Nested,
    Array,
    Unknown,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Byte(_) => ValueKind::Byte,
            Value::Char(_) => ValueKind::Char,
            Value::Short(_) => ValueKind::Short,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::String(_) => ValueKind::String,
            Value::Enum { .. } => ValueKind::Enum,
            Value::Class(_) => ValueKind::Class,
            Value::Nested(_) => ValueKind::Nested,
            Value::Array(_) => ValueKind::Array,
        }
    }

    /// Component kind of an array value, `Unknown` for an empty array.
    pub fn component_kind(&self) -> Option<ValueKind> {
        match self {
            Value::Array(elements) => Some(
                elements
                    .first()
                    .map(|e| e.value.kind())
                    .unwrap_or(ValueKind::Unknown),
            ),
            _ => None,
        }
    }
}

// Floating-point members compare and hash by bit pattern so annotation
// values can be interned and used as map keys.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Byte(a), Byte(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (Boolean(a), Boolean(b)) => a == b,
            (String(a), String(b)) => a == b,
            (
                Enum {
                    type_name: ta,
                    constant: ca,
                },
                Enum {
                    type_name: tb,
                    constant: cb,
                },
            ) => ta == tb && ca == cb,
            (Class(a), Class(b)) => a == b,
            (Nested(a), Nested(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Byte(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::Short(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::Boolean(v) => v.hash(state),
            Value::String(v) => v.hash(state),
            Value::Enum {
                type_name,
                constant,
            } => {
                type_name.hash(state);
                constant.hash(state);
            }
            Value::Class(v) => v.hash(state),
            Value::Nested(v) => v.hash(state),
            Value::Array(v) => v.hash(state),
        }
    }
}

/// Where an annotation was declared. Targets are value-level references
/// (class name plus member name/position), so records and annotation
/// instances never form reference cycles; resolve them against an `Index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationTarget {
    Class(DotName),
    Field(FieldRef),
    Method(MethodRef),
    MethodParameter { method: MethodRef, position: u8 },
    RecordComponent(RecordComponentRef),
    TypeUse(TypeUseTarget),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub class: DotName,
    pub name: Arc<str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub class: DotName,
    pub name: Arc<str>,
    /// Position of the method in its class's method list; disambiguates
    /// overloads.
    pub position: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordComponentRef {
    pub class: DotName,
    pub name: Arc<str>,
}

/// A type-use annotation target: the member the annotation was found on, the
/// resolved type node it decorates, and how that type is being used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeUseTarget {
    pub enclosing: EnclosingTarget,
    /// The annotated node of the rebuilt type tree. The Void sentinel when
    /// the annotation's path could not be applied (e.g. a bridge method whose
    /// generic signature was elided).
    pub ty: Arc<Type>,
    pub usage: TypeUsage,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnclosingTarget {
    Class(DotName),
    Field(FieldRef),
    Method(MethodRef),
    RecordComponent(RecordComponentRef),
}

/// How an annotated type is used at its target site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeUsage {
    /// A bare type use: field type, record component type, method return.
    Empty,
    Receiver,
    /// Superclass (position 65535) or implemented interface (position =
    /// interface index).
    ClassExtends { position: u16 },
    MethodParameter { position: u16 },
    TypeParameter { position: u16 },
    TypeParameterBound { position: u16, bound: u16 },
    Throws { position: u16 },
}

impl AnnotationTarget {
    /// The class the annotated element belongs to.
    pub fn class_name(&self) -> &DotName {
        match self {
            AnnotationTarget::Class(name) => name,
            AnnotationTarget::Field(f) => &f.class,
            AnnotationTarget::Method(m) => &m.class,
            AnnotationTarget::MethodParameter { method, .. } => &method.class,
            AnnotationTarget::RecordComponent(r) => &r.class,
            AnnotationTarget::TypeUse(t) => t.enclosing.class_name(),
        }
    }
}

impl EnclosingTarget {
    pub fn class_name(&self) -> &DotName {
        match self {
            EnclosingTarget::Class(name) => name,
            EnclosingTarget::Field(f) => &f.class,
            EnclosingTarget::Method(m) => &m.class,
            EnclosingTarget::RecordComponent(r) => &r.class,
        }
    }
}
