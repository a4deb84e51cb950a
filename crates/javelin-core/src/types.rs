use std::fmt;
use std::sync::Arc;

use crate::annotation::AnnotationInstance;
use crate::name::{well_known, DotName};

/// The eight JVM primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Byte = 0,
    Char = 1,
    Double = 2,
    Float = 3,
    Int = 4,
    Long = 5,
    Short = 6,
    Boolean = 7,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Double => "double",
            Primitive::Float => "float",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Short => "short",
            Primitive::Boolean => "boolean",
        }
    }

    pub fn descriptor(self) -> u8 {
        match self {
            Primitive::Byte => b'B',
            Primitive::Char => b'C',
            Primitive::Double => b'D',
            Primitive::Float => b'F',
            Primitive::Int => b'I',
            Primitive::Long => b'J',
            Primitive::Short => b'S',
            Primitive::Boolean => b'Z',
        }
    }

    pub fn from_descriptor(c: u8) -> Option<Primitive> {
        Some(match c {
            b'B' => Primitive::Byte,
            b'C' => Primitive::Char,
            b'D' => Primitive::Double,
            b'F' => Primitive::Float,
            b'I' => Primitive::Int,
            b'J' => Primitive::Long,
            b'S' => Primitive::Short,
            b'Z' => Primitive::Boolean,
            _ => return None,
        })
    }

    /// Inverse of `p as u8`; used by the binary codec.
    pub fn from_index(i: u8) -> Option<Primitive> {
        Some(match i {
            0 => Primitive::Byte,
            1 => Primitive::Char,
            2 => Primitive::Double,
            3 => Primitive::Float,
            4 => Primitive::Int,
            5 => Primitive::Long,
            6 => Primitive::Short,
            7 => Primitive::Boolean,
            _ => return None,
        })
    }
}

/// One use of a type. The set of variants is closed and mirrors what the
/// class-file format can express. Every variant carries the annotation
/// instances attached directly to this type use.
///
/// Types are immutable once built; "modifying" one produces a new instance
/// that shares all unrelated children with the original.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Class(ClassType),
    Parameterized(ParameterizedType),
    Array(ArrayType),
    Primitive(PrimitiveType),
    Void(VoidType),
    TypeVariable(TypeVariable),
    UnresolvedTypeVariable(UnresolvedTypeVariable),
    Wildcard(WildcardType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Parameterized,
    Array,
    Primitive,
    Void,
    TypeVariable,
    UnresolvedTypeVariable,
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub name: DotName,
    pub annotations: Vec<AnnotationInstance>,
}

/// A generic type with its argument list and, for non-static inner classes of
/// a parameterized (or annotated) enclosing type, the owner type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterizedType {
    /// The raw (erased) name, dollar-separated for inner classes.
    pub name: DotName,
    pub arguments: Vec<Arc<Type>>,
    pub owner: Option<Arc<Type>>,
    pub annotations: Vec<AnnotationInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub component: Arc<Type>,
    pub dimensions: u8,
    pub annotations: Vec<AnnotationInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimitiveType {
    pub primitive: Primitive,
    pub annotations: Vec<AnnotationInstance>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VoidType {
    pub annotations: Vec<AnnotationInstance>,
}

/// A resolved type variable. An identifier-only instance (empty bound list)
/// is also how a self-referential bound (`T extends Comparable<T>`) refers
/// back to the variable being defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    pub identifier: Arc<str>,
    pub bounds: Vec<Arc<Type>>,
    pub annotations: Vec<AnnotationInstance>,
}

/// A type variable whose declaration could not be found in scope. Only
/// produced for malformed input or compiler-elided generic data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnresolvedTypeVariable {
    pub identifier: Arc<str>,
    pub annotations: Vec<AnnotationInstance>,
}

/// `? extends X` (`extends` true), `? super X` (`extends` false), or the
/// unbounded `?` (`extends` true, no bound).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardType {
    pub extends: bool,
    pub bound: Option<Arc<Type>>,
    pub annotations: Vec<AnnotationInstance>,
}

impl Type {
    pub fn class(name: DotName) -> Type {
        Type::Class(ClassType {
            name,
            annotations: Vec::new(),
        })
    }

    pub fn primitive(primitive: Primitive) -> Type {
        Type::Primitive(PrimitiveType {
            primitive,
            annotations: Vec::new(),
        })
    }

    pub fn void() -> Type {
        Type::Void(VoidType::default())
    }

    pub fn array(component: Arc<Type>, dimensions: u8) -> Type {
        Type::Array(ArrayType {
            component,
            dimensions,
            annotations: Vec::new(),
        })
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Type::Class(_) => TypeKind::Class,
            Type::Parameterized(_) => TypeKind::Parameterized,
            Type::Array(_) => TypeKind::Array,
            Type::Primitive(_) => TypeKind::Primitive,
            Type::Void(_) => TypeKind::Void,
            Type::TypeVariable(_) => TypeKind::TypeVariable,
            Type::UnresolvedTypeVariable(_) => TypeKind::UnresolvedTypeVariable,
            Type::Wildcard(_) => TypeKind::Wildcard,
        }
    }

    /// The erased name of this type use.
    pub fn name(&self) -> DotName {
        match self {
            Type::Class(t) => t.name.clone(),
            Type::Parameterized(t) => t.name.clone(),
            Type::Array(t) => {
                let mut s = String::new();
                for _ in 0..t.dimensions {
                    s.push('[');
                }
                match &*t.component {
                    Type::Primitive(p) => s.push(p.primitive.descriptor() as char),
                    other => {
                        s.push('L');
                        s.push_str(&other.name().to_string());
                        s.push(';');
                    }
                }
                DotName::simple(s)
            }
            Type::Primitive(t) => well_known::primitive(t.primitive),
            Type::Void(_) => well_known::void(),
            Type::TypeVariable(t) => t
                .bounds
                .first()
                .map(|b| b.name())
                .unwrap_or_else(well_known::object),
            Type::UnresolvedTypeVariable(t) => DotName::simple(&*t.identifier),
            Type::Wildcard(t) => match (&t.bound, t.extends) {
                (Some(b), true) => b.name(),
                _ => well_known::object(),
            },
        }
    }

    pub fn annotations(&self) -> &[AnnotationInstance] {
        match self {
            Type::Class(t) => &t.annotations,
            Type::Parameterized(t) => &t.annotations,
            Type::Array(t) => &t.annotations,
            Type::Primitive(t) => &t.annotations,
            Type::Void(t) => &t.annotations,
            Type::TypeVariable(t) => &t.annotations,
            Type::UnresolvedTypeVariable(t) => &t.annotations,
            Type::Wildcard(t) => &t.annotations,
        }
    }

    pub fn annotation(&self, name: &DotName) -> Option<&AnnotationInstance> {
        self.annotations().iter().find(|a| &a.name == name)
    }

    pub fn has_annotation(&self, name: &DotName) -> bool {
        self.annotation(name).is_some()
    }

    /// Copies this type with one more annotation attached to the use itself.
    pub fn with_added_annotation(&self, annotation: AnnotationInstance) -> Type {
        let mut copy = self.clone();
        let annotations = match &mut copy {
            Type::Class(t) => &mut t.annotations,
            Type::Parameterized(t) => &mut t.annotations,
            Type::Array(t) => &mut t.annotations,
            Type::Primitive(t) => &mut t.annotations,
            Type::Void(t) => &mut t.annotations,
            Type::TypeVariable(t) => &mut t.annotations,
            Type::UnresolvedTypeVariable(t) => &mut t.annotations,
            Type::Wildcard(t) => &mut t.annotations,
        };
        annotations.push(annotation);
        copy
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ann in self.annotations() {
            write!(f, "@{} ", ann.name)?;
        }
        match self {
            Type::Class(t) => write!(f, "{}", t.name),
            Type::Parameterized(t) => {
                if let Some(owner) = &t.owner {
                    write!(f, "{}.{}", owner, t.name.local())?;
                } else {
                    write!(f, "{}", t.name)?;
                }
                if !t.arguments.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in t.arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Type::Array(t) => {
                write!(f, "{}", t.component)?;
                for _ in 0..t.dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            Type::Primitive(t) => f.write_str(t.primitive.name()),
            Type::Void(_) => f.write_str("void"),
            Type::TypeVariable(t) => f.write_str(&t.identifier),
            Type::UnresolvedTypeVariable(t) => f.write_str(&t.identifier),
            Type::Wildcard(t) => match (&t.bound, t.extends) {
                (None, _) => f.write_str("?"),
                (Some(b), true) => write!(f, "? extends {b}"),
                (Some(b), false) => write!(f, "? super {b}"),
            },
        }
    }
}
