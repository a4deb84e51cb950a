//! Shared data model for the javelin annotation index: hierarchical names,
//! the interning subsystem, type trees, annotation instances and targets,
//! class/method/field records, and the immutable [`Index`] aggregate.

#![forbid(unsafe_code)]

mod annotation;
mod class_info;
mod index;
mod intern;
mod name;
mod types;

pub use crate::annotation::{
    AnnotationInstance, AnnotationTarget, AnnotationValue, EnclosingTarget, FieldRef, MethodRef,
    RecordComponentRef, TypeUsage, TypeUseTarget, Value, ValueKind,
};
pub use crate::class_info::{
    flags, ClassInfo, EnclosingMethod, FieldInfo, MethodInfo, NestingInfo, NestingKind,
    RecordComponentInfo,
};
pub use crate::index::Index;
pub use crate::intern::{InternPool, PoolIndex};
pub use crate::name::{well_known, DotName, NameTable};
pub use crate::types::{
    ArrayType, ClassType, ParameterizedType, Primitive, PrimitiveType, Type, TypeKind,
    TypeVariable, UnresolvedTypeVariable, VoidType, WildcardType,
};
