use std::collections::BTreeMap;
use std::sync::Arc;

use crate::annotation::AnnotationInstance;
use crate::annotation::AnnotationValue;
use crate::name::DotName;
use crate::types::Type;

/// JVM access flag masks used by the index.
pub mod flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_BRIDGE: u16 = 0x0040;
    pub const ACC_VARARGS: u16 = 0x0080;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub name: Arc<str>,
    pub flags: u16,
    /// Declared type; signature-derived when a generic signature is present.
    pub ty: Arc<Type>,
    pub annotations: Vec<AnnotationInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordComponentInfo {
    pub name: Arc<str>,
    pub ty: Arc<Type>,
    pub annotations: Vec<AnnotationInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodInfo {
    pub name: Arc<str>,
    pub flags: u16,
    pub type_parameters: Vec<Arc<Type>>,
    pub parameters: Vec<Arc<Type>>,
    pub return_type: Arc<Type>,
    pub exceptions: Vec<Arc<Type>>,
    /// Present only when a receiver type use carries annotations.
    pub receiver_type: Option<Arc<Type>>,
    /// From the MethodParameters attribute; empty when absent.
    pub parameter_names: Vec<Option<Arc<str>>>,
    /// From the AnnotationDefault attribute of annotation-type members.
    pub default_value: Option<AnnotationValue>,
    /// Annotations declared directly on the method, its parameters, and its
    /// type uses.
    pub annotations: Vec<AnnotationInstance>,
}

impl MethodInfo {
    pub fn is_static(&self) -> bool {
        self.flags & flags::ACC_STATIC != 0
    }

    pub fn is_bridge(&self) -> bool {
        self.flags & flags::ACC_BRIDGE != 0
    }

    pub fn is_synthetic(&self) -> bool {
        self.flags & flags::ACC_SYNTHETIC != 0
    }

    pub fn is_constructor(&self) -> bool {
        &*self.name == "<init>"
    }
}

/// Classification of a class's lexical position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NestingKind {
    Top,
    Inner,
    Local,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosingMethod {
    pub class: DotName,
    pub name: Arc<str>,
    pub parameters: Vec<Arc<Type>>,
    pub return_type: Arc<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestingInfo {
    pub kind: NestingKind,
    pub enclosing_class: Option<DotName>,
    /// Source simple name; absent for anonymous classes.
    pub simple_name: Option<Arc<str>>,
    pub enclosing_method: Option<EnclosingMethod>,
}

impl Default for NestingInfo {
    fn default() -> Self {
        NestingInfo {
            kind: NestingKind::Top,
            enclosing_class: None,
            simple_name: None,
            enclosing_method: None,
        }
    }
}

/// Everything the index records about one class. Immutable; built by the
/// indexer (or the codec reader) and only ever handed out behind `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub name: DotName,
    pub flags: u16,
    /// Signature-derived when present; `None` only for `java.lang.Object`
    /// and module-info classes.
    pub super_type: Option<Arc<Type>>,
    pub interface_types: Vec<Arc<Type>>,
    pub type_parameters: Vec<Arc<Type>>,
    pub fields: Vec<Arc<FieldInfo>>,
    pub methods: Vec<Arc<MethodInfo>>,
    pub record_components: Vec<Arc<RecordComponentInfo>>,
    /// Every annotation declared anywhere in this class (class, members,
    /// parameters, type uses), keyed by annotation name.
    pub annotations: BTreeMap<DotName, Vec<AnnotationInstance>>,
    pub nesting: NestingInfo,
    pub has_no_args_constructor: bool,
}

impl ClassInfo {
    pub fn super_name(&self) -> Option<DotName> {
        self.super_type.as_ref().map(|t| t.name())
    }

    pub fn interface_names(&self) -> impl Iterator<Item = DotName> + '_ {
        self.interface_types.iter().map(|t| t.name())
    }

    pub fn field(&self, name: &str) -> Option<&Arc<FieldInfo>> {
        self.fields.iter().find(|f| &*f.name == name)
    }

    /// First method with the given name; use [`ClassInfo::method_at`] to
    /// disambiguate overloads by position.
    pub fn method(&self, name: &str) -> Option<&Arc<MethodInfo>> {
        self.methods.iter().find(|m| &*m.name == name)
    }

    pub fn method_at(&self, position: u16) -> Option<&Arc<MethodInfo>> {
        self.methods.get(position as usize)
    }

    pub fn record_component(&self, name: &str) -> Option<&Arc<RecordComponentInfo>> {
        self.record_components.iter().find(|c| &*c.name == name)
    }

    pub fn annotations_of(&self, name: &DotName) -> &[AnnotationInstance] {
        self.annotations.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Annotations attached to the class declaration itself.
    pub fn class_annotations(&self) -> impl Iterator<Item = &AnnotationInstance> {
        self.annotations.values().flatten().filter(|a| {
            matches!(
                a.target(),
                Some(crate::annotation::AnnotationTarget::Class(_))
            )
        })
    }

    pub fn is_interface(&self) -> bool {
        self.flags & flags::ACC_INTERFACE != 0
    }

    pub fn is_annotation_type(&self) -> bool {
        self.flags & flags::ACC_ANNOTATION != 0
    }

    pub fn is_enum(&self) -> bool {
        self.flags & flags::ACC_ENUM != 0
    }
}
