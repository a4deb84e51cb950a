use std::collections::HashMap;
use std::sync::Arc;

use crate::annotation::AnnotationInstance;
use crate::class_info::ClassInfo;
use crate::name::DotName;

/// The completed, immutable annotation index.
///
/// Built once by `Indexer::complete` (or a codec reader) and read-only
/// afterwards; it contains no interior mutability, so arbitrarily many
/// threads may query it concurrently without synchronization.
#[derive(Debug, Default)]
pub struct Index {
    annotations: HashMap<DotName, Vec<AnnotationInstance>>,
    subclasses: HashMap<DotName, Vec<Arc<ClassInfo>>>,
    implementors: HashMap<DotName, Vec<Arc<ClassInfo>>>,
    classes: HashMap<DotName, Arc<ClassInfo>>,
}

impl Index {
    /// Assembles an index from finalized maps. Used by the indexer's
    /// completion step and by the binary readers.
    pub fn create(
        annotations: HashMap<DotName, Vec<AnnotationInstance>>,
        subclasses: HashMap<DotName, Vec<Arc<ClassInfo>>>,
        implementors: HashMap<DotName, Vec<Arc<ClassInfo>>>,
        classes: HashMap<DotName, Arc<ClassInfo>>,
    ) -> Index {
        Index {
            annotations,
            subclasses,
            implementors,
            classes,
        }
    }

    /// Every usage of the named annotation, wherever it appeared.
    pub fn annotations_of(&self, name: &DotName) -> &[AnnotationInstance] {
        self.annotations.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn annotation_names(&self) -> impl Iterator<Item = &DotName> {
        self.annotations.keys()
    }

    /// Classes whose direct superclass is the named class.
    pub fn subclasses_of(&self, name: &DotName) -> &[Arc<ClassInfo>] {
        self.subclasses.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Classes that directly implement the named interface.
    pub fn implementors_of(&self, name: &DotName) -> &[Arc<ClassInfo>] {
        self.implementors
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn class_by_name(&self, name: &DotName) -> Option<&Arc<ClassInfo>> {
        self.classes.get(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassInfo>> {
        self.classes.values()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn annotation_name_count(&self) -> usize {
        self.annotations.len()
    }

    pub fn subclass_entry_count(&self) -> usize {
        self.subclasses.len()
    }

    pub fn implementor_entry_count(&self) -> usize {
        self.implementors.len()
    }

    pub fn superclass_names(&self) -> impl Iterator<Item = &DotName> {
        self.subclasses.keys()
    }

    pub fn interface_names(&self) -> impl Iterator<Item = &DotName> {
        self.implementors.keys()
    }
}
