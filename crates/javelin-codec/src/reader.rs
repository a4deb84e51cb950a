use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use byteorder::{BigEndian, ReadBytesExt};
use javelin_core::{AnnotationInstance, ClassInfo, DotName, Index};
use tracing::debug;

use crate::error::{Error, Result};
use crate::{reader_current, reader_legacy, MAGIC};

/// Deserializes an [`Index`] from any supported format version.
pub struct IndexReader<R: Read> {
    input: R,
}

impl<R: Read> IndexReader<R> {
    pub fn new(input: R) -> IndexReader<R> {
        IndexReader { input }
    }

    pub fn read(mut self) -> Result<Index> {
        let magic = self.input.read_u32::<BigEndian>()?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }
        let version = self.input.read_u8()?;
        let index = match version {
            1..=3 => reader_legacy::read_index(&mut self.input)?,
            6..=9 => reader_current::read_index(&mut self.input, version)?,
            other => return Err(Error::UnsupportedVersion(other)),
        };
        debug!(version, classes = index.class_count(), "index read");
        Ok(index)
    }
}

/// Rebuilds the derived lookup maps from the class records. The maps are
/// not stored in the file; class records are the single source of truth.
pub(crate) fn build_index(class_list: Vec<Arc<ClassInfo>>) -> Index {
    let mut annotations: HashMap<DotName, Vec<AnnotationInstance>> = HashMap::new();
    let mut subclasses: HashMap<DotName, Vec<Arc<ClassInfo>>> = HashMap::new();
    let mut implementors: HashMap<DotName, Vec<Arc<ClassInfo>>> = HashMap::new();
    let mut classes: HashMap<DotName, Arc<ClassInfo>> = HashMap::new();

    for class in class_list {
        if let Some(super_name) = class.super_name() {
            subclasses.entry(super_name).or_default().push(class.clone());
        }
        for interface in class.interface_names() {
            implementors.entry(interface).or_default().push(class.clone());
        }
        for (name, instances) in &class.annotations {
            annotations
                .entry(name.clone())
                .or_default()
                .extend(instances.iter().cloned());
        }
        classes.insert(class.name.clone(), class);
    }
    Index::create(annotations, subclasses, implementors, classes)
}
