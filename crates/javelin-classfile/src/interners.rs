use std::sync::Arc;

use javelin_core::{DotName, InternPool, NameTable, Type};

/// The canonicalizing pools an indexer threads through parsing. Everything a
/// produced class record points at (names, identifier strings, type trees,
/// type lists) goes through here, so structurally equal values collapse to
/// one shared instance per indexing run.
#[derive(Debug, Default)]
pub struct Interners {
    pub names: NameTable,
    pub strings: InternPool<Arc<str>>,
    pub types: InternPool<Arc<Type>>,
    pub type_lists: InternPool<Vec<Arc<Type>>>,
}

impl Interners {
    pub fn new() -> Interners {
        Interners::default()
    }

    /// Interns a slash-delimited internal name.
    pub fn name(&mut self, internal: &str) -> DotName {
        self.names.intern_internal(internal)
    }

    pub fn str(&mut self, s: &str) -> Arc<str> {
        self.strings.intern(Arc::from(s))
    }

    pub fn ty(&mut self, ty: Type) -> Arc<Type> {
        self.types.intern(Arc::new(ty))
    }

    pub fn type_list(&mut self, list: Vec<Arc<Type>>) -> Vec<Arc<Type>> {
        self.type_lists.intern(list)
    }
}
