use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::OnceLock;

use crate::intern::InternPool;

/// A hierarchical class or package name.
///
/// A `DotName` is either *simple* (one flat string holding the entire dotted
/// name) or *componentized* (a chain of parent links, one segment per level,
/// where each link records whether it crosses a package/member dot or an
/// inner-class dollar). Both representations of the same logical name compare
/// equal, hash equal, and order identically; comparisons walk the expanded
/// character sequence without ever materializing it.
#[derive(Clone)]
pub struct DotName {
    data: Arc<NameData>,
}

#[derive(Debug)]
struct NameData {
    prefix: Option<DotName>,
    local: Box<str>,
    inner_class: bool,
    componentized: bool,
}

impl DotName {
    /// Creates a simple (flat) name. The string may contain `.` and `$`
    /// separators; they are compared as ordinary characters.
    pub fn simple(name: impl Into<Box<str>>) -> DotName {
        DotName {
            data: Arc::new(NameData {
                prefix: None,
                local: name.into(),
                inner_class: false,
                componentized: false,
            }),
        }
    }

    /// Creates a componentized name. The prefix, when present, must itself be
    /// componentized.
    pub fn component(prefix: Option<&DotName>, local: impl Into<Box<str>>, inner_class: bool) -> DotName {
        if let Some(p) = prefix {
            assert!(
                p.is_componentized(),
                "prefix of a componentized name must be componentized"
            );
        }
        DotName {
            data: Arc::new(NameData {
                prefix: prefix.cloned(),
                local: local.into(),
                inner_class,
                componentized: true,
            }),
        }
    }

    /// The last segment for componentized names, the whole string otherwise.
    pub fn local(&self) -> &str {
        &self.data.local
    }

    pub fn prefix(&self) -> Option<&DotName> {
        self.data.prefix.as_ref()
    }

    pub fn is_componentized(&self) -> bool {
        self.data.componentized
    }

    /// Whether this segment is attached to its prefix with a `$` separator.
    pub fn is_inner_class(&self) -> bool {
        self.data.inner_class
    }

    /// Number of ancestors in the component chain (0 for simple names and
    /// chain roots).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cur = self.prefix();
        while let Some(p) = cur {
            depth += 1;
            cur = p.prefix();
        }
        depth
    }

    fn segments(&self) -> Vec<(u8, &str)> {
        // Root-to-leaf order; the byte is the separator preceding the
        // segment, 0 for the root.
        let mut segs = Vec::new();
        let mut cur = Some(self);
        while let Some(name) = cur {
            let sep = match name.prefix() {
                Some(_) => {
                    if name.data.inner_class {
                        b'$'
                    } else {
                        b'.'
                    }
                }
                None => 0,
            };
            segs.push((sep, name.local()));
            cur = name.prefix();
        }
        segs.reverse();
        segs
    }

    fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.segments().into_iter().flat_map(|(sep, local)| {
            let lead = if sep == 0 { None } else { Some(sep) };
            lead.into_iter().chain(local.bytes())
        })
    }

    /// Total expanded length in bytes, separators included.
    pub fn expanded_len(&self) -> usize {
        let mut len = 0;
        for (sep, local) in self.segments() {
            if sep != 0 {
                len += 1;
            }
            len += local.len();
        }
        len
    }
}

impl PartialEq for DotName {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.data, &other.data) {
            return true;
        }
        self.bytes().eq(other.bytes())
    }
}

impl Eq for DotName {}

impl Hash for DotName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.bytes() {
            state.write_u8(b);
        }
        state.write_usize(self.expanded_len());
    }
}

impl PartialOrd for DotName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DotName {
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.data, &other.data) {
            return Ordering::Equal;
        }
        self.bytes().cmp(other.bytes())
    }
}

impl fmt::Display for DotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (sep, local) in self.segments() {
            if sep != 0 {
                write!(f, "{}", sep as char)?;
            }
            f.write_str(local)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DotName({self})")
    }
}

/// Builds componentized, interned names from the delimited forms found in
/// class files: `java/util/Map$Entry` (internal) or `java.util.Map$Entry`
/// (dotted). Every intermediate level is interned, so equal names and equal
/// prefixes share one instance each.
#[derive(Debug, Default)]
pub struct NameTable {
    pool: InternPool<DotName>,
}

impl NameTable {
    pub fn new() -> NameTable {
        NameTable {
            pool: InternPool::new(),
        }
    }

    pub fn intern(&mut self, name: DotName) -> DotName {
        self.pool.intern(name)
    }

    /// Interns a slash-delimited internal name, e.g. `java/util/Map$Entry`.
    pub fn intern_internal(&mut self, name: &str) -> DotName {
        self.build(name, b'/')
    }

    /// Interns a dot-delimited source-form name, e.g. `java.util.Map$Entry`.
    pub fn intern_dotted(&mut self, name: &str) -> DotName {
        self.build(name, b'.')
    }

    pub fn pool(&mut self) -> &mut InternPool<DotName> {
        &mut self.pool
    }

    fn build(&mut self, s: &str, package_sep: u8) -> DotName {
        let bytes = s.as_bytes();
        let mut name: Option<DotName> = None;
        let mut pending_inner = false;
        let mut start = 0usize;
        for (i, &c) in bytes.iter().enumerate() {
            // A separator with an empty segment on its left (leading `$`,
            // doubled separators) is kept as part of the segment text.
            if (c == package_sep || c == b'$') && i > start {
                let seg = DotName::component(name.as_ref(), &s[start..i], pending_inner);
                name = Some(self.pool.intern(seg));
                pending_inner = c == b'$';
                start = i + 1;
            }
        }
        let seg = DotName::component(name.as_ref(), &s[start..], pending_inner);
        self.pool.intern(seg)
    }
}

/// Process-wide well-known names, initialized once on first use.
pub mod well_known {
    use super::{DotName, OnceLock};
    use crate::types::Primitive;

    macro_rules! known_name {
        ($fn_name:ident, $name:expr) => {
            pub fn $fn_name() -> DotName {
                static CELL: OnceLock<DotName> = OnceLock::new();
                CELL.get_or_init(|| DotName::simple($name)).clone()
            }
        };
    }

    known_name!(object, "java.lang.Object");
    known_name!(enum_name, "java.lang.Enum");
    known_name!(record_name, "java.lang.Record");

    /// The boxed counterpart of a primitive type.
    pub fn boxed(primitive: Primitive) -> DotName {
        static CELLS: OnceLock<[DotName; 8]> = OnceLock::new();
        let cells = CELLS.get_or_init(|| {
            [
                DotName::simple("java.lang.Byte"),
                DotName::simple("java.lang.Character"),
                DotName::simple("java.lang.Double"),
                DotName::simple("java.lang.Float"),
                DotName::simple("java.lang.Integer"),
                DotName::simple("java.lang.Long"),
                DotName::simple("java.lang.Short"),
                DotName::simple("java.lang.Boolean"),
            ]
        });
        cells[primitive as usize].clone()
    }

    pub fn primitive(primitive: Primitive) -> DotName {
        static CELLS: OnceLock<[DotName; 8]> = OnceLock::new();
        let cells = CELLS.get_or_init(|| {
            [
                DotName::simple("byte"),
                DotName::simple("char"),
                DotName::simple("double"),
                DotName::simple("float"),
                DotName::simple("int"),
                DotName::simple("long"),
                DotName::simple("short"),
                DotName::simple("boolean"),
            ]
        });
        cells[primitive as usize].clone()
    }

    pub fn void() -> DotName {
        static CELL: OnceLock<DotName> = OnceLock::new();
        CELL.get_or_init(|| DotName::simple("void")).clone()
    }
}
