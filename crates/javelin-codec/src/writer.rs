use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use javelin_core::Index;
use tracing::debug;

use crate::error::{Error, Result};
use crate::packed::CountingWriter;
use crate::{writer_current, writer_legacy, MAGIC};

/// Serializes an [`Index`] into one of the supported format versions.
pub struct IndexWriter<W: Write> {
    out: W,
}

impl<W: Write> IndexWriter<W> {
    pub fn new(out: W) -> IndexWriter<W> {
        IndexWriter { out }
    }

    /// Writes the index and returns the number of bytes produced. The
    /// version is checked before anything reaches the output.
    pub fn write(self, index: &Index, version: u8) -> Result<usize> {
        if !matches!(version, 1..=3 | 6..=9) {
            return Err(Error::UnsupportedVersion(version));
        }
        let mut out = CountingWriter::new(self.out);
        out.write_u32::<BigEndian>(MAGIC)?;
        out.write_u8(version)?;
        match version {
            1..=3 => writer_legacy::write_index(&mut out, index)?,
            _ => writer_current::write_index(&mut out, index, version)?,
        }
        out.flush()?;
        debug!(version, bytes = out.written(), classes = index.class_count(), "index written");
        Ok(out.written())
    }
}
