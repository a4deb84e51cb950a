//! Binary serialization for [`javelin_core::Index`].
//!
//! An index file starts with a four-byte magic and a one-byte format
//! version. Two containers are supported: the flat layout of versions 1
//! through 3, kept for reading old files, and the cross-referenced layout of
//! versions 6 through 9, which pools names, types, and annotation instances
//! and reconstructs the lookup maps from the class records on read.

#![forbid(unsafe_code)]

mod error;
mod packed;
mod reader;
mod reader_current;
mod reader_legacy;
mod tags;
mod writer;
mod writer_current;
mod writer_legacy;

pub use error::{Error, Result};
pub use reader::IndexReader;
pub use writer::IndexWriter;

pub const MAGIC: u32 = 0xBABE_1F15;

/// The version new files should be written with.
pub const CURRENT_VERSION: u8 = 9;
