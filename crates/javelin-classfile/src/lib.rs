//! Class-file parsing for the javelin annotation index.
//!
//! The only entry point is [`Indexer`]: it decodes class files directly into
//! the index's data model (no intermediate class-file object graph), applies
//! generic signatures over descriptor-derived types, resolves type-annotation
//! paths, and accumulates the cross-class maps that become the [`Index`]
//! returned by [`Indexer::complete`].
//!
//! [`Index`]: javelin_core::Index

#![forbid(unsafe_code)]

mod constant_pool;
mod descriptor;
mod error;
mod indexer;
mod interners;
mod reader;
mod signature;
mod type_annotation;

pub use crate::error::{Error, Result};
pub use crate::indexer::Indexer;
