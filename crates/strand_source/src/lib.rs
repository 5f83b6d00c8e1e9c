//! Source file management and span tracking for diagnostics.
//!
//! This crate provides the [`SourceDb`] for loading and managing source files,
//! the [`FileId`] and [`Span`] types that netlist objects carry to point back
//! at the HDL text they were elaborated from, and [`ResolvedSpan`] for
//! converting byte offsets to human-readable line/column coordinates.

#![warn(missing_docs)]

pub mod file_id;
pub mod source_db;
pub mod span;

pub use file_id::FileId;
pub use source_db::{SourceDb, SourceFile};
pub use span::{ResolvedSpan, Span};
