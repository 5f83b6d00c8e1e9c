//! Central database of all source files in a compilation session.

use crate::file_id::FileId;
use crate::span::{ResolvedSpan, Span};
use std::io;
use std::path::{Path, PathBuf};

/// A source file loaded into the compilation session.
///
/// Stores the file's content along with precomputed line-start offsets for
/// efficient line/column resolution during diagnostic rendering.
pub struct SourceFile {
    /// The unique identifier for this file within the [`SourceDb`].
    pub id: FileId,
    /// The filesystem path of this file (or a synthetic name for in-memory
    /// sources).
    pub path: PathBuf,
    /// The full text content of the file.
    pub content: String,
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(id: FileId, path: PathBuf, content: String) -> Self {
        let line_starts = compute_line_starts(&content);
        Self {
            id,
            path,
            content,
            line_starts,
        }
    }

    /// Converts a byte offset into 1-indexed (line, column) coordinates.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line = (line_idx as u32) + 1;
        let col = byte_offset - self.line_starts[line_idx] + 1;
        (line, col)
    }
}

/// The source database, owning all loaded source text and resolving
/// [`FileId`] + byte offsets to line/column coordinates for diagnostics.
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty source database.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Loads a source file from the filesystem and returns its [`FileId`].
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.add_source(path.to_path_buf(), content))
    }

    /// Adds a source file from an in-memory string (useful for tests).
    ///
    /// The `name` parameter is used as the file path in diagnostics.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(SourceFile::new(id, name.into(), content));
        id
    }

    /// Returns the [`SourceFile`] for the given [`FileId`].
    ///
    /// # Panics
    ///
    /// Panics if the `FileId` is invalid.
    pub fn get_file(&self, id: FileId) -> &SourceFile {
        &self.files[id.as_raw() as usize]
    }

    /// Resolves a [`Span`] to human-readable line/column coordinates.
    ///
    /// Dummy spans resolve to `<unknown>:0:0`.
    pub fn resolve_span(&self, span: Span) -> ResolvedSpan {
        if span.is_dummy() {
            return ResolvedSpan {
                file_path: PathBuf::from("<unknown>"),
                start_line: 0,
                start_col: 0,
            };
        }
        let file = self.get_file(span.file);
        let (start_line, start_col) = file.line_col(span.start);
        ResolvedSpan {
            file_path: file.path.clone(),
            start_line,
            start_col,
        }
    }
}

impl Default for SourceDb {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the byte offsets of each line start in the given content.
fn compute_line_starts(content: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get() {
        let mut db = SourceDb::new();
        let id = db.add_source("dff.v", "module dff;".to_string());
        assert_eq!(db.get_file(id).content, "module dff;");
    }

    #[test]
    fn line_col_resolution() {
        let mut db = SourceDb::new();
        let id = db.add_source("t.v", "abc\ndef\nghi".to_string());
        let file = db.get_file(id);
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(4), (2, 1));
        assert_eq!(file.line_col(5), (2, 2));
        assert_eq!(file.line_col(8), (3, 1));
    }

    #[test]
    fn resolve_span() {
        let mut db = SourceDb::new();
        let id = db.add_source("t.v", "abc\ndef\nghi".to_string());
        let resolved = db.resolve_span(Span::new(id, 4, 7));
        assert_eq!(resolved.file_path, PathBuf::from("t.v"));
        assert_eq!(resolved.start_line, 2);
        assert_eq!(resolved.start_col, 1);
    }

    #[test]
    fn resolve_dummy_span() {
        let db = SourceDb::new();
        let resolved = db.resolve_span(Span::DUMMY);
        assert_eq!(resolved.file_path, PathBuf::from("<unknown>"));
        assert_eq!(resolved.start_line, 0);
    }

    #[test]
    fn multiple_files() {
        let mut db = SourceDb::new();
        let id1 = db.add_source("a.v", "file one".to_string());
        let id2 = db.add_source("b.v", "file two".to_string());
        assert_ne!(id1, id2);
        assert_eq!(db.get_file(id1).content, "file one");
        assert_eq!(db.get_file(id2).content, "file two");
    }

    #[test]
    fn empty_file() {
        let mut db = SourceDb::new();
        let id = db.add_source("empty.v", String::new());
        assert_eq!(db.get_file(id).line_col(0), (1, 1));
    }
}
