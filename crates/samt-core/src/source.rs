//! Source file registry types.

use serde::Serialize;

/// Stable handle for a registered source file.
///
/// Assigned by the [`DiagnosticController`](crate::DiagnosticController) in
/// registration order; locations refer to their file through this id rather
/// than through an owning reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceId(pub u32);

impl SourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A source file: URI-like path and full text content. Owned by the
/// diagnostic controller for the duration of a run.
#[derive(Debug)]
pub struct SourceFile {
    id: SourceId,
    path: String,
    content: String,
}

impl SourceFile {
    pub fn new(id: SourceId, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
