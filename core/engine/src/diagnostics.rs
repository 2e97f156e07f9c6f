//! FILENAME: core/engine/src/diagnostics.rs
//! PURPOSE: Non-fatal warnings reported alongside a successful result.
//! CONTEXT: Ingestion and pivoting keep going on a best-effort basis when
//! they meet duplicate labels, malformed rows or exclusions that never match.
//! Callers own the list, so tests can assert on exactly what was reported.

use serde::{Deserialize, Serialize};

use crate::logging::log_warn;

/// The kind of condition that was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A header label collided with an earlier one and was renamed.
    DuplicateLabel,
    /// A data row had the wrong field count and was dropped.
    MalformedRow,
    /// An excluded value does not occur in its column.
    UnusedExclusion,
}

impl DiagnosticKind {
    fn category(self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateLabel | DiagnosticKind::MalformedRow => "CSV",
            DiagnosticKind::UnusedExclusion => "PIVOT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// An ordered list of warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics { entries: Vec::new() }
    }

    /// Records a warning and forwards it to the `log` facade.
    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log_warn!(kind.category(), "{}", message);
        self.entries.push(Diagnostic { kind, message });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Diagnostic> {
        self.entries.last()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Moves every entry of `other` to the end of this list.
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.entries.append(&mut other.entries);
    }

    pub fn take(&mut self) -> Diagnostics {
        std::mem::take(self)
    }
}
