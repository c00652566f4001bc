use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// What went wrong, independent of the wording of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A weave point label shares its name with an enclosing knot or stitch.
    NamingCollision,
    /// A control path reaches the end of its scope with nowhere to go.
    LooseEnd,
    /// A named divert does not match any knot, stitch or label.
    UnresolvedTarget,
    /// Two knots (or two stitches of one knot) share a name.
    DuplicateScope,
    /// A resolved reference points at a container that is not part of the
    /// story graph. Always a compiler bug.
    DanglingReference,
}

/// A compile diagnostic with source location information.
#[derive(Debug, Clone)]
pub struct CompileDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    /// Other locations involved, each with its own label text.
    pub secondary: Vec<(Range<usize>, String)>,
    pub notes: Vec<String>,
}

impl CompileDiagnostic {
    fn new(
        kind: DiagnosticKind,
        severity: Severity,
        message: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        CompileDiagnostic {
            kind,
            message: message.into(),
            span,
            file_id,
            severity,
            secondary: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(
        kind: DiagnosticKind,
        message: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        Self::new(kind, Severity::Error, message, span, file_id)
    }

    pub fn warning(
        kind: DiagnosticKind,
        message: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        Self::new(kind, Severity::Warning, message, span, file_id)
    }

    pub fn bug(
        kind: DiagnosticKind,
        message: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        Self::new(kind, Severity::Bug, message, span, file_id)
    }

    pub fn with_secondary(mut self, span: Range<usize>, label: impl Into<String>) -> Self {
        self.secondary.push((span, label.into()));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Bug)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning)
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut labels = vec![Label::primary(self.file_id, self.span.clone())];
        for (span, label) in &self.secondary {
            labels.push(Label::secondary(self.file_id, span.clone()).with_message(label));
        }

        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(labels)
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Where the weave pass sends the problems it finds in a story.
/// Reporting never stops compilation.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: CompileDiagnostic);
}

impl DiagnosticSink for Vec<CompileDiagnostic> {
    fn report(&mut self, diagnostic: CompileDiagnostic) {
        self.push(diagnostic);
    }
}
