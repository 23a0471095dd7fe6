// diag.rs — Unified diagnostics model
//
// Provides the soft diagnostic types raised by the build and verify phases.
// Soft diagnostics never stop a build; fatal scanner-protocol violations are
// a separate error type (`graph::SchemaViolation`).
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::descriptor::Locator;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0100`).
///
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // Build phase
    pub const E0100: DiagCode = DiagCode("E0100"); // unknown operator
    pub const E0101: DiagCode = DiagCode("E0101"); // missing callback
    pub const E0102: DiagCode = DiagCode("E0102"); // callback arity

    // Verify phase
    pub const E0200: DiagCode = DiagCode("E0200"); // type mismatch
    pub const E0201: DiagCode = DiagCode("E0201"); // untyped stream
}

// ── Diagnostic kind ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagKind {
    UnknownOperator,
    MissingCallback,
    ArityMismatch,
    TypeMismatch,
    Untyped,
}

impl DiagKind {
    pub fn code(self) -> DiagCode {
        match self {
            DiagKind::UnknownOperator => codes::E0100,
            DiagKind::MissingCallback => codes::E0101,
            DiagKind::ArityMismatch => codes::E0102,
            DiagKind::TypeMismatch => codes::E0200,
            DiagKind::Untyped => codes::E0201,
        }
    }
}

// ── Related locator ──────────────────────────────────────────────────────

/// A secondary source location providing context for a diagnostic.
#[derive(Debug, Clone)]
pub struct RelatedLocator {
    pub locator: Option<Locator>,
    pub label: String,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A checker diagnostic. `message` is self-contained: it already names the
/// places involved, so rendering it needs nothing else.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagKind,
    pub locator: Option<Locator>,
    pub message: String,
    pub hint: Option<String>,
    pub related: Vec<RelatedLocator>,
}

impl Diagnostic {
    /// Create a new diagnostic with no hint or related locators.
    pub fn new(kind: DiagKind, locator: Option<Locator>, message: impl Into<String>) -> Self {
        Self {
            kind,
            locator,
            message: message.into(),
            hint: None,
            related: Vec::new(),
        }
    }

    pub fn code(&self) -> DiagCode {
        self.kind.code()
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a related locator.
    pub fn with_related(mut self, locator: Option<Locator>, label: impl Into<String>) -> Self {
        self.related.push(RelatedLocator {
            locator,
            label: label.into(),
        });
        self
    }

    /// One-line rendering used in reports: `error[CODE]: message`.
    pub fn headline(&self) -> String {
        format!("error[{}]: {}", self.code(), self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline())?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
