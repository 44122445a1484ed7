use std::fmt;

use serde::Serialize;

use crate::error::{CompositionError, SynthError};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    /// The schema (or operation) at `path` was not emitted.
    Error,
}

/// Machine-readable diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    UndefinedReference,
    DependencyFailed,
    CircularAlias,
    CompositionError,
    NestedUnionInIntersection,
    MaxItemsExceeded,
    ConstraintTypeMismatch,
    NullableConflict,
    DanglingExclusiveFlag,
    InvertedRange,
    VersionMismatch,
    IgnoredKeyword,
}

/// A structured, non-fatal report produced during synthesis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    /// JSON pointer into the source document.
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn warning(code: DiagnosticCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, path, message)
    }

    pub fn info(code: DiagnosticCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, path, message)
    }
}

impl From<&SynthError> for Diagnostic {
    fn from(err: &SynthError) -> Self {
        let code = match err {
            SynthError::UndefinedReference { .. } => DiagnosticCode::UndefinedReference,
            SynthError::DependencyFailed { .. } => DiagnosticCode::DependencyFailed,
            SynthError::CircularAlias { .. } => DiagnosticCode::CircularAlias,
            SynthError::Composition {
                source: CompositionError::NestedUnionInIntersection { .. },
                ..
            } => DiagnosticCode::NestedUnionInIntersection,
            SynthError::Composition { .. } => DiagnosticCode::CompositionError,
            SynthError::MaxItemsExceeded { .. } => DiagnosticCode::MaxItemsExceeded,
        };
        Diagnostic::new(Severity::Error, code, err.path(), err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level}: {} ({})", self.message, self.path)
    }
}

/// Escape a single JSON pointer token (`~` → `~0`, `/` → `~1`).
pub fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape a single JSON pointer token.
pub fn unescape_pointer(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_escaping_round_trips_special_chars() {
        assert_eq!(escape_pointer("a/b~c"), "a~1b~0c");
        assert_eq!(unescape_pointer("a~1b~0c"), "a/b~c");
    }

    #[test]
    fn nested_union_gets_its_own_code() {
        let err = SynthError::composition(
            "#/components/schemas/Pet",
            CompositionError::NestedUnionInIntersection {
                member: "1".to_string(),
            },
        );
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.code, DiagnosticCode::NestedUnionInIntersection);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.path, "#/components/schemas/Pet");
    }
}
