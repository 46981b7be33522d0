//! Structured diagnostics: warnings collected during compilation and a
//! uniform rendering of both warnings and errors for display.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CompileError, Position};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// The category of a [`Warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// A library or file was included more than once; later includes are skipped.
    RedundantInclude,
    /// A condition compares a register against a value wider than the register.
    UnsatisfiableCondition,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A non-fatal finding. Compilation continues past warnings unless the
/// compiler runs in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    pub position: Position,
    /// Included file the warning was raised in, `None` for the main source.
    pub file: Option<String>,
}

impl From<Warning> for CompileError {
    fn from(warning: Warning) -> Self {
        CompileError::PromotedWarning {
            message: format!("{} ({})", warning.message, warning.kind),
            position: warning.position,
        }
    }
}

/// A renderable error or warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Error or warning kind name, e.g. `ArityError` or `RedundantInclude`.
    pub code: String,
    pub message: String,
    pub position: Position,
    pub file: Option<String>,
}

impl Diagnostic {
    /// Render the source line the diagnostic points into, with a caret under
    /// the offending column. Returns an empty string if the line does not
    /// exist in `source`.
    pub fn render(&self, source: &str) -> String {
        render_snippet(source, self.position)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(error: &CompileError) -> Self {
        Self {
            severity: Severity::Error,
            code: error.kind().to_string(),
            message: error.innermost().to_string(),
            position: error.position(),
            file: error.file().map(str::to_string),
        }
    }
}

impl From<&Warning> for Diagnostic {
    fn from(warning: &Warning) -> Self {
        Self {
            severity: Severity::Warning,
            code: warning.kind.to_string(),
            message: format!("{} at {}", warning.message, warning.position),
            position: warning.position,
            file: warning.file.clone(),
        }
    }
}

/// Render line `position.line` of `source` with a caret under `position.column`.
pub fn render_snippet(source: &str, position: Position) -> String {
    let Some(line) = source.lines().nth(position.line.saturating_sub(1)) else {
        return String::new();
    };
    let gutter = position.line.to_string();
    // Keep tabs so the caret lines up under tab-indented source.
    let pad: String = line
        .chars()
        .take(position.column.saturating_sub(1))
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    format!(
        "{gutter} | {line}\n{blank} | {pad}^",
        blank = " ".repeat(gutter.len())
    )
}
