//! Error types for the compiler pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use qasmc_ir::IrError;

/// A location in source text. Lines and columns are 1-based; `offset` is the
/// byte offset from the start of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    /// Create a position.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The category of a [`CompileError`], for hosts that dispatch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    LexError,
    ParseError,
    DuplicateRegisterError,
    DuplicateGateError,
    DuplicateQubitError,
    UnboundIdentifierError,
    UndefinedGateError,
    ArityError,
    IndexOutOfBoundsError,
    RecursiveGateDefinitionError,
    IncludeDepthExceededError,
    IncludeError,
    PromotedWarning,
    CircuitError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Errors that terminate a compilation.
///
/// Every variant carries the position of the offending token or construct.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Unrecognized input character.
    #[error("unrecognized input '{text}' at {position}")]
    Lex { text: String, position: Position },

    /// Grammar violation.
    #[error("expected {expected}, found {found} at {position}")]
    Parse {
        expected: String,
        found: String,
        position: Position,
    },

    /// A register name was declared twice.
    #[error("register '{name}' is already declared (at {position})")]
    DuplicateRegister { name: String, position: Position },

    /// A gate name was defined twice.
    #[error("gate '{name}' is already defined (at {position})")]
    DuplicateGate { name: String, position: Position },

    /// The same qubit appears twice in one gate application.
    #[error("qubit {qubit} is used more than once in '{gate}' at {position}")]
    DuplicateQubit {
        gate: String,
        qubit: String,
        position: Position,
    },

    /// A name that does not resolve to what the context requires.
    #[error("'{name}' is not {expected} in this scope (at {position})")]
    UnboundIdentifier {
        name: String,
        expected: &'static str,
        position: Position,
    },

    /// Call to a gate that is not declared.
    #[error("gate '{name}' is not defined (at {position})")]
    UndefinedGate { name: String, position: Position },

    /// Parameter or qubit count mismatch, or irreconcilable broadcast sizes.
    #[error("{message} at {position}")]
    Arity { message: String, position: Position },

    /// Register element index past the register's end.
    #[error("index {index} is out of bounds for register '{register}' of size {size} at {position}")]
    IndexOutOfBounds {
        register: String,
        index: u64,
        size: u32,
        position: Position,
    },

    /// A gate body that calls itself, directly or transitively.
    #[error("gate '{name}' is defined in terms of itself (at {position})")]
    RecursiveGateDefinition { name: String, position: Position },

    /// Includes nested deeper than the configured limit.
    #[error("including '{path}' exceeds the maximum include depth of {limit} at {position}")]
    IncludeDepthExceeded {
        path: String,
        limit: usize,
        position: Position,
    },

    /// The include hook could not supply a file.
    #[error("cannot include '{path}': {reason} (at {position})")]
    Include {
        path: String,
        reason: String,
        position: Position,
    },

    /// A warning raised while compiling in strict mode.
    #[error("{message} at {position}")]
    PromotedWarning { message: String, position: Position },

    /// The circuit model rejected an instruction.
    #[error("{source} at {position}")]
    Circuit {
        #[source]
        source: IrError,
        position: Position,
    },

    /// An error raised while compiling an included file.
    #[error("in included file '{file}': {error}")]
    Included {
        file: String,
        error: Box<CompileError>,
    },
}

impl CompileError {
    /// Shorthand for a grammar violation.
    pub fn parse(expected: impl Into<String>, found: impl Into<String>, position: Position) -> Self {
        CompileError::Parse {
            expected: expected.into(),
            found: found.into(),
            position,
        }
    }

    /// Shorthand for an arity mismatch.
    pub fn arity(message: impl Into<String>, position: Position) -> Self {
        CompileError::Arity {
            message: message.into(),
            position,
        }
    }

    /// A parameter expression that evaluated to infinity or NaN, such as a
    /// division by zero.
    pub fn non_finite(value: f64, position: Position) -> Self {
        Self::parse("a finite parameter value", value.to_string(), position)
    }

    /// Map an IR error raised at `position` onto the compiler taxonomy.
    pub fn from_ir(error: IrError, position: Position) -> Self {
        match error {
            IrError::DuplicateRegister(name) => CompileError::DuplicateRegister { name, position },
            IrError::UnknownRegister(name) => CompileError::UnboundIdentifier {
                name,
                expected: "a register",
                position,
            },
            IrError::WrongRegisterKind { name, expected, .. } => {
                CompileError::UnboundIdentifier {
                    name,
                    expected: match expected {
                        qasmc_ir::RegisterKind::Quantum => "a quantum register",
                        qasmc_ir::RegisterKind::Classical => "a classical register",
                    },
                    position,
                }
            }
            IrError::IndexOutOfRange {
                register,
                index,
                size,
            } => CompileError::IndexOutOfBounds {
                register,
                index: u64::from(index),
                size,
                position,
            },
            source => CompileError::Circuit { source, position },
        }
    }

    /// The error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Lex { .. } => ErrorKind::LexError,
            CompileError::Parse { .. } => ErrorKind::ParseError,
            CompileError::DuplicateRegister { .. } => ErrorKind::DuplicateRegisterError,
            CompileError::DuplicateGate { .. } => ErrorKind::DuplicateGateError,
            CompileError::DuplicateQubit { .. } => ErrorKind::DuplicateQubitError,
            CompileError::UnboundIdentifier { .. } => ErrorKind::UnboundIdentifierError,
            CompileError::UndefinedGate { .. } => ErrorKind::UndefinedGateError,
            CompileError::Arity { .. } => ErrorKind::ArityError,
            CompileError::IndexOutOfBounds { .. } => ErrorKind::IndexOutOfBoundsError,
            CompileError::RecursiveGateDefinition { .. } => {
                ErrorKind::RecursiveGateDefinitionError
            }
            CompileError::IncludeDepthExceeded { .. } => ErrorKind::IncludeDepthExceededError,
            CompileError::Include { .. } => ErrorKind::IncludeError,
            CompileError::PromotedWarning { .. } => ErrorKind::PromotedWarning,
            CompileError::Circuit { .. } => ErrorKind::CircuitError,
            CompileError::Included { error, .. } => error.kind(),
        }
    }

    /// Where the error was raised. For errors inside included files this is a
    /// position in the innermost included file; see [`file`](Self::file).
    pub fn position(&self) -> Position {
        match self {
            CompileError::Lex { position, .. }
            | CompileError::Parse { position, .. }
            | CompileError::DuplicateRegister { position, .. }
            | CompileError::DuplicateGate { position, .. }
            | CompileError::DuplicateQubit { position, .. }
            | CompileError::UnboundIdentifier { position, .. }
            | CompileError::UndefinedGate { position, .. }
            | CompileError::Arity { position, .. }
            | CompileError::IndexOutOfBounds { position, .. }
            | CompileError::RecursiveGateDefinition { position, .. }
            | CompileError::IncludeDepthExceeded { position, .. }
            | CompileError::Include { position, .. }
            | CompileError::PromotedWarning { position, .. }
            | CompileError::Circuit { position, .. } => *position,
            CompileError::Included { error, .. } => error.position(),
        }
    }

    /// The included file the error was raised in, or `None` for the main source.
    pub fn file(&self) -> Option<&str> {
        match self {
            CompileError::Included { file, error } => error.file().or(Some(file.as_str())),
            _ => None,
        }
    }

    /// The message without the include-file prefix.
    pub fn innermost(&self) -> &CompileError {
        match self {
            CompileError::Included { error, .. } => error.innermost(),
            other => other,
        }
    }
}

/// Result type for compiler operations.
pub type CompileResult<T> = Result<T, CompileError>;
