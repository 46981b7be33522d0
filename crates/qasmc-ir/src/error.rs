//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use crate::register::RegisterKind;
use thiserror::Error;

/// Errors raised while assembling a [`Circuit`](crate::Circuit).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A register with this name already exists.
    #[error("register '{0}' is already declared")]
    DuplicateRegister(String),

    /// Registers must hold at least one bit.
    #[error("register '{0}' must have a positive size")]
    EmptyRegister(String),

    /// The register would push its kind's index space past `u32::MAX`.
    #[error("register '{name}' of size {size} does not fit in the {kind} index space ({allocated} already allocated)")]
    IndexSpaceExhausted {
        /// Register name.
        name: String,
        /// Quantum or classical.
        kind: RegisterKind,
        /// Requested size.
        size: u32,
        /// Elements of this kind allocated before the register.
        allocated: u32,
    },

    /// No register with this name exists.
    #[error("no register named '{0}'")]
    UnknownRegister(String),

    /// The register exists but has the wrong kind.
    #[error("'{name}' is a {found} register, not a {expected} register")]
    WrongRegisterKind {
        /// Register name.
        name: String,
        /// The kind the caller needed.
        expected: RegisterKind,
        /// The kind the register actually has.
        found: RegisterKind,
    },

    /// Element index past the end of a register.
    #[error("index {index} is out of range for register '{register}' of size {size}")]
    IndexOutOfRange {
        /// Register name.
        register: String,
        /// The offending index.
        index: u32,
        /// Declared register size.
        size: u32,
    },

    /// Qubit not allocated in this circuit.
    #[error("qubit {0} is not allocated in this circuit")]
    QubitNotFound(QubitId),

    /// Classical bit not allocated in this circuit.
    #[error("classical bit {0} is not allocated in this circuit")]
    ClbitNotFound(ClbitId),

    /// Measurement needs one clbit per qubit.
    #[error("measurement pairs {qubits} qubits with {clbits} classical bits")]
    MeasureMismatch {
        /// Number of qubits.
        qubits: usize,
        /// Number of classical bits.
        clbits: usize,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
