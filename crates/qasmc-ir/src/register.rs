//! Quantum and classical registers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::error::{IrError, IrResult};

/// Whether a register holds qubits or classical bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterKind {
    /// Declared with `qreg`.
    Quantum,
    /// Declared with `creg`.
    Classical,
}

impl RegisterKind {
    /// The declaration keyword for this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            RegisterKind::Quantum => "qreg",
            RegisterKind::Classical => "creg",
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterKind::Quantum => write!(f, "quantum"),
            RegisterKind::Classical => write!(f, "classical"),
        }
    }
}

/// A declared register together with the slice of the flat index space it owns.
///
/// `start` is the absolute index of element 0; the register covers
/// `start..start + size` in the index space of its kind. Registers allocated
/// by [`Circuit::add_register`](crate::Circuit::add_register) always have
/// `start + size <= u32::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Register {
    /// Register name, unique within a circuit.
    pub name: String,
    /// Quantum or classical.
    pub kind: RegisterKind,
    /// Number of elements.
    pub size: u32,
    /// Absolute index of the first element.
    pub start: u32,
}

impl Register {
    /// Absolute index range covered by this register.
    pub fn range(&self) -> Range<u32> {
        self.start..self.start.saturating_add(self.size)
    }

    /// Absolute index of element `index`, checked against the register size.
    pub fn absolute(&self, index: u32) -> IrResult<u32> {
        match self.start.checked_add(index) {
            Some(absolute) if index < self.size => Ok(absolute),
            _ => Err(IrError::IndexOutOfRange {
                register: self.name.clone(),
                index,
                size: self.size,
            }),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}[{}]", self.kind.keyword(), self.name, self.size)
    }
}
