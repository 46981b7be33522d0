//! Resolved instructions handed to the host toolkit.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::qubit::{ClbitId, QubitId};

/// What an instruction does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "name", rename_all = "lowercase")]
pub enum InstructionKind {
    /// A primitive gate, identified by its opcode name (`U`, `CX`, `h`, `cu1`, ...).
    Gate(String),
    /// Measurement of one qubit into one classical bit.
    Measure,
    /// Reset of one qubit to |0⟩.
    Reset,
    /// Scheduling barrier over a set of qubits.
    Barrier,
}

impl InstructionKind {
    /// The opcode name as it appears in source text.
    pub fn name(&self) -> &str {
        match self {
            InstructionKind::Gate(name) => name,
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
        }
    }
}

/// A classical condition: the instruction only fires when the named
/// classical register, read as an unsigned integer (element 0 least
/// significant), equals `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Name of the classical register.
    pub register: String,
    /// Absolute clbit ids of the register, element 0 first.
    pub clbits: Vec<ClbitId>,
    /// Expected integer value.
    pub value: u64,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.register, self.value)
    }
}

/// A fully resolved instruction: opcode, real parameters and absolute operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation.
    pub kind: InstructionKind,
    /// Real-valued gate parameters, in declaration order.
    pub params: Vec<f64>,
    /// Qubit operands.
    pub qubits: Vec<QubitId>,
    /// Classical bit operands (measurement only).
    pub clbits: Vec<ClbitId>,
    /// Optional classical condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(
        name: impl Into<String>,
        params: Vec<f64>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> Self {
        Self {
            kind: InstructionKind::Gate(name.into()),
            params,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            condition: None,
        }
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            params: vec![],
            qubits: vec![qubit],
            clbits: vec![clbit],
            condition: None,
        }
    }

    /// Create a reset instruction.
    pub fn reset(qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Reset,
            params: vec![],
            qubits: vec![qubit],
            clbits: vec![],
            condition: None,
        }
    }

    /// Create a barrier instruction.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            params: vec![],
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            condition: None,
        }
    }

    /// Attach a classical condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }

    /// The opcode name.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Check if this is a gate application.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(condition) = &self.condition {
            write!(f, "if({condition}) ")?;
        }
        write!(f, "{}", self.name())?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| format!("{p:?}")).collect();
            write!(f, "({})", params.join(", "))?;
        }
        let qubits: Vec<String> = self.qubits.iter().map(ToString::to_string).collect();
        if !qubits.is_empty() {
            write!(f, " {}", qubits.join(", "))?;
        }
        if !self.clbits.is_empty() {
            let clbits: Vec<String> = self.clbits.iter().map(ToString::to_string).collect();
            write!(f, " -> {}", clbits.join(", "))?;
        }
        Ok(())
    }
}
