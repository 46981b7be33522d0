//! The flat circuit produced by a compilation.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::register::{Register, RegisterKind};

/// An ordered instruction list together with the register table it indexes into.
///
/// Registers are allocated in declaration order: each new register of a kind
/// starts where the previous register of that kind ended, so the index space
/// depends only on the sequence of [`add_register`](Circuit::add_register) calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    registers: Vec<Register>,
    num_qubits: u32,
    num_clbits: u32,
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a register and allocate its slice of the index space.
    ///
    /// Fails without modifying the circuit if the kind's total would exceed
    /// `u32::MAX`.
    pub fn add_register(
        &mut self,
        name: impl Into<String>,
        kind: RegisterKind,
        size: u32,
    ) -> IrResult<&Register> {
        let name = name.into();
        if self.register(&name).is_some() {
            return Err(IrError::DuplicateRegister(name));
        }
        if size == 0 {
            return Err(IrError::EmptyRegister(name));
        }
        let counter = match kind {
            RegisterKind::Quantum => &mut self.num_qubits,
            RegisterKind::Classical => &mut self.num_clbits,
        };
        let start = *counter;
        *counter = start
            .checked_add(size)
            .ok_or_else(|| IrError::IndexSpaceExhausted {
                name: name.clone(),
                kind,
                size,
                allocated: start,
            })?;
        self.registers.push(Register {
            name,
            kind,
            size,
            start,
        });
        Ok(&self.registers[self.registers.len() - 1])
    }

    /// Look up a register by name.
    pub fn register(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Look up a register by name, requiring a particular kind.
    pub fn register_of_kind(&self, name: &str, kind: RegisterKind) -> IrResult<&Register> {
        let register = self
            .register(name)
            .ok_or_else(|| IrError::UnknownRegister(name.to_string()))?;
        if register.kind == kind {
            Ok(register)
        } else {
            Err(IrError::WrongRegisterKind {
                name: name.to_string(),
                expected: kind,
                found: register.kind,
            })
        }
    }

    /// All registers in declaration order.
    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    /// Quantum registers in declaration order.
    pub fn qregs(&self) -> impl Iterator<Item = &Register> {
        self.registers
            .iter()
            .filter(|r| r.kind == RegisterKind::Quantum)
    }

    /// Classical registers in declaration order.
    pub fn cregs(&self) -> impl Iterator<Item = &Register> {
        self.registers
            .iter()
            .filter(|r| r.kind == RegisterKind::Classical)
    }

    /// Total number of allocated qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Total number of allocated classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Append an instruction after checking its operands are allocated.
    pub fn push(&mut self, instruction: Instruction) -> IrResult<()> {
        if let Some(q) = instruction.qubits.iter().find(|q| q.0 >= self.num_qubits) {
            return Err(IrError::QubitNotFound(*q));
        }
        let condition_clbits = instruction
            .condition
            .iter()
            .flat_map(|c| c.clbits.iter());
        if let Some(c) = instruction
            .clbits
            .iter()
            .chain(condition_clbits)
            .find(|c| c.0 >= self.num_clbits)
        {
            return Err(IrError::ClbitNotFound(*c));
        }
        if instruction.kind == InstructionKind::Measure
            && instruction.qubits.len() != instruction.clbits.len()
        {
            return Err(IrError::MeasureMismatch {
                qubits: instruction.qubits.len(),
                clbits: instruction.clbits.len(),
            });
        }
        self.instructions.push(instruction);
        Ok(())
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if the circuit has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Count instructions by opcode name.
    pub fn count_ops(&self) -> FxHashMap<String, usize> {
        let mut counts = FxHashMap::default();
        for instruction in &self.instructions {
            *counts.entry(instruction.name().to_string()).or_insert(0) += 1;
        }
        counts
    }
}
