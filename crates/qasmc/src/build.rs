//! Circuit building: lowers an expanded AST to the flat instruction list.

use qasmc_ir::{Circuit, ClbitId, Condition, Instruction, QubitId, RegisterKind};

use crate::ast::{
    Barrier, Conditional, ConditionalOp, GateCall, Measure, Operand, Program, Reset, Statement,
};
use crate::error::{CompileError, CompileResult, Position};

/// Build the circuit for an expanded program.
///
/// Qubits and clbits are allocated per kind in register declaration order.
/// Calls to composite gates must already have been expanded; any gate call
/// left in the program is emitted under its own name.
pub fn build(program: &Program) -> CompileResult<Circuit> {
    let mut builder = CircuitBuilder::new();
    for statement in &program.statements {
        builder.build_statement(statement)?;
    }
    tracing::debug!(
        qubits = builder.circuit.num_qubits(),
        clbits = builder.circuit.num_clbits(),
        instructions = builder.circuit.len(),
        "built circuit"
    );
    Ok(builder.circuit)
}

/// A resolved operand reference.
#[derive(Debug, Clone)]
enum Resolved<T> {
    Single(T),
    Register(Vec<T>),
}

impl<T: Copy> Resolved<T> {
    /// The element used for broadcast index `i`.
    fn at(&self, i: usize) -> T {
        match self {
            Resolved::Single(id) => *id,
            Resolved::Register(ids) => ids[i],
        }
    }
}

struct CircuitBuilder {
    circuit: Circuit,
}

impl CircuitBuilder {
    fn new() -> Self {
        Self {
            circuit: Circuit::new(),
        }
    }

    fn build_statement(&mut self, statement: &Statement) -> CompileResult<()> {
        match statement {
            Statement::RegisterDecl(decl) => {
                self.circuit
                    .add_register(decl.name.as_str(), decl.kind, decl.size)
                    .map_err(|e| CompileError::from_ir(e, decl.position))?;
                Ok(())
            }
            Statement::GateDecl(_) | Statement::Include(_) => Ok(()),
            Statement::GateCall(call) => self.build_gate(call, None),
            Statement::Measure(measure) => self.build_measure(measure, None),
            Statement::Reset(reset) => self.build_reset(reset, None),
            Statement::Barrier(barrier) => self.build_barrier(barrier),
            Statement::Conditional(cond) => {
                let condition = self.resolve_condition(cond)?;
                match &cond.op {
                    ConditionalOp::Gate(call) => self.build_gate(call, Some(&condition)),
                    ConditionalOp::Measure(measure) => self.build_measure(measure, Some(&condition)),
                    ConditionalOp::Reset(reset) => self.build_reset(reset, Some(&condition)),
                }
            }
        }
    }

    fn push(&mut self, instruction: Instruction, position: Position) -> CompileResult<()> {
        self.circuit
            .push(instruction)
            .map_err(|e| CompileError::from_ir(e, position))
    }

    fn resolve(&self, operand: &Operand, kind: RegisterKind) -> CompileResult<Resolved<u32>> {
        let register = self
            .circuit
            .register_of_kind(&operand.register, kind)
            .map_err(|e| CompileError::from_ir(e, operand.position))?;
        match operand.index {
            Some(index) => register
                .absolute(index)
                .map(Resolved::Single)
                .map_err(|e| CompileError::from_ir(e, operand.position)),
            None => Ok(Resolved::Register(register.range().collect())),
        }
    }

    fn resolve_qubits(&self, operand: &Operand) -> CompileResult<Resolved<QubitId>> {
        Ok(match self.resolve(operand, RegisterKind::Quantum)? {
            Resolved::Single(id) => Resolved::Single(QubitId(id)),
            Resolved::Register(ids) => Resolved::Register(ids.into_iter().map(QubitId).collect()),
        })
    }

    fn resolve_clbits(&self, operand: &Operand) -> CompileResult<Resolved<ClbitId>> {
        Ok(match self.resolve(operand, RegisterKind::Classical)? {
            Resolved::Single(id) => Resolved::Single(ClbitId(id)),
            Resolved::Register(ids) => Resolved::Register(ids.into_iter().map(ClbitId).collect()),
        })
    }

    fn resolve_condition(&self, cond: &Conditional) -> CompileResult<Condition> {
        let register = self
            .circuit
            .register_of_kind(&cond.register, RegisterKind::Classical)
            .map_err(|e| CompileError::from_ir(e, cond.position))?;
        Ok(Condition {
            register: register.name.clone(),
            clbits: register.range().map(ClbitId).collect(),
            value: cond.value,
        })
    }

    /// Emit one instruction per broadcast index.
    fn build_gate(&mut self, call: &GateCall, condition: Option<&Condition>) -> CompileResult<()> {
        let operands = call
            .qubits
            .iter()
            .map(|o| self.resolve_qubits(o))
            .collect::<CompileResult<Vec<_>>>()?;
        let width = broadcast_width(&call.name, &operands, call.position)?;

        for i in 0..width.unwrap_or(1) {
            let qubits: Vec<QubitId> = operands.iter().map(|r| r.at(i)).collect();
            if let Some(dup) = first_duplicate(&qubits) {
                return Err(CompileError::DuplicateQubit {
                    gate: call.name.clone(),
                    qubit: operand_label(&call.qubits[dup], i),
                    position: call.position,
                });
            }
            let instruction = Instruction::gate(call.name.as_str(), call.params.clone(), qubits)
                .with_condition(condition.cloned());
            self.push(instruction, call.position)?;
        }
        Ok(())
    }

    /// Pair element with element, or register with equally sized register.
    fn build_measure(&mut self, measure: &Measure, condition: Option<&Condition>) -> CompileResult<()> {
        let qubits = self.resolve_qubits(&measure.qubit)?;
        let clbits = self.resolve_clbits(&measure.clbit)?;
        let pairs: Vec<(QubitId, ClbitId)> = match (qubits, clbits) {
            (Resolved::Single(q), Resolved::Single(c)) => vec![(q, c)],
            (Resolved::Register(qs), Resolved::Register(cs)) if qs.len() == cs.len() => {
                qs.into_iter().zip(cs).collect()
            }
            (Resolved::Register(qs), Resolved::Register(cs)) => {
                return Err(CompileError::arity(
                    format!(
                        "cannot measure register '{}' of size {} into register '{}' of size {}",
                        measure.qubit.register,
                        qs.len(),
                        measure.clbit.register,
                        cs.len()
                    ),
                    measure.position,
                ));
            }
            _ => {
                return Err(CompileError::arity(
                    format!(
                        "cannot measure '{}' into '{}': operands must both be registers or both be elements",
                        measure.qubit, measure.clbit
                    ),
                    measure.position,
                ));
            }
        };

        for (q, c) in pairs {
            let instruction = Instruction::measure(q, c).with_condition(condition.cloned());
            self.push(instruction, measure.position)?;
        }
        Ok(())
    }

    fn build_reset(&mut self, reset: &Reset, condition: Option<&Condition>) -> CompileResult<()> {
        let qubits = match self.resolve_qubits(&reset.qubit)? {
            Resolved::Single(q) => vec![q],
            Resolved::Register(qs) => qs,
        };
        for q in qubits {
            let instruction = Instruction::reset(q).with_condition(condition.cloned());
            self.push(instruction, reset.position)?;
        }
        Ok(())
    }

    /// One instruction over the union of all operands, first appearance first.
    fn build_barrier(&mut self, barrier: &Barrier) -> CompileResult<()> {
        let mut qubits: Vec<QubitId> = Vec::new();
        for operand in &barrier.qubits {
            let ids = match self.resolve_qubits(operand)? {
                Resolved::Single(q) => vec![q],
                Resolved::Register(qs) => qs,
            };
            for q in ids {
                if !qubits.contains(&q) {
                    qubits.push(q);
                }
            }
        }
        self.push(Instruction::barrier(qubits), barrier.position)
    }
}

/// Common size of the whole-register operands, `None` if there are none.
fn broadcast_width<T>(
    gate: &str,
    operands: &[Resolved<T>],
    position: Position,
) -> CompileResult<Option<usize>> {
    let mut width = None;
    for operand in operands {
        if let Resolved::Register(ids) = operand {
            match width {
                Some(w) if w != ids.len() => {
                    return Err(CompileError::arity(
                        format!(
                            "cannot broadcast '{gate}' over registers of sizes {w} and {}",
                            ids.len()
                        ),
                        position,
                    ));
                }
                _ => width = Some(ids.len()),
            }
        }
    }
    Ok(width)
}

/// Index of the first operand that repeats an earlier one.
fn first_duplicate(qubits: &[QubitId]) -> Option<usize> {
    (1..qubits.len()).find(|&j| qubits[..j].contains(&qubits[j]))
}

/// Source-like label for operand `operand` at broadcast index `i`.
fn operand_label(operand: &Operand, i: usize) -> String {
    match operand.index {
        Some(index) => format!("{}[{index}]", operand.register),
        None => format!("{}[{i}]", operand.register),
    }
}
