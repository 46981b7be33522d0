//! `OpenQASM` 2.0 emitter for compiled circuits.

use rustc_hash::FxHashSet;

use qasmc_ir::{Circuit, ClbitId, Instruction, InstructionKind, IrError, QubitId, RegisterKind};

use crate::error::{CompileError, CompileResult, Position};
use crate::stdlib::{BUILTIN_GATES, QELIB1, StandardLibrary};

/// Emit a circuit as `OpenQASM` 2.0 source, including the classic `qelib1.inc`.
pub fn emit(circuit: &Circuit) -> CompileResult<String> {
    emit_with_library(circuit, &QELIB1)
}

/// Emit a circuit as `OpenQASM` 2.0 source.
///
/// Gates that are neither built in nor part of `library` are declared
/// `opaque` with the arity of their first use, so the output compiles on its
/// own against the same library.
pub fn emit_with_library(circuit: &Circuit, library: &StandardLibrary) -> CompileResult<String> {
    let mut emitter = Emitter::new(circuit);
    emitter.emit_circuit(library)?;
    Ok(emitter.output)
}

struct Emitter<'c> {
    circuit: &'c Circuit,
    output: String,
    /// Source label of each qubit, indexed by id.
    qubit_labels: Vec<String>,
    /// Source label of each clbit, indexed by id.
    clbit_labels: Vec<String>,
}

impl<'c> Emitter<'c> {
    fn new(circuit: &'c Circuit) -> Self {
        let labels = |kind: RegisterKind, count: u32| {
            let mut labels = vec![String::new(); count as usize];
            for register in circuit.registers().iter().filter(|r| r.kind == kind) {
                for (i, id) in register.range().enumerate() {
                    if let Some(slot) = labels.get_mut(id as usize) {
                        *slot = format!("{}[{i}]", register.name);
                    }
                }
            }
            labels
        };
        Self {
            circuit,
            output: String::new(),
            qubit_labels: labels(RegisterKind::Quantum, circuit.num_qubits()),
            clbit_labels: labels(RegisterKind::Classical, circuit.num_clbits()),
        }
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }

    fn emit_circuit(&mut self, library: &StandardLibrary) -> CompileResult<()> {
        let circuit = self.circuit;
        self.writeln("OPENQASM 2.0;");
        self.writeln(&format!("include \"{}\";", library.filename));

        let mut declared = FxHashSet::default();
        for instruction in circuit.instructions() {
            let InstructionKind::Gate(name) = &instruction.kind else {
                continue;
            };
            let known =
                library.contains(name) || BUILTIN_GATES.iter().any(|g| g.name == name.as_str());
            if !known && declared.insert(name.as_str()) {
                let decl = opaque_decl(name, instruction.params.len(), instruction.qubits.len());
                self.writeln(&decl);
            }
        }

        for register in circuit.registers() {
            self.writeln(&format!(
                "{} {}[{}];",
                register.kind.keyword(),
                register.name,
                register.size
            ));
        }

        for instruction in circuit.instructions() {
            let line = self.emit_instruction(instruction)?;
            self.writeln(&line);
        }
        Ok(())
    }

    fn emit_instruction(&self, instruction: &Instruction) -> CompileResult<String> {
        let mut line = String::new();
        if let Some(condition) = &instruction.condition {
            line.push_str(&format!("if({}=={}) ", condition.register, condition.value));
        }

        let qubits = instruction
            .qubits
            .iter()
            .map(|q| self.qubit_label(*q))
            .collect::<CompileResult<Vec<_>>>()?
            .join(", ");

        match &instruction.kind {
            InstructionKind::Gate(name) => {
                line.push_str(name);
                if !instruction.params.is_empty() {
                    let params: Vec<String> =
                        instruction.params.iter().map(|p| format_real(*p)).collect();
                    line.push_str(&format!("({})", params.join(", ")));
                }
                line.push_str(&format!(" {qubits};"));
            }
            InstructionKind::Measure => {
                let clbits = instruction
                    .clbits
                    .iter()
                    .map(|c| self.clbit_label(*c))
                    .collect::<CompileResult<Vec<_>>>()?
                    .join(", ");
                line.push_str(&format!("measure {qubits} -> {clbits};"));
            }
            InstructionKind::Reset => line.push_str(&format!("reset {qubits};")),
            InstructionKind::Barrier => line.push_str(&format!("barrier {qubits};")),
        }
        Ok(line)
    }

    fn qubit_label(&self, qubit: QubitId) -> CompileResult<String> {
        match self.qubit_labels.get(qubit.0 as usize) {
            Some(label) if !label.is_empty() => Ok(label.clone()),
            _ => Err(CompileError::Circuit {
                source: IrError::QubitNotFound(qubit),
                position: Position::default(),
            }),
        }
    }

    fn clbit_label(&self, clbit: ClbitId) -> CompileResult<String> {
        match self.clbit_labels.get(clbit.0 as usize) {
            Some(label) if !label.is_empty() => Ok(label.clone()),
            _ => Err(CompileError::Circuit {
                source: IrError::ClbitNotFound(clbit),
                position: Position::default(),
            }),
        }
    }
}

/// `opaque name(p0, ...) a0, ...;`
fn opaque_decl(name: &str, num_params: usize, num_qubits: usize) -> String {
    let params: Vec<String> = (0..num_params).map(|i| format!("p{i}")).collect();
    let qubits: Vec<String> = (0..num_qubits).map(|i| format!("a{i}")).collect();
    if params.is_empty() {
        format!("opaque {name} {};", qubits.join(", "))
    } else {
        format!("opaque {name}({}) {};", params.join(", "), qubits.join(", "))
    }
}

/// A real value as an expression that evaluates back to the same value.
fn format_real(value: f64) -> String {
    if value.is_nan() {
        "(0.0/0.0)".to_string()
    } else if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        format!("({sign}1.0/0.0)")
    } else {
        format!("{value:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qasmc_ir::Condition;

    fn bell() -> Circuit {
        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Quantum, 2).unwrap();
        circuit.add_register("c", RegisterKind::Classical, 2).unwrap();
        circuit
            .push(Instruction::gate("h", vec![], [QubitId(0)]))
            .unwrap();
        circuit
            .push(Instruction::gate("cx", vec![], [QubitId(0), QubitId(1)]))
            .unwrap();
        circuit
            .push(Instruction::measure(QubitId(0), ClbitId(0)))
            .unwrap();
        circuit
            .push(Instruction::measure(QubitId(1), ClbitId(1)))
            .unwrap();
        circuit
    }

    #[test]
    fn test_emit_bell() {
        let qasm = emit(&bell()).unwrap();
        let expected = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0], q[1];\nmeasure q[0] -> c[0];\nmeasure q[1] -> c[1];\n";
        assert_eq!(qasm, expected);
    }

    #[test]
    fn test_emit_params_and_conditions() {
        let mut circuit = Circuit::new();
        circuit.add_register("a", RegisterKind::Quantum, 1).unwrap();
        circuit.add_register("b", RegisterKind::Quantum, 2).unwrap();
        circuit.add_register("m", RegisterKind::Classical, 1).unwrap();
        circuit
            .push(
                Instruction::gate("U", vec![0.5, -1e-7, f64::INFINITY], [QubitId(2)]).with_condition(
                    Some(Condition {
                        register: "m".into(),
                        clbits: vec![ClbitId(0)],
                        value: 1,
                    }),
                ),
            )
            .unwrap();
        circuit
            .push(Instruction::barrier([QubitId(1), QubitId(0)]))
            .unwrap();
        circuit.push(Instruction::reset(QubitId(0))).unwrap();

        let qasm = emit(&circuit).unwrap();
        assert!(qasm.contains("if(m==1) U(0.5, -1e-7, (1.0/0.0)) b[1];\n"));
        assert!(qasm.contains("barrier b[0], a[0];\n"));
        assert!(qasm.contains("reset a[0];\n"));
    }

    #[test]
    fn test_opaque_declarations_for_unknown_gates() {
        let mut circuit = Circuit::new();
        circuit.add_register("q", RegisterKind::Quantum, 3).unwrap();
        circuit
            .push(Instruction::gate("swap", vec![], [QubitId(0), QubitId(1)]))
            .unwrap();
        circuit
            .push(Instruction::gate("magic", vec![0.1, 0.2], [QubitId(2)]))
            .unwrap();
        circuit
            .push(Instruction::gate("swap", vec![], [QubitId(1), QubitId(2)]))
            .unwrap();

        let qasm = emit(&circuit).unwrap();
        assert_eq!(qasm.matches("opaque swap a0, a1;").count(), 1);
        assert!(qasm.contains("opaque magic(p0, p1) a0;"));

        let qasm = emit_with_library(&circuit, &crate::stdlib::QELIB1_EXTENDED).unwrap();
        assert!(!qasm.contains("opaque swap"));
    }

    #[test]
    fn test_format_real() {
        assert_eq!(format_real(2.0), "2.0");
        assert_eq!(format_real(-0.25), "-0.25");
        assert_eq!(format_real(f64::NEG_INFINITY), "(-1.0/0.0)");
        assert_eq!(format_real(f64::NAN), "(0.0/0.0)");
    }
}
