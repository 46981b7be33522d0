//! Output model of the qasmc OpenQASM 2 compiler
//!
//! This crate holds the data a compilation hands to the host toolkit: the
//! register table with each register's slice of the flat qubit/clbit index
//! space, and the ordered list of resolved instructions. It knows nothing
//! about source text; see the `qasmc` crate for the compiler itself.
//!
//! # Example
//!
//! ```rust
//! use qasmc_ir::{Circuit, Instruction, QubitId, RegisterKind};
//!
//! let mut circuit = Circuit::new();
//! circuit.add_register("q", RegisterKind::Quantum, 2).unwrap();
//! circuit.push(Instruction::gate("CX", vec![], [QubitId(0), QubitId(1)])).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.instructions()[0].name(), "CX");
//! ```

pub mod circuit;
pub mod error;
pub mod instruction;
pub mod qubit;
pub mod register;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use instruction::{Condition, Instruction, InstructionKind};
pub use qubit::{ClbitId, QubitId};
pub use register::{Register, RegisterKind};
