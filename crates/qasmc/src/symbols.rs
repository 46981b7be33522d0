//! Symbol tables scoped to one compilation.
//!
//! Registers and gates live in separate namespaces, so `qreg h[1]; h h;` is
//! legal. Gate bodies are owned by their `GateDecl` AST nodes; the table only
//! records signatures.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use qasmc_ir::RegisterKind;

use crate::error::{CompileError, CompileResult, Position};
use crate::stdlib::{BUILTIN_GATES, StandardLibrary};

/// Where a gate signature came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateOrigin {
    /// `U` or `CX`.
    Builtin,
    /// Spliced in from the standard library.
    Library,
    /// Declared with `opaque`.
    Opaque,
    /// Declared with `gate` and a body.
    Defined,
}

/// Parameter and qubit arity of a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateSignature {
    pub name: String,
    pub num_params: usize,
    pub num_qubits: usize,
    pub origin: GateOrigin,
    /// Declaration site; `None` for built-in and library gates.
    pub position: Option<Position>,
}

impl GateSignature {
    /// Whether calls to this gate reach the host unexpanded.
    pub fn is_primitive(&self) -> bool {
        self.origin != GateOrigin::Defined
    }
}

/// A declared register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegisterSymbol {
    pub kind: RegisterKind,
    pub size: u32,
    pub position: Position,
}

/// Register and gate bindings for one compilation unit.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    registers: FxHashMap<String, RegisterSymbol>,
    gates: FxHashMap<String, GateSignature>,
    included: FxHashSet<String>,
    library: Option<&'static str>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table holding only the built-in `U` and `CX`.
    pub fn new() -> Self {
        let gates = BUILTIN_GATES
            .iter()
            .map(|g| {
                (
                    g.name.to_string(),
                    GateSignature {
                        name: g.name.to_string(),
                        num_params: g.num_params,
                        num_qubits: g.num_qubits,
                        origin: GateOrigin::Builtin,
                        position: None,
                    },
                )
            })
            .collect();
        Self {
            registers: FxHashMap::default(),
            gates,
            included: FxHashSet::default(),
            library: None,
        }
    }

    /// Declare a register. Names are unique across both register kinds.
    pub fn declare_register(
        &mut self,
        name: &str,
        kind: RegisterKind,
        size: u32,
        position: Position,
    ) -> CompileResult<()> {
        if self.registers.contains_key(name) {
            return Err(CompileError::DuplicateRegister {
                name: name.to_string(),
                position,
            });
        }
        self.registers.insert(
            name.to_string(),
            RegisterSymbol {
                kind,
                size,
                position,
            },
        );
        Ok(())
    }

    pub fn register(&self, name: &str) -> Option<&RegisterSymbol> {
        self.registers.get(name)
    }

    /// Look up a register of the given kind, failing with
    /// `UnboundIdentifier` if it is missing or of the other kind.
    pub fn require_register(
        &self,
        name: &str,
        kind: RegisterKind,
        position: Position,
    ) -> CompileResult<&RegisterSymbol> {
        match self.registers.get(name) {
            Some(symbol) if symbol.kind == kind => Ok(symbol),
            _ => Err(CompileError::UnboundIdentifier {
                name: name.to_string(),
                expected: match kind {
                    RegisterKind::Quantum => "a quantum register",
                    RegisterKind::Classical => "a classical register",
                },
                position,
            }),
        }
    }

    /// Declare a gate. Redefining any known gate, including library and
    /// built-in gates, is an error.
    pub fn declare_gate(&mut self, signature: GateSignature) -> CompileResult<()> {
        if self.gates.contains_key(&signature.name) {
            return Err(CompileError::DuplicateGate {
                position: signature.position.unwrap_or_default(),
                name: signature.name,
            });
        }
        self.gates.insert(signature.name.clone(), signature);
        Ok(())
    }

    pub fn gate(&self, name: &str) -> Option<&GateSignature> {
        self.gates.get(name)
    }

    /// Whether `name` is a gate defined with a body.
    pub fn is_composite(&self, name: &str) -> bool {
        self.gates
            .get(name)
            .is_some_and(|g| g.origin == GateOrigin::Defined)
    }

    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    pub fn num_registers(&self) -> usize {
        self.registers.len()
    }

    /// Splice a standard library into the table. Returns `false` without
    /// changing anything if a library was already loaded.
    pub fn load_library(
        &mut self,
        library: &StandardLibrary,
        position: Position,
    ) -> CompileResult<bool> {
        if self.library.is_some() {
            return Ok(false);
        }
        for g in library.gates() {
            if let Some(existing) = self.gates.get(g.name) {
                return Err(CompileError::DuplicateGate {
                    name: existing.name.clone(),
                    position,
                });
            }
        }
        for g in library.gates() {
            self.gates.insert(
                g.name.to_string(),
                GateSignature {
                    name: g.name.to_string(),
                    num_params: g.num_params,
                    num_qubits: g.num_qubits,
                    origin: GateOrigin::Library,
                    position: None,
                },
            );
        }
        self.library = Some(library.version);
        Ok(true)
    }

    /// Version of the loaded standard library, if any.
    pub fn library(&self) -> Option<&'static str> {
        self.library
    }

    /// Record that `path` has been included. Returns `false` if it already was.
    pub fn mark_included(&mut self, path: &str) -> bool {
        self.included.insert(path.to_string())
    }
}
