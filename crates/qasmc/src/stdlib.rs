//! Built-in gate tables.
//!
//! The standard library is a versioned, read-only table of gate signatures
//! spliced into the symbol table by `include "qelib1.inc";`. Library gates are
//! primitive from the compiler's point of view and reach the host under their
//! own names.

/// Signature of a library gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryGate {
    pub name: &'static str,
    pub num_params: usize,
    pub num_qubits: usize,
}

const fn gate(name: &'static str, num_params: usize, num_qubits: usize) -> LibraryGate {
    LibraryGate {
        name,
        num_params,
        num_qubits,
    }
}

/// A named, versioned gate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardLibrary {
    /// Include filename that loads this library.
    pub filename: &'static str,
    pub version: &'static str,
    gates: &'static [LibraryGate],
}

impl StandardLibrary {
    /// Look up a gate by name.
    pub fn get(&self, name: &str) -> Option<&LibraryGate> {
        self.gates.iter().find(|g| g.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn gates(&self) -> &'static [LibraryGate] {
        self.gates
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

/// The two primitives every program can call: `U(theta, phi, lambda) q` and `CX c, t`.
pub const BUILTIN_GATES: &[LibraryGate] = &[gate("U", 3, 1), gate("CX", 0, 2)];

const CLASSIC_COUNT: usize = 23;

// The first CLASSIC_COUNT entries are the classic qelib1.inc.
const ALL_GATES: &[LibraryGate] = &[
    gate("u3", 3, 1),
    gate("u2", 2, 1),
    gate("u1", 1, 1),
    gate("cx", 0, 2),
    gate("id", 0, 1),
    gate("x", 0, 1),
    gate("y", 0, 1),
    gate("z", 0, 1),
    gate("h", 0, 1),
    gate("s", 0, 1),
    gate("sdg", 0, 1),
    gate("t", 0, 1),
    gate("tdg", 0, 1),
    gate("rx", 1, 1),
    gate("ry", 1, 1),
    gate("rz", 1, 1),
    gate("cz", 0, 2),
    gate("cy", 0, 2),
    gate("ch", 0, 2),
    gate("ccx", 0, 3),
    gate("crz", 1, 2),
    gate("cu1", 1, 2),
    gate("cu3", 3, 2),
    // Extensions
    gate("u0", 1, 1),
    gate("u", 3, 1),
    gate("p", 1, 1),
    gate("sx", 0, 1),
    gate("sxdg", 0, 1),
    gate("swap", 0, 2),
    gate("cswap", 0, 3),
    gate("crx", 1, 2),
    gate("cry", 1, 2),
    gate("cp", 1, 2),
    gate("csx", 0, 2),
    gate("cu", 4, 2),
    gate("rxx", 1, 2),
    gate("rzz", 1, 2),
    gate("rccx", 0, 3),
    gate("rc3x", 0, 4),
    gate("c3x", 0, 4),
    gate("c3sqrtx", 0, 4),
    gate("c4x", 0, 5),
];

/// The classic `qelib1.inc` gate set.
pub static QELIB1: StandardLibrary = StandardLibrary {
    filename: "qelib1.inc",
    version: "qelib1",
    gates: ALL_GATES.split_at(CLASSIC_COUNT).0,
};

/// `qelib1.inc` with the later additions (`sx`, `swap`, `cu`, `rzz`, ...).
pub static QELIB1_EXTENDED: StandardLibrary = StandardLibrary {
    filename: "qelib1.inc",
    version: "qelib1-extended",
    gates: ALL_GATES,
};
