//! `OpenQASM` 2.0 compiler
//!
//! This crate compiles `OpenQASM` 2.0 source text into the flat circuit model
//! of [`qasmc_ir`]: a register table plus an ordered list of resolved
//! instructions with absolute qubit and clbit indices.
//!
//! The pipeline runs in three stages, each available on its own:
//!
//! 1. [`parse`]: lexing and recursive-descent parsing into an [`ast::Program`],
//!    checking every name against the [`SymbolTable`] as declarations are seen.
//!    `include "qelib1.inc";` splices in a [`StandardLibrary`] table; other
//!    includes are fetched through an [`IncludeResolver`].
//! 2. [`expand`]: inlining of user-defined gate bodies until only primitive
//!    gates remain.
//! 3. [`build`]: qubit/clbit allocation and lowering to a [`Circuit`].
//!
//! [`emit`] writes a circuit back out as `OpenQASM` 2.0.
//!
//! # Example
//!
//! ```rust
//! use qasmc::compile;
//!
//! let source = r#"
//!     OPENQASM 2.0;
//!     include "qelib1.inc";
//!     gate bell a, b { h a; cx a, b; }
//!     qreg q[2];
//!     creg c[2];
//!     bell q[0], q[1];
//!     measure q -> c;
//! "#;
//!
//! let compilation = compile(source).unwrap();
//! let names: Vec<_> = compilation
//!     .circuit
//!     .instructions()
//!     .iter()
//!     .map(|i| i.name())
//!     .collect();
//! assert_eq!(names, ["h", "cx", "measure", "measure"]);
//! ```
//!
//! # Example: Includes and options
//!
//! ```rust
//! use qasmc::{CompileOptions, Compiler, InMemoryIncludes, QELIB1_EXTENDED};
//!
//! let resolver = InMemoryIncludes::new()
//!     .with_file("defs.inc", "gate flip a { x a; }");
//! let compiler = Compiler::new()
//!     .with_options(CompileOptions::new().with_library(&QELIB1_EXTENDED))
//!     .with_resolver(resolver);
//!
//! let source = r#"
//!     OPENQASM 2.0;
//!     include "qelib1.inc";
//!     include "defs.inc";
//!     qreg q[2];
//!     flip q;
//!     swap q[0], q[1];
//! "#;
//! let circuit = compiler.compile(source).unwrap().circuit;
//! assert_eq!(circuit.len(), 3);
//! ```
//!
//! # Errors
//!
//! Compilation stops at the first error. Every [`CompileError`] has an
//! [`ErrorKind`] and a source [`Position`]; [`Diagnostic`] renders either
//! an error or a warning with a snippet of the offending line.

pub mod ast;
pub mod build;
pub mod compiler;
pub mod diagnostics;
pub mod emitter;
pub mod error;
pub mod expand;
pub mod include;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod stdlib;
pub mod symbols;

pub use build::build;
pub use compiler::{Compilation, Compiler, compile};
pub use diagnostics::{Diagnostic, Severity, Warning, WarningKind};
pub use emitter::{emit, emit_with_library};
pub use error::{CompileError, CompileResult, ErrorKind, Position};
pub use expand::expand;
pub use include::{InMemoryIncludes, IncludeResolver, NoIncludes, ResolveError};
pub use lexer::{Lexer, SpannedToken, Token, tokenize};
pub use options::CompileOptions;
pub use parser::{ParseOutput, parse};
pub use stdlib::{QELIB1, QELIB1_EXTENDED, StandardLibrary};
pub use symbols::SymbolTable;

pub use qasmc_ir::Circuit;
