//! The compilation driver: parse, expand and build in sequence.

use serde::Serialize;
use tracing::{debug, info, instrument};

use qasmc_ir::Circuit;

use crate::build::build;
use crate::diagnostics::{Diagnostic, Warning};
use crate::error::{CompileError, CompileResult};
use crate::expand::expand;
use crate::include::{IncludeResolver, NoIncludes};
use crate::options::CompileOptions;
use crate::parser::parse;

/// Output of a successful compilation.
#[derive(Debug, Clone, Serialize)]
pub struct Compilation {
    pub circuit: Circuit,
    /// Warnings raised along the way, in source order.
    pub warnings: Vec<Warning>,
}

impl Compilation {
    /// The warnings as renderable diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.warnings.iter().map(Diagnostic::from).collect()
    }
}

/// Compiles `OpenQASM` 2.0 source text into a [`Circuit`].
///
/// Each call to [`compile`](Self::compile) owns its own symbol tables, so a
/// compiler can be shared between threads.
pub struct Compiler {
    options: CompileOptions,
    resolver: Box<dyn IncludeResolver>,
}

impl Compiler {
    /// Create a compiler with default options and no include resolver.
    pub fn new() -> Self {
        Self {
            options: CompileOptions::default(),
            resolver: Box::new(NoIncludes),
        }
    }

    /// Set the compile options.
    #[must_use]
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the resolver used for non-library includes.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl IncludeResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a complete program.
    ///
    /// Fails with the first error encountered. In strict mode the first
    /// warning is returned as a [`CompileError::PromotedWarning`].
    #[instrument(skip(self, source), fields(bytes = source.len()))]
    pub fn compile(&self, source: &str) -> CompileResult<Compilation> {
        let parsed = parse(source, &self.options, self.resolver.as_ref())?;
        debug!(
            statements = parsed.program.statements.len(),
            registers = parsed.symbols.num_registers(),
            gates = parsed.symbols.num_gates(),
            "parsed program"
        );

        if self.options.strict {
            if let Some(warning) = parsed.warnings.first() {
                return Err(promote(warning.clone()));
            }
        }

        let expanded = expand(&parsed.program, &parsed.symbols)?;
        let circuit = build(&expanded)?;

        info!(
            "Compiled circuit with {} qubits, {} clbits, {} instructions ({} warnings)",
            circuit.num_qubits(),
            circuit.num_clbits(),
            circuit.len(),
            parsed.warnings.len()
        );

        Ok(Compilation {
            circuit,
            warnings: parsed.warnings,
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

fn promote(warning: Warning) -> CompileError {
    match warning.file.clone() {
        Some(file) => CompileError::Included {
            file,
            error: Box::new(warning.into()),
        },
        None => warning.into(),
    }
}

/// Compile `source` with default options and no include resolver.
pub fn compile(source: &str) -> CompileResult<Compilation> {
    Compiler::new().compile(source)
}
