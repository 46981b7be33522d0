//! Compile command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use console::style;

use qasmc::{
    Compilation, CompileOptions, Compiler, QELIB1, QELIB1_EXTENDED, StandardLibrary,
    emit_with_library,
};
use qasmc_ir::Instruction;

use super::common::{FsIncludeResolver, read_source, report_error, report_warnings};

/// How to render a compiled circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable register and instruction listing
    Table,
    /// The circuit and warnings as JSON
    Json,
    /// Normalized OpenQASM 2.0
    Qasm,
}

/// Execute the compile command.
pub fn execute(
    input: &Path,
    include_dirs: &[PathBuf],
    format: OutputFormat,
    output: Option<&Path>,
    max_include_depth: usize,
    strict: bool,
    extended_library: bool,
) -> Result<()> {
    let source = read_source(input)?;
    let resolver = FsIncludeResolver::for_input(input, include_dirs);
    let library = select_library(extended_library);

    let options = CompileOptions::new()
        .with_library(library)
        .with_max_include_depth(max_include_depth)
        .with_strict(strict);
    let compiler = Compiler::new()
        .with_options(options)
        .with_resolver(resolver.clone());

    let compilation = match compiler.compile(&source) {
        Ok(compilation) => compilation,
        Err(e) => {
            report_error(&e, input, &source, &resolver);
            anyhow::bail!("could not compile {}", input.display());
        }
    };
    report_warnings(&compilation.warnings, input, &source, &resolver);

    let rendered = match format {
        OutputFormat::Table => render_table(input, &compilation),
        OutputFormat::Json => serde_json::to_string_pretty(&compilation)
            .context("Failed to serialize circuit")?,
        OutputFormat::Qasm => emit_with_library(&compilation.circuit, library)
            .map_err(|e| anyhow::anyhow!("Emit error: {e}"))?,
    };

    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            println!(
                "{} Wrote {}",
                style("✓").green().bold(),
                style(path.display()).green()
            );
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

pub fn select_library(extended: bool) -> &'static StandardLibrary {
    if extended { &QELIB1_EXTENDED } else { &QELIB1 }
}

fn render_table(input: &Path, compilation: &Compilation) -> String {
    let circuit = &compilation.circuit;
    let mut out = String::new();

    out.push_str(&format!(
        "{} Compiled {}\n",
        style("✓").green().bold(),
        style(input.display()).green()
    ));
    out.push_str(&format!(
        "  {} qubits, {} clbits, {} instructions, {} warnings\n",
        circuit.num_qubits(),
        circuit.num_clbits(),
        circuit.len(),
        compilation.warnings.len()
    ));

    out.push_str(&format!("\n{}\n", style("Registers:").bold()));
    for register in circuit.registers() {
        let range = register.range();
        out.push_str(&format!(
            "  {:<5} {:<12} size {:<4} indices {}..{}\n",
            register.kind.keyword(),
            style(&register.name).cyan(),
            register.size,
            range.start,
            range.end
        ));
    }

    out.push_str(&format!("\n{}\n", style("Instructions:").bold()));
    for (i, instruction) in circuit.instructions().iter().enumerate() {
        out.push_str(&format!("  {i:>5}  {}\n", describe(instruction)));
    }
    out
}

fn describe(instruction: &Instruction) -> String {
    let mut line = format!("{:<10}", instruction.name());
    if !instruction.params.is_empty() {
        let params: Vec<String> = instruction.params.iter().map(|p| format!("{p:.6}")).collect();
        line.push_str(&format!(" ({})", params.join(", ")));
    }
    let qubits: Vec<String> = instruction.qubits.iter().map(ToString::to_string).collect();
    line.push_str(&format!(" {}", qubits.join(" ")));
    if !instruction.clbits.is_empty() {
        let clbits: Vec<String> = instruction.clbits.iter().map(ToString::to_string).collect();
        line.push_str(&format!(" -> {}", clbits.join(" ")));
    }
    if let Some(condition) = &instruction.condition {
        line.push_str(&format!("  if {condition}"));
    }
    line
}
