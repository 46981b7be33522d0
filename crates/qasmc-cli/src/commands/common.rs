//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use qasmc::{CompileError, Diagnostic, IncludeResolver, ResolveError, Severity, Warning};

/// Read a source file.
pub fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Resolves include paths against a list of directories, first match wins.
#[derive(Debug, Clone, Default)]
pub struct FsIncludeResolver {
    search_path: Vec<PathBuf>,
}

impl FsIncludeResolver {
    /// Search the directory containing `input` first, then `dirs` in order.
    pub fn for_input(input: &Path, dirs: &[PathBuf]) -> Self {
        let base = input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let mut search_path = vec![base];
        search_path.extend(dirs.iter().cloned());
        Self { search_path }
    }

    /// Find the file an include path refers to.
    pub fn locate(&self, path: &str) -> Option<PathBuf> {
        let requested = Path::new(path);
        if requested.is_absolute() {
            return requested.is_file().then(|| requested.to_path_buf());
        }
        self.search_path
            .iter()
            .map(|dir| dir.join(requested))
            .find(|candidate| candidate.is_file())
    }
}

impl IncludeResolver for FsIncludeResolver {
    fn resolve(&self, path: &str) -> Result<String, ResolveError> {
        let Some(found) = self.locate(path) else {
            let searched: Vec<String> = self
                .search_path
                .iter()
                .map(|d| d.display().to_string())
                .collect();
            return Err(format!("not found (searched: {})", searched.join(", ")).into());
        };
        tracing::debug!("Resolved include '{}' to {}", path, found.display());
        Ok(fs::read_to_string(&found)?)
    }
}

/// Print a diagnostic to stderr with a source snippet.
///
/// `source` is the text of the input file; diagnostics raised inside an
/// included file are rendered against that file, fetched through `resolver`.
pub fn print_diagnostic(
    diagnostic: &Diagnostic,
    input: &Path,
    source: &str,
    resolver: &FsIncludeResolver,
) {
    let label = match diagnostic.severity {
        Severity::Error => style(format!("error[{}]", diagnostic.code)).red().bold(),
        Severity::Warning => style(format!("warning[{}]", diagnostic.code))
            .yellow()
            .bold(),
    };
    eprintln!("{}: {}", label, diagnostic.message);

    let (file, snippet) = match &diagnostic.file {
        Some(file) => {
            let text = resolver.resolve(file).unwrap_or_default();
            (file.clone(), diagnostic.render(&text))
        }
        None => (input.display().to_string(), diagnostic.render(source)),
    };
    eprintln!(
        "  {} {}:{}:{}",
        style("-->").blue().bold(),
        file,
        diagnostic.position.line,
        diagnostic.position.column
    );
    for line in snippet.lines() {
        eprintln!("  {}", style(line).dim());
    }
}

/// Print a compile error with its snippet.
pub fn report_error(
    error: &CompileError,
    input: &Path,
    source: &str,
    resolver: &FsIncludeResolver,
) {
    print_diagnostic(&Diagnostic::from(error), input, source, resolver);
}

/// Print collected warnings with their snippets.
pub fn report_warnings(
    warnings: &[Warning],
    input: &Path,
    source: &str,
    resolver: &FsIncludeResolver,
) {
    for warning in warnings {
        print_diagnostic(&Diagnostic::from(warning), input, source, resolver);
    }
}
