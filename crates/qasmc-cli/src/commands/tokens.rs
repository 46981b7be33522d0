//! Tokens command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use qasmc::Lexer;

use super::common::{FsIncludeResolver, read_source, report_error};

/// Execute the tokens command.
pub fn execute(input: &Path) -> Result<()> {
    let source = read_source(input)?;

    let mut count = 0;
    for token in Lexer::new(&source) {
        match token {
            Ok(token) => {
                println!(
                    "{:>5}:{:<4} {}",
                    token.position.line,
                    token.position.column,
                    style(token.token.describe()).cyan()
                );
                count += 1;
            }
            Err(e) => {
                let resolver = FsIncludeResolver::for_input(input, &[]);
                report_error(&e, input, &source, &resolver);
                anyhow::bail!("could not tokenize {}", input.display());
            }
        }
    }

    tracing::info!("{} tokens", count);
    Ok(())
}
