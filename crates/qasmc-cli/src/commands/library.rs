//! Library command implementation.

use console::style;

use super::compile::select_library;

/// Execute the library command.
pub fn execute(extended: bool) {
    let library = select_library(extended);

    println!(
        "{} {} ({} gates, loaded by include \"{}\")\n",
        style("Library").cyan().bold(),
        style(library.version).yellow(),
        library.len(),
        library.filename
    );
    println!("  {:<10} {:>6} {:>6}", "gate", "params", "qubits");
    for gate in library.gates() {
        println!(
            "  {:<10} {:>6} {:>6}",
            style(gate.name).green(),
            gate.num_params,
            gate.num_qubits
        );
    }
}
