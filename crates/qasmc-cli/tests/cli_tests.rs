//! CLI integration tests.
//!
//! Each test writes its inputs into a temporary directory and runs the built
//! `qasmc` binary against them.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const BELL: &str = r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
cx q[0], q[1];
measure q -> c;
"#;

fn qasmc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qasmc"))
        .args(args)
        .env_remove("QASMC_INCLUDE_PATH")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run qasmc")
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

mod compile_command {
    use super::*;

    #[test]
    fn test_table_output() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "bell.qasm", BELL);

        let output = qasmc(&["compile", input.to_str().unwrap()]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let out = stdout(&output);
        assert!(out.contains("2 qubits, 2 clbits, 4 instructions, 0 warnings"));
        assert!(out.contains("measure"));
    }

    #[test]
    fn test_json_output() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "bell.qasm", BELL);

        let output = qasmc(&["compile", input.to_str().unwrap(), "--format", "json"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["circuit"]["num_qubits"], 2);
        assert_eq!(json["circuit"]["instructions"].as_array().unwrap().len(), 4);
        assert_eq!(json["warnings"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_qasm_output_recompiles() {
        let dir = TempDir::new().unwrap();
        let input = write(
            dir.path(),
            "prog.qasm",
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\ngate bell a, b { h a; cx a, b; }\nqreg q[2];\nbell q[0], q[1];\n",
        );
        let out_file = dir.path().join("out.qasm");

        let output = qasmc(&[
            "compile",
            input.to_str().unwrap(),
            "--format",
            "qasm",
            "-o",
            out_file.to_str().unwrap(),
        ]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let emitted = fs::read_to_string(&out_file).unwrap();
        assert!(emitted.starts_with("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n"));
        assert!(!emitted.contains("bell"));
        let circuit = qasmc::compile(&emitted).unwrap().circuit;
        assert_eq!(circuit.len(), 2);
    }

    #[test]
    fn test_include_from_input_directory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "defs.inc", "gate flip a { U(3.141592653589793,0,3.141592653589793) a; }");
        let input = write(
            dir.path(),
            "main.qasm",
            "OPENQASM 2.0;\ninclude \"defs.inc\";\nqreg q[3];\nflip q;\n",
        );

        let output = qasmc(&["compile", input.to_str().unwrap()]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("3 instructions"));
    }

    #[test]
    fn test_include_directory_flag_and_env() {
        let dir = TempDir::new().unwrap();
        let libdir = dir.path().join("lib");
        write(&libdir, "defs.inc", "gate flip a { U(0,0,0) a; }");
        let input = write(
            dir.path(),
            "src/main.qasm",
            "OPENQASM 2.0;\ninclude \"defs.inc\";\nqreg q[1];\nflip q[0];\n",
        );
        let input = input.to_str().unwrap();

        let output = qasmc(&["compile", input]);
        assert!(!output.status.success());
        assert!(stderr(&output).contains("IncludeError"));

        let output = qasmc(&["compile", input, "-I", libdir.to_str().unwrap()]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let output = Command::new(env!("CARGO_BIN_EXE_qasmc"))
            .args(["compile", input])
            .env("QASMC_INCLUDE_PATH", &libdir)
            .env("NO_COLOR", "1")
            .output()
            .unwrap();
        assert!(output.status.success(), "stderr: {}", stderr(&output));
    }

    #[test]
    fn test_compile_error_reports_snippet() {
        let dir = TempDir::new().unwrap();
        let input = write(
            dir.path(),
            "bad.qasm",
            "OPENQASM 2.0;\nqreg q[1];\nfoo q[0];\n",
        );

        let output = qasmc(&["compile", input.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(1));
        let err = stderr(&output);
        assert!(err.contains("error[UndefinedGateError]"));
        assert!(err.contains("bad.qasm:3:1"));
        assert!(err.contains("3 | foo q[0];"));
        assert!(err.contains("Error:"));
    }

    #[test]
    fn test_error_inside_included_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "defs.inc", "qreg q[1];\nqreg q[2];\n");
        let input = write(
            dir.path(),
            "main.qasm",
            "OPENQASM 2.0;\ninclude \"defs.inc\";\n",
        );

        let output = qasmc(&["compile", input.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(1));
        let err = stderr(&output);
        assert!(err.contains("error[DuplicateRegisterError]"));
        assert!(err.contains("defs.inc:2:6"));
        assert!(err.contains("2 | qreg q[2];"));
    }

    #[test]
    fn test_strict_mode() {
        let dir = TempDir::new().unwrap();
        let input = write(
            dir.path(),
            "twice.qasm",
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\ninclude \"qelib1.inc\";\nqreg q[1];\nx q[0];\n",
        );
        let input = input.to_str().unwrap();

        let output = qasmc(&["compile", input]);
        assert!(output.status.success());
        assert!(stderr(&output).contains("warning[RedundantInclude]"));

        let output = qasmc(&["compile", input, "--strict"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("error[PromotedWarning]"));
    }

    #[test]
    fn test_max_include_depth() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.inc", "include \"b.inc\";");
        write(dir.path(), "b.inc", "gate g q { U(0,0,0) q; }");
        let input = write(dir.path(), "main.qasm", "OPENQASM 2.0;\ninclude \"a.inc\";\n");
        let input = input.to_str().unwrap();

        assert!(qasmc(&["compile", input]).status.success());

        let output = qasmc(&["compile", input, "--max-include-depth", "1"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("IncludeDepthExceededError"));
    }

    #[test]
    fn test_extended_library_flag() {
        let dir = TempDir::new().unwrap();
        let input = write(
            dir.path(),
            "swap.qasm",
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nswap q[0], q[1];\n",
        );
        let input = input.to_str().unwrap();

        assert!(!qasmc(&["compile", input]).status.success());
        let output = qasmc(&["compile", input, "--extended-library"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
    }

    #[test]
    fn test_missing_input_file() {
        let output = qasmc(&["compile", "/nonexistent/input.qasm"]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("File not found"));
    }
}

mod other_commands {
    use super::*;

    #[test]
    fn test_tokens() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "t.qasm", "OPENQASM 2.0;\nqreg q[2];");

        let output = qasmc(&["tokens", input.to_str().unwrap()]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let out = stdout(&output);
        assert_eq!(out.lines().count(), 9);
        assert!(out.contains("2:1"));
        assert!(out.contains("identifier 'q'"));
    }

    #[test]
    fn test_tokens_lex_error() {
        let dir = TempDir::new().unwrap();
        let input = write(dir.path(), "t.qasm", "qreg q[2] $");

        let output = qasmc(&["tokens", input.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("error[LexError]"));
    }

    #[test]
    fn test_library_listing() {
        let output = qasmc(&["library"]);
        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains("cu3"));
        assert!(!out.contains("cswap"));

        let output = qasmc(&["library", "--extended-library"]);
        let out = stdout(&output);
        assert!(out.contains("qelib1-extended"));
        assert!(out.contains("cswap"));
    }
}
