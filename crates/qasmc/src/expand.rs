//! Gate expansion.
//!
//! Every call to a gate defined with a body is replaced by the calls in that
//! body, with actual parameters and qubits substituted for the formals,
//! recursively until only primitive gates (`U`, `CX`, library and opaque
//! gates) remain. Calls that broadcast over whole registers are split per
//! index first, so the expanded calls keep per-index program order.

use rustc_hash::FxHashMap;

use crate::ast::{Conditional, ConditionalOp, GateCall, GateDecl, Operand, Program, Statement};
use crate::error::{CompileError, CompileResult, Position};
use crate::symbols::SymbolTable;

/// Expand all composite gate calls in `program`.
///
/// Gate declarations are kept in the output, so expanding an already
/// expanded program returns it unchanged.
pub fn expand(program: &Program, symbols: &SymbolTable) -> CompileResult<Program> {
    let mut expander = Expander::new(symbols);
    let mut statements = Vec::with_capacity(program.statements.len());

    for statement in &program.statements {
        match statement {
            Statement::GateDecl(decl) => {
                expander.define(decl);
                statements.push(statement.clone());
            }
            Statement::GateCall(call) => expander.expand_call(call, None, &mut statements)?,
            Statement::Conditional(cond) => match &cond.op {
                ConditionalOp::Gate(call) => {
                    expander.expand_call(call, Some(cond), &mut statements)?;
                }
                _ => statements.push(statement.clone()),
            },
            _ => statements.push(statement.clone()),
        }
    }

    tracing::debug!(
        before = program.statements.len(),
        after = statements.len(),
        "expanded gate calls"
    );
    Ok(Program { statements })
}

struct Expander<'p> {
    symbols: &'p SymbolTable,
    definitions: FxHashMap<&'p str, &'p GateDecl>,
    /// Gates currently being expanded, innermost last.
    stack: Vec<&'p str>,
}

impl<'p> Expander<'p> {
    fn new(symbols: &'p SymbolTable) -> Self {
        Self {
            symbols,
            definitions: FxHashMap::default(),
            stack: Vec::new(),
        }
    }

    fn define(&mut self, decl: &'p GateDecl) {
        if decl.body.is_some() {
            self.definitions.insert(decl.name.as_str(), decl);
        }
    }

    /// Expand `call` into `out`, wrapping every emitted call in a copy of
    /// `condition` if one is given.
    fn expand_call(
        &mut self,
        call: &GateCall,
        condition: Option<&Conditional>,
        out: &mut Vec<Statement>,
    ) -> CompileResult<()> {
        if !self.symbols.is_composite(&call.name) {
            out.push(wrap(call.clone(), condition));
            return Ok(());
        }

        let Some(&decl) = self.definitions.get(call.name.as_str()) else {
            return Err(CompileError::UndefinedGate {
                name: call.name.clone(),
                position: call.position,
            });
        };

        for qubits in self.broadcast(call)? {
            self.substitute(decl, call, &qubits, condition, out)?;
        }
        Ok(())
    }

    /// Split a call with whole-register operands into one operand list per
    /// register index.
    fn broadcast(&self, call: &GateCall) -> CompileResult<Vec<Vec<Operand>>> {
        let mut width: Option<u32> = None;
        for operand in call.qubits.iter().filter(|o| o.index.is_none()) {
            let size = self.register_size(operand)?;
            match width {
                Some(w) if w != size => {
                    return Err(CompileError::arity(
                        format!(
                            "cannot broadcast '{}' over registers of sizes {w} and {size}",
                            call.name
                        ),
                        call.position,
                    ));
                }
                _ => width = Some(size),
            }
        }

        let Some(width) = width else {
            return Ok(vec![call.qubits.clone()]);
        };
        Ok((0..width)
            .map(|i| {
                call.qubits
                    .iter()
                    .map(|o| match o.index {
                        Some(_) => o.clone(),
                        None => Operand::element(o.register.clone(), i, o.position),
                    })
                    .collect()
            })
            .collect())
    }

    fn register_size(&self, operand: &Operand) -> CompileResult<u32> {
        self.symbols
            .register(&operand.register)
            .map(|r| r.size)
            .ok_or_else(|| CompileError::UnboundIdentifier {
                name: operand.register.clone(),
                expected: "a quantum register",
                position: operand.position,
            })
    }

    /// Instantiate the body of `decl` for one concrete qubit assignment.
    fn substitute(
        &mut self,
        decl: &'p GateDecl,
        call: &GateCall,
        qubits: &[Operand],
        condition: Option<&Conditional>,
        out: &mut Vec<Statement>,
    ) -> CompileResult<()> {
        if self.stack.contains(&decl.name.as_str()) {
            return Err(CompileError::RecursiveGateDefinition {
                name: decl.name.clone(),
                position: call.position,
            });
        }
        if call.params.len() != decl.params.len() || qubits.len() != decl.qubits.len() {
            return Err(CompileError::arity(
                format!(
                    "gate '{}' takes {} parameter(s) and {} qubit(s), but was given {} and {}",
                    decl.name,
                    decl.params.len(),
                    decl.qubits.len(),
                    call.params.len(),
                    qubits.len()
                ),
                call.position,
            ));
        }

        self.stack.push(decl.name.as_str());
        for body_call in decl.body.iter().flatten() {
            let params = body_call
                .params
                .iter()
                .map(|p| p.eval(&call.params))
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| unbound(&decl.name, "a gate parameter", body_call.position))?;
            if let Some(&value) = params.iter().find(|v| !v.is_finite()) {
                return Err(CompileError::non_finite(value, call.position));
            }
            let operands = body_call
                .qubits
                .iter()
                .map(|&i| qubits.get(i).cloned())
                .collect::<Option<Vec<Operand>>>()
                .ok_or_else(|| {
                    unbound(&decl.name, "a qubit argument of this gate", body_call.position)
                })?;

            let inner = GateCall {
                name: body_call.name.clone(),
                params,
                qubits: operands,
                position: call.position,
            };
            self.expand_call(&inner, condition, out)?;
        }
        self.stack.pop();
        Ok(())
    }
}

fn unbound(gate: &str, expected: &'static str, position: Position) -> CompileError {
    CompileError::UnboundIdentifier {
        name: gate.to_string(),
        expected,
        position,
    }
}

fn wrap(call: GateCall, condition: Option<&Conditional>) -> Statement {
    match condition {
        Some(cond) => Statement::Conditional(Conditional {
            register: cond.register.clone(),
            value: cond.value,
            op: ConditionalOp::Gate(call),
            position: cond.position,
        }),
        None => Statement::GateCall(call),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BodyCall, Expr};
    use crate::error::ErrorKind;
    use crate::include::NoIncludes;
    use crate::options::CompileOptions;
    use crate::parser::parse;
    use crate::symbols::{GateOrigin, GateSignature};
    use std::f64::consts::PI;

    fn expand_source(source: &str) -> CompileResult<Program> {
        let output = parse(source, &CompileOptions::default(), &NoIncludes)?;
        expand(&output.program, &output.symbols)
    }

    fn calls(program: &Program) -> Vec<&GateCall> {
        program
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::GateCall(call) => Some(call),
                Statement::Conditional(c) => match &c.op {
                    ConditionalOp::Gate(call) => Some(call),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_broadcast_expansion() {
        let program =
            expand_source("OPENQASM 2.0;\ngate h q { U(pi/2,0,pi) q; }\nqreg a[3];\nh a;").unwrap();
        let calls = calls(&program);
        assert_eq!(calls.len(), 3);
        for (i, call) in calls.iter().enumerate() {
            assert_eq!(call.name, "U");
            assert_eq!(call.params, vec![PI / 2.0, 0.0, PI]);
            assert_eq!(call.qubits, vec![Operand::element("a", i as u32, call.qubits[0].position)]);
            assert_eq!(call.position.line, 4);
        }
    }

    #[test]
    fn test_nested_substitution() {
        let source = r"
            OPENQASM 2.0;
            gate rz(phi) a { U(0, 0, phi) a; }
            gate crz(lambda) c, t {
                rz(lambda/2) t;
                CX c, t;
                rz(-lambda/2) t;
                CX c, t;
            }
            qreg q[2];
            crz(1.0) q[1], q[0];
        ";
        let program = expand_source(source).unwrap();
        let calls = calls(&program);
        let names: Vec<_> = calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["U", "CX", "U", "CX"]);
        assert_eq!(calls[0].params, vec![0.0, 0.0, 0.5]);
        assert_eq!(calls[0].qubits[0].to_string(), "q[0]");
        assert_eq!(calls[2].params[2], -0.5);
        assert_eq!(calls[1].qubits[0].to_string(), "q[1]");
        assert_eq!(calls[1].qubits[1].to_string(), "q[0]");
    }

    #[test]
    fn test_primitive_calls_untouched() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nh q;\ncx q[0], q[1];";
        let output = parse(source, &CompileOptions::default(), &NoIncludes).unwrap();
        let expanded = expand(&output.program, &output.symbols).unwrap();
        assert_eq!(expanded, output.program);
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let source = "OPENQASM 2.0;\ngate g(t) a, b { U(t,0,0) a; CX a, b; }\nqreg q[2];\ncreg c[1];\ng(0.3) q[0], q[1];\nif(c==1) g(0.1) q[1], q[0];";
        let output = parse(source, &CompileOptions::default(), &NoIncludes).unwrap();
        let once = expand(&output.program, &output.symbols).unwrap();
        let twice = expand(&once, &output.symbols).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_conditional_wraps_every_expanded_call() {
        let source = "OPENQASM 2.0;\ngate g a, b { U(0,0,0) a; CX a, b; }\nqreg q[2];\ncreg c[2];\nif(c==2) g q[0], q[1];";
        let program = expand_source(source).unwrap();
        let conditionals: Vec<_> = program
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::Conditional(c) => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(conditionals.len(), 2);
        assert!(conditionals.iter().all(|c| c.register == "c" && c.value == 2));
    }

    #[test]
    fn test_non_finite_body_parameter() {
        let source = "OPENQASM 2.0;\ngate g(t) a { U(1/t,0,0) a; }\nqreg q[1];\ng(0) q[0];";
        let err = expand_source(source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.position().line, 4);
        assert_eq!(err.position().column, 1);

        let source = "OPENQASM 2.0;\ngate g(t) a { U(1/t,0,0) a; }\nqreg q[1];\ng(2) q[0];";
        assert!(expand_source(source).is_ok());
    }

    #[test]
    fn test_broadcast_size_mismatch() {
        let source = "OPENQASM 2.0;\ngate g a, b { CX a, b; }\nqreg q[2];\nqreg r[3];\ng q, r;";
        let err = expand_source(source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArityError);
        assert_eq!(err.position().line, 5);
    }

    #[test]
    fn test_mixed_broadcast() {
        let source = "OPENQASM 2.0;\ngate g a, b { CX a, b; }\nqreg q[1];\nqreg r[2];\ng q[0], r;";
        let program = expand_source(source).unwrap();
        let calls = calls(&program);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].qubits[0].to_string(), "q[0]");
        assert_eq!(calls[1].qubits[1].to_string(), "r[1]");
    }

    #[test]
    fn test_recursion_in_hand_built_ast() {
        // A cycle the parser would reject: `g` calls itself.
        let mut symbols = SymbolTable::new();
        symbols
            .declare_gate(GateSignature {
                name: "g".into(),
                num_params: 0,
                num_qubits: 1,
                origin: GateOrigin::Defined,
                position: None,
            })
            .unwrap();
        symbols
            .declare_register("q", qasmc_ir::RegisterKind::Quantum, 1, Position::default())
            .unwrap();
        let position = Position::new(3, 1, 20);
        let program = Program {
            statements: vec![
                Statement::GateDecl(GateDecl {
                    name: "g".into(),
                    params: vec![],
                    qubits: vec!["a".into()],
                    body: Some(vec![BodyCall {
                        name: "g".into(),
                        params: vec![],
                        qubits: vec![0],
                        position,
                    }]),
                    position,
                }),
                Statement::GateCall(GateCall {
                    name: "g".into(),
                    params: vec![],
                    qubits: vec![Operand::element("q", 0, position)],
                    position,
                }),
            ],
        };
        let err = expand(&program, &symbols).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecursiveGateDefinitionError);
    }

    #[test]
    fn test_param_out_of_range_in_hand_built_body() {
        let mut symbols = SymbolTable::new();
        symbols
            .declare_gate(GateSignature {
                name: "g".into(),
                num_params: 0,
                num_qubits: 1,
                origin: GateOrigin::Defined,
                position: None,
            })
            .unwrap();
        let position = Position::default();
        let program = Program {
            statements: vec![
                Statement::GateDecl(GateDecl {
                    name: "g".into(),
                    params: vec![],
                    qubits: vec!["a".into()],
                    body: Some(vec![BodyCall {
                        name: "U".into(),
                        params: vec![Expr::Param(0), Expr::Constant(0.0), Expr::Constant(0.0)],
                        qubits: vec![0],
                        position,
                    }]),
                    position,
                }),
                Statement::GateCall(GateCall {
                    name: "g".into(),
                    params: vec![],
                    qubits: vec![Operand::element("q", 0, position)],
                    position,
                }),
            ],
        };
        let err = expand(&program, &symbols).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnboundIdentifierError);
    }
}
