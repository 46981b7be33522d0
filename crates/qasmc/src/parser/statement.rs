//! Statement parsing for `OpenQASM` 2.

use qasmc_ir::RegisterKind;

use super::Parser;
use crate::ast::{
    Barrier, BodyCall, Conditional, ConditionalOp, GateCall, GateDecl, Include, Measure, Operand,
    RegisterDecl, Reset, Statement,
};
use crate::diagnostics::WarningKind;
use crate::error::{CompileError, CompileResult, Position};
use crate::lexer::Token;
use crate::symbols::{GateOrigin, GateSignature};

impl Parser<'_, '_> {
    /// Parse one statement, appending it (or, for includes, the spliced
    /// statements of the included file) to `out`.
    pub(super) fn parse_statement(&mut self, out: &mut Vec<Statement>) -> CompileResult<()> {
        let position = self.position()?;
        let token = self
            .peek()?
            .cloned()
            .ok_or_else(|| CompileError::parse("statement", "end of input", position))?;

        let statement = match token {
            Token::Include => return self.parse_include(out),
            Token::Qreg => self.parse_register_decl(RegisterKind::Quantum)?,
            Token::Creg => self.parse_register_decl(RegisterKind::Classical)?,
            Token::Gate => self.parse_gate_def(false)?,
            Token::Opaque => self.parse_gate_def(true)?,
            Token::Measure => Statement::Measure(self.parse_measure()?),
            Token::Reset => Statement::Reset(self.parse_reset()?),
            Token::Barrier => self.parse_barrier()?,
            Token::If => self.parse_if()?,
            Token::Identifier(_) | Token::GateU | Token::GateCX => {
                Statement::GateCall(self.parse_gate_call()?)
            }
            _ => {
                let found = self.next_token("statement")?;
                return Err(Self::unexpected("statement", &found));
            }
        };
        out.push(statement);
        Ok(())
    }

    /// Parse `include "path";`.
    fn parse_include(&mut self, out: &mut Vec<Statement>) -> CompileResult<()> {
        let position = self.expect(&Token::Include)?.position;
        let token = self.next_token("string literal")?;
        let Token::StringLiteral(path) = token.token else {
            return Err(Self::unexpected("string literal", &token));
        };
        self.expect(&Token::Semicolon)?;

        let library = self.ctx.options.library;
        if path == library.filename {
            if self.ctx.symbols.load_library(library, position)? {
                tracing::debug!(library = library.version, "loaded standard library");
                out.push(Statement::Include(Include { path, position }));
            } else {
                let message = format!("'{path}' is already included");
                self.warn(WarningKind::RedundantInclude, message, position);
            }
            return Ok(());
        }

        if !self.ctx.symbols.mark_included(&path) {
            let message = format!("'{path}' is already included");
            self.warn(WarningKind::RedundantInclude, message, position);
            return Ok(());
        }

        let limit = self.ctx.options.max_include_depth;
        if self.depth >= limit {
            return Err(CompileError::IncludeDepthExceeded {
                path,
                limit,
                position,
            });
        }

        let source = self
            .ctx
            .resolver
            .resolve(&path)
            .map_err(|e| CompileError::Include {
                path: path.clone(),
                reason: e.to_string(),
                position,
            })?;
        tracing::debug!(%path, depth = self.depth + 1, "parsing included file");

        let nested = Parser::new(
            &source,
            self.ctx.reborrow(),
            self.depth + 1,
            Some(path.clone()),
        );
        let statements = nested
            .parse_program(false)
            .map_err(|e| CompileError::Included {
                file: path.clone(),
                error: Box::new(e),
            })?;

        out.push(Statement::Include(Include { path, position }));
        out.extend(statements);
        Ok(())
    }

    /// Parse `qreg name[size];` or `creg name[size];`.
    fn parse_register_decl(&mut self, kind: RegisterKind) -> CompileResult<Statement> {
        let position = self.position()?;
        self.advance()?;
        let (name, name_position) = self.parse_identifier()?;
        self.expect(&Token::LBracket)?;
        let (size, size_position) = self.parse_int_literal()?;
        let size = match u32::try_from(size) {
            Ok(size) if size > 0 => size,
            _ => {
                return Err(CompileError::parse(
                    "a positive register size",
                    size.to_string(),
                    size_position,
                ));
            }
        };
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Semicolon)?;

        self.ctx
            .symbols
            .declare_register(&name, kind, size, name_position)?;

        Ok(Statement::RegisterDecl(RegisterDecl {
            name,
            kind,
            size,
            position,
        }))
    }

    /// Parse a gate name: an identifier or one of the `U`/`CX` keywords.
    fn parse_gate_name(&mut self) -> CompileResult<(String, Position)> {
        let token = self.next_token("gate name")?;
        let name = match token.token {
            Token::Identifier(name) => name,
            Token::GateU => "U".to_string(),
            Token::GateCX => "CX".to_string(),
            _ => return Err(Self::unexpected("gate name", &token)),
        };
        Ok((name, token.position))
    }

    /// Parse `gate name(params) qubits { body }` or `opaque name(params) qubits;`.
    fn parse_gate_def(&mut self, opaque: bool) -> CompileResult<Statement> {
        let position = self.position()?;
        self.advance()?;
        let (name, name_position) = self.parse_gate_name()?;
        if self.ctx.symbols.gate(&name).is_some() {
            return Err(CompileError::DuplicateGate {
                name,
                position: name_position,
            });
        }

        let params = if self.consume(&Token::LParen)? {
            let params = if self.check(&Token::RParen)? {
                Vec::new()
            } else {
                self.parse_identifier_list()?
            };
            self.expect(&Token::RParen)?;
            params
        } else {
            Vec::new()
        };
        let qubits = self.parse_identifier_list()?;

        let params = unique_names(params)?;
        let qubits = unique_names(qubits)?;

        let body = if opaque {
            self.expect(&Token::Semicolon)?;
            None
        } else {
            self.expect(&Token::LBrace)?;
            let mut body = Vec::new();
            while !self.consume(&Token::RBrace)? {
                body.push(self.parse_body_call(&name, &params, &qubits)?);
            }
            Some(body)
        };

        self.ctx.symbols.declare_gate(GateSignature {
            name: name.clone(),
            num_params: params.len(),
            num_qubits: qubits.len(),
            origin: if opaque {
                GateOrigin::Opaque
            } else {
                GateOrigin::Defined
            },
            position: Some(name_position),
        })?;

        Ok(Statement::GateDecl(GateDecl {
            name,
            params,
            qubits,
            body,
            position,
        }))
    }

    /// Parse one gate application inside the body of gate `gate_name`.
    fn parse_body_call(
        &mut self,
        gate_name: &str,
        params: &[String],
        qubits: &[String],
    ) -> CompileResult<BodyCall> {
        let token = self.peek()?.cloned();
        if !matches!(
            token,
            Some(Token::Identifier(_) | Token::GateU | Token::GateCX)
        ) {
            let found = self.next_token("gate call or '}'")?;
            return Err(Self::unexpected("gate call or '}'", &found));
        }

        let (name, position) = self.parse_gate_name()?;
        if name == gate_name {
            return Err(CompileError::RecursiveGateDefinition { name, position });
        }
        let (num_params, num_qubits) = self.lookup_gate(&name, position)?;

        let args = if self.consume(&Token::LParen)? {
            let args = self.parse_expression_list(params)?;
            self.expect(&Token::RParen)?;
            args
        } else {
            Vec::new()
        };

        let mut indices = Vec::new();
        for (arg, arg_position) in self.parse_identifier_list()? {
            let Some(index) = qubits.iter().position(|q| *q == arg) else {
                return Err(CompileError::UnboundIdentifier {
                    name: arg,
                    expected: "a qubit argument of this gate",
                    position: arg_position,
                });
            };
            if indices.contains(&index) {
                return Err(CompileError::DuplicateQubit {
                    gate: name,
                    qubit: arg,
                    position: arg_position,
                });
            }
            indices.push(index);
        }
        self.expect(&Token::Semicolon)?;

        check_arity(&name, num_params, args.len(), num_qubits, indices.len(), position)?;

        Ok(BodyCall {
            name,
            params: args,
            qubits: indices,
            position,
        })
    }

    /// Resolve a gate name to its `(num_params, num_qubits)` arity.
    fn lookup_gate(&self, name: &str, position: Position) -> CompileResult<(usize, usize)> {
        self.ctx
            .symbols
            .gate(name)
            .map(|g| (g.num_params, g.num_qubits))
            .ok_or_else(|| CompileError::UndefinedGate {
                name: name.to_string(),
                position,
            })
    }

    /// Parse a top-level gate application.
    fn parse_gate_call(&mut self) -> CompileResult<GateCall> {
        let (name, position) = self.parse_gate_name()?;
        let (num_params, num_qubits) = self.lookup_gate(&name, position)?;

        let params = if self.consume(&Token::LParen)? {
            let mut params = Vec::new();
            if !self.check(&Token::RParen)? {
                params.push(self.parse_constant_expression()?);
                while self.consume(&Token::Comma)? {
                    params.push(self.parse_constant_expression()?);
                }
            }
            self.expect(&Token::RParen)?;
            params
        } else {
            Vec::new()
        };

        let mut qubits = vec![self.parse_operand(RegisterKind::Quantum)?];
        while self.consume(&Token::Comma)? {
            qubits.push(self.parse_operand(RegisterKind::Quantum)?);
        }
        self.expect(&Token::Semicolon)?;

        check_arity(&name, num_params, params.len(), num_qubits, qubits.len(), position)?;

        Ok(GateCall {
            name,
            params,
            qubits,
            position,
        })
    }

    /// Parse `name` or `name[index]`, checking that `name` is a declared
    /// register of the given kind.
    fn parse_operand(&mut self, kind: RegisterKind) -> CompileResult<Operand> {
        let (register, position) = self.parse_identifier()?;
        self.ctx.symbols.require_register(&register, kind, position)?;

        let index = if self.consume(&Token::LBracket)? {
            let (index, index_position) = self.parse_int_literal()?;
            self.expect(&Token::RBracket)?;
            // Bounds are checked when the circuit is built; anything wider
            // than u32 can never be in range.
            let index = u32::try_from(index).map_err(|_| {
                let size = self
                    .ctx
                    .symbols
                    .register(&register)
                    .map_or(0, |r| r.size);
                CompileError::IndexOutOfBounds {
                    register: register.clone(),
                    index,
                    size,
                    position: index_position,
                }
            })?;
            Some(index)
        } else {
            None
        };

        Ok(Operand {
            register,
            index,
            position,
        })
    }

    /// Parse `measure qubit -> clbit;`.
    fn parse_measure(&mut self) -> CompileResult<Measure> {
        let position = self.expect(&Token::Measure)?.position;
        let qubit = self.parse_operand(RegisterKind::Quantum)?;
        self.expect(&Token::Arrow)?;
        let clbit = self.parse_operand(RegisterKind::Classical)?;
        self.expect(&Token::Semicolon)?;
        Ok(Measure {
            qubit,
            clbit,
            position,
        })
    }

    /// Parse `reset qubit;`.
    fn parse_reset(&mut self) -> CompileResult<Reset> {
        let position = self.expect(&Token::Reset)?.position;
        let qubit = self.parse_operand(RegisterKind::Quantum)?;
        self.expect(&Token::Semicolon)?;
        Ok(Reset { qubit, position })
    }

    /// Parse `barrier operands;`.
    fn parse_barrier(&mut self) -> CompileResult<Statement> {
        let position = self.expect(&Token::Barrier)?.position;
        let mut qubits = vec![self.parse_operand(RegisterKind::Quantum)?];
        while self.consume(&Token::Comma)? {
            qubits.push(self.parse_operand(RegisterKind::Quantum)?);
        }
        self.expect(&Token::Semicolon)?;
        Ok(Statement::Barrier(Barrier { qubits, position }))
    }

    /// Parse `if (creg == value) op;`.
    fn parse_if(&mut self) -> CompileResult<Statement> {
        let position = self.expect(&Token::If)?.position;
        self.expect(&Token::LParen)?;
        let (register, register_position) = self.parse_identifier()?;
        let size = self
            .ctx
            .symbols
            .require_register(&register, RegisterKind::Classical, register_position)?
            .size;
        self.expect(&Token::EqEq)?;
        let (value, value_position) = self.parse_int_literal()?;
        self.expect(&Token::RParen)?;

        if size < 64 && value >> size != 0 {
            let message = format!(
                "condition value {value} does not fit in the {size} bit(s) of register '{register}'"
            );
            self.warn(WarningKind::UnsatisfiableCondition, message, value_position);
        }

        let next = self.peek()?.cloned();
        let op = match next {
            Some(Token::Measure) => ConditionalOp::Measure(self.parse_measure()?),
            Some(Token::Reset) => ConditionalOp::Reset(self.parse_reset()?),
            Some(Token::Identifier(_) | Token::GateU | Token::GateCX) => {
                ConditionalOp::Gate(self.parse_gate_call()?)
            }
            _ => {
                let expected = "gate call, 'measure' or 'reset'";
                let found = self.next_token(expected)?;
                return Err(Self::unexpected(expected, &found));
            }
        };

        Ok(Statement::Conditional(Conditional {
            register,
            value,
            op,
            position,
        }))
    }
}

/// Check call-site parameter and qubit counts against a gate's signature.
fn check_arity(
    name: &str,
    num_params: usize,
    given_params: usize,
    num_qubits: usize,
    given_qubits: usize,
    position: Position,
) -> CompileResult<()> {
    if given_params != num_params {
        return Err(CompileError::arity(
            format!("gate '{name}' takes {num_params} parameter(s), but {given_params} were given"),
            position,
        ));
    }
    if given_qubits != num_qubits {
        return Err(CompileError::arity(
            format!("gate '{name}' acts on {num_qubits} qubit(s), but {given_qubits} were given"),
            position,
        ));
    }
    Ok(())
}

/// Strip positions from a formal argument list, rejecting repeated names.
fn unique_names(names: Vec<(String, Position)>) -> CompileResult<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for (name, position) in names {
        if out.contains(&name) {
            return Err(CompileError::parse(
                "a distinct argument name",
                format!("repeated '{name}'"),
                position,
            ));
        }
        out.push(name);
    }
    Ok(out)
}
