//! Recursive-descent parser for `OpenQASM` 2.
//!
//! The parser consults and populates the [`SymbolTable`] as it goes: register
//! and gate declarations are recorded when they are seen, so every reference
//! is checked against the declarations that precede it. Included files are
//! parsed by a nested parser sharing the same table, and their statements
//! are spliced in place of the `include`.

mod expression;
mod statement;

use crate::ast::{Program, Statement};
use crate::diagnostics::{Warning, WarningKind};
use crate::error::{CompileError, CompileResult, Position};
use crate::include::IncludeResolver;
use crate::lexer::{Lexer, SpannedToken, Token};
use crate::options::CompileOptions;
use crate::symbols::SymbolTable;

/// Result of parsing a program.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub program: Program,
    /// Registers and gates declared by the program and its includes.
    pub symbols: SymbolTable,
    pub warnings: Vec<Warning>,
}

/// Parse `source` into an AST.
pub fn parse(
    source: &str,
    options: &CompileOptions,
    resolver: &dyn IncludeResolver,
) -> CompileResult<ParseOutput> {
    let mut symbols = SymbolTable::new();
    let mut warnings = Vec::new();
    let ctx = ParseContext {
        options,
        resolver,
        symbols: &mut symbols,
        warnings: &mut warnings,
    };
    let statements = Parser::new(source, ctx, 0, None).parse_program(true)?;
    Ok(ParseOutput {
        program: Program { statements },
        symbols,
        warnings,
    })
}

/// State shared between the main parser and the parsers of included files.
pub(super) struct ParseContext<'a> {
    options: &'a CompileOptions,
    resolver: &'a dyn IncludeResolver,
    symbols: &'a mut SymbolTable,
    warnings: &'a mut Vec<Warning>,
}

impl ParseContext<'_> {
    fn reborrow(&mut self) -> ParseContext<'_> {
        ParseContext {
            options: self.options,
            resolver: self.resolver,
            symbols: &mut *self.symbols,
            warnings: &mut *self.warnings,
        }
    }
}

/// Parser state.
pub(super) struct Parser<'src, 'a> {
    lexer: Lexer<'src>,
    peeked: Option<SpannedToken>,
    ctx: ParseContext<'a>,
    /// Include nesting depth of this file; 0 for the main source.
    depth: usize,
    /// Include path of this file; `None` for the main source.
    file: Option<String>,
}

impl<'src, 'a> Parser<'src, 'a> {
    fn new(source: &'src str, ctx: ParseContext<'a>, depth: usize, file: Option<String>) -> Self {
        Self {
            lexer: Lexer::new(source),
            peeked: None,
            ctx,
            depth,
            file,
        }
    }

    fn fill(&mut self) -> CompileResult<()> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next().transpose()?;
        }
        Ok(())
    }

    /// Peek at the current token.
    pub(super) fn peek(&mut self) -> CompileResult<Option<&Token>> {
        self.fill()?;
        Ok(self.peeked.as_ref().map(|t| &t.token))
    }

    /// Position of the current token, or of the end of input.
    pub(super) fn position(&mut self) -> CompileResult<Position> {
        self.fill()?;
        Ok(match &self.peeked {
            Some(t) => t.position,
            None => self.lexer.end_position(),
        })
    }

    /// Advance and return the current token.
    pub(super) fn advance(&mut self) -> CompileResult<Option<SpannedToken>> {
        self.fill()?;
        Ok(self.peeked.take())
    }

    /// Advance, failing at end of input.
    pub(super) fn next_token(&mut self, expected: &str) -> CompileResult<SpannedToken> {
        let position = self.position()?;
        self.advance()?
            .ok_or_else(|| CompileError::parse(expected, "end of input", position))
    }

    /// Build a parse error for an unexpected token.
    pub(super) fn unexpected(expected: &str, found: &SpannedToken) -> CompileError {
        CompileError::parse(expected, found.token.describe(), found.position)
    }

    /// Expect a specific token.
    pub(super) fn expect(&mut self, expected: &Token) -> CompileResult<SpannedToken> {
        let description = expected.describe();
        let found = self.next_token(&description)?;
        if std::mem::discriminant(&found.token) != std::mem::discriminant(expected) {
            return Err(Self::unexpected(&description, &found));
        }
        Ok(found)
    }

    /// Check if current token matches.
    pub(super) fn check(&mut self, token: &Token) -> CompileResult<bool> {
        Ok(self
            .peek()?
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token)))
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> CompileResult<bool> {
        if self.check(token)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Parse an identifier.
    pub(super) fn parse_identifier(&mut self) -> CompileResult<(String, Position)> {
        let token = self.next_token("identifier")?;
        match token.token {
            Token::Identifier(name) => Ok((name, token.position)),
            _ => Err(Self::unexpected("identifier", &token)),
        }
    }

    /// Parse a comma-separated identifier list.
    pub(super) fn parse_identifier_list(&mut self) -> CompileResult<Vec<(String, Position)>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma)? {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    /// Parse an integer literal.
    pub(super) fn parse_int_literal(&mut self) -> CompileResult<(u64, Position)> {
        let token = self.next_token("integer")?;
        match token.token {
            Token::IntLiteral(v) => Ok((v, token.position)),
            _ => Err(Self::unexpected("integer", &token)),
        }
    }

    /// Record a warning against the current file.
    pub(super) fn warn(&mut self, kind: WarningKind, message: String, position: Position) {
        tracing::warn!(%kind, %position, file = ?self.file, "{message}");
        self.ctx.warnings.push(Warning {
            kind,
            message,
            position,
            file: self.file.clone(),
        });
    }

    /// Parse the whole token stream. The version header is required in the
    /// main source and optional in included files.
    fn parse_program(mut self, require_header: bool) -> CompileResult<Vec<Statement>> {
        if self.check(&Token::OpenQasm)? || require_header {
            self.parse_header()?;
        }

        let mut statements = Vec::new();
        while self.peek()?.is_some() {
            self.parse_statement(&mut statements)?;
        }
        Ok(statements)
    }

    /// Parse and validate `OPENQASM 2.0;`.
    fn parse_header(&mut self) -> CompileResult<()> {
        self.expect(&Token::OpenQasm)?;
        let version = self.next_token("version number")?;
        let supported = match version.token {
            Token::RealLiteral(v) => v == 2.0,
            Token::IntLiteral(v) => v == 2,
            _ => false,
        };
        if !supported {
            return Err(Self::unexpected("version 2.0", &version));
        }
        self.expect(&Token::Semicolon)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ConditionalOp, Expr};
    use crate::diagnostics::WarningKind;
    use crate::error::ErrorKind;
    use crate::include::{InMemoryIncludes, NoIncludes};
    use crate::stdlib::QELIB1_EXTENDED;
    use std::f64::consts::PI;

    fn parse_default(source: &str) -> CompileResult<ParseOutput> {
        parse(source, &CompileOptions::default(), &NoIncludes)
    }

    fn parse_err(source: &str) -> CompileError {
        parse_default(source).unwrap_err()
    }

    #[test]
    fn test_parse_bell_state() {
        let source = r#"
            OPENQASM 2.0;
            include "qelib1.inc";
            qreg q[2];
            creg c[2];
            h q[0];
            cx q[0], q[1];
            measure q -> c;
        "#;
        let output = parse_default(source).unwrap();
        let statements = &output.program.statements;
        assert_eq!(statements.len(), 6);
        assert!(matches!(&statements[0], Statement::Include(i) if i.path == "qelib1.inc"));
        match &statements[3] {
            Statement::GateCall(call) => {
                assert_eq!(call.name, "h");
                assert_eq!(call.qubits[0].to_string(), "q[0]");
                assert_eq!(call.position.line, 6);
            }
            other => panic!("expected gate call, got {other:?}"),
        }
        assert!(matches!(&statements[5], Statement::Measure(m) if m.qubit.index.is_none()));
        assert_eq!(output.symbols.num_registers(), 2);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_header_required_and_validated() {
        let err = parse_err("qreg q[1];");
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.position().line, 1);

        let err = parse_err("OPENQASM 3.0;");
        assert!(err.to_string().contains("version 2.0"));

        assert!(parse_default("OPENQASM 2;").is_ok());
    }

    #[test]
    fn test_parameter_expressions_are_evaluated() {
        let source = "OPENQASM 2.0;\nqreg q[1];\nU(pi/2, -pi/4 + 1, 2*3^2) q[0];";
        let output = parse_default(source).unwrap();
        let Statement::GateCall(call) = &output.program.statements[1] else {
            panic!("expected gate call");
        };
        assert!((call.params[0] - PI / 2.0).abs() < 1e-12);
        assert!((call.params[1] - (1.0 - PI / 4.0)).abs() < 1e-12);
        assert!((call.params[2] - 18.0).abs() < 1e-12);
    }

    #[test]
    fn test_gate_definition_body() {
        let source = r"
            OPENQASM 2.0;
            gate rot(theta, phi) a, b {
                U(theta/2, -phi, sin(pi/2)) b;
                CX a, b;
            }
        ";
        let output = parse_default(source).unwrap();
        let decl = output.program.gate_decls().next().unwrap();
        assert_eq!(decl.params, ["theta", "phi"]);
        assert_eq!(decl.qubits, ["a", "b"]);
        let body = decl.body.as_ref().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].qubits, [1]);
        assert_eq!(body[0].params[2], Expr::Constant(1.0));
        assert_eq!(body[0].params[0].eval(&[1.0, 0.0]), Some(0.5));
        assert_eq!(body[1].qubits, [0, 1]);
        assert!(output.symbols.is_composite("rot"));
    }

    #[test]
    fn test_opaque_declaration() {
        let output = parse_default("OPENQASM 2.0;\nopaque magic(a) q, r;\nqreg q[2];\nmagic(0.5) q[0], q[1];").unwrap();
        let decl = output.program.gate_decls().next().unwrap();
        assert!(decl.is_opaque());
        let sig = output.symbols.gate("magic").unwrap();
        assert!(sig.is_primitive());
        assert_eq!((sig.num_params, sig.num_qubits), (1, 2));
    }

    #[test]
    fn test_undefined_gate() {
        let err = parse_err("OPENQASM 2.0;\nqreg q[1];\nfoo q;");
        assert_eq!(err.kind(), ErrorKind::UndefinedGateError);
        assert_eq!(err.position().line, 3);

        // qelib1 gates need the include
        let err = parse_err("OPENQASM 2.0;\nqreg q[1];\nh q;");
        assert_eq!(err.kind(), ErrorKind::UndefinedGateError);
    }

    #[test]
    fn test_arity_reported_at_call_site() {
        let source = "OPENQASM 2.0;\ngate two a, b { CX a, b; }\nqreg q[2];\ntwo q[0];";
        let err = parse_err(source);
        assert_eq!(err.kind(), ErrorKind::ArityError);
        assert_eq!(err.position(), Position::new(4, 1, 52));

        let err = parse_err("OPENQASM 2.0;\nqreg q[1];\nU(1, 2) q[0];");
        assert_eq!(err.kind(), ErrorKind::ArityError);
    }

    #[test]
    fn test_unbound_formal_in_body() {
        let err = parse_err("OPENQASM 2.0;\ngate g a { CX a, b; }");
        assert_eq!(err.kind(), ErrorKind::UnboundIdentifierError);
        assert_eq!(err.position().column, 18);

        let err = parse_err("OPENQASM 2.0;\ngate g a { U(theta, 0, 0) a; }");
        assert_eq!(err.kind(), ErrorKind::UnboundIdentifierError);
    }

    #[test]
    fn test_recursive_gate_definition() {
        let err = parse_err("OPENQASM 2.0;\ngate g q { g q; }");
        assert_eq!(err.kind(), ErrorKind::RecursiveGateDefinitionError);
    }

    #[test]
    fn test_body_restrictions() {
        let err = parse_err("OPENQASM 2.0;\ngate g a { measure a -> a; }");
        assert_eq!(err.kind(), ErrorKind::ParseError);
        let err = parse_err("OPENQASM 2.0;\ngate g a { U(0,0,0) a[0]; }");
        assert_eq!(err.kind(), ErrorKind::ParseError);
        let err = parse_err("OPENQASM 2.0;\ngate g a, b { CX a, a; }");
        assert_eq!(err.kind(), ErrorKind::DuplicateQubitError);
    }

    #[test]
    fn test_duplicate_declarations() {
        let err = parse_err("OPENQASM 2.0;\nqreg q[1];\ncreg q[1];");
        assert_eq!(err.kind(), ErrorKind::DuplicateRegisterError);
        assert_eq!(err.position(), Position::new(3, 6, 30));

        let err = parse_err("OPENQASM 2.0;\ngate g a { }\ngate g b { }");
        assert_eq!(err.kind(), ErrorKind::DuplicateGateError);

        let err = parse_err("OPENQASM 2.0;\ninclude \"qelib1.inc\";\ngate h a { }");
        assert_eq!(err.kind(), ErrorKind::DuplicateGateError);
    }

    #[test]
    fn test_register_size_must_be_positive() {
        let err = parse_err("OPENQASM 2.0;\nqreg q[0];");
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_operand_register_kinds() {
        let err = parse_err("OPENQASM 2.0;\ncreg c[1];\nU(0,0,0) c[0];");
        assert_eq!(err.kind(), ErrorKind::UnboundIdentifierError);
        let err = parse_err("OPENQASM 2.0;\nqreg q[1];\nmeasure q -> q;");
        assert_eq!(err.kind(), ErrorKind::UnboundIdentifierError);
    }

    #[test]
    fn test_conditional_on_undeclared_register() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\ncreg c[1];\nif(d==1) x q[0];";
        let err = parse_err(source);
        assert_eq!(err.kind(), ErrorKind::UnboundIdentifierError);
        assert_eq!(err.position().line, 5);
    }

    #[test]
    fn test_conditional_forms() {
        let source = "OPENQASM 2.0;\nqreg q[1];\ncreg c[2];\nif(c==3) U(0,0,0) q[0];\nif (c == 1) measure q[0] -> c[1];\nif(c==0) reset q;";
        let output = parse_default(source).unwrap();
        let ops: Vec<_> = output
            .program
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::Conditional(c) => Some(&c.op),
                _ => None,
            })
            .collect();
        assert!(matches!(ops[0], ConditionalOp::Gate(_)));
        assert!(matches!(ops[1], ConditionalOp::Measure(_)));
        assert!(matches!(ops[2], ConditionalOp::Reset(_)));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_unsatisfiable_condition_warns() {
        let source = "OPENQASM 2.0;\nqreg q[1];\ncreg c[2];\nif(c==4) U(0,0,0) q[0];";
        let output = parse_default(source).unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].kind, WarningKind::UnsatisfiableCondition);
        assert_eq!(output.warnings[0].position.line, 4);
    }

    #[test]
    fn test_redundant_library_include_warns() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\ninclude \"qelib1.inc\";";
        let output = parse_default(source).unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].kind, WarningKind::RedundantInclude);
        assert_eq!(output.program.statements.len(), 1);
    }

    #[test]
    fn test_extended_library_option() {
        let source = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nswap q[0], q[1];";
        assert_eq!(parse_err(source).kind(), ErrorKind::UndefinedGateError);
        let options = CompileOptions::new().with_library(&QELIB1_EXTENDED);
        assert!(parse(source, &options, &NoIncludes).is_ok());
    }

    #[test]
    fn test_user_include_is_spliced() {
        let resolver = InMemoryIncludes::new()
            .with_file("defs.inc", "OPENQASM 2.0;\ngate flip a { U(pi, 0, pi) a; }\n");
        let source = "OPENQASM 2.0;\ninclude \"defs.inc\";\nqreg q[1];\nflip q[0];";
        let output = parse(source, &CompileOptions::default(), &resolver).unwrap();
        let statements = &output.program.statements;
        assert!(matches!(&statements[0], Statement::Include(i) if i.path == "defs.inc"));
        assert!(matches!(&statements[1], Statement::GateDecl(d) if d.name == "flip"));
        assert_eq!(statements.len(), 4);
    }

    #[test]
    fn test_include_errors() {
        let err = parse_err("OPENQASM 2.0;\ninclude \"missing.inc\";");
        assert_eq!(err.kind(), ErrorKind::IncludeError);
        assert_eq!(err.position().line, 2);

        let resolver = InMemoryIncludes::new().with_file("bad.inc", "qreg q[1];\nfoo q;");
        let err = parse(
            "OPENQASM 2.0;\ninclude \"bad.inc\";",
            &CompileOptions::default(),
            &resolver,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedGateError);
        assert_eq!(err.file(), Some("bad.inc"));
        assert_eq!(err.position().line, 2);
    }

    #[test]
    fn test_include_depth_limit() {
        let mut resolver = InMemoryIncludes::new();
        for i in 0..4 {
            resolver.insert(format!("f{i}.inc"), format!("include \"f{}.inc\";", i + 1));
        }
        resolver.insert("f4.inc", "");
        let source = "OPENQASM 2.0;\ninclude \"f0.inc\";";

        let options = CompileOptions::new().with_max_include_depth(5);
        assert!(parse(source, &options, &resolver).is_ok());

        let options = CompileOptions::new().with_max_include_depth(3);
        let err = parse(source, &options, &resolver).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncludeDepthExceededError);
        assert_eq!(err.file(), Some("f2.inc"));
    }

    #[test]
    fn test_lex_error_is_fatal() {
        let err = parse_err("OPENQASM 2.0;\nqreg q[1];\n@");
        assert_eq!(err.kind(), ErrorKind::LexError);
        assert_eq!(err.position(), Position::new(3, 1, 25));
    }
}
