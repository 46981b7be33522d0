//! Lexer for `OpenQASM` 2.

use logos::Logos;
use std::ops::Range;

use crate::error::{CompileError, CompileResult, Position};

/// Why logos rejected a piece of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexFault {
    /// No token matches the input.
    #[default]
    Unrecognized,
    /// Well-formed integer literal that does not fit in 64 bits.
    IntegerOutOfRange,
    /// Well-formed real literal whose value is not finite, e.g. `1e999`.
    RealOutOfRange,
}

fn real_literal(lex: &mut logos::Lexer<'_, Token>) -> Result<f64, LexFault> {
    match lex.slice().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LexFault::RealOutOfRange),
    }
}

fn int_literal(lex: &mut logos::Lexer<'_, Token>) -> Result<u64, LexFault> {
    lex.slice()
        .parse::<u64>()
        .map_err(|_| LexFault::IntegerOutOfRange)
}

/// Tokens for `OpenQASM` 2.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexFault)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qreg")]
    Qreg,

    #[token("creg")]
    Creg,

    #[token("gate")]
    Gate,

    #[token("opaque")]
    Opaque,

    #[token("measure")]
    Measure,

    #[token("reset")]
    Reset,

    #[token("barrier")]
    Barrier,

    #[token("if")]
    If,

    #[token("pi")]
    Pi,

    // Built-in gates (higher priority than identifier)
    #[token("U", priority = 3)]
    GateU,

    #[token("CX", priority = 3)]
    GateCX,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", real_literal)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", real_literal)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", real_literal)]
    RealLiteral(f64),

    #[regex(r"[0-9]+", int_literal)]
    IntLiteral(u64),

    #[regex(r#""[^"\n]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    StringLiteral(String),

    // Identifiers
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("^")]
    Caret,

    #[token("==")]
    EqEq,

    #[token("->")]
    Arrow,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

impl Token {
    /// Short description used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            Token::RealLiteral(v) => format!("real number {v:?}"),
            Token::IntLiteral(v) => format!("integer {v}"),
            Token::StringLiteral(s) => format!("string \"{s}\""),
            Token::Identifier(s) => format!("identifier '{s}'"),
            other => format!("'{other}'"),
        }
    }
}

/// Prints the token as source text. Real literals use the shortest form that
/// parses back to the same value and always contain a `.` or an exponent, so
/// the printed text lexes back to an identical token.
impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::Qreg => write!(f, "qreg"),
            Token::Creg => write!(f, "creg"),
            Token::Gate => write!(f, "gate"),
            Token::Opaque => write!(f, "opaque"),
            Token::Measure => write!(f, "measure"),
            Token::Reset => write!(f, "reset"),
            Token::Barrier => write!(f, "barrier"),
            Token::If => write!(f, "if"),
            Token::Pi => write!(f, "pi"),
            Token::GateU => write!(f, "U"),
            Token::GateCX => write!(f, "CX"),
            Token::RealLiteral(v) => write!(f, "{v:?}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::EqEq => write!(f, "=="),
            Token::Arrow => write!(f, "->"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// A token with its span and line/column position.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Range<usize>,
    pub position: Position,
}

/// Incremental byte-offset to line/column conversion. Offsets must be
/// requested in non-decreasing order.
#[derive(Debug, Clone)]
struct LineTracker {
    line: usize,
    line_start: usize,
    scanned: usize,
}

impl Default for LineTracker {
    fn default() -> Self {
        Self {
            line: 1,
            line_start: 0,
            scanned: 0,
        }
    }
}

impl LineTracker {
    fn locate(&mut self, source: &str, offset: usize) -> Position {
        let from = self.scanned.min(offset);
        for (i, byte) in source.as_bytes()[from..offset].iter().enumerate() {
            if *byte == b'\n' {
                self.line += 1;
                self.line_start = from + i + 1;
            }
        }
        self.scanned = offset;
        let column = source[self.line_start..offset].chars().count() + 1;
        Position::new(self.line, column, offset)
    }
}

/// Lazy token stream over a borrowed source buffer.
///
/// Whitespace and comments are skipped but still advance the line/column
/// tracking. An unrecognized character yields a [`CompileError::Lex`]; a
/// numeric literal whose value is out of range yields a [`CompileError::Parse`]
/// at the literal.
#[derive(Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, Token>,
    lines: LineTracker,
}

impl<'src> Lexer<'src> {
    /// Create a lexer positioned at the start of `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            lines: LineTracker::default(),
        }
    }

    /// Rewind to the start of the source.
    pub fn restart(&mut self) {
        self.inner = Token::lexer(self.source);
        self.lines = LineTracker::default();
    }

    /// The source buffer being lexed.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Position just past the last byte of the source.
    pub fn end_position(&self) -> Position {
        self.lines.clone().locate(self.source, self.source.len())
    }
}

impl Iterator for Lexer<'_> {
    type Item = CompileResult<SpannedToken>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.next()?;
        let span = self.inner.span();
        let position = self.lines.locate(self.source, span.start);
        Some(match result {
            Ok(token) => Ok(SpannedToken {
                token,
                span,
                position,
            }),
            Err(LexFault::Unrecognized) => Err(CompileError::Lex {
                text: self.inner.slice().to_string(),
                position,
            }),
            Err(LexFault::IntegerOutOfRange) => Err(CompileError::parse(
                format!("an integer no larger than {}", u64::MAX),
                format!("'{}'", self.inner.slice()),
                position,
            )),
            Err(LexFault::RealOutOfRange) => Err(CompileError::parse(
                "a finite real number",
                format!("'{}'", self.inner.slice()),
                position,
            )),
        })
    }
}

/// Tokenize a complete source string, failing on the first lex error.
pub fn tokenize(source: &str) -> CompileResult<Vec<SpannedToken>> {
    Lexer::new(source).collect()
}
