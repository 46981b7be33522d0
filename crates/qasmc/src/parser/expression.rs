//! Parameter expression parsing.

use super::Parser;
use crate::ast::{BinOp, Expr, Function};
use crate::error::{CompileError, CompileResult};
use crate::lexer::Token;

impl Parser<'_, '_> {
    /// Parse an expression whose identifiers may name the given formal
    /// parameters. Constant sub-expressions are folded.
    pub(super) fn parse_expression(&mut self, formals: &[String]) -> CompileResult<Expr> {
        self.parse_binary_expr(formals, 0)
    }

    /// Parse an expression with no free parameters and evaluate it. The
    /// value must be finite.
    pub(super) fn parse_constant_expression(&mut self) -> CompileResult<f64> {
        let position = self.position()?;
        let expr = self.parse_expression(&[])?;
        let value = expr
            .as_constant()
            .ok_or_else(|| CompileError::parse("a constant expression", "a parameter", position))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(CompileError::non_finite(value, position))
        }
    }

    /// Parse a comma-separated expression list, stopping before `)`.
    pub(super) fn parse_expression_list(&mut self, formals: &[String]) -> CompileResult<Vec<Expr>> {
        if self.check(&Token::RParen)? {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.parse_expression(formals)?];
        while self.consume(&Token::Comma)? {
            exprs.push(self.parse_expression(formals)?);
        }
        Ok(exprs)
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, formals: &[String], min_prec: u8) -> CompileResult<Expr> {
        let mut left = self.parse_unary_expr(formals)?;

        while let Some(op) = self.peek_binary_op()? {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance()?; // consume operator

            // `^` is right associative
            let next_prec = if op == BinOp::Pow { prec } else { prec + 1 };
            let right = self.parse_binary_expr(formals, next_prec)?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    /// Parse unary expression. Negation applies to a whole power, so `-2^2`
    /// is `-4`.
    fn parse_unary_expr(&mut self, formals: &[String]) -> CompileResult<Expr> {
        if self.consume(&Token::Minus)? {
            let expr = self.parse_binary_expr(formals, op_precedence(BinOp::Pow))?;
            return Ok(Expr::neg(expr));
        }
        self.parse_primary_expr(formals)
    }

    /// Parse primary expression.
    #[allow(clippy::cast_precision_loss)]
    fn parse_primary_expr(&mut self, formals: &[String]) -> CompileResult<Expr> {
        let token = self.next_token("expression")?;

        match token.token {
            Token::IntLiteral(v) => Ok(Expr::Constant(v as f64)),
            Token::RealLiteral(v) => Ok(Expr::Constant(v)),
            Token::Pi => Ok(Expr::Constant(std::f64::consts::PI)),
            Token::Identifier(ref name) => {
                if let Some(func) = Function::from_name(name) {
                    if self.consume(&Token::LParen)? {
                        let arg = self.parse_expression(formals)?;
                        self.expect(&Token::RParen)?;
                        return Ok(Expr::function(func, arg));
                    }
                }
                match formals.iter().position(|f| f == name) {
                    Some(index) => Ok(Expr::Param(index)),
                    None => Err(CompileError::UnboundIdentifier {
                        name: name.clone(),
                        expected: "a gate parameter",
                        position: token.position,
                    }),
                }
            }
            Token::LParen => {
                let expr = self.parse_expression(formals)?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            _ => Err(Self::unexpected("expression", &token)),
        }
    }

    /// Peek at binary operator.
    fn peek_binary_op(&mut self) -> CompileResult<Option<BinOp>> {
        Ok(match self.peek()? {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            Some(Token::Star) => Some(BinOp::Mul),
            Some(Token::Slash) => Some(BinOp::Div),
            Some(Token::Caret) => Some(BinOp::Pow),
            _ => None,
        })
    }
}

/// Get operator precedence.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
        BinOp::Pow => 3,
    }
}
