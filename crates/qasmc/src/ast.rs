//! Abstract syntax tree for `OpenQASM` 2 programs.
//!
//! Operand references are kept symbolic (`register` or `register[index]`);
//! they are resolved to circuit qubits by the circuit builder. Gate bodies
//! refer to formal qubit arguments by position and to formal parameters
//! through [`Expr::Param`].

use serde::Serialize;

use qasmc_ir::RegisterKind;

use crate::error::Position;

/// A parsed program. Statements of included files are spliced in place of
/// their `include` statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    /// Gate definitions in program order.
    pub fn gate_decls(&self) -> impl Iterator<Item = &GateDecl> {
        self.statements.iter().filter_map(|s| match s {
            Statement::GateDecl(decl) => Some(decl),
            _ => None,
        })
    }

    /// Whether any statement still applies a gate defined with a body.
    pub fn has_composite_calls(&self, is_composite: impl Fn(&str) -> bool) -> bool {
        self.statements.iter().any(|s| match s {
            Statement::GateCall(call) => is_composite(&call.name),
            Statement::Conditional(cond) => match &cond.op {
                ConditionalOp::Gate(call) => is_composite(&call.name),
                _ => false,
            },
            _ => false,
        })
    }
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    RegisterDecl(RegisterDecl),
    GateDecl(GateDecl),
    GateCall(GateCall),
    Measure(Measure),
    Reset(Reset),
    Barrier(Barrier),
    Conditional(Conditional),
    /// Marks where an included file's statements begin.
    Include(Include),
}

impl Statement {
    /// Position of the statement's first token.
    pub fn position(&self) -> Position {
        match self {
            Statement::RegisterDecl(s) => s.position,
            Statement::GateDecl(s) => s.position,
            Statement::GateCall(s) => s.position,
            Statement::Measure(s) => s.position,
            Statement::Reset(s) => s.position,
            Statement::Barrier(s) => s.position,
            Statement::Conditional(s) => s.position,
            Statement::Include(s) => s.position,
        }
    }
}

/// `qreg name[size];` or `creg name[size];`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterDecl {
    pub name: String,
    pub kind: RegisterKind,
    pub size: u32,
    pub position: Position,
}

/// `gate name(params) qubits { body }` or `opaque name(params) qubits;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateDecl {
    pub name: String,
    pub params: Vec<String>,
    pub qubits: Vec<String>,
    /// `None` for opaque gates.
    pub body: Option<Vec<BodyCall>>,
    pub position: Position,
}

impl GateDecl {
    pub fn is_opaque(&self) -> bool {
        self.body.is_none()
    }
}

/// A gate application inside a gate body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyCall {
    pub name: String,
    pub params: Vec<Expr>,
    /// Indices into the enclosing definition's formal qubit list.
    pub qubits: Vec<usize>,
    pub position: Position,
}

/// A top-level gate application with constant parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateCall {
    pub name: String,
    pub params: Vec<f64>,
    pub qubits: Vec<Operand>,
    pub position: Position,
}

/// A register or register element reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operand {
    pub register: String,
    /// `None` when the whole register is referenced.
    pub index: Option<u32>,
    pub position: Position,
}

impl Operand {
    pub fn element(register: impl Into<String>, index: u32, position: Position) -> Self {
        Self {
            register: register.into(),
            index: Some(index),
            position,
        }
    }

    pub fn whole(register: impl Into<String>, position: Position) -> Self {
        Self {
            register: register.into(),
            index: None,
            position,
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.register, i),
            None => write!(f, "{}", self.register),
        }
    }
}

/// `measure qubit -> clbit;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    pub qubit: Operand,
    pub clbit: Operand,
    pub position: Position,
}

/// `reset qubit;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reset {
    pub qubit: Operand,
    pub position: Position,
}

/// `barrier operands;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Barrier {
    pub qubits: Vec<Operand>,
    pub position: Position,
}

/// `if (register == value) op;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conditional {
    pub register: String,
    pub value: u64,
    pub op: ConditionalOp,
    pub position: Position,
}

/// The operation guarded by a conditional.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConditionalOp {
    Gate(GateCall),
    Measure(Measure),
    Reset(Reset),
}

/// `include "path";`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Include {
    pub path: String,
    pub position: Position,
}

/// A parameter expression inside a gate body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Constant(f64),
    /// Index into the enclosing definition's formal parameter list.
    Param(usize),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Function {
        func: Function,
        arg: Box<Expr>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinOp::Add => lhs + rhs,
            BinOp::Sub => lhs - rhs,
            BinOp::Mul => lhs * rhs,
            BinOp::Div => lhs / rhs,
            BinOp::Pow => lhs.powf(rhs),
        }
    }
}

/// Built-in unary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

impl Function {
    /// Look up a function by its source name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            "exp" => Some(Function::Exp),
            "ln" => Some(Function::Ln),
            "sqrt" => Some(Function::Sqrt),
            _ => None,
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Sqrt => x.sqrt(),
        }
    }
}

impl Expr {
    /// Negation, folded when the operand is constant.
    pub fn neg(inner: Expr) -> Expr {
        match inner {
            Expr::Constant(v) => Expr::Constant(-v),
            other => Expr::Neg(Box::new(other)),
        }
    }

    /// Binary operation, folded when both operands are constant.
    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        match (&lhs, &rhs) {
            (Expr::Constant(a), Expr::Constant(b)) => Expr::Constant(op.apply(*a, *b)),
            _ => Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        }
    }

    /// Function application, folded when the argument is constant.
    pub fn function(func: Function, arg: Expr) -> Expr {
        match arg {
            Expr::Constant(v) => Expr::Constant(func.apply(v)),
            other => Expr::Function {
                func,
                arg: Box::new(other),
            },
        }
    }

    /// The value if the expression has no free parameters.
    pub fn as_constant(&self) -> Option<f64> {
        match self {
            Expr::Constant(v) => Some(*v),
            _ => None,
        }
    }

    /// Evaluate with `args` bound to the formal parameters. Returns `None` if
    /// a parameter index is out of range.
    pub fn eval(&self, args: &[f64]) -> Option<f64> {
        Some(match self {
            Expr::Constant(v) => *v,
            Expr::Param(i) => *args.get(*i)?,
            Expr::Neg(inner) => -inner.eval(args)?,
            Expr::Binary { op, lhs, rhs } => op.apply(lhs.eval(args)?, rhs.eval(args)?),
            Expr::Function { func, arg } => func.apply(arg.eval(args)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_folding() {
        let e = Expr::binary(BinOp::Mul, Expr::Constant(2.0), Expr::Constant(3.0));
        assert_eq!(e, Expr::Constant(6.0));
        let e = Expr::neg(Expr::function(Function::Sqrt, Expr::Constant(4.0)));
        assert_eq!(e.as_constant(), Some(-2.0));
    }

    #[test]
    fn test_eval_with_params() {
        // -(theta / 2) + phi
        let e = Expr::binary(
            BinOp::Add,
            Expr::neg(Expr::binary(BinOp::Div, Expr::Param(0), Expr::Constant(2.0))),
            Expr::Param(1),
        );
        assert_eq!(e.as_constant(), None);
        assert_eq!(e.eval(&[1.0, 0.25]), Some(-0.25));
        assert_eq!(e.eval(&[1.0]), None);
    }

    #[test]
    fn test_pow_and_functions() {
        let e = Expr::function(
            Function::Ln,
            Expr::binary(BinOp::Pow, Expr::Param(0), Expr::Constant(2.0)),
        );
        let v = e.eval(&[std::f64::consts::E]).unwrap();
        assert!((v - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_operand_display() {
        let pos = Position::default();
        assert_eq!(Operand::element("q", 3, pos).to_string(), "q[3]");
        assert_eq!(Operand::whole("c", pos).to_string(), "c");
    }

    #[test]
    fn test_function_names() {
        assert_eq!(Function::from_name("cos"), Some(Function::Cos));
        assert_eq!(Function::from_name("cosh"), None);
    }
}
