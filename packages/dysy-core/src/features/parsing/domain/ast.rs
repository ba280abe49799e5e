//! Typed AST for the supported Python subset
//!
//! `Display` renders expressions back to Python source. The analyzer uses it
//! for predicate/right-hand-side text and the tracer for log lines; nothing
//! parses the rendered text again.

use std::fmt;

use crate::shared::models::{python_float_repr, Line};

/// A parsed subject module: its top-level function definitions and
/// module-level constant assignments, each in source order
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub functions: Vec<FunctionDef>,
    pub globals: Vec<GlobalAssign>,
}

/// `NAME = expr` at module level (`NAME op= expr` arrives expanded)
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalAssign {
    pub name: String,
    pub value: Expr,
    pub line: Line,
}

impl Module {
    pub fn first_function(&self) -> Option<&FunctionDef> {
        self.functions.first()
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub line: Line,
}

/// Statement with its source extent
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub line: Line,
    /// Last line covered by the statement (inclusive)
    pub end_line: Line,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Assign {
        target: AssignTarget,
        value: Expr,
    },
    AugAssign {
        target: AssignTarget,
        op: BinOp,
        value: Expr,
    },
    Expr(Expr),
    /// `elif` chains are nested `If`s in `orelse`
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    For {
        target: String,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Raise(Option<Expr>),
    Pass,
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Name(String),
    Subscript { name: String, index: Expr },
}

impl AssignTarget {
    /// Bound name, if the target is a plain name
    pub fn name(&self) -> Option<&str> {
        match self {
            AssignTarget::Name(name) => Some(name),
            AssignTarget::Subscript { .. } => None,
        }
    }

    /// Expression reading the current value of the target
    pub fn as_expr(&self) -> Expr {
        match self {
            AssignTarget::Name(name) => Expr::Name(name.clone()),
            AssignTarget::Subscript { name, index } => Expr::Subscript {
                value: Box::new(Expr::Name(name.clone())),
                index: Box::new(index.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    Name(String),
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    /// Call of a builtin or module-level function (dotted names allowed)
    Call {
        func: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `a < b <= c` keeps Python's chained form
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CmpOp, Expr)>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    List(Vec<Expr>),
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(left: Expr, op: CmpOp, right: Expr) -> Self {
        Expr::Compare {
            left: Box::new(left),
            comparisons: vec![(op, right)],
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    /// Whether rendering as an operand needs parentheses
    fn is_compound(&self) -> bool {
        matches!(
            self,
            Expr::Unary { .. }
                | Expr::Binary { .. }
                | Expr::Compare { .. }
                | Expr::BoolOp { .. }
                | Expr::IfExp { .. }
        )
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_compound() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(BinOp::Add),
            "-" => Some(BinOp::Sub),
            "*" => Some(BinOp::Mul),
            "/" => Some(BinOp::Div),
            "//" => Some(BinOp::FloorDiv),
            "%" => Some(BinOp::Mod),
            "**" => Some(BinOp::Pow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Lt,
    LtE,
    Gt,
    GtE,
    Eq,
    NotEq,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(CmpOp::Lt),
            "<=" => Some(CmpOp::LtE),
            ">" => Some(CmpOp::Gt),
            ">=" => Some(CmpOp::GtE),
            "==" => Some(CmpOp::Eq),
            "!=" => Some(CmpOp::NotEq),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn keyword(&self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(i) => write!(f, "{}", i),
            Expr::Float(v) => write!(f, "{}", python_float_repr(*v)),
            Expr::Bool(true) => write!(f, "True"),
            Expr::Bool(false) => write!(f, "False"),
            Expr::None => write!(f, "None"),
            Expr::Name(name) => write!(f, "{}", name),
            Expr::Subscript { value, index } => {
                value.fmt_operand(f)?;
                write!(f, "[{}]", index)
            }
            Expr::Call { func, args } => {
                write!(f, "{}(", func)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Unary { op, operand } => {
                match op {
                    UnaryOp::Neg => write!(f, "-")?,
                    UnaryOp::Pos => write!(f, "+")?,
                    UnaryOp::Not => write!(f, "not ")?,
                }
                operand.fmt_operand(f)
            }
            Expr::Binary { op, left, right } => {
                left.fmt_operand(f)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_operand(f)
            }
            Expr::Compare { left, comparisons } => {
                left.fmt_operand(f)?;
                for (op, right) in comparisons {
                    write!(f, " {} ", op.symbol())?;
                    right.fmt_operand(f)?;
                }
                Ok(())
            }
            Expr::BoolOp { op, values } => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.keyword())?;
                    }
                    value.fmt_operand(f)?;
                }
                Ok(())
            }
            Expr::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Expr::IfExp { test, body, orelse } => {
                body.fmt_operand(f)?;
                write!(f, " if ")?;
                test.fmt_operand(f)?;
                write!(f, " else ")?;
                orelse.fmt_operand(f)
            }
        }
    }
}

impl fmt::Display for AssignTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignTarget::Name(name) => write!(f, "{}", name),
            AssignTarget::Subscript { name, index } => write!(f, "{}[{}]", name, index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested_binary() {
        // (real_a + real_b) ** 2 - 1230000000 < 1e-10
        let sum = Expr::binary(
            BinOp::Add,
            Expr::Name("real_a".into()),
            Expr::Name("real_b".into()),
        );
        let squared = Expr::binary(BinOp::Pow, sum, Expr::Int(2));
        let shifted = Expr::binary(BinOp::Sub, squared, Expr::Int(1230000000));
        let predicate = Expr::compare(shifted, CmpOp::Lt, Expr::Float(1e-10));

        assert_eq!(
            predicate.to_string(),
            "(((real_a + real_b) ** 2) - 1230000000) < 1e-10"
        );
    }

    #[test]
    fn test_render_not_and_subscript() {
        let read = Expr::Subscript {
            value: Box::new(Expr::Name("int_seq".into())),
            index: Box::new(Expr::Int(3)),
        };
        let predicate = Expr::not(Expr::compare(read, CmpOp::Eq, Expr::Int(0)));
        assert_eq!(predicate.to_string(), "not (int_seq[3] == 0)");
    }
}
