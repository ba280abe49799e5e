//! Solver-level expressions and per-run symbolic state

use rustc_hash::FxHashMap;
use std::fmt;

use crate::features::naming::SolverVar;
use crate::features::parsing::{BinOp, CmpOp};
use crate::shared::models::python_float_repr;

/// Expression over solver variables
///
/// Built from subject `Expr`s by the builder and handed to the SMT bridge
/// as-is; the rendered text is for logs only.
#[derive(Debug, Clone, PartialEq)]
pub enum SymExpr {
    Int(i64),
    Real(f64),
    Bool(bool),
    /// Parameter (or sequence element) decided by the solver
    Var(SolverVar),
    /// Name with no symbolic or concrete binding
    Free(String),
    Neg(Box<SymExpr>),
    Not(Box<SymExpr>),
    Binary {
        op: BinOp,
        left: Box<SymExpr>,
        right: Box<SymExpr>,
    },
    Compare {
        op: CmpOp,
        left: Box<SymExpr>,
        right: Box<SymExpr>,
    },
    And(Vec<SymExpr>),
    Or(Vec<SymExpr>),
    Ite {
        cond: Box<SymExpr>,
        then: Box<SymExpr>,
        otherwise: Box<SymExpr>,
    },
}

impl SymExpr {
    pub fn var(var: SolverVar) -> Self {
        SymExpr::Var(var)
    }

    pub fn binary(op: BinOp, left: SymExpr, right: SymExpr) -> Self {
        SymExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(op: CmpOp, left: SymExpr, right: SymExpr) -> Self {
        SymExpr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn equals(left: SymExpr, right: SymExpr) -> Self {
        Self::compare(CmpOp::Eq, left, right)
    }

    pub fn not(operand: SymExpr) -> Self {
        SymExpr::Not(Box::new(operand))
    }

    /// Solver variables mentioned anywhere in the expression
    pub fn variables(&self) -> Vec<&SolverVar> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a SolverVar>) {
        match self {
            SymExpr::Var(var) => {
                if !out.contains(&var) {
                    out.push(var);
                }
            }
            SymExpr::Int(_) | SymExpr::Real(_) | SymExpr::Bool(_) | SymExpr::Free(_) => {}
            SymExpr::Neg(inner) | SymExpr::Not(inner) => inner.collect_variables(out),
            SymExpr::Binary { left, right, .. } | SymExpr::Compare { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            SymExpr::And(items) | SymExpr::Or(items) => {
                for item in items {
                    item.collect_variables(out);
                }
            }
            SymExpr::Ite {
                cond,
                then,
                otherwise,
            } => {
                cond.collect_variables(out);
                then.collect_variables(out);
                otherwise.collect_variables(out);
            }
        }
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            SymExpr::Neg(_) | SymExpr::Binary { .. } | SymExpr::Compare { .. }
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

fn fmt_call(f: &mut fmt::Formatter<'_>, name: &str, args: &[&SymExpr]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    write!(f, ")")
}

impl fmt::Display for SymExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymExpr::Int(i) => write!(f, "{}", i),
            SymExpr::Real(v) => write!(f, "{}", python_float_repr(*v)),
            SymExpr::Bool(true) => write!(f, "True"),
            SymExpr::Bool(false) => write!(f, "False"),
            SymExpr::Var(var) => write!(f, "{}", var),
            SymExpr::Free(name) => write!(f, "{}", name),
            SymExpr::Neg(inner) => {
                write!(f, "-")?;
                inner.fmt_operand(f)
            }
            SymExpr::Not(inner) => fmt_call(f, "Not", &[inner.as_ref()]),
            SymExpr::Binary { op, left, right } => {
                left.fmt_operand(f)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_operand(f)
            }
            SymExpr::Compare { op, left, right } => {
                left.fmt_operand(f)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_operand(f)
            }
            SymExpr::And(items) => fmt_call(f, "And", &items.iter().collect::<Vec<_>>()),
            SymExpr::Or(items) => fmt_call(f, "Or", &items.iter().collect::<Vec<_>>()),
            SymExpr::Ite {
                cond,
                then,
                otherwise,
            } => fmt_call(f, "If", &[cond.as_ref(), then.as_ref(), otherwise.as_ref()]),
        }
    }
}

/// Variable name → symbolic value, rebuilt fresh for every run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolicState {
    bindings: FxHashMap<String, SymExpr>,
}

impl SymbolicState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&SymExpr> {
        self.bindings.get(name)
    }

    /// Bind (or rebind) a name
    pub fn bind(&mut self, name: impl Into<String>, value: SymExpr) {
        self.bindings.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
