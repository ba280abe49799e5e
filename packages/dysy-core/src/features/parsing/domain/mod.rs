//! Parsing domain models

mod ast;
mod error;

pub use ast::{
    AssignTarget, BinOp, BoolOp, CmpOp, Expr, FunctionDef, GlobalAssign, Module, Stmt, StmtKind,
    UnaryOp,
};
pub use error::ParseError;
