//! Parsing - Python subset → typed AST
//!
//! ## Architecture
//!
//! ```text
//! subject source
//!       ↓
//! tree-sitter-python CST
//!       ↓
//! PythonFrontend (lowering)
//!       ↓
//! Module { FunctionDef { Stmt*, Expr* }, GlobalAssign* }
//! ```
//!
//! Only the constructs the interpreter and the symbolic builder understand
//! are accepted; everything else is rejected with its line.

pub mod domain;
pub mod infrastructure;

pub use domain::{
    AssignTarget, BinOp, BoolOp, CmpOp, Expr, FunctionDef, GlobalAssign, Module, ParseError,
    Stmt, StmtKind, UnaryOp,
};
pub use infrastructure::python::PythonFrontend;
