//! Symbolic expressions
//!
//! Subject expressions (`parsing::Expr`) and solver expressions
//! ([`SymExpr`]) are separate types joined by a single translation,
//! [`SymbolicExpressionBuilder::build`].

mod builder;
mod domain;

pub use builder::{SymbolicExpressionBuilder, CALL_PLACEHOLDER};
pub use domain::{SymExpr, SymbolicState};
