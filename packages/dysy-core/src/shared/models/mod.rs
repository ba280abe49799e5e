//! Shared domain models

mod value;

pub use value::{python_float_repr, ListRef, Value};

/// 1-based source line of the subject file
pub type Line = u32;
