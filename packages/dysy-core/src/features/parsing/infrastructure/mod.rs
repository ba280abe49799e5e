//! Parsing infrastructure (tree-sitter lives here)

pub mod python;
