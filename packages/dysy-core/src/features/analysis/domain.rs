//! Program analysis domain models

use std::collections::BTreeMap;
use thiserror::Error;

use crate::features::interpreter::{ExecError, Locals};
use crate::features::naming::ParamSpec;
use crate::features::parsing::{AssignTarget, Expr, FunctionDef, Module, ParseError};
use crate::shared::models::Line;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Subject has no top-level function definition
    #[error("No function definition found in subject")]
    NoFunction,

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A module-level constant could not be evaluated
    #[error("Module-level initializer failed: {0}")]
    ModuleInit(ExecError),
}

/// Name and typed parameters of the function under test
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub line: Line,
}

impl FunctionSignature {
    pub fn from_def(def: &FunctionDef) -> Self {
        Self {
            name: def.name.clone(),
            params: def.params.iter().map(|p| ParamSpec::from_name(p)).collect(),
            line: def.line,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// `if` or `elif` (elif arrives as a nested `if`)
    If,
    While,
}

/// A conditional statement of the target function
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSite {
    pub line: Line,
    pub kind: BranchKind,
    pub predicate: Expr,
    pub predicate_text: String,
    /// First line reached when the predicate is false
    pub continuation_line: Line,
}

/// An assignment of the target function
///
/// Augmented assignments are stored in expanded form: `x += e` has
/// `rhs = x + e`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentSite {
    pub line: Line,
    pub target: AssignTarget,
    pub rhs: Expr,
    pub rhs_text: String,
}

/// Immutable result of analyzing a subject module
///
/// Sites are keyed by source line. Two statements sharing one line keep
/// the last one.
#[derive(Debug, Clone)]
pub struct ProgramAnalysis {
    pub signature: FunctionSignature,
    pub branches: BTreeMap<Line, BranchSite>,
    pub assignments: BTreeMap<Line, AssignmentSite>,
    pub module: Module,
    /// Values of the module-level constants
    pub globals: Locals,
}

impl ProgramAnalysis {
    pub fn branch(&self, line: Line) -> Option<&BranchSite> {
        self.branches.get(&line)
    }

    pub fn assignment(&self, line: Line) -> Option<&AssignmentSite> {
        self.assignments.get(&line)
    }

    /// Number of branch outcomes (two per branch site)
    pub fn branch_outcome_count(&self) -> usize {
        self.branches.len() * 2
    }

    /// Definition of the function under test
    pub fn target(&self) -> Option<&FunctionDef> {
        self.module.function(&self.signature.name)
    }
}
