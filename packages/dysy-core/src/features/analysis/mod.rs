//! Program Analyzer
//!
//! Parses the subject once and walks the first function definition,
//! recording every branch site (`if`/`elif`/`while`) and assignment site
//! by source line. Other functions in the module are kept for concrete
//! execution only.

mod analyzer;
mod domain;

pub use analyzer::ProgramAnalyzer;
pub use domain::{
    AnalysisError, AssignmentSite, BranchKind, BranchSite, FunctionSignature, ProgramAnalysis,
};
