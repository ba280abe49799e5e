//! Error types for dysy-core
//!
//! Each feature owns its error enum; this module folds them into one
//! crate-level error for the CLI and file-based entry points.

use thiserror::Error;

use crate::config::ConfigError;
use crate::features::analysis::AnalysisError;
use crate::features::interpreter::ExecError;
use crate::features::parsing::ParseError;
use crate::features::smt::SmtError;

/// Main error type for dysy-core operations
#[derive(Debug, Error)]
pub enum DysyError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Subject source could not be lowered
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Static analysis failed (no function, ...)
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Concrete execution failed outside a driver session
    #[error(transparent)]
    Execution(#[from] ExecError),

    /// Solver translation failure
    #[error(transparent)]
    Smt(#[from] SmtError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for dysy operations
pub type Result<T> = std::result::Result<T, DysyError>;
