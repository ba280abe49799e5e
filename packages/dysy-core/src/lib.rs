/*
 * dysy - Concolic Regression-Test Generator
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (concrete values, source lines)
 * - features/    : Vertical slices (parsing → analysis → interpreter → symbolic
 *                  → tracer → constraints → smt → driver → test_writer)
 * - config/      : Session configuration (presets + YAML)
 *
 * Flow:
 *   subject.py → ProgramAnalysis → ConcolicDriver ⇄ (TraceContext, Z3Bridge) → TestSink
 */

#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and utilities
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{Preset, SessionConfig};
pub use errors::{DysyError, Result};
pub use features::analysis::{ProgramAnalysis, ProgramAnalyzer};
pub use features::driver::{
    run_session, ConcolicDriver, IterationOutcome, RecordingSink, SessionReport, TestSink,
};
pub use features::test_writer::UnittestWriter;
pub use shared::models::Value;
