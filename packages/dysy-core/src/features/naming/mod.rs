//! Naming Convention Resolver
//!
//! Parameter types are never declared in the subject; they are read off the
//! parameter name:
//!
//! - name contains `int` → integer domain, otherwise real
//! - name contains `seq` → fixed-length sequence of [`SEQUENCE_LENGTH`]
//!   elements, otherwise scalar
//!
//! The same convention names solver variables (`x#`, `x#3`) and turns a
//! solver model back into concrete arguments.

pub mod domain;
pub mod synthesizer;

pub use domain::{
    ConcreteArguments, NumericDomain, ParamSpec, Shape, SolverVar,
    SEQUENCE_LENGTH,
};
pub use synthesizer::{ArgumentSynthesizer, RandomRanges};
