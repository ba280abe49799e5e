//! Feature modules (vertical slices)
//!
//! ```text
//! parsing ─→ analysis ─┬─→ tracer ─→ constraints ─→ smt ─→ driver ─→ test_writer
//!            naming ───┤      ↑
//!       interpreter ───┴── symbolic
//! ```

pub mod analysis;
pub mod constraints;
pub mod driver;
pub mod interpreter;
pub mod naming;
pub mod parsing;
pub mod smt;
pub mod symbolic;
pub mod test_writer;
pub mod tracer;
