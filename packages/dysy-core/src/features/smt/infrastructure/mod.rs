//! SMT infrastructure (z3 lives here)

mod translator;
mod z3_bridge;

pub use translator::{decimal_fraction, parse_real_text};
pub use z3_bridge::Z3Bridge;
