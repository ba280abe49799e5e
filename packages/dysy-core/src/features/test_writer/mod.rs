//! Test Sink: Python `unittest` module writer
//!
//! Writes every call that covered something new into a `RandomTestCases`
//! class. An empty call text (the worklist ran dry and was reseeded) closes
//! the current `testN` method; the next new call opens another one.

mod unittest;

pub use unittest::UnittestWriter;
