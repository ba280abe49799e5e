//! Concrete argument synthesis
//!
//! Two sources of arguments: uniform random draws (session start, reseed,
//! slots a model leaves unset) and solver models decoded through
//! [`SolverVar`] names.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::debug;

use super::domain::{ConcreteArguments, NumericDomain, ParamSpec, Shape, SolverVar};
use crate::shared::models::Value;

/// Ranges for random draws
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomRanges {
    /// Inclusive integer range
    pub int: (i64, i64),
    /// Half-open real range
    pub real: (f64, f64),
}

impl Default for RandomRanges {
    fn default() -> Self {
        Self {
            int: (5, 10),
            real: (5.0, 10.0),
        }
    }
}

pub struct ArgumentSynthesizer {
    rng: StdRng,
    ranges: RandomRanges,
}

impl ArgumentSynthesizer {
    /// Seeded synthesizer; `None` draws the seed from OS entropy
    pub fn new(seed: Option<u64>, ranges: RandomRanges) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, ranges }
    }

    pub fn random_scalar(&mut self, domain: NumericDomain) -> Value {
        match domain {
            NumericDomain::Integer => {
                let (lo, hi) = self.ranges.int;
                Value::Int(self.rng.gen_range(lo.min(hi)..=hi.max(lo)))
            }
            NumericDomain::Real => {
                let (lo, hi) = self.ranges.real;
                if hi > lo {
                    Value::Float(self.rng.gen_range(lo..hi))
                } else {
                    Value::Float(lo)
                }
            }
        }
    }

    pub fn random_value(&mut self, spec: &ParamSpec) -> Value {
        match spec.shape {
            Shape::Scalar => self.random_scalar(spec.domain),
            Shape::Sequence(len) => {
                Value::list((0..len).map(|_| self.random_scalar(spec.domain)).collect())
            }
        }
    }

    pub fn random_arguments(&mut self, params: &[ParamSpec]) -> ConcreteArguments {
        let mut args = ConcreteArguments::new();
        for spec in params {
            let value = self.random_value(spec);
            args.insert(spec.name.clone(), value);
        }
        args
    }

    /// Decode solver assignments into arguments
    ///
    /// Parameters the model does not mention get random values; sequence
    /// slots the model does not mention get random elements. Assignments
    /// to unknown parameters or out-of-range slots are ignored.
    pub fn arguments_from_assignments(
        &mut self,
        params: &[ParamSpec],
        assignments: impl IntoIterator<Item = (SolverVar, Value)>,
    ) -> ConcreteArguments {
        let mut by_param: FxHashMap<String, FxHashMap<Option<usize>, Value>> =
            FxHashMap::default();
        for (var, value) in assignments {
            by_param
                .entry(var.param)
                .or_default()
                .insert(var.index, value);
        }

        let mut args = ConcreteArguments::new();
        for spec in params {
            let assigned = by_param.remove(&spec.name).unwrap_or_default();
            let value = match spec.shape {
                Shape::Scalar => match assigned.get(&None) {
                    Some(value) => spec.domain.coerce(value),
                    None => self.random_scalar(spec.domain),
                },
                Shape::Sequence(len) => Value::list(
                    (0..len)
                        .map(|i| match assigned.get(&Some(i)) {
                            Some(value) => spec.domain.coerce(value),
                            None => self.random_scalar(spec.domain),
                        })
                        .collect(),
                ),
            };
            args.insert(spec.name.clone(), value);
        }

        for name in by_param.keys() {
            debug!(param = %name, "model assigns a variable with no matching parameter");
        }

        args
    }
}
