//! Naming convention domain models

use indexmap::IndexMap;
use std::fmt;

use crate::shared::models::Value;

/// Fixed length of every sequence parameter
pub const SEQUENCE_LENGTH: usize = 15;

/// Marker separating a parameter name from its element index
const VAR_MARKER: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericDomain {
    Integer,
    Real,
}

impl NumericDomain {
    /// Coerce a numeric value into this domain
    ///
    /// Reals landing in an integer domain are rounded to the nearest integer.
    pub fn coerce(&self, value: &Value) -> Value {
        match (self, value) {
            (NumericDomain::Integer, Value::Float(f)) => Value::Int(f.round() as i64),
            (NumericDomain::Integer, Value::Bool(b)) => Value::Int(i64::from(*b)),
            (NumericDomain::Real, Value::Int(i)) => Value::Float(*i as f64),
            (NumericDomain::Real, Value::Bool(b)) => Value::Float(if *b { 1.0 } else { 0.0 }),
            _ => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Sequence(usize),
}

/// Per-parameter configuration, derived once from the name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamSpec {
    pub name: String,
    pub domain: NumericDomain,
    pub shape: Shape,
}

impl ParamSpec {
    pub fn from_name(name: &str) -> Self {
        let domain = if name.contains("int") {
            NumericDomain::Integer
        } else {
            NumericDomain::Real
        };
        let shape = if name.contains("seq") {
            Shape::Sequence(SEQUENCE_LENGTH)
        } else {
            Shape::Scalar
        };

        Self {
            name: name.to_string(),
            domain,
            shape,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.shape, Shape::Sequence(_))
    }

    /// Solver variable for the scalar itself
    pub fn scalar_var(&self) -> SolverVar {
        SolverVar {
            param: self.name.clone(),
            index: None,
            domain: self.domain,
        }
    }

    /// Solver variable for one sequence element
    pub fn element_var(&self, index: usize) -> SolverVar {
        SolverVar {
            param: self.name.clone(),
            index: Some(index),
            domain: self.domain,
        }
    }
}

/// Solver-level variable: a scalar parameter or one sequence element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolverVar {
    pub param: String,
    pub index: Option<usize>,
    pub domain: NumericDomain,
}

impl fmt::Display for SolverVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}{}{}", self.param, VAR_MARKER, index),
            None => write!(f, "{}{}", self.param, VAR_MARKER),
        }
    }
}

/// Parse a rendered solver variable name (`x#`, `x#3`)
///
/// Models are decoded from the typed variables of the query, so only tests
/// go back from text.
#[cfg(test)]
pub(crate) fn parse_solver_var(text: &str) -> Option<SolverVar> {
    let (param, suffix) = text.rsplit_once(VAR_MARKER)?;
    if param.is_empty() {
        return None;
    }

    let index = if suffix.is_empty() {
        None
    } else {
        Some(suffix.parse::<usize>().ok()?)
    };

    Some(SolverVar {
        param: param.to_string(),
        index,
        domain: ParamSpec::from_name(param).domain,
    })
}

/// Ordered parameter name → concrete value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcreteArguments {
    values: IndexMap<String, Value>,
}

impl ConcreteArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Positional argument values in parameter order
    ///
    /// Each call gets fresh lists, as a call written with literals would.
    pub fn values(&self) -> Vec<Value> {
        self.values.values().map(Value::deep_copy).collect()
    }

    /// Render as `<module>.<function>(p1=<lit>, p2=<lit>)`
    pub fn render_call(&self, module: &str, function: &str) -> String {
        let args = self
            .values
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}.{}({})", module, function, args)
    }
}
