//! Builtin functions available to subject code

use super::domain::ExecError;
use super::evaluator::{binary, compare};
use crate::features::parsing::{BinOp, CmpOp};
use crate::shared::models::Value;

/// Largest list `range()` may build
const MAX_RANGE_LEN: i64 = 1_000_000;

/// Call a builtin; `None` when `name` is not a builtin
pub fn call_builtin(name: &str, args: &[Value]) -> Option<Result<Value, ExecError>> {
    let result = match name {
        "len" => len(args),
        "abs" => unary_numeric(name, args, |v| match v {
            Value::Float(f) => Ok(Value::Float(f.abs())),
            other => other
                .as_i64()
                .and_then(i64::checked_abs)
                .map(Value::Int)
                .ok_or(ExecError::Overflow),
        }),
        "min" => extremum(name, args, CmpOp::Lt),
        "max" => extremum(name, args, CmpOp::Gt),
        "int" => unary_numeric(name, args, |v| match v {
            Value::Float(f) if !f.is_finite() => Err(ExecError::Value(format!(
                "cannot convert float {} to integer",
                f
            ))),
            Value::Float(f) => float_to_i64(f.trunc()).map(Value::Int),
            other => Ok(Value::Int(other.as_i64().unwrap_or_default())),
        }),
        "float" => unary_numeric(name, args, |v| {
            Ok(Value::Float(v.as_f64().unwrap_or_default()))
        }),
        "bool" => match args {
            [] => Ok(Value::Bool(false)),
            [v] => Ok(Value::Bool(v.is_truthy())),
            _ => Err(arity(name, 1, args.len())),
        },
        "range" => range(args),
        // Output is discarded
        "print" => Ok(Value::None),
        "sum" => sum(args),
        "round" => round(args),
        "pow" => match args {
            [base, exp] => binary(BinOp::Pow, base, exp),
            _ => Err(arity(name, 2, args.len())),
        },
        "math.sqrt" => float_fn(name, args, |x| {
            if x < 0.0 {
                Err(ExecError::Value("math domain error".to_string()))
            } else {
                Ok(x.sqrt())
            }
        }),
        "math.exp" => float_fn(name, args, |x| {
            let result = x.exp();
            if result.is_infinite() {
                Err(ExecError::Overflow)
            } else {
                Ok(result)
            }
        }),
        "math.log" => float_fn(name, args, |x| {
            if x <= 0.0 {
                Err(ExecError::Value("math domain error".to_string()))
            } else {
                Ok(x.ln())
            }
        }),
        "math.sin" => float_fn(name, args, |x| Ok(x.sin())),
        "math.cos" => float_fn(name, args, |x| Ok(x.cos())),
        "math.fabs" => float_fn(name, args, |x| Ok(x.abs())),
        "math.floor" => unary_numeric(name, args, |v| float_to_int(v, f64::floor)),
        "math.ceil" => unary_numeric(name, args, |v| float_to_int(v, f64::ceil)),
        "math.pow" => match args {
            [base, exp] => binary(
                BinOp::Pow,
                &Value::Float(base.as_f64().unwrap_or_default()),
                exp,
            ),
            _ => Err(arity(name, 2, args.len())),
        },
        _ => return None,
    };
    Some(result)
}

fn arity(function: &str, expected: usize, got: usize) -> ExecError {
    ExecError::Arity {
        function: function.to_string(),
        expected,
        got,
    }
}

fn unary_numeric(
    name: &str,
    args: &[Value],
    f: impl FnOnce(&Value) -> Result<Value, ExecError>,
) -> Result<Value, ExecError> {
    match args {
        [v] if v.is_numeric() => f(v),
        [v] => Err(ExecError::type_error(format!(
            "{}() argument must be a number, not '{}'",
            name,
            v.type_name()
        ))),
        _ => Err(arity(name, 1, args.len())),
    }
}

fn float_fn(
    name: &str,
    args: &[Value],
    f: impl FnOnce(f64) -> Result<f64, ExecError>,
) -> Result<Value, ExecError> {
    unary_numeric(name, args, |v| {
        f(v.as_f64().unwrap_or_default()).map(Value::Float)
    })
}

fn float_to_int(value: &Value, f: fn(f64) -> f64) -> Result<Value, ExecError> {
    match value {
        Value::Float(x) if !x.is_finite() => Err(ExecError::Overflow),
        Value::Float(x) => float_to_i64(f(*x)).map(Value::Int),
        other => Ok(Value::Int(other.as_i64().unwrap_or_default())),
    }
}

/// Integral float → i64; Python would give a big integer, we give Overflow
fn float_to_i64(x: f64) -> Result<i64, ExecError> {
    // 2^63 is exact in f64; every integral value below it fits
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if x.is_finite() && (-LIMIT..LIMIT).contains(&x) {
        Ok(x as i64)
    } else {
        Err(ExecError::Overflow)
    }
}

fn len(args: &[Value]) -> Result<Value, ExecError> {
    match args {
        [Value::List(list)] => Ok(Value::Int(list.len() as i64)),
        [other] => Err(ExecError::type_error(format!(
            "object of type '{}' has no len()",
            other.type_name()
        ))),
        _ => Err(arity("len", 1, args.len())),
    }
}

/// `min`/`max` over either one list or several arguments
fn extremum(name: &str, args: &[Value], better: CmpOp) -> Result<Value, ExecError> {
    let candidates: Vec<Value> = match args {
        [Value::List(list)] => list.to_vec(),
        [_] | [] => {
            return Err(ExecError::type_error(format!(
                "{}() expects an iterable or at least two arguments",
                name
            )))
        }
        _ => args.to_vec(),
    };

    let mut best = candidates
        .first()
        .ok_or_else(|| ExecError::Value(format!("{}() arg is an empty sequence", name)))?;
    for candidate in &candidates[1..] {
        if compare(better, candidate, best)? {
            best = candidate;
        }
    }
    Ok(best.clone())
}

fn range(args: &[Value]) -> Result<Value, ExecError> {
    let ints = args
        .iter()
        .map(|arg| match arg {
            Value::Int(_) | Value::Bool(_) => Ok(arg.as_i64().unwrap_or_default()),
            other => Err(ExecError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(arity("range", 3, args.len())),
    };
    if step == 0 {
        return Err(ExecError::Value("range() arg 3 must not be zero".to_string()));
    }

    let span = if step > 0 {
        stop.saturating_sub(start)
    } else {
        start.saturating_sub(stop)
    };
    let count = if span <= 0 {
        0
    } else {
        (span - 1) / step.saturating_abs() + 1
    };
    if count > MAX_RANGE_LEN {
        return Err(ExecError::Value(format!(
            "range of {} elements is too large",
            count
        )));
    }

    Ok(Value::list(
        (0..count).map(|i| Value::Int(start + i * step)).collect(),
    ))
}

fn sum(args: &[Value]) -> Result<Value, ExecError> {
    let (items, start) = match args {
        [Value::List(list)] => (list.to_vec(), Value::Int(0)),
        [Value::List(list), start] => (list.to_vec(), start.clone()),
        [other, ..] => {
            return Err(ExecError::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            )))
        }
        [] => return Err(arity("sum", 1, 0)),
    };
    items
        .iter()
        .try_fold(start, |acc, item| binary(BinOp::Add, &acc, item))
}

fn round(args: &[Value]) -> Result<Value, ExecError> {
    match args {
        [Value::Float(x)] if !x.is_finite() => Err(ExecError::Overflow),
        // Python rounds half to even
        [Value::Float(x)] => float_to_i64(round_half_even(*x)).map(Value::Int),
        [v] if v.is_numeric() => Ok(Value::Int(v.as_i64().unwrap_or_default())),
        [v, digits] if v.is_numeric() => {
            let digits = digits
                .as_i64()
                .ok_or_else(|| ExecError::type_error("round() digits must be an integer"))?;
            match v {
                Value::Float(x) => {
                    let scale = 10f64.powi(digits as i32);
                    Ok(Value::Float(round_half_even(x * scale) / scale))
                }
                other => Ok(other.clone()),
            }
        }
        [v, ..] => Err(ExecError::type_error(format!(
            "type {} doesn't define __round__",
            v.type_name()
        ))),
        [] => Err(arity("round", 1, 0)),
    }
}

fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (x - x.trunc()).abs() == 0.5 && rounded % 2.0 != 0.0 {
        rounded - x.signum()
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, ExecError> {
        call_builtin(name, args).expect("builtin exists")
    }

    #[test]
    fn test_range_forms() {
        assert_eq!(
            call("range", &[Value::Int(3)]).unwrap(),
            Value::list(vec![Value::Int(0), Value::Int(1), Value::Int(2)])
        );
        assert_eq!(
            call("range", &[Value::Int(5), Value::Int(0), Value::Int(-2)]).unwrap(),
            Value::list(vec![Value::Int(5), Value::Int(3), Value::Int(1)])
        );
        assert_eq!(
            call("range", &[Value::Int(2), Value::Int(1)]).unwrap(),
            Value::list(vec![])
        );
    }

    #[test]
    fn test_min_max_len_sum() {
        let list = Value::list(vec![Value::Int(4), Value::Float(1.5), Value::Int(9)]);
        assert_eq!(call("min", &[list.clone()]).unwrap(), Value::Float(1.5));
        assert_eq!(call("max", &[Value::Int(2), Value::Int(7)]).unwrap(), Value::Int(7));
        assert_eq!(call("len", &[list.clone()]).unwrap(), Value::Int(3));
        assert_eq!(call("sum", &[list]).unwrap(), Value::Float(14.5));
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(call("round", &[Value::Float(2.5)]).unwrap(), Value::Int(2));
        assert_eq!(call("round", &[Value::Float(3.5)]).unwrap(), Value::Int(4));
        assert_eq!(call("round", &[Value::Float(-2.5)]).unwrap(), Value::Int(-2));
    }

    #[test]
    fn test_math_domain_errors() {
        assert!(matches!(
            call("math.sqrt", &[Value::Int(-1)]),
            Err(ExecError::Value(_))
        ));
        assert_eq!(call("math.floor", &[Value::Float(-1.5)]).unwrap(), Value::Int(-2));
        assert!(call_builtin("open", &[]).is_none());
    }

    #[test]
    fn test_float_to_int_out_of_range_overflows() {
        assert_eq!(call("math.floor", &[Value::Float(1e30)]), Err(ExecError::Overflow));
        assert_eq!(call("math.ceil", &[Value::Float(-1e19)]), Err(ExecError::Overflow));
        assert_eq!(call("int", &[Value::Float(9.3e18)]), Err(ExecError::Overflow));
        assert_eq!(call("round", &[Value::Float(-1e300)]), Err(ExecError::Overflow));
        assert_eq!(
            call("int", &[Value::Float(-9.2e18)]).unwrap(),
            Value::Int(-9_200_000_000_000_000_000)
        );
        assert_eq!(call("int", &[Value::Float(-7.9)]).unwrap(), Value::Int(-7));
    }
}
