//! Expression evaluation with Python numeric semantics
//!
//! Integers are i64; results that Python would promote to a big integer
//! fail with `ExecError::Overflow` instead.

use std::cmp::Ordering;

use super::domain::{ExecError, Locals};
use crate::features::parsing::{BinOp, BoolOp, CmpOp, Expr, UnaryOp};
use crate::shared::models::Value;

/// Nesting depth at which list equality gives up
const MAX_COMPARE_DEPTH: usize = 1000;

/// Resolves the calls an expression makes, and the module-level names
/// a frame does not bind itself
pub trait CallResolver {
    fn call(&mut self, func: &str, args: Vec<Value>) -> Result<Value, ExecError>;

    fn global(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Resolver for call-free evaluation
struct NoCalls<'g> {
    globals: Option<&'g Locals>,
}

impl CallResolver for NoCalls<'_> {
    fn call(&mut self, func: &str, _args: Vec<Value>) -> Result<Value, ExecError> {
        Err(ExecError::UnknownFunction(func.to_string()))
    }

    fn global(&self, name: &str) -> Option<Value> {
        self.globals.and_then(|globals| globals.get(name).cloned())
    }
}

pub fn evaluate(
    expr: &Expr,
    locals: &Locals,
    resolver: &mut dyn CallResolver,
) -> Result<Value, ExecError> {
    match expr {
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::None => Ok(Value::None),
        Expr::Name(name) => locals
            .get(name)
            .cloned()
            .or_else(|| resolver.global(name))
            .ok_or_else(|| ExecError::Name(name.clone())),
        Expr::Subscript { value, index } => {
            let container = evaluate(value, locals, resolver)?;
            let index = evaluate(index, locals, resolver)?;
            subscript(&container, &index)
        }
        Expr::Call { func, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, locals, resolver))
                .collect::<Result<Vec<_>, _>>()?;
            resolver.call(func, args)
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, locals, resolver)?;
            unary(*op, &value)
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, locals, resolver)?;
            let right = evaluate(right, locals, resolver)?;
            binary(*op, &left, &right)
        }
        Expr::Compare { left, comparisons } => {
            let mut current = evaluate(left, locals, resolver)?;
            for (op, right) in comparisons {
                let right = evaluate(right, locals, resolver)?;
                if !compare(*op, &current, &right)? {
                    return Ok(Value::Bool(false));
                }
                current = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::BoolOp { op, values } => {
            // Python returns the deciding operand, not a bool
            let mut last = Value::Bool(matches!(op, BoolOp::And));
            for value in values {
                last = evaluate(value, locals, resolver)?;
                let truthy = last.is_truthy();
                match op {
                    BoolOp::And if !truthy => return Ok(last),
                    BoolOp::Or if truthy => return Ok(last),
                    _ => {}
                }
            }
            Ok(last)
        }
        Expr::List(items) => Ok(Value::list(
            items
                .iter()
                .map(|item| evaluate(item, locals, resolver))
                .collect::<Result<_, _>>()?,
        )),
        Expr::IfExp { test, body, orelse } => {
            if evaluate(test, locals, resolver)?.is_truthy() {
                evaluate(body, locals, resolver)
            } else {
                evaluate(orelse, locals, resolver)
            }
        }
    }
}

/// Evaluate without performing any call
pub fn evaluate_pure(expr: &Expr, locals: &Locals) -> Result<Value, ExecError> {
    evaluate(expr, locals, &mut NoCalls { globals: None })
}

/// [`evaluate_pure`] with module-level names behind the locals
pub fn evaluate_pure_in(
    expr: &Expr,
    locals: &Locals,
    globals: &Locals,
) -> Result<Value, ExecError> {
    evaluate(expr, locals, &mut NoCalls { globals: Some(globals) })
}

/// Normalize a Python index (negative counts from the end)
pub fn normalize_index(index: &Value, len: usize) -> Result<usize, ExecError> {
    let raw = match index {
        Value::Int(_) | Value::Bool(_) => index.as_i64().unwrap_or_default(),
        other => {
            return Err(ExecError::type_error(format!(
                "list indices must be integers, not {}",
                other.type_name()
            )))
        }
    };
    let adjusted = if raw < 0 { raw + len as i64 } else { raw };
    if adjusted < 0 || adjusted >= len as i64 {
        return Err(ExecError::Index { index: raw, len });
    }
    Ok(adjusted as usize)
}

pub fn subscript(container: &Value, index: &Value) -> Result<Value, ExecError> {
    match container {
        Value::List(list) => {
            let slot = normalize_index(index, list.len())?;
            list.get(slot).ok_or(ExecError::Index {
                index: slot as i64,
                len: list.len(),
            })
        }
        other => Err(ExecError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

pub fn unary(op: UnaryOp, value: &Value) -> Result<Value, ExecError> {
    match (op, value) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(ExecError::Overflow),
        (UnaryOp::Neg, Value::Bool(b)) => Ok(Value::Int(-i64::from(*b))),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        (UnaryOp::Pos, v @ (Value::Int(_) | Value::Float(_))) => Ok(v.clone()),
        (_, v) => Err(ExecError::type_error(format!(
            "bad operand type for unary operator: '{}'",
            v.type_name()
        ))),
    }
}

/// Operand pair after numeric promotion
enum Numeric {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn promote(op: BinOp, left: &Value, right: &Value) -> Result<Numeric, ExecError> {
    if let (Some(a), Some(b)) = (int_like(left), int_like(right)) {
        return Ok(Numeric::Ints(a, b));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok(Numeric::Floats(a, b)),
        _ => Err(ExecError::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn int_like(value: &Value) -> Option<i64> {
    match value {
        Value::Int(_) | Value::Bool(_) => value.as_i64(),
        _ => None,
    }
}

pub fn binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, ExecError> {
    if let (BinOp::Add, Value::List(a), Value::List(b)) = (op, left, right) {
        let mut items = a.to_vec();
        items.extend(b.to_vec());
        return Ok(Value::list(items));
    }

    let operands = promote(op, left, right)?;
    match op {
        BinOp::Add => match operands {
            Numeric::Ints(a, b) => a.checked_add(b).map(Value::Int).ok_or(ExecError::Overflow),
            Numeric::Floats(a, b) => Ok(Value::Float(a + b)),
        },
        BinOp::Sub => match operands {
            Numeric::Ints(a, b) => a.checked_sub(b).map(Value::Int).ok_or(ExecError::Overflow),
            Numeric::Floats(a, b) => Ok(Value::Float(a - b)),
        },
        BinOp::Mul => match operands {
            Numeric::Ints(a, b) => a.checked_mul(b).map(Value::Int).ok_or(ExecError::Overflow),
            Numeric::Floats(a, b) => Ok(Value::Float(a * b)),
        },
        BinOp::Div => {
            let (a, b) = as_floats(operands);
            if b == 0.0 {
                return Err(ExecError::ZeroDivision);
            }
            Ok(Value::Float(a / b))
        }
        BinOp::FloorDiv => match operands {
            Numeric::Ints(_, 0) => Err(ExecError::ZeroDivision),
            Numeric::Ints(a, b) => {
                let q = a.checked_div(b).ok_or(ExecError::Overflow)?;
                let adjust = a % b != 0 && ((a < 0) != (b < 0));
                Ok(Value::Int(if adjust { q - 1 } else { q }))
            }
            Numeric::Floats(_, b) if b == 0.0 => Err(ExecError::ZeroDivision),
            Numeric::Floats(a, b) => Ok(Value::Float((a / b).floor())),
        },
        BinOp::Mod => match operands {
            Numeric::Ints(_, 0) => Err(ExecError::ZeroDivision),
            Numeric::Ints(a, b) => {
                let r = a.checked_rem(b).ok_or(ExecError::Overflow)?;
                Ok(Value::Int(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }))
            }
            Numeric::Floats(_, b) if b == 0.0 => Err(ExecError::ZeroDivision),
            Numeric::Floats(a, b) => {
                let r = a % b;
                Ok(Value::Float(if r != 0.0 && ((r < 0.0) != (b < 0.0)) { r + b } else { r }))
            }
        },
        BinOp::Pow => power(operands),
    }
}

fn as_floats(operands: Numeric) -> (f64, f64) {
    match operands {
        Numeric::Ints(a, b) => (a as f64, b as f64),
        Numeric::Floats(a, b) => (a, b),
    }
}

fn power(operands: Numeric) -> Result<Value, ExecError> {
    match operands {
        Numeric::Ints(base, exp) if exp >= 0 => {
            let exp = u32::try_from(exp).map_err(|_| ExecError::Overflow)?;
            base.checked_pow(exp).map(Value::Int).ok_or(ExecError::Overflow)
        }
        other => {
            let (base, exp) = as_floats(other);
            if base == 0.0 && exp < 0.0 {
                return Err(ExecError::ZeroDivision);
            }
            if base < 0.0 && exp.fract() != 0.0 {
                return Err(ExecError::Value(
                    "negative number raised to a fractional power".to_string(),
                ));
            }
            let result = base.powf(exp);
            if result.is_infinite() {
                return Err(ExecError::Overflow);
            }
            Ok(Value::Float(result))
        }
    }
}

pub fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, ExecError> {
    match op {
        CmpOp::Eq => values_equal(left, right, 0),
        CmpOp::NotEq => values_equal(left, right, 0).map(|equal| !equal),
        _ => {
            let ordering = order(left, right).ok_or_else(|| {
                ExecError::type_error(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    op.symbol(),
                    left.type_name(),
                    right.type_name()
                ))
            })?;
            // NaN compares false everywhere
            let Some(ordering) = ordering else {
                return Ok(false);
            };
            Ok(match op {
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::LtE => ordering != Ordering::Greater,
                CmpOp::Gt => ordering == Ordering::Greater,
                CmpOp::GtE => ordering != Ordering::Less,
                CmpOp::Eq => ordering == Ordering::Equal,
                CmpOp::NotEq => ordering != Ordering::Equal,
            })
        }
    }
}

/// `None` when the types are not orderable; `Some(None)` for NaN
fn order(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    if let (Some(a), Some(b)) = (int_like(left), int_like(right)) {
        return Some(Some(a.cmp(&b)));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Some(a.partial_cmp(&b)),
        _ => None,
    }
}

/// Structural equality; identical lists are equal without a walk
fn values_equal(left: &Value, right: &Value, depth: usize) -> Result<bool, ExecError> {
    match (left, right) {
        (Value::List(a), Value::List(b)) if a.ptr_eq(b) => Ok(true),
        (Value::List(a), Value::List(b)) => {
            // Mutually nested lists never bottom out
            if depth >= MAX_COMPARE_DEPTH {
                return Err(ExecError::RecursionLimit(MAX_COMPARE_DEPTH));
            }
            let (a, b) = (a.to_vec(), b.to_vec());
            if a.len() != b.len() {
                return Ok(false);
            }
            for (x, y) in a.iter().zip(&b) {
                if !values_equal(x, y, depth + 1)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::None, Value::None) => Ok(true),
        _ => Ok(match order(left, right) {
            Some(ordering) => ordering == Some(Ordering::Equal),
            None => false,
        }),
    }
}
