//! `SymExpr` → z3 AST
//!
//! Sort rules:
//! - Int and Real operands are unified by promoting to Real
//! - `/` is always real division
//! - `**` with a small non-negative integer literal exponent is expanded
//!   into multiplication, anything else is a real power
//! - a numeric term in boolean position means `!= 0`
//! - a boolean term in numeric position means `ite(b, 1, 0)`
//! - a free name is a Real constant, or a Bool constant in boolean position

use z3::ast::{Ast, Bool, Int, Real};
use z3::Context;

use crate::features::naming::NumericDomain;
use crate::features::parsing::{BinOp, CmpOp};
use crate::features::smt::domain::SmtError;
use crate::features::symbolic::SymExpr;

/// Largest exponent expanded into repeated multiplication
const MAX_EXPANDED_POWER: i64 = 16;

enum Term<'ctx> {
    Int(Int<'ctx>),
    Real(Real<'ctx>),
    Bool(Bool<'ctx>),
}

enum Num<'ctx> {
    Int(Int<'ctx>),
    Real(Real<'ctx>),
}

pub struct Translator<'ctx> {
    ctx: &'ctx Context,
}

impl<'ctx> Translator<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        Self { ctx }
    }

    /// Translate one constraint (boolean position)
    pub fn constraint(&self, expr: &SymExpr) -> Result<Bool<'ctx>, SmtError> {
        self.boolean(expr)
    }

    pub fn int_var(&self, name: &str) -> Int<'ctx> {
        Int::new_const(self.ctx, name)
    }

    pub fn real_var(&self, name: &str) -> Real<'ctx> {
        Real::new_const(self.ctx, name)
    }

    fn term(&self, expr: &SymExpr) -> Result<Term<'ctx>, SmtError> {
        match expr {
            SymExpr::Int(i) => Ok(Term::Int(Int::from_i64(self.ctx, *i))),
            SymExpr::Real(f) => self.real_literal(*f).map(Term::Real),
            SymExpr::Bool(b) => Ok(Term::Bool(Bool::from_bool(self.ctx, *b))),
            SymExpr::Var(var) => {
                let name = var.to_string();
                Ok(match var.domain {
                    NumericDomain::Integer => Term::Int(self.int_var(&name)),
                    NumericDomain::Real => Term::Real(self.real_var(&name)),
                })
            }
            SymExpr::Free(name) => Ok(Term::Real(self.real_var(name))),
            SymExpr::Neg(inner) => Ok(match self.numeric(inner)? {
                Num::Int(i) => Term::Int(i.unary_minus()),
                Num::Real(r) => Term::Real(r.unary_minus()),
            }),
            SymExpr::Not(inner) => Ok(Term::Bool(self.boolean(inner)?.not())),
            SymExpr::Binary { op, left, right } => self.binary(*op, left, right),
            SymExpr::Compare { op, left, right } => {
                Ok(Term::Bool(self.compare(*op, left, right)?))
            }
            SymExpr::And(items) => {
                let items = self.booleans(items)?;
                let refs: Vec<&Bool<'ctx>> = items.iter().collect();
                Ok(Term::Bool(Bool::and(self.ctx, &refs)))
            }
            SymExpr::Or(items) => {
                let items = self.booleans(items)?;
                let refs: Vec<&Bool<'ctx>> = items.iter().collect();
                Ok(Term::Bool(Bool::or(self.ctx, &refs)))
            }
            SymExpr::Ite {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.boolean(cond)?;
                match (self.term(then)?, self.term(otherwise)?) {
                    (Term::Bool(a), Term::Bool(b)) => Ok(Term::Bool(cond.ite(&a, &b))),
                    (a, b) => match (self.to_num(a), self.to_num(b)) {
                        (Num::Int(a), Num::Int(b)) => Ok(Term::Int(cond.ite(&a, &b))),
                        (a, b) => Ok(Term::Real(cond.ite(&self.real(a), &self.real(b)))),
                    },
                }
            }
        }
    }

    fn booleans(&self, items: &[SymExpr]) -> Result<Vec<Bool<'ctx>>, SmtError> {
        items.iter().map(|item| self.boolean(item)).collect()
    }

    fn boolean(&self, expr: &SymExpr) -> Result<Bool<'ctx>, SmtError> {
        if let SymExpr::Free(name) = expr {
            return Ok(Bool::new_const(self.ctx, name.as_str()));
        }
        Ok(match self.term(expr)? {
            Term::Bool(b) => b,
            Term::Int(i) => i._eq(&Int::from_i64(self.ctx, 0)).not(),
            Term::Real(r) => r._eq(&self.real_zero()).not(),
        })
    }

    fn numeric(&self, expr: &SymExpr) -> Result<Num<'ctx>, SmtError> {
        Ok(self.to_num(self.term(expr)?))
    }

    fn to_num(&self, term: Term<'ctx>) -> Num<'ctx> {
        match term {
            Term::Int(i) => Num::Int(i),
            Term::Real(r) => Num::Real(r),
            Term::Bool(b) => Num::Int(b.ite(
                &Int::from_i64(self.ctx, 1),
                &Int::from_i64(self.ctx, 0),
            )),
        }
    }

    fn real(&self, num: Num<'ctx>) -> Real<'ctx> {
        match num {
            Num::Int(i) => Real::from_int(&i),
            Num::Real(r) => r,
        }
    }

    fn real_zero(&self) -> Real<'ctx> {
        Real::from_int(&Int::from_i64(self.ctx, 0))
    }

    /// floor(a / b) as a Real
    fn real_floor_div(&self, a: &Real<'ctx>, b: &Real<'ctx>) -> Real<'ctx> {
        Real::from_int(&Int::from_real(&a.div(b)))
    }

    fn binary(&self, op: BinOp, left: &SymExpr, right: &SymExpr) -> Result<Term<'ctx>, SmtError> {
        let base = self.numeric(left)?;

        if op == BinOp::Pow {
            if let SymExpr::Int(n) = right {
                if (0..=MAX_EXPANDED_POWER).contains(n) {
                    return Ok(self.expand_power(base, *n as usize));
                }
            }
            let exponent = self.numeric(right)?;
            return Ok(Term::Real(self.real(base).power(&self.real(exponent))));
        }

        let rhs = self.numeric(right)?;
        let ctx = self.ctx;
        Ok(match (op, base, rhs) {
            (BinOp::Div, a, b) => Term::Real(self.real(a).div(&self.real(b))),
            (_, Num::Int(a), Num::Int(b)) => Term::Int(match op {
                BinOp::Add => Int::add(ctx, &[&a, &b]),
                BinOp::Sub => Int::sub(ctx, &[&a, &b]),
                BinOp::Mul => Int::mul(ctx, &[&a, &b]),
                BinOp::FloorDiv => a.div(&b),
                BinOp::Mod => a.modulo(&b),
                BinOp::Div | BinOp::Pow => {
                    return Err(SmtError::Unsupported(format!("integer {}", op.symbol())))
                }
            }),
            (_, a, b) => {
                let (a, b) = (self.real(a), self.real(b));
                Term::Real(match op {
                    BinOp::Add => Real::add(ctx, &[&a, &b]),
                    BinOp::Sub => Real::sub(ctx, &[&a, &b]),
                    BinOp::Mul => Real::mul(ctx, &[&a, &b]),
                    BinOp::FloorDiv => self.real_floor_div(&a, &b),
                    // Python: a - b * floor(a / b)
                    BinOp::Mod => {
                        let floor = self.real_floor_div(&a, &b);
                        Real::sub(ctx, &[&a, &Real::mul(ctx, &[&b, &floor])])
                    }
                    BinOp::Div | BinOp::Pow => {
                        return Err(SmtError::Unsupported(format!("real {}", op.symbol())))
                    }
                })
            }
        })
    }

    fn expand_power(&self, base: Num<'ctx>, exponent: usize) -> Term<'ctx> {
        match base {
            Num::Int(b) => {
                if exponent == 0 {
                    return Term::Int(Int::from_i64(self.ctx, 1));
                }
                let factors: Vec<&Int<'ctx>> = std::iter::repeat(&b).take(exponent).collect();
                Term::Int(Int::mul(self.ctx, &factors))
            }
            Num::Real(b) => {
                if exponent == 0 {
                    return Term::Real(Real::from_int(&Int::from_i64(self.ctx, 1)));
                }
                let factors: Vec<&Real<'ctx>> = std::iter::repeat(&b).take(exponent).collect();
                Term::Real(Real::mul(self.ctx, &factors))
            }
        }
    }

    fn compare(&self, op: CmpOp, left: &SymExpr, right: &SymExpr) -> Result<Bool<'ctx>, SmtError> {
        let (l, r) = (self.term(left)?, self.term(right)?);

        if let (Term::Bool(a), Term::Bool(b)) = (&l, &r) {
            match op {
                CmpOp::Eq => return Ok(a._eq(b)),
                CmpOp::NotEq => return Ok(a._eq(b).not()),
                _ => {}
            }
        }

        Ok(match (self.to_num(l), self.to_num(r)) {
            (Num::Int(a), Num::Int(b)) => match op {
                CmpOp::Lt => a.lt(&b),
                CmpOp::LtE => a.le(&b),
                CmpOp::Gt => a.gt(&b),
                CmpOp::GtE => a.ge(&b),
                CmpOp::Eq => a._eq(&b),
                CmpOp::NotEq => a._eq(&b).not(),
            },
            (a, b) => {
                let (a, b) = (self.real(a), self.real(b));
                match op {
                    CmpOp::Lt => a.lt(&b),
                    CmpOp::LtE => a.le(&b),
                    CmpOp::Gt => a.gt(&b),
                    CmpOp::GtE => a.ge(&b),
                    CmpOp::Eq => a._eq(&b),
                    CmpOp::NotEq => a._eq(&b).not(),
                }
            }
        })
    }

    fn real_literal(&self, value: f64) -> Result<Real<'ctx>, SmtError> {
        let (num, den) = decimal_fraction(value).ok_or(SmtError::NonFinite(value))?;
        Real::from_real_str(self.ctx, &num, &den)
            .ok_or_else(|| SmtError::Unsupported(format!("real literal {}", value)))
    }
}

/// Exact decimal fraction of the shortest round-tripping rendering of `value`
///
/// `1.23e9` → `("1230000000", "1")`, `1e-10` → `("1", "10000000000")`.
pub fn decimal_fraction(value: f64) -> Option<(String, String)> {
    if !value.is_finite() {
        return None;
    }

    let rendered = format!("{:e}", value.abs());
    let (mantissa, exponent) = rendered.split_once('e')?;
    let exponent: i64 = exponent.parse().ok()?;
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let digits = format!("{}{}", whole, fraction);
    let shift = exponent - fraction.len() as i64;
    let sign = if value < 0.0 { "-" } else { "" };

    if shift >= 0 {
        Some((
            format!("{}{}{}", sign, digits, "0".repeat(shift as usize)),
            "1".to_string(),
        ))
    } else {
        Some((
            format!("{}{}", sign, digits),
            format!("1{}", "0".repeat((-shift) as usize)),
        ))
    }
}

/// Parse z3's textual rendering of a real numeral
///
/// Handles `3`, `3.25`, `1.4142135623?` (decimal approximation),
/// `(- 3.0)` and `(/ 1.0 3.0)`.
pub fn parse_real_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix("(-").and_then(|t| t.strip_suffix(')')) {
        return parse_real_text(inner).map(|v| -v);
    }
    if let Some(inner) = text.strip_prefix("(/").and_then(|t| t.strip_suffix(')')) {
        let mut parts = split_operands(inner.trim());
        let num = parse_real_text(parts.next()?)?;
        let den = parse_real_text(parts.next()?)?;
        return if den == 0.0 { None } else { Some(num / den) };
    }
    text.trim_end_matches('?').parse::<f64>().ok()
}

/// Split the two top-level operands of an s-expression body
fn split_operands(body: &str) -> impl Iterator<Item = &str> {
    let mut depth = 0usize;
    let mut split_at = None;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ' ' if depth == 0 => {
                split_at = Some(i);
                break;
            }
            _ => {}
        }
    }
    let (first, second) = match split_at {
        Some(i) => (&body[..i], body[i + 1..].trim()),
        None => (body, ""),
    };
    [first, second].into_iter().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_fraction() {
        assert_eq!(
            decimal_fraction(1.23e9),
            Some(("1230000000".to_string(), "1".to_string()))
        );
        assert_eq!(
            decimal_fraction(1e-10),
            Some(("1".to_string(), "10000000000".to_string()))
        );
        assert_eq!(
            decimal_fraction(-2.5),
            Some(("-25".to_string(), "10".to_string()))
        );
        assert_eq!(decimal_fraction(0.0), Some(("0".to_string(), "1".to_string())));
        assert_eq!(decimal_fraction(f64::NAN), None);
    }

    #[test]
    fn test_parse_real_text() {
        assert_eq!(parse_real_text("3"), Some(3.0));
        assert_eq!(parse_real_text("(- 2.5)"), Some(-2.5));
        assert_eq!(parse_real_text("(/ 1.0 4.0)"), Some(0.25));
        assert_eq!(parse_real_text("(- (/ 1.0 2.0))"), Some(-0.5));
        assert_eq!(parse_real_text("1.5?"), Some(1.5));
        assert_eq!(parse_real_text("(root-obj (+ (^ x 2) (- 2)) 1)"), None);
    }
}
