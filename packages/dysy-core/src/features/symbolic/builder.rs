//! Symbolic Expression Builder
//!
//! Translates a subject `Expr` into a `SymExpr` in one pass:
//!
//! 1. calls → the placeholder constant [`CALL_PLACEHOLDER`]
//! 2. identifiers → solver variable, symbolic binding, concrete literal
//!    (locals, then module constants) or free name, in that order
//! 3. `not` → `Not`
//!
//! The builder never mutates its inputs; the same inputs always give the
//! same expression.

use crate::features::analysis::FunctionSignature;
use crate::features::interpreter::{evaluate_pure_in, Locals};
use crate::features::naming::{ParamSpec, Shape};
use crate::features::parsing::{BoolOp, Expr, UnaryOp};
use crate::shared::models::Value;

use super::domain::{SymExpr, SymbolicState};

/// Value every nested call is abstracted to
pub const CALL_PLACEHOLDER: i64 = 15;

pub struct SymbolicExpressionBuilder<'a> {
    signature: &'a FunctionSignature,
    globals: Option<&'a Locals>,
}

impl<'a> SymbolicExpressionBuilder<'a> {
    pub fn new(signature: &'a FunctionSignature) -> Self {
        Self {
            signature,
            globals: None,
        }
    }

    /// Concretize module-level constants the locals do not shadow
    pub fn with_globals(mut self, globals: &'a Locals) -> Self {
        self.globals = Some(globals);
        self
    }

    fn eval_concrete(&self, expr: &Expr, locals: &Locals) -> Option<Value> {
        let empty = Locals::default();
        evaluate_pure_in(expr, locals, self.globals.unwrap_or(&empty)).ok()
    }

    pub fn build(&self, expr: &Expr, state: &SymbolicState, locals: &Locals) -> SymExpr {
        match expr {
            Expr::Int(i) => SymExpr::Int(*i),
            Expr::Float(f) => SymExpr::Real(*f),
            Expr::Bool(b) => SymExpr::Bool(*b),
            Expr::None => SymExpr::Free("None".to_string()),
            Expr::Name(name) => self.resolve_name(name, state, locals),
            Expr::Subscript { value, index } => self.resolve_subscript(expr, value, index, locals),
            Expr::Call { .. } => SymExpr::Int(CALL_PLACEHOLDER),
            Expr::Unary { op, operand } => {
                let operand = self.build(operand, state, locals);
                match op {
                    UnaryOp::Not => SymExpr::not(operand),
                    UnaryOp::Neg => SymExpr::Neg(Box::new(operand)),
                    UnaryOp::Pos => operand,
                }
            }
            Expr::Binary { op, left, right } => SymExpr::binary(
                *op,
                self.build(left, state, locals),
                self.build(right, state, locals),
            ),
            Expr::Compare { left, comparisons } => {
                // a < b <= c  →  And(a < b, b <= c)
                let mut current = self.build(left, state, locals);
                let mut links = Vec::with_capacity(comparisons.len());
                for (op, right) in comparisons {
                    let right = self.build(right, state, locals);
                    links.push(SymExpr::compare(*op, current, right.clone()));
                    current = right;
                }
                match links.len() {
                    1 => links.remove(0),
                    _ => SymExpr::And(links),
                }
            }
            Expr::BoolOp { op, values } => {
                let values = values
                    .iter()
                    .map(|v| self.build(v, state, locals))
                    .collect();
                match op {
                    BoolOp::And => SymExpr::And(values),
                    BoolOp::Or => SymExpr::Or(values),
                }
            }
            Expr::List(_) => SymExpr::Free(expr.to_string()),
            Expr::IfExp { test, body, orelse } => SymExpr::Ite {
                cond: Box::new(self.build(test, state, locals)),
                then: Box::new(self.build(body, state, locals)),
                otherwise: Box::new(self.build(orelse, state, locals)),
            },
        }
    }

    fn resolve_name(&self, name: &str, state: &SymbolicState, locals: &Locals) -> SymExpr {
        if let Some(spec) = self.signature.param(name) {
            return match spec.shape {
                Shape::Scalar => SymExpr::var(spec.scalar_var()),
                // A whole sequence has no scalar solver counterpart
                Shape::Sequence(_) => SymExpr::Free(name.to_string()),
            };
        }
        if let Some(bound) = state.get(name) {
            return bound.clone();
        }
        let concrete = match locals.get(name) {
            Some(value) => Some(value),
            None => self.globals.and_then(|globals| globals.get(name)),
        };
        match concrete.and_then(literal) {
            Some(lit) => lit,
            None => SymExpr::Free(name.to_string()),
        }
    }

    fn resolve_subscript(
        &self,
        whole: &Expr,
        value: &Expr,
        index: &Expr,
        locals: &Locals,
    ) -> SymExpr {
        if let Expr::Name(name) = value {
            if let Some(spec) = self.sequence_param(name) {
                if let Some(slot) = self.concrete_slot(index, locals, spec) {
                    return SymExpr::var(spec.element_var(slot));
                }
            }
        }

        match self.eval_concrete(whole, locals).as_ref().and_then(literal) {
            Some(lit) => lit,
            None => SymExpr::Free(whole.to_string()),
        }
    }

    fn sequence_param(&self, name: &str) -> Option<&'a ParamSpec> {
        self.signature.param(name).filter(|spec| spec.is_sequence())
    }

    /// Index of a sequence element, if it evaluates concretely into range
    fn concrete_slot(&self, index: &Expr, locals: &Locals, spec: &ParamSpec) -> Option<usize> {
        let Shape::Sequence(len) = spec.shape else {
            return None;
        };
        match self.eval_concrete(index, locals)? {
            Value::Int(i) if (0..len as i64).contains(&i) => Some(i as usize),
            Value::Bool(b) => Some(usize::from(b)),
            _ => None,
        }
    }
}

/// Scalar concrete value as a solver literal
fn literal(value: &Value) -> Option<SymExpr> {
    match value {
        Value::Int(i) => Some(SymExpr::Int(*i)),
        Value::Float(f) => Some(SymExpr::Real(*f)),
        Value::Bool(b) => Some(SymExpr::Bool(*b)),
        Value::None | Value::List(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::{BinOp, CmpOp};
    use pretty_assertions::assert_eq;

    fn signature(params: &[&str]) -> FunctionSignature {
        FunctionSignature {
            name: "f".to_string(),
            params: params.iter().map(|p| ParamSpec::from_name(p)).collect(),
            line: 1,
        }
    }

    fn name(n: &str) -> Expr {
        Expr::Name(n.to_string())
    }

    #[test]
    fn test_identifier_resolution_order() {
        let sig = signature(&["real_a", "int_seq"]);
        let builder = SymbolicExpressionBuilder::new(&sig);

        let mut state = SymbolicState::new();
        state.bind("t", SymExpr::binary(BinOp::Mul, SymExpr::Int(2), SymExpr::Real(0.5)));
        let mut locals = Locals::default();
        locals.insert("k".into(), Value::Int(3));
        locals.insert("t".into(), Value::Float(1.0));

        // param, symbolic binding (wins over the local), concrete, free
        let expr = Expr::BoolOp {
            op: BoolOp::And,
            values: vec![name("real_a"), name("t"), name("k"), name("z")],
        };
        assert_eq!(
            builder.build(&expr, &state, &locals).to_string(),
            "And(real_a#, 2 * 0.5, 3, z)"
        );
    }

    #[test]
    fn test_calls_become_placeholder() {
        let sig = signature(&["x"]);
        let builder = SymbolicExpressionBuilder::new(&sig);
        let expr = Expr::binary(
            BinOp::Add,
            name("x"),
            Expr::Call {
                func: "helper".into(),
                args: vec![name("x")],
            },
        );
        assert_eq!(
            builder
                .build(&expr, &SymbolicState::new(), &Locals::default())
                .to_string(),
            "x# + 15"
        );
    }

    #[test]
    fn test_sequence_subscript_uses_concrete_index() {
        let sig = signature(&["int_seq"]);
        let builder = SymbolicExpressionBuilder::new(&sig);
        let mut locals = Locals::default();
        locals.insert("i".into(), Value::Int(4));

        let read = |idx: Expr| Expr::Subscript {
            value: Box::new(name("int_seq")),
            index: Box::new(idx),
        };

        let at_i = builder.build(&read(name("i")), &SymbolicState::new(), &locals);
        assert_eq!(at_i.to_string(), "int_seq#4");

        let out_of_range = builder.build(&read(Expr::Int(20)), &SymbolicState::new(), &locals);
        assert_eq!(out_of_range, SymExpr::Free("int_seq[20]".into()));
    }

    #[test]
    fn test_module_constants_become_literals() {
        let sig = signature(&["int_x", "int_seq"]);
        let mut globals = Locals::default();
        globals.insert("LIMIT".into(), Value::Int(100));
        globals.insert("LAST".into(), Value::Int(14));
        let builder = SymbolicExpressionBuilder::new(&sig).with_globals(&globals);

        let mut locals = Locals::default();
        locals.insert("LAST".into(), Value::Int(3));
        let expr = Expr::compare(
            Expr::Subscript {
                value: Box::new(name("int_seq")),
                index: Box::new(name("LAST")),
            },
            CmpOp::Gt,
            Expr::binary(BinOp::Add, name("int_x"), name("LIMIT")),
        );
        // The local LAST shadows the module constant
        assert_eq!(
            builder.build(&expr, &SymbolicState::new(), &locals).to_string(),
            "int_seq#3 > (int_x# + 100)"
        );

        let plain = SymbolicExpressionBuilder::new(&sig);
        assert_eq!(
            plain.build(&name("LIMIT"), &SymbolicState::new(), &Locals::default()),
            SymExpr::Free("LIMIT".into())
        );
    }

    #[test]
    fn test_chained_comparison_and_negation() {
        let sig = signature(&["real_x"]);
        let builder = SymbolicExpressionBuilder::new(&sig);
        let chained = Expr::Compare {
            left: Box::new(Expr::Int(0)),
            comparisons: vec![(CmpOp::Lt, name("real_x")), (CmpOp::Lt, Expr::Int(10))],
        };
        let built = builder.build(&Expr::not(chained), &SymbolicState::new(), &Locals::default());
        assert_eq!(built.to_string(), "Not(And(0 < real_x#, real_x# < 10))");
    }
}
