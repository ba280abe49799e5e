//! Statement executor with a line hook
//!
//! Every statement of every user-defined frame fires
//! [`LineHook::on_line`] before it executes. Builtins have no lines and
//! fire nothing.

use super::builtins::call_builtin;
use super::domain::{ExecError, ExecutionLimits, LineEvent, LineHook, Locals};
use super::evaluator::{binary, evaluate, normalize_index, CallResolver};
use crate::features::parsing::{AssignTarget, Expr, FunctionDef, Module, Stmt, StmtKind};
use crate::shared::models::{Line, Value};

/// Control flow out of a block
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter<'a, H: LineHook + ?Sized> {
    module: &'a Module,
    hook: &'a mut H,
    limits: ExecutionLimits,
    /// Module-level names, evaluated on the first call
    globals: Option<Locals>,
    steps: usize,
    depth: usize,
}

/// Resolver for module-level initializers: builtins only
struct BuiltinCalls;

impl CallResolver for BuiltinCalls {
    fn call(&mut self, func: &str, args: Vec<Value>) -> Result<Value, ExecError> {
        call_builtin(func, &args)
            .unwrap_or_else(|| Err(ExecError::UnknownFunction(func.to_string())))
    }
}

/// Evaluate the module-level constants in source order
///
/// Initializers see the constants above them and may call builtins.
pub fn module_globals(module: &Module) -> Result<Locals, ExecError> {
    let mut globals = Locals::default();
    for global in &module.globals {
        let value = evaluate(&global.value, &globals, &mut BuiltinCalls)
            .map_err(|e| e.at_line(global.line))?;
        globals.insert(global.name.clone(), value);
    }
    Ok(globals)
}

impl<'a, H: LineHook + ?Sized> Interpreter<'a, H> {
    pub fn new(module: &'a Module, hook: &'a mut H, limits: ExecutionLimits) -> Self {
        Self {
            module,
            hook,
            limits,
            globals: None,
            steps: 0,
            depth: 0,
        }
    }

    /// Statements executed so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Call a module function with positional arguments
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value, ExecError> {
        let module = self.module;
        if self.globals.is_none() {
            self.globals = Some(module_globals(module)?);
        }
        let function = module
            .function(name)
            .ok_or_else(|| ExecError::UnknownFunction(name.to_string()))?;
        self.invoke(function, args)
    }

    fn invoke(&mut self, function: &FunctionDef, args: Vec<Value>) -> Result<Value, ExecError> {
        if args.len() != function.params.len() {
            return Err(ExecError::Arity {
                function: function.name.clone(),
                expected: function.params.len(),
                got: args.len(),
            });
        }
        if self.depth >= self.limits.max_depth {
            return Err(ExecError::RecursionLimit(self.limits.max_depth));
        }

        let mut locals: Locals = function.params.iter().cloned().zip(args).collect();

        self.depth += 1;
        self.hook.on_enter(&function.name, self.depth);
        let flow = self.exec_block(&function.name, &function.body, &mut locals);
        self.hook.on_exit(&function.name, self.depth);
        self.depth -= 1;

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
            Flow::Break => Err(ExecError::OutsideLoop("break")),
            Flow::Continue => Err(ExecError::OutsideLoop("continue")),
        }
    }

    fn exec_block(
        &mut self,
        function: &str,
        block: &[Stmt],
        locals: &mut Locals,
    ) -> Result<Flow, ExecError> {
        for stmt in block {
            match self.exec_stmt(function, stmt, locals)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn tick(&mut self) -> Result<(), ExecError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(ExecError::StepLimit(self.limits.max_steps));
        }
        Ok(())
    }

    fn fire(
        &mut self,
        function: &str,
        line: Line,
        locals: &Locals,
        branch_outcome: Option<bool>,
    ) -> Result<(), ExecError> {
        let event = LineEvent {
            function,
            line,
            locals,
            branch_outcome,
            depth: self.depth,
        };
        self.hook.on_line(&event)
    }

    /// Evaluate a predicate once and fire the branch event with its outcome
    fn branch(
        &mut self,
        function: &str,
        line: Line,
        test: &Expr,
        locals: &Locals,
    ) -> Result<bool, ExecError> {
        self.tick()?;
        let outcome = evaluate(test, locals, self)?.is_truthy();
        self.fire(function, line, locals, Some(outcome))?;
        Ok(outcome)
    }

    fn exec_stmt(
        &mut self,
        function: &str,
        stmt: &Stmt,
        locals: &mut Locals,
    ) -> Result<Flow, ExecError> {
        self.exec_stmt_inner(function, stmt, locals)
            .map_err(|e| match e {
                ExecError::StepLimit(_) | ExecError::RecursionLimit(_) => e,
                other => other.at_line(stmt.line),
            })
    }

    fn exec_stmt_inner(
        &mut self,
        function: &str,
        stmt: &Stmt,
        locals: &mut Locals,
    ) -> Result<Flow, ExecError> {
        let line = stmt.line;

        match &stmt.kind {
            StmtKind::If { test, body, orelse } => {
                if self.branch(function, line, test, locals)? {
                    self.exec_block(function, body, locals)
                } else {
                    self.exec_block(function, orelse, locals)
                }
            }
            StmtKind::While { test, body } => {
                while self.branch(function, line, test, locals)? {
                    match self.exec_block(function, body, locals)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::For { target, iter, body } => {
                self.tick()?;
                self.fire(function, line, locals, None)?;
                let list = match evaluate(iter, locals, self)? {
                    Value::List(list) => list,
                    other => {
                        return Err(ExecError::type_error(format!(
                            "'{}' object is not iterable",
                            other.type_name()
                        )))
                    }
                };
                // Indexed like Python's list iterator, so body writes are seen
                let mut position = 0;
                while let Some(item) = list.get(position) {
                    position += 1;
                    locals.insert(target.clone(), item);
                    match self.exec_block(function, body, locals)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                    self.tick()?;
                    self.fire(function, line, locals, None)?;
                }
                Ok(Flow::Normal)
            }
            simple => {
                self.tick()?;
                self.fire(function, line, locals, None)?;
                self.exec_simple(simple, locals)
            }
        }
    }

    fn exec_simple(&mut self, kind: &StmtKind, locals: &mut Locals) -> Result<Flow, ExecError> {
        match kind {
            StmtKind::Assign { target, value } => {
                let value = evaluate(value, locals, self)?;
                self.store(target, value, locals)?;
                Ok(Flow::Normal)
            }
            StmtKind::AugAssign { target, op, value } => {
                let current = evaluate(&target.as_expr(), locals, self)?;
                let operand = evaluate(value, locals, self)?;
                self.store(target, binary(*op, &current, &operand)?, locals)?;
                Ok(Flow::Normal)
            }
            StmtKind::Expr(expr) => {
                evaluate(expr, locals, self)?;
                Ok(Flow::Normal)
            }
            StmtKind::Return(value) => Ok(Flow::Return(match value {
                Some(expr) => evaluate(expr, locals, self)?,
                None => Value::None,
            })),
            StmtKind::Raise(exception) => {
                // The exception object itself is never constructed
                let name = match exception {
                    Some(Expr::Call { func, .. }) => func.clone(),
                    Some(other) => other.to_string(),
                    None => "exception".to_string(),
                };
                Err(ExecError::Raised(name))
            }
            StmtKind::Pass => Ok(Flow::Normal),
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::If { .. } | StmtKind::While { .. } | StmtKind::For { .. } => {
                Err(ExecError::type_error("compound statement in simple position"))
            }
        }
    }

    fn store(
        &mut self,
        target: &AssignTarget,
        value: Value,
        locals: &mut Locals,
    ) -> Result<(), ExecError> {
        match target {
            AssignTarget::Name(name) => {
                locals.insert(name.clone(), value);
                Ok(())
            }
            AssignTarget::Subscript { name, index } => {
                let index = evaluate(index, locals, self)?;
                let container = locals
                    .get(name)
                    .cloned()
                    .or_else(|| self.global(name))
                    .ok_or_else(|| ExecError::Name(name.clone()))?;
                match container {
                    Value::List(list) => {
                        let slot = normalize_index(&index, list.len())?;
                        list.set(slot, value);
                        Ok(())
                    }
                    other => Err(ExecError::type_error(format!(
                        "'{}' object does not support item assignment",
                        other.type_name()
                    ))),
                }
            }
        }
    }
}

impl<'a, H: LineHook + ?Sized> CallResolver for Interpreter<'a, H> {
    fn call(&mut self, func: &str, args: Vec<Value>) -> Result<Value, ExecError> {
        let module = self.module;
        if let Some(function) = module.function(func) {
            return self.invoke(function, args);
        }
        call_builtin(func, &args)
            .unwrap_or_else(|| Err(ExecError::UnknownFunction(func.to_string())))
    }

    fn global(&self, name: &str) -> Option<Value> {
        self.globals.as_ref().and_then(|globals| globals.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::interpreter::NoopHook;
    use crate::features::parsing::PythonFrontend;

    fn module(source: &str) -> Module {
        PythonFrontend::new().unwrap().parse_module(source).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<(String, Line, Option<bool>)>,
    }

    impl LineHook for Recorder {
        fn on_line(&mut self, event: &LineEvent<'_>) -> Result<(), ExecError> {
            self.events
                .push((event.function.to_string(), event.line, event.branch_outcome));
            Ok(())
        }
    }

    #[test]
    fn test_branch_events_carry_outcome() {
        let m = module("def f(x):\n    if x > 1:\n        return 1\n    return 0\n");
        let mut hook = Recorder::default();
        let result = Interpreter::new(&m, &mut hook, ExecutionLimits::default())
            .call_function("f", vec![Value::Int(0)])
            .unwrap();

        assert_eq!(result, Value::Int(0));
        assert_eq!(
            hook.events,
            vec![("f".to_string(), 2, Some(false)), ("f".to_string(), 4, None)]
        );
    }

    #[test]
    fn test_while_fires_each_evaluation() {
        let m = module("def f(n):\n    while n > 0:\n        n -= 1\n    return n\n");
        let mut hook = Recorder::default();
        Interpreter::new(&m, &mut hook, ExecutionLimits::default())
            .call_function("f", vec![Value::Int(2)])
            .unwrap();

        let outcomes: Vec<Option<bool>> = hook
            .events
            .iter()
            .filter(|(_, line, _)| *line == 2)
            .map(|(_, _, outcome)| *outcome)
            .collect();
        assert_eq!(outcomes, vec![Some(true), Some(true), Some(false)]);
    }

    #[test]
    fn test_helper_calls_and_subscript_assignment() {
        let source = "\
def f(seq):
    s = seq
    s[0] = g(s[1])
    total = 0
    for v in s:
        total += v
    return total

def g(y):
    return y * 10
";
        let m = module(source);
        let mut hook = NoopHook;
        let args = vec![Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])];
        let result = Interpreter::new(&m, &mut hook, ExecutionLimits::default())
            .call_function("f", args)
            .unwrap();
        assert_eq!(result, Value::Int(25));
    }

    fn seq(values: &[i64]) -> Value {
        Value::list(values.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_list_alias_sees_writes() {
        let source = "\
def f(int_seq):
    s = int_seq
    s[0] = 100
    if int_seq[0] > 50:
        return 1
    return 0
";
        let m = module(source);
        let mut hook = Recorder::default();
        let result = Interpreter::new(&m, &mut hook, ExecutionLimits::default())
            .call_function("f", vec![seq(&[5; 15])])
            .unwrap();

        assert_eq!(result, Value::Int(1));
        assert!(hook.events.contains(&("f".to_string(), 4, Some(true))));
    }

    #[test]
    fn test_callee_mutates_caller_list() {
        let source = "\
def f(int_seq):
    g(int_seq)
    return int_seq[0]

def g(s):
    s[0] = 99
";
        let m = module(source);
        let mut hook = NoopHook;
        let arg = seq(&[5, 6, 7]);
        let result = Interpreter::new(&m, &mut hook, ExecutionLimits::default())
            .call_function("f", vec![arg.clone()])
            .unwrap();

        assert_eq!(result, Value::Int(99));
        assert_eq!(arg.to_string(), "[99, 6, 7]");
    }

    #[test]
    fn test_for_sees_writes_made_by_the_body() {
        let source = "\
def f(s):
    total = 0
    for v in s:
        s[2] = 10
        total += v
    return total
";
        let m = module(source);
        let mut hook = NoopHook;
        let result = Interpreter::new(&m, &mut hook, ExecutionLimits::default())
            .call_function("f", vec![seq(&[1, 2, 3])])
            .unwrap();
        assert_eq!(result, Value::Int(13));
    }

    #[test]
    fn test_module_constants_resolve_after_locals() {
        let source = "\
LIMIT = 100
SCALE = max(2, 3)
TABLE = [1, 2, 3]

def f(int_x):
    TABLE[0] = int_x
    if int_x * SCALE > LIMIT:
        return TABLE[0]
    return TABLE[1]

def g(LIMIT):
    return LIMIT
";
        let m = module(source);
        let mut hook = Recorder::default();
        let mut interp = Interpreter::new(&m, &mut hook, ExecutionLimits::default());

        assert_eq!(interp.call_function("f", vec![Value::Int(40)]).unwrap(), Value::Int(40));
        assert_eq!(interp.call_function("f", vec![Value::Int(7)]).unwrap(), Value::Int(2));
        assert_eq!(interp.call_function("g", vec![Value::Int(5)]).unwrap(), Value::Int(5));
        drop(interp);
        assert!(hook.events.contains(&("f".to_string(), 7, Some(true))));
        assert!(hook.events.contains(&("f".to_string(), 7, Some(false))));
    }

    #[test]
    fn test_failing_module_initializer_carries_line() {
        let m = module("A = 1\nB = 1 / 0\n\ndef f():\n    return A\n");
        assert_eq!(
            module_globals(&m),
            Err(ExecError::ZeroDivision.at_line(2))
        );
    }

    #[test]
    fn test_step_limit_stops_infinite_loop() {
        let m = module("def f(x):\n    while True:\n        pass\n");
        let mut hook = NoopHook;
        let limits = ExecutionLimits {
            max_steps: 50,
            max_depth: 8,
        };
        let err = Interpreter::new(&m, &mut hook, limits)
            .call_function("f", vec![Value::Int(0)])
            .unwrap_err();
        assert_eq!(err, ExecError::StepLimit(50));
    }

    #[test]
    fn test_recursion_limit() {
        let m = module("def f(n):\n    return f(n + 1)\n");
        let mut hook = NoopHook;
        let limits = ExecutionLimits {
            max_steps: 10_000,
            max_depth: 8,
        };
        let err = Interpreter::new(&m, &mut hook, limits)
            .call_function("f", vec![Value::Int(0)])
            .unwrap_err();
        assert_eq!(err, ExecError::RecursionLimit(8));
    }

    #[test]
    fn test_raise_and_errors_carry_line() {
        let m = module("def f(x):\n    if x:\n        raise ValueError()\n    return 1 / x\n");
        let mut hook = NoopHook;
        let mut interp = Interpreter::new(&m, &mut hook, ExecutionLimits::default());

        let raised = interp.call_function("f", vec![Value::Int(1)]).unwrap_err();
        assert_eq!(
            raised,
            ExecError::Raised("ValueError".into()).at_line(3)
        );

        let zero = interp.call_function("f", vec![Value::Int(0)]).unwrap_err();
        assert_eq!(zero.root(), &ExecError::ZeroDivision);
    }
}
