//! Python Frontend - tree-sitter Python → typed subset AST
//!
//! Recursive descent over the tree-sitter CST. Every node kind the lowering
//! does not know is rejected with `ParseError::Unsupported` so the analyzer
//! never silently drops a statement the tracer would later execute.

use tree_sitter::{Node, Parser, Tree};

use crate::features::parsing::domain::{
    AssignTarget, BinOp, BoolOp, CmpOp, Expr, FunctionDef, GlobalAssign, Module, ParseError, Stmt,
    StmtKind, UnaryOp,
};
use crate::shared::models::Line;

pub struct PythonFrontend {
    parser: Parser,
}

impl PythonFrontend {
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::language())
            .map_err(|e| ParseError::Language(e.to_string()))?;

        Ok(Self { parser })
    }

    /// Parse source code and get tree
    fn parse(&mut self, source: &str) -> Result<Tree, ParseError> {
        self.parser.parse(source, None).ok_or(ParseError::NoTree)
    }

    /// Parse a whole module and lower its function definitions and
    /// module-level constant assignments
    pub fn parse_module(&mut self, source: &str) -> Result<Module, ParseError> {
        let tree = self.parse(source)?;
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error_line(root).unwrap_or_else(|| line_of(root));
            return Err(ParseError::Syntax { line });
        }

        let lowering = Lowering { source };
        let mut functions = Vec::new();
        let mut globals = Vec::new();
        let children: Vec<Node> = root.named_children(&mut root.walk()).collect();

        for child in children {
            match child.kind() {
                "function_definition" => functions.push(lowering.function(child)?),
                "decorated_definition" => {
                    if let Some(def) = child.child_by_field_name("definition") {
                        if def.kind() == "function_definition" {
                            functions.push(lowering.function(def)?);
                        }
                    }
                }
                "expression_statement" => {
                    if let Some(global) = lowering.global(child)? {
                        globals.push(global);
                    }
                }
                // Imports, classes and other module-level code are never executed
                _ => {}
            }
        }

        Ok(Module { functions, globals })
    }
}

fn line_of(node: Node) -> Line {
    node.start_position().row as Line + 1
}

fn end_line_of(node: Node) -> Line {
    node.end_position().row as Line + 1
}

fn first_error_line(node: Node) -> Option<Line> {
    if node.is_error() || node.is_missing() {
        return Some(line_of(node));
    }
    let children: Vec<Node> = node.children(&mut node.walk()).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error_line)
}

/// Lowering context (borrowed source text)
struct Lowering<'s> {
    source: &'s str,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> &'s str {
        &self.source[node.byte_range()]
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>, ParseError> {
        node.child_by_field_name(name)
            .ok_or_else(|| ParseError::unsupported(format!("{} without {}", node.kind(), name), line_of(node)))
    }

    fn named_children<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        node.named_children(&mut node.walk())
            .filter(|c| !c.is_extra())
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Definitions
    // ═══════════════════════════════════════════════════════════════════════

    fn function(&self, node: Node) -> Result<FunctionDef, ParseError> {
        let name = self.text(self.field(node, "name")?).to_string();
        let parameters = self.field(node, "parameters")?;

        let mut params = Vec::new();
        for param in self.named_children(parameters) {
            let param_name = match param.kind() {
                "identifier" => self.text(param),
                "typed_parameter" => self
                    .named_children(param)
                    .into_iter()
                    .find(|c| c.kind() == "identifier")
                    .map(|c| self.text(c))
                    .ok_or_else(|| ParseError::unsupported("typed parameter", line_of(param)))?,
                "default_parameter" | "typed_default_parameter" => {
                    self.text(self.field(param, "name")?)
                }
                other => return Err(ParseError::unsupported(other, line_of(param))),
            };
            params.push(param_name.to_string());
        }

        let body = self.block(self.field(node, "body")?)?;

        Ok(FunctionDef {
            name,
            params,
            body,
            line: line_of(node),
        })
    }

    /// Module-level `NAME = expr` / `NAME op= expr`; other expression
    /// statements (docstrings, calls) are skipped
    fn global(&self, node: Node) -> Result<Option<GlobalAssign>, ParseError> {
        let is_assignment = self
            .named_children(node)
            .iter()
            .any(|c| matches!(c.kind(), "assignment" | "augmented_assignment"));
        if !is_assignment {
            return Ok(None);
        }

        let stmt = self.statement(node)?;
        let (name, value) = match stmt.kind {
            StmtKind::Assign {
                target: AssignTarget::Name(name),
                value,
            } => (name, value),
            StmtKind::AugAssign {
                target: AssignTarget::Name(name),
                op,
                value,
            } => {
                let current = Expr::Name(name.clone());
                (name, Expr::binary(op, current, value))
            }
            _ => {
                return Err(ParseError::unsupported(
                    "module-level item assignment",
                    stmt.line,
                ))
            }
        };

        Ok(Some(GlobalAssign {
            name,
            value,
            line: stmt.line,
        }))
    }

    fn block(&self, node: Node) -> Result<Vec<Stmt>, ParseError> {
        self.named_children(node)
            .into_iter()
            .map(|child| self.statement(child))
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════════

    fn statement(&self, node: Node) -> Result<Stmt, ParseError> {
        let line = line_of(node);
        let kind = match node.kind() {
            "expression_statement" => {
                let children = self.named_children(node);
                if children.len() != 1 {
                    return Err(ParseError::unsupported("tuple expression", line));
                }
                let inner = children[0];
                match inner.kind() {
                    "assignment" => self.assignment(inner)?,
                    "augmented_assignment" => self.augmented_assignment(inner)?,
                    _ => StmtKind::Expr(self.expression(inner)?),
                }
            }
            "if_statement" => return self.if_statement(node),
            "while_statement" => {
                if node.child_by_field_name("alternative").is_some() {
                    return Err(ParseError::unsupported("while-else", line));
                }
                StmtKind::While {
                    test: self.expression(self.field(node, "condition")?)?,
                    body: self.block(self.field(node, "body")?)?,
                }
            }
            "for_statement" => {
                if node.child_by_field_name("alternative").is_some() {
                    return Err(ParseError::unsupported("for-else", line));
                }
                let left = self.field(node, "left")?;
                if left.kind() != "identifier" {
                    return Err(ParseError::unsupported("for target pattern", line));
                }
                StmtKind::For {
                    target: self.text(left).to_string(),
                    iter: self.expression(self.field(node, "right")?)?,
                    body: self.block(self.field(node, "body")?)?,
                }
            }
            "return_statement" => StmtKind::Return(self.optional_operand(node)?),
            "raise_statement" => StmtKind::Raise(self.optional_operand(node)?),
            "pass_statement" => StmtKind::Pass,
            "break_statement" => StmtKind::Break,
            "continue_statement" => StmtKind::Continue,
            other => return Err(ParseError::unsupported(other, line)),
        };

        Ok(Stmt {
            line,
            end_line: end_line_of(node),
            kind,
        })
    }

    fn optional_operand(&self, node: Node) -> Result<Option<Expr>, ParseError> {
        match self.named_children(node).first() {
            Some(child) => Ok(Some(self.expression(*child)?)),
            None => Ok(None),
        }
    }

    fn assignment(&self, node: Node) -> Result<StmtKind, ParseError> {
        let line = line_of(node);
        let right = node
            .child_by_field_name("right")
            .ok_or_else(|| ParseError::unsupported("annotation without value", line))?;
        if right.kind() == "assignment" {
            return Err(ParseError::unsupported("chained assignment", line));
        }

        Ok(StmtKind::Assign {
            target: self.target(self.field(node, "left")?)?,
            value: self.expression(right)?,
        })
    }

    fn augmented_assignment(&self, node: Node) -> Result<StmtKind, ParseError> {
        let line = line_of(node);
        let operator = self.text(self.field(node, "operator")?);
        let op = operator
            .strip_suffix('=')
            .and_then(BinOp::from_symbol)
            .ok_or_else(|| ParseError::unsupported(format!("operator {}", operator), line))?;

        Ok(StmtKind::AugAssign {
            target: self.target(self.field(node, "left")?)?,
            op,
            value: self.expression(self.field(node, "right")?)?,
        })
    }

    fn target(&self, node: Node) -> Result<AssignTarget, ParseError> {
        match node.kind() {
            "identifier" => Ok(AssignTarget::Name(self.text(node).to_string())),
            "subscript" => {
                let value = self.field(node, "value")?;
                if value.kind() != "identifier" {
                    return Err(ParseError::unsupported("nested subscript target", line_of(node)));
                }
                Ok(AssignTarget::Subscript {
                    name: self.text(value).to_string(),
                    index: self.subscript_index(node)?,
                })
            }
            other => Err(ParseError::unsupported(
                format!("assignment to {}", other),
                line_of(node),
            )),
        }
    }

    /// `if` with its `elif`/`else` alternatives folded into nested `orelse`
    fn if_statement(&self, node: Node) -> Result<Stmt, ParseError> {
        let test = self.expression(self.field(node, "condition")?)?;
        let body = self.block(self.field(node, "consequence")?)?;
        let alternatives: Vec<Node> = node
            .children_by_field_name("alternative", &mut node.walk())
            .collect();

        let mut orelse: Vec<Stmt> = Vec::new();
        for alternative in alternatives.into_iter().rev() {
            match alternative.kind() {
                "else_clause" => {
                    orelse = self.block(self.field(alternative, "body")?)?;
                }
                "elif_clause" => {
                    let end_line = orelse
                        .last()
                        .map(|s| s.end_line)
                        .unwrap_or_else(|| end_line_of(alternative));
                    let nested = Stmt {
                        line: line_of(alternative),
                        end_line: end_line.max(end_line_of(alternative)),
                        kind: StmtKind::If {
                            test: self.expression(self.field(alternative, "condition")?)?,
                            body: self.block(self.field(alternative, "consequence")?)?,
                            orelse: std::mem::take(&mut orelse),
                        },
                    };
                    orelse = vec![nested];
                }
                other => return Err(ParseError::unsupported(other, line_of(alternative))),
            }
        }

        Ok(Stmt {
            line: line_of(node),
            end_line: end_line_of(node),
            kind: StmtKind::If { test, body, orelse },
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════════

    fn expression(&self, node: Node) -> Result<Expr, ParseError> {
        let line = line_of(node);

        match node.kind() {
            "identifier" => Ok(Expr::Name(self.text(node).to_string())),
            "integer" => self.integer(node),
            "float" => self.float(node),
            "true" => Ok(Expr::Bool(true)),
            "false" => Ok(Expr::Bool(false)),
            "none" => Ok(Expr::None),

            // Parenthesized expression - transparently visit the inner expression
            "parenthesized_expression" => match self.named_children(node).first() {
                Some(inner) => self.expression(*inner),
                None => Err(ParseError::unsupported("empty parentheses", line)),
            },

            "unary_operator" => {
                let operator = self.text(self.field(node, "operator")?);
                let op = match operator {
                    "-" => UnaryOp::Neg,
                    "+" => UnaryOp::Pos,
                    other => {
                        return Err(ParseError::unsupported(format!("operator {}", other), line))
                    }
                };
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(self.expression(self.field(node, "argument")?)?),
                })
            }

            "not_operator" => Ok(Expr::not(
                self.expression(self.field(node, "argument")?)?,
            )),

            "binary_operator" => {
                let operator = self.text(self.field(node, "operator")?);
                let op = BinOp::from_symbol(operator).ok_or_else(|| {
                    ParseError::unsupported(format!("operator {}", operator), line)
                })?;
                Ok(Expr::binary(
                    op,
                    self.expression(self.field(node, "left")?)?,
                    self.expression(self.field(node, "right")?)?,
                ))
            }

            "boolean_operator" => {
                let op = match self.text(self.field(node, "operator")?) {
                    "and" => BoolOp::And,
                    _ => BoolOp::Or,
                };
                let mut values = Vec::new();
                for side in ["left", "right"] {
                    match self.expression(self.field(node, side)?)? {
                        // a and b and c arrives left-nested; keep it flat
                        Expr::BoolOp {
                            op: inner,
                            values: nested,
                        } if inner == op => values.extend(nested),
                        other => values.push(other),
                    }
                }
                Ok(Expr::BoolOp { op, values })
            }

            "comparison_operator" => {
                let operands = self.named_children(node);
                let operators: Vec<Node> = node
                    .children_by_field_name("operators", &mut node.walk())
                    .collect();
                if operands.len() < 2 || operators.len() != operands.len() - 1 {
                    return Err(ParseError::unsupported("comparison form", line));
                }

                let left = self.expression(operands[0])?;
                let mut comparisons = Vec::with_capacity(operators.len());
                for (op_node, operand) in operators.iter().zip(operands.iter().skip(1)) {
                    let symbol = self.text(*op_node);
                    let op = CmpOp::from_symbol(symbol).ok_or_else(|| {
                        ParseError::unsupported(format!("comparison {}", symbol), line)
                    })?;
                    comparisons.push((op, self.expression(*operand)?));
                }
                Ok(Expr::Compare {
                    left: Box::new(left),
                    comparisons,
                })
            }

            "call" => {
                let function = self.field(node, "function")?;
                let func = match function.kind() {
                    "identifier" | "attribute" => self.text(function).to_string(),
                    other => {
                        return Err(ParseError::unsupported(format!("call of {}", other), line))
                    }
                };
                let arguments = self.field(node, "arguments")?;
                if arguments.kind() != "argument_list" {
                    return Err(ParseError::unsupported(arguments.kind(), line));
                }
                let mut args = Vec::new();
                for arg in self.named_children(arguments) {
                    match arg.kind() {
                        "keyword_argument" | "list_splat" | "dictionary_splat" => {
                            return Err(ParseError::unsupported(arg.kind(), line_of(arg)))
                        }
                        _ => args.push(self.expression(arg)?),
                    }
                }
                Ok(Expr::Call { func, args })
            }

            "subscript" => Ok(Expr::Subscript {
                value: Box::new(self.expression(self.field(node, "value")?)?),
                index: Box::new(self.subscript_index(node)?),
            }),

            "list" => Ok(Expr::List(
                self.named_children(node)
                    .into_iter()
                    .map(|item| self.expression(item))
                    .collect::<Result<_, _>>()?,
            )),

            "conditional_expression" => {
                let parts = self.named_children(node);
                if parts.len() != 3 {
                    return Err(ParseError::unsupported("conditional expression", line));
                }
                Ok(Expr::IfExp {
                    body: Box::new(self.expression(parts[0])?),
                    test: Box::new(self.expression(parts[1])?),
                    orelse: Box::new(self.expression(parts[2])?),
                })
            }

            other => Err(ParseError::unsupported(other, line)),
        }
    }

    fn subscript_index(&self, node: Node) -> Result<Expr, ParseError> {
        let indices: Vec<Node> = node
            .children_by_field_name("subscript", &mut node.walk())
            .collect();
        match indices.as_slice() {
            [index] if index.kind() != "slice" => self.expression(*index),
            _ => Err(ParseError::unsupported("slice or tuple index", line_of(node))),
        }
    }

    fn integer(&self, node: Node) -> Result<Expr, ParseError> {
        let raw = self.text(node);
        let digits = raw.replace('_', "");
        let lowered = digits.to_ascii_lowercase();

        let parsed = if let Some(hex) = lowered.strip_prefix("0x") {
            i64::from_str_radix(hex, 16)
        } else if let Some(oct) = lowered.strip_prefix("0o") {
            i64::from_str_radix(oct, 8)
        } else if let Some(bin) = lowered.strip_prefix("0b") {
            i64::from_str_radix(bin, 2)
        } else {
            lowered.parse::<i64>()
        };

        parsed.map(Expr::Int).map_err(|_| ParseError::Literal {
            text: raw.to_string(),
            line: line_of(node),
        })
    }

    fn float(&self, node: Node) -> Result<Expr, ParseError> {
        let raw = self.text(node);
        if raw.ends_with('j') || raw.ends_with('J') {
            return Err(ParseError::unsupported("complex literal", line_of(node)));
        }
        raw.replace('_', "")
            .parse::<f64>()
            .map(Expr::Float)
            .map_err(|_| ParseError::Literal {
                text: raw.to_string(),
                line: line_of(node),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Module {
        PythonFrontend::new().unwrap().parse_module(source).unwrap()
    }

    #[test]
    fn test_function_signature_and_lines() {
        let module = parse("import math\n\ndef f(int_a, real_b=1.0):\n    return int_a\n");
        let func = module.first_function().unwrap();

        assert_eq!(func.name, "f");
        assert_eq!(func.params, vec!["int_a".to_string(), "real_b".to_string()]);
        assert_eq!(func.line, 3);
        assert_eq!(func.body[0].line, 4);
    }

    #[test]
    fn test_elif_chain_nests_in_orelse() {
        let source = "\
def f(x):
    if x < 0:
        return -1
    elif x == 0:
        return 0
    else:
        return 1
";
        let module = parse(source);
        let stmt = &module.functions[0].body[0];
        let StmtKind::If { orelse, .. } = &stmt.kind else {
            panic!("expected if");
        };
        assert_eq!(orelse.len(), 1);
        assert_eq!(orelse[0].line, 4);
        let StmtKind::If { orelse: inner, .. } = &orelse[0].kind else {
            panic!("expected nested if");
        };
        assert_eq!(inner[0].line, 7);
    }

    #[test]
    fn test_augmented_assignment_and_chained_compare() {
        let source = "def f(x):\n    x += 2\n    return 0 < x <= 10\n";
        let module = parse(source);
        let body = &module.functions[0].body;

        assert!(matches!(
            &body[0].kind,
            StmtKind::AugAssign { op: BinOp::Add, .. }
        ));
        let StmtKind::Return(Some(expr)) = &body[1].kind else {
            panic!("expected return");
        };
        assert_eq!(expr.to_string(), "0 < x <= 10");
    }

    #[test]
    fn test_boolean_chain_is_flat() {
        let module = parse("def f(a, b, c):\n    return a and b and c\n");
        let StmtKind::Return(Some(Expr::BoolOp { values, .. })) = &module.functions[0].body[0].kind
        else {
            panic!("expected bool op");
        };
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_unsupported_construct_reports_line() {
        let err = PythonFrontend::new()
            .unwrap()
            .parse_module("def f(x):\n    y = 'text'\n")
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::Unsupported {
                kind: "string".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn test_syntax_error() {
        let err = PythonFrontend::new()
            .unwrap()
            .parse_module("def f(x):\n    if x <:\n        pass\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_module_level_constants() {
        let source = "\
\"\"\"Subject docstring\"\"\"
import math

LIMIT = 100
LIMIT += 5
print(LIMIT)

def f(int_x):
    return int_x > LIMIT

if __name__ == '__main__':
    f(1)
";
        let module = parse(source);
        let names: Vec<(&str, Line)> = module
            .globals
            .iter()
            .map(|g| (g.name.as_str(), g.line))
            .collect();
        assert_eq!(names, vec![("LIMIT", 4), ("LIMIT", 5)]);
        assert_eq!(module.globals[1].value.to_string(), "LIMIT + 5");
        assert_eq!(module.functions.len(), 1);
    }

    #[test]
    fn test_module_level_item_assignment_is_rejected() {
        let err = PythonFrontend::new()
            .unwrap()
            .parse_module("TABLE = [1, 2]\nTABLE[0] = 3\n\ndef f(x):\n    return x\n")
            .unwrap_err();
        assert_eq!(err, ParseError::unsupported("module-level item assignment", 2));
    }

    #[test]
    fn test_integer_literal_forms() {
        let module = parse("def f():\n    return 0x10 + 1_000\n");
        let StmtKind::Return(Some(expr)) = &module.functions[0].body[0].kind else {
            panic!("expected return");
        };
        assert_eq!(expr, &Expr::binary(BinOp::Add, Expr::Int(16), Expr::Int(1000)));
    }
}
