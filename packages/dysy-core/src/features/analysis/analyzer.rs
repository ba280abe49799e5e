//! Program Analyzer - static extraction of branch and assignment sites

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use super::domain::{
    AnalysisError, AssignmentSite, BranchKind, BranchSite, FunctionSignature, ProgramAnalysis,
};
use crate::errors::Result;
use crate::features::interpreter::module_globals;
use crate::features::parsing::{AssignTarget, Expr, PythonFrontend, Stmt, StmtKind};
use crate::shared::models::Line;

pub struct ProgramAnalyzer {
    frontend: PythonFrontend,
}

impl ProgramAnalyzer {
    pub fn new() -> std::result::Result<Self, AnalysisError> {
        Ok(Self {
            frontend: PythonFrontend::new()?,
        })
    }

    /// Analyze subject source; the first function definition is the target
    pub fn analyze(&mut self, source: &str) -> std::result::Result<ProgramAnalysis, AnalysisError> {
        let module = self.frontend.parse_module(source)?;
        let target = module.first_function().ok_or(AnalysisError::NoFunction)?;
        let globals = module_globals(&module).map_err(AnalysisError::ModuleInit)?;

        let signature = FunctionSignature::from_def(target);
        let mut collector = SiteCollector::default();
        collector.visit_block(&target.body);

        debug!(
            function = %signature.name,
            params = signature.params.len(),
            globals = globals.len(),
            branches = collector.branches.len(),
            assignments = collector.assignments.len(),
            "Analyzed subject"
        );

        let SiteCollector {
            branches,
            assignments,
        } = collector;

        Ok(ProgramAnalysis {
            signature,
            branches,
            assignments,
            module,
            globals,
        })
    }

    pub fn analyze_file(&mut self, path: impl AsRef<Path>) -> Result<ProgramAnalysis> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Ok(self.analyze(&source)?)
    }
}

#[derive(Default)]
struct SiteCollector {
    branches: BTreeMap<Line, BranchSite>,
    assignments: BTreeMap<Line, AssignmentSite>,
}

impl SiteCollector {
    fn visit_block(&mut self, block: &[Stmt]) {
        for stmt in block {
            self.visit(stmt);
        }
    }

    fn visit(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                self.record_assignment(stmt.line, target.clone(), value.clone());
            }
            StmtKind::AugAssign { target, op, value } => {
                let rhs = Expr::binary(*op, target.as_expr(), value.clone());
                self.record_assignment(stmt.line, target.clone(), rhs);
            }
            StmtKind::If { test, body, orelse } => {
                let continuation_line = match orelse.first() {
                    Some(first) => first.line,
                    None => block_end(body, stmt.end_line) + 1,
                };
                self.record_branch(stmt.line, BranchKind::If, test, continuation_line);
                self.visit_block(body);
                self.visit_block(orelse);
            }
            StmtKind::While { test, body } => {
                let continuation_line = block_end(body, stmt.end_line) + 1;
                self.record_branch(stmt.line, BranchKind::While, test, continuation_line);
                self.visit_block(body);
            }
            StmtKind::For { body, .. } => self.visit_block(body),
            StmtKind::Expr(_)
            | StmtKind::Return(_)
            | StmtKind::Raise(_)
            | StmtKind::Pass
            | StmtKind::Break
            | StmtKind::Continue => {}
        }
    }

    fn record_assignment(&mut self, line: Line, target: AssignTarget, rhs: Expr) {
        self.assignments.insert(
            line,
            AssignmentSite {
                line,
                rhs_text: rhs.to_string(),
                target,
                rhs,
            },
        );
    }

    fn record_branch(
        &mut self,
        line: Line,
        kind: BranchKind,
        predicate: &Expr,
        continuation_line: Line,
    ) {
        self.branches.insert(
            line,
            BranchSite {
                line,
                kind,
                predicate: predicate.clone(),
                predicate_text: predicate.to_string(),
                continuation_line,
            },
        );
    }
}

fn block_end(block: &[Stmt], fallback: Line) -> Line {
    block.last().map(|s| s.end_line).unwrap_or(fallback)
}
