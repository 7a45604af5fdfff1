//! Blocks of statements, and the branch/loop control-flow structures that
//! wrap a nested block in a condition.

use std::collections::BTreeMap;
use std::fmt;

use crate::operand::Operand;
use crate::statement::{Call, Statement};

/// An ordered sequence of statements.
///
/// Derived views (`calls`, `variables`, `literals`, …) are pure functions of
/// the statement sequence; nothing here is memoised, matching the
/// reference implementation's plain recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Block { statements }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// All `Call` nodes, unwrapping `CallAssignment` and recursing into the
    /// bodies of any nested branch/loop statements — every call that could
    /// produce a matched line belongs in the constraint generator's `get`
    /// list, regardless of how deep it is nested in control flow.
    pub fn calls(&self) -> Vec<&Call> {
        let mut out = Vec::new();
        for statement in &self.statements {
            match statement {
                Statement::Call(call) => out.push(call),
                Statement::CallAssignment { value, .. } => out.push(value),
                Statement::Structure(structure) => out.extend(structure.block.calls()),
                Statement::Reference(_) | Statement::LiteralAssignment { .. } => {}
            }
        }
        out
    }

    /// Bare literal references directly in this block (not recursing into
    /// nested structures — a reference inside a branch is a statement of
    /// that branch's own body).
    pub fn references(&self) -> impl Iterator<Item = &Operand> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Reference(literal) => Some(literal),
            _ => None,
        })
    }

    pub fn labels(&self) -> std::collections::BTreeSet<String> {
        self.calls().into_iter().map(|c| c.label.clone()).collect()
    }

    /// All variables utilized, recursing into nested structures (their
    /// condition and body both contribute).
    pub fn variables(&self) -> std::collections::BTreeSet<Operand> {
        self.statements.iter().fold(Default::default(), |mut acc, s| {
            acc.extend(s.variables());
            acc
        })
    }

    pub fn literals(&self) -> std::collections::BTreeSet<Operand> {
        self.statements.iter().fold(Default::default(), |mut acc, s| {
            acc.extend(s.literals());
            acc
        })
    }

    /// Direct assignment statements in this block (not recursing into
    /// nested structures — their assignments are local to that structure).
    pub fn assignments(&self) -> Vec<&Statement> {
        self.statements
            .iter()
            .filter(|s| {
                matches!(
                    s,
                    Statement::LiteralAssignment { .. } | Statement::CallAssignment { .. }
                )
            })
            .collect()
    }

    /// Maps each assignee to the statement that defines it. On a duplicate
    /// assignee the first declaration wins; later ones are kept in
    /// `statements` but dropped from this table (§4.3, §9).
    pub fn definitions(&self) -> BTreeMap<String, &Statement> {
        let mut defs = BTreeMap::new();
        for statement in self.assignments() {
            let assignee = match statement {
                Statement::LiteralAssignment { assignee, .. }
                | Statement::CallAssignment { assignee, .. } => assignee,
                _ => unreachable!("assignments() only yields assignment statements"),
            };
            defs.entry(assignee.clone()).or_insert(statement);
        }
        defs
    }

    pub fn get_definition(&self, variable: &str) -> Option<&Statement> {
        self.definitions().get(variable).copied()
    }

    /// Direct statements depending on the given variable.
    pub fn get_dependencies(&self, variable: &str) -> Vec<&Statement> {
        self.statements
            .iter()
            .filter(|s| s.dependencies().contains(&Operand::Variable(variable.to_string())))
            .collect()
    }

    pub fn get_statements(&self, label: &str) -> Vec<&Call> {
        self.calls().into_iter().filter(|c| c.label == label).collect()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.statements
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        )
    }
}

impl std::ops::Add for Block {
    type Output = Block;

    fn add(self, other: Block) -> Block {
        let mut statements = self.statements;
        statements.extend(other.statements);
        Block::new(statements)
    }
}

/// Whether a `Structure` renders as `if (...)` or `while (...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    Branch,
    Loop,
}

/// A branch or loop: a nested block guarded by a condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Structure {
    pub kind: StructureKind,
    /// The guarding test; a single operand or a `Condition` of several.
    pub condition: Operand,
    pub block: Block,
}

impl Structure {
    pub fn new(kind: StructureKind, condition: Operand, block: Block) -> Self {
        Structure {
            kind,
            condition,
            block,
        }
    }

    pub fn variables(&self) -> std::collections::BTreeSet<Operand> {
        let mut vars = self.block.variables();
        vars.extend(self.condition.variables());
        vars
    }

    pub fn literals(&self) -> std::collections::BTreeSet<Operand> {
        let mut lits = self.block.literals();
        lits.extend(self.condition.literals());
        lits
    }

    /// All operands (literals and variables) the condition tests — the set
    /// that gets wired to every body statement via a `Conditional` edge.
    pub fn condition_operands(&self) -> Vec<Operand> {
        match &self.condition {
            Operand::Condition(operands) => operands.clone(),
            other => vec![other.clone()],
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.kind {
            StructureKind::Branch => "if",
            StructureKind::Loop => "while",
        };
        writeln!(f, "{keyword} ({}) {{", self.condition)?;
        for statement in &self.block.statements {
            writeln!(f, "\t{statement}")?;
        }
        write!(f, "}}")
    }
}
