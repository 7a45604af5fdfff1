//! Call, reference, and assignment statements, and the variable sets they
//! define and depend on.

use std::collections::BTreeSet;
use std::fmt;

use crate::block::Structure;
use crate::operand::Operand;

/// An API-function invocation by label with positional operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    pub label: String,
    pub parameters: Vec<Operand>,
    pub library: Option<String>,
}

impl Call {
    pub fn new(label: impl Into<String>, parameters: Vec<Operand>) -> Self {
        Call {
            label: label.into(),
            parameters,
            library: None,
        }
    }

    pub fn dependencies(&self) -> BTreeSet<Operand> {
        self.parameters.iter().fold(BTreeSet::new(), |mut acc, p| {
            acc.extend(p.variables());
            acc
        })
    }

    pub fn literals(&self) -> BTreeSet<Operand> {
        self.parameters.iter().fold(BTreeSet::new(), |mut acc, p| {
            acc.extend(p.literals());
            acc
        })
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .parameters
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match &self.library {
            Some(library) => write!(f, "{library}.{}({params})", self.label),
            None => write!(f, "{}({params})", self.label),
        }
    }
}

/// A single statement in a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    Call(Call),
    /// A bare literal that must occur somewhere in the analyzed program.
    Reference(Operand),
    LiteralAssignment { assignee: String, value: Operand },
    CallAssignment { assignee: String, value: Call },
    /// A nested branch or loop; its own body is opaque to the parent
    /// block's `definitions`/`assignments` views but contributes to
    /// `variables`/`literals`/`calls` (see `Block::calls`).
    Structure(Structure),
}

impl Statement {
    /// Variables defined (bound) by this statement.
    pub fn defines(&self) -> BTreeSet<Operand> {
        match self {
            Statement::LiteralAssignment { assignee, .. }
            | Statement::CallAssignment { assignee, .. } => {
                BTreeSet::from([Operand::Variable(assignee.clone())])
            }
            Statement::Call(_) | Statement::Reference(_) | Statement::Structure(_) => {
                BTreeSet::new()
            }
        }
    }

    /// Variables this statement depends on (must already be defined).
    ///
    /// For a `Structure` this is an approximation: the condition's
    /// variables plus everything its body depends on, regardless of
    /// whether the body defines some of those itself. Good enough for the
    /// "who reads this variable" lookups `Block::get_dependencies` needs;
    /// the constraint generator wires the condition's own operands
    /// directly rather than going through this method.
    pub fn dependencies(&self) -> BTreeSet<Operand> {
        match self {
            Statement::Call(call) => call.dependencies(),
            Statement::CallAssignment { value, .. } => value.dependencies(),
            Statement::Reference(_) | Statement::LiteralAssignment { .. } => BTreeSet::new(),
            Statement::Structure(structure) => {
                let mut deps = structure.condition.variables();
                for statement in &structure.block.statements {
                    deps.extend(statement.dependencies());
                }
                deps
            }
        }
    }

    /// Union of variables defined and depended on by this statement.
    pub fn variables(&self) -> BTreeSet<Operand> {
        match self {
            Statement::Structure(structure) => structure.variables(),
            _ => {
                let mut vars = self.defines();
                vars.extend(self.dependencies());
                vars
            }
        }
    }

    pub fn literals(&self) -> BTreeSet<Operand> {
        match self {
            Statement::Call(call) => call.literals(),
            Statement::Reference(literal) => BTreeSet::from([literal.clone()]),
            Statement::LiteralAssignment { value, .. } => value.literals(),
            Statement::CallAssignment { value, .. } => value.literals(),
            Statement::Structure(structure) => structure.literals(),
        }
    }

    /// The `Call` this statement directly carries, if any — unwraps
    /// `CallAssignment` the same way a `Block`'s `calls` view does.
    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Statement::Call(call) => Some(call),
            Statement::CallAssignment { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Call(call) => write!(f, "{call}"),
            Statement::Reference(literal) => write!(f, "{literal}"),
            Statement::LiteralAssignment { assignee, value } => {
                write!(f, "{assignee} = {value}")
            }
            Statement::CallAssignment { assignee, value } => {
                write!(f, "{assignee} = {value}")
            }
            Statement::Structure(structure) => write!(f, "{structure}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_dependencies_ignore_unbound() {
        let call = Call::new(
            "foo",
            vec![
                Operand::UnboundVariable,
                Operand::Variable("x".into()),
                Operand::IntegerLiteral(1),
            ],
        );
        assert_eq!(call.dependencies(), BTreeSet::from([Operand::Variable("x".into())]));
        assert_eq!(call.literals(), BTreeSet::from([Operand::IntegerLiteral(1)]));
    }

    #[test]
    fn call_assignment_defines_and_depends() {
        let stmt = Statement::CallAssignment {
            assignee: "x".into(),
            value: Call::new("HttpOpenRequestA", vec![Operand::UnboundVariable; 7]),
        };
        assert_eq!(stmt.defines(), BTreeSet::from([Operand::Variable("x".into())]));
        assert!(stmt.dependencies().is_empty());
    }

    #[test]
    fn display_matches_grammar() {
        let call = Call::new("foo", vec![Operand::StringLiteral("bar".into())]);
        assert_eq!(call.to_string(), "foo(\"bar\")");
        let stmt = Statement::CallAssignment {
            assignee: "x".into(),
            value: call,
        };
        assert_eq!(stmt.to_string(), "x = foo(\"bar\")");
    }
}
