//! Leaf AST types: literals, variables, and the compound/condition operators
//! that merge or test them.
//!
//! All nodes here are immutable value objects with structural equality and
//! hashing; construction from raw text is the only validation point (see
//! [`parse_integer`]).

use std::collections::BTreeSet;
use std::fmt;

use crate::error::RikaiError;

/// A single operand: a literal, a variable, the wildcard, or a compound
/// merge/condition over further operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operand {
    StringLiteral(String),
    IntegerLiteral(i64),
    /// A named enum value; renders as `name` but carries the resolved
    /// integer so later passes never need the enum definitions again.
    EnumValue { name: String, value: i64 },
    Variable(String),
    UnboundVariable,
    /// `a + b + …` — a value-merge.
    Compound(Vec<Operand>),
    /// `a | b | …` — a branch/loop test.
    Condition(Vec<Operand>),
}

pub const UNBOUND_SYMBOL: &str = "_";

impl Operand {
    /// True for any literal-bearing variant (string, integer, enum).
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Operand::StringLiteral(_) | Operand::IntegerLiteral(_) | Operand::EnumValue { .. }
        )
    }

    pub fn is_unbound(&self) -> bool {
        matches!(self, Operand::UnboundVariable)
    }

    /// Transitively reachable `Variable` nodes.
    pub fn variables(&self) -> BTreeSet<Operand> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<Operand>) {
        match self {
            Operand::Variable(_) => {
                out.insert(self.clone());
            }
            Operand::Compound(operands) | Operand::Condition(operands) => {
                for operand in operands {
                    operand.collect_variables(out);
                }
            }
            _ => {}
        }
    }

    /// Transitively reachable literal nodes (string, integer, enum).
    pub fn literals(&self) -> BTreeSet<Operand> {
        let mut out = BTreeSet::new();
        self.collect_literals(&mut out);
        out
    }

    fn collect_literals(&self, out: &mut BTreeSet<Operand>) {
        match self {
            Operand::StringLiteral(_) | Operand::IntegerLiteral(_) | Operand::EnumValue { .. } => {
                out.insert(self.clone());
            }
            Operand::Compound(operands) | Operand::Condition(operands) => {
                for operand in operands {
                    operand.collect_literals(out);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::StringLiteral(value) => write!(f, "\"{value}\""),
            Operand::IntegerLiteral(value) => write!(f, "{}", format_hex(*value)),
            Operand::EnumValue { name, .. } => write!(f, "{name}"),
            Operand::Variable(name) => write!(f, "{name}"),
            Operand::UnboundVariable => write!(f, "{UNBOUND_SYMBOL}"),
            Operand::Compound(operands) => write!(f, "{}", join(operands, " + ")),
            Operand::Condition(operands) => write!(f, "{}", join(operands, " | ")),
        }
    }
}

fn join(operands: &[Operand], sep: &str) -> String {
    operands
        .iter()
        .map(|op| op.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn format_hex(value: i64) -> String {
    if value < 0 {
        format!("-0x{:x}", value.unsigned_abs())
    } else {
        format!("0x{value:x}")
    }
}

/// Parse a signed integer literal from rule-language text.
///
/// Accepts an optional leading `+`/`-`, then either a `0x`/`0X`-prefixed
/// hex literal (case-insensitive digits) or a plain decimal literal. Radix
/// ambiguity always resolves in favor of an explicit `0x`/`0X` prefix.
pub fn parse_integer(text: &str) -> Result<i64, RikaiError> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
            .map_err(|_| RikaiError::MalformedLiteral(text.to_string()))?
    } else {
        rest.parse::<i64>()
            .map_err(|_| RikaiError::MalformedLiteral(text.to_string()))?
    };

    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_parsing_matches_scenario_six() {
        assert_eq!(parse_integer("0x50").unwrap(), 0x50);
        assert_eq!(parse_integer("1337").unwrap(), 1337);
        assert_eq!(parse_integer("-8").unwrap(), -8);
        assert_eq!(parse_integer("+50").unwrap(), 50);
        assert_eq!(parse_integer("0xFF").unwrap(), 0xFF);
        assert_eq!(parse_integer("0xfF").unwrap(), 0xFF);
    }

    #[test]
    fn integer_parsing_rejects_garbage() {
        assert!(parse_integer("0xZZ").is_err());
        assert!(parse_integer("not-a-number").is_err());
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(Operand::StringLiteral("bar".into()).to_string(), "\"bar\"");
        assert_eq!(Operand::IntegerLiteral(80).to_string(), "0x50");
        assert_eq!(Operand::IntegerLiteral(-8).to_string(), "-0x8");
        assert_eq!(
            Operand::EnumValue {
                name: "FLAG_A".into(),
                value: 1
            }
            .to_string(),
            "FLAG_A"
        );
        assert_eq!(Operand::Variable("x".into()).to_string(), "x");
        assert_eq!(Operand::UnboundVariable.to_string(), "_");
        assert_eq!(
            Operand::Compound(vec![Operand::IntegerLiteral(1), Operand::IntegerLiteral(2)])
                .to_string(),
            "0x1 + 0x2"
        );
        assert_eq!(
            Operand::Condition(vec![Operand::Variable("a".into()), Operand::Variable("b".into())])
                .to_string(),
            "a | b"
        );
    }

    #[test]
    fn variables_and_literals_are_transitive() {
        let compound = Operand::Compound(vec![
            Operand::Variable("a".into()),
            Operand::IntegerLiteral(1),
            Operand::Variable("b".into()),
        ]);
        assert_eq!(compound.variables().len(), 2);
        assert_eq!(compound.literals().len(), 1);
    }

    #[test]
    fn unbound_never_constrains() {
        assert!(Operand::UnboundVariable.variables().is_empty());
        assert!(Operand::UnboundVariable.literals().is_empty());
        assert!(Operand::UnboundVariable.is_unbound());
    }
}
