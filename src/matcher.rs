//! Tries each expansion of a behavior against a database, stopping at the
//! first one that matches.

use crate::behavior::Behavior;
use crate::error::RikaiError;
use crate::external::Database;
use crate::query::QueryGenerator;

/// One row of a match: the `Line` attribute of each `get`-clause variable,
/// in the order `QueryGenerator` emitted them.
pub type MatchRow = Vec<i64>;

pub struct PatternMatcher<'a, D: Database + ?Sized> {
    db: &'a D,
}

impl<'a, D: Database + ?Sized> PatternMatcher<'a, D> {
    pub fn new(db: &'a D) -> Self {
        PatternMatcher { db }
    }

    /// Tries every expansion of `behavior` in order, returning the rows of
    /// the first expansion with a non-empty result. `Ok(vec![])` if no
    /// expansion matches anything.
    pub fn match_behavior(&self, behavior: &Behavior) -> Result<Vec<MatchRow>, RikaiError> {
        for block in behavior.expand() {
            let generated = QueryGenerator::generate(&block);
            let rows = self.db.query(&generated.text)?;
            if !rows.is_empty() {
                return rows
                    .into_iter()
                    .map(|mut row| {
                        generated
                            .get_order
                            .iter()
                            .map(|name| {
                                row.remove(name).ok_or_else(|| {
                                    RikaiError::QueryExecutionError(format!(
                                        "result row missing expected variable '{name}'"
                                    ))
                                })
                            })
                            .collect()
                    })
                    .collect();
            }
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::testing::MockDatabase;
    use crate::operand::Operand;
    use crate::statement::{Call, Statement};
    use std::collections::HashMap;

    #[test]
    fn returns_empty_when_no_expansion_matches() {
        let db = MockDatabase::empty();
        let behavior = Behavior::new(
            vec![crate::block::Block::new(vec![Statement::Call(Call::new("foo", vec![]))])],
            vec![],
        );
        let matcher = PatternMatcher::new(&db);
        let result = matcher.match_behavior(&behavior).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn returns_first_matching_expansion() {
        let mut row = HashMap::new();
        row.insert("ln0".to_string(), 42i64);
        let db = MockDatabase::with_fixed_result(vec![row]);
        let behavior = Behavior::new(
            vec![crate::block::Block::new(vec![Statement::Call(Call::new("foo", vec![]))])],
            vec![],
        );
        let matcher = PatternMatcher::new(&db);
        let result = matcher.match_behavior(&behavior).unwrap();
        assert_eq!(result, vec![vec![42]]);
    }

    /// Scenario 4's two-call shape: the generated `get` list is `ln0, ln2`
    /// (first call, then second, the assignment's literal sitting between
    /// them in id order). The fixed row's values are deliberately not in
    /// ascending order, so a value-sort (the bug this guards against) would
    /// silently swap which line number belongs to which call.
    #[test]
    fn stops_at_first_nonempty_disjunction_case() {
        use indexmap::IndexMap;
        let mut row = HashMap::new();
        row.insert("ln0".to_string(), 99i64);
        row.insert("ln2".to_string(), 3i64);
        let db = MockDatabase::with_fixed_result(vec![row]);

        let mut possibilities = IndexMap::new();
        possibilities.insert(
            "a".to_string(),
            crate::block::Block::new(vec![Statement::LiteralAssignment {
                assignee: "x".into(),
                value: Operand::IntegerLiteral(1),
            }]),
        );
        possibilities.insert(
            "b".to_string(),
            crate::block::Block::new(vec![Statement::LiteralAssignment {
                assignee: "x".into(),
                value: Operand::IntegerLiteral(2),
            }]),
        );
        let disjunction = crate::behavior::Disjunction::new("\"m\"".into(), possibilities);
        let leading = crate::block::Block::new(vec![Statement::Call(Call::new("a", vec![]))]);
        let trailing = crate::block::Block::new(vec![Statement::Call(Call::new("b", vec![]))]);
        let behavior = Behavior::new(vec![leading, trailing], vec![disjunction]);
        let matcher = PatternMatcher::new(&db);
        let result = matcher.match_behavior(&behavior).unwrap();
        assert_eq!(result, vec![vec![99, 3]]);
    }
}
