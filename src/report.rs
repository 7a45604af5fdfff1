//! Renders matched rules as either a human-readable line per match or a
//! JSON array, mirroring the original `report_live`/`report_dict` split.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::RikaiError;
use crate::frontend::Match;

/// One rule's match result, shaped for JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    pub name: String,
    pub meta: HashMap<String, String>,
    pub pattern: String,
    pub matches: Vec<Vec<i64>>,
}

pub fn report_live(matches: &[Match]) -> Vec<String> {
    matches
        .iter()
        .map(|m| format!("{} matched at {:?}", m.rule.name, m.rows))
        .collect()
}

pub fn report_json(matches: &[Match]) -> Result<String, RikaiError> {
    let reports: Vec<RuleReport> = matches
        .iter()
        .map(|m| RuleReport {
            name: m.rule.name.clone(),
            meta: m.rule.meta.clone(),
            pattern: m.rule.source.clone(),
            matches: m.rows.clone(),
        })
        .collect();
    serde_json::to_string_pretty(&reports).map_err(|e| RikaiError::QueryExecutionError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use std::collections::HashMap as Map;

    fn sample_match() -> Match {
        Match {
            rule: Rule {
                name: "leak".into(),
                meta: Map::new(),
                pattern: crate::behavior::Behavior::default(),
                source: "foo()".into(),
            },
            rows: vec![vec![12, 15]],
        }
    }

    #[test]
    fn report_live_formats_one_line_per_match() {
        let lines = report_live(&[sample_match()]);
        assert_eq!(lines, vec!["leak matched at [[12, 15]]".to_string()]);
    }

    #[test]
    fn report_json_serializes_name_meta_matches() {
        let json = report_json(&[sample_match()]).unwrap();
        assert!(json.contains("\"name\": \"leak\""));
        assert!(json.contains("\"matches\""));
    }
}
