//! Orchestration: ingest a source file once, open its database, run every
//! configured rule against it, and yield only the rules that matched.
//!
//! Mirrors the original `SynchronousFrontend.analyze`: preprocess, open,
//! iterate rules, match, yield non-empty results.

use std::path::Path;

use tracing::{info, warn};

use crate::config::RikaiConfig;
use crate::error::RikaiError;
use crate::external::{DatabaseManager, Ingest};
use crate::matcher::{MatchRow, PatternMatcher};
use crate::rule::{Rule, RuleLoader};

/// One rule paired with the rows it matched.
pub struct Match {
    pub rule: Rule,
    pub rows: Vec<MatchRow>,
}

/// Ingests `source`, opens the resulting database, and matches every rule
/// found under `config.rules.path`. Rules that fail to parse are logged and
/// skipped rather than aborting the whole run.
pub fn analyze(
    config: &RikaiConfig,
    ingest: &dyn Ingest,
    manager: &dyn DatabaseManager,
    source: &Path,
) -> Result<Vec<Match>, RikaiError> {
    let timeout = std::time::Duration::from_secs(config.rikai.ingest_timeout_secs);
    let database_id = ingest.ingest(source, timeout)?;
    info!(database = %database_id, source = %source.display(), "ingested source");

    let db = manager.open(&database_id)?;
    let matcher = PatternMatcher::new(db.as_ref());

    let mut matches = Vec::new();
    for (path, outcome) in RuleLoader::load_dir(&config.rules.path) {
        let rule = match outcome {
            Ok(rule) => rule,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unparsable rule");
                continue;
            }
        };
        let rows = matcher.match_behavior(&rule.pattern)?;
        if !rows.is_empty() {
            info!(rule = %rule.name, matches = rows.len(), "rule matched");
            matches.push(Match { rule, rows });
        }
    }
    Ok(matches)
}
