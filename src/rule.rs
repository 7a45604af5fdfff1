//! Rule file loading: the YAML envelope around a behavior pattern, and a
//! recursive directory walker in the teacher's `walkdir` style (a few lines
//! of `std::fs::read_dir` recursion, not worth a crate).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::behavior::Behavior;
use crate::error::RikaiError;
use crate::parser::Parser;

/// The on-disk envelope: `name`, `meta`, optional `definitions`, `pattern`.
#[derive(Debug, Clone, Deserialize)]
struct RuleFile {
    name: String,
    #[serde(default)]
    meta: HashMap<String, String>,
    #[serde(default)]
    definitions: HashMap<String, i64>,
    pattern: Option<String>,
}

/// A loaded, parsed rule ready to match against a database.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub meta: HashMap<String, String>,
    pub pattern: Behavior,
    /// The rule's source text, kept verbatim for reporting.
    pub source: String,
}

impl Rule {
    pub fn from_yaml(text: &str) -> Result<Self, RikaiError> {
        let file: RuleFile = serde_yaml::from_str(text)?;
        let pattern_text = file
            .pattern
            .ok_or_else(|| RikaiError::MalformedRule("missing required field 'pattern'".into()))?;
        let pattern = Parser::parse(&pattern_text, &file.definitions)?;
        Ok(Rule {
            name: file.name,
            meta: file.meta,
            pattern,
            source: pattern_text,
        })
    }
}

/// Recursively enumerates `*.yaml`/`*.yml` files under `dir` and parses each
/// into a `Rule`. A parse failure aborts only that one rule file; the caller
/// decides whether to treat that as fatal or to continue with the rest.
pub struct RuleLoader;

impl RuleLoader {
    pub fn load_dir(dir: &Path) -> Vec<(PathBuf, Result<Rule, RikaiError>)> {
        let mut results = Vec::new();
        for path in walkdir(dir) {
            let is_rule_file = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            );
            if !is_rule_file {
                continue;
            }
            debug!(path = %path.display(), "loading rule file");
            let outcome = std::fs::read_to_string(&path)
                .map_err(|e| RikaiError::MalformedRule(e.to_string()))
                .and_then(|text| Rule::from_yaml(&text));
            if let Err(e) = &outcome {
                warn!(path = %path.display(), error = %e, "failed to load rule");
            }
            results.push((path, outcome));
        }
        results
    }
}

fn walkdir(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    files.extend(walkdir(&path));
                } else {
                    files.push(path);
                }
            }
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not read rule directory");
        }
    }
    files
}
