//! A `Behavior` is a base set of blocks plus zero or more disjunctions;
//! `expand` walks the cartesian product of disjunction cases to produce the
//! concrete blocks a matcher actually queries against.

use indexmap::IndexMap;

use crate::block::Block;

/// One `switch`/`case` site: a named slot with its ordered set of candidate
/// blocks. Insertion order is preserved (`IndexMap`) so expansion always
/// walks cases in declaration order, matching the grammar's textual order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disjunction {
    pub value: String,
    pub possibilities: IndexMap<String, Block>,
}

impl Disjunction {
    pub fn new(value: impl Into<String>, possibilities: IndexMap<String, Block>) -> Self {
        Disjunction {
            value: value.into(),
            possibilities,
        }
    }
}

/// A behavior pattern: the base blocks common to every match, plus the
/// disjunctions that fan out into concrete variants.
///
/// `blocks` holds the plain-statement segments in source order, interleaved
/// around the disjunctions: `blocks[0]`, `disjunctions[0]`'s chosen case,
/// `blocks[1]`, `disjunctions[1]`'s chosen case, … `blocks[n]`. A behavior
/// with `k` disjunctions has `k + 1` segments; a leading or trailing
/// disjunction (or two adjacent ones) simply has an empty segment between
/// them. This is how the parser reconstructs source order — `switch (...)
/// {...}` sitting between two plain statements must expand with its chosen
/// case in that same position, not appended after every plain statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Behavior {
    pub blocks: Vec<Block>,
    pub disjunctions: Vec<Disjunction>,
}

impl Behavior {
    pub fn new(blocks: Vec<Block>, disjunctions: Vec<Disjunction>) -> Self {
        Behavior { blocks, disjunctions }
    }

    /// Number of concrete blocks `expand` will yield: the product of each
    /// disjunction's case count, or 1 if there are none.
    pub fn cardinality(&self) -> usize {
        self.disjunctions.iter().map(|d| d.possibilities.len()).product()
    }

    /// All concrete blocks: the segments and one case chosen from each
    /// disjunction, interleaved in source order — every combination of
    /// cases, enumerated with the first disjunction varying slowest.
    ///
    /// A behavior with no disjunctions expands to exactly one block: all
    /// segments concatenated.
    pub fn expand(&self) -> Vec<Block> {
        if self.disjunctions.is_empty() {
            let merged = self
                .blocks
                .iter()
                .cloned()
                .fold(Block::default(), |acc, b| acc + b);
            return vec![merged];
        }

        let mut variants = vec![self.blocks.first().cloned().unwrap_or_default()];
        for (i, disjunction) in self.disjunctions.iter().enumerate() {
            let trailing = self.blocks.get(i + 1).cloned().unwrap_or_default();
            let mut next = Vec::with_capacity(variants.len() * disjunction.possibilities.len());
            for variant in &variants {
                for case in disjunction.possibilities.values() {
                    next.push(variant.clone() + case.clone() + trailing.clone());
                }
            }
            variants = next;
        }
        variants
    }
}
