//! rikai: a constraint-matching engine for detecting C API misuse patterns.
//!
//! Source is ingested by an external front-end into a graph database of
//! `Call` nodes and their parameter edges; rules, written in a small
//! pattern language, expand into one or more constraint queries and are
//! matched against that graph.

pub mod behavior;
pub mod block;
pub mod config;
pub mod error;
pub mod external;
pub mod frontend;
pub mod matcher;
pub mod operand;
pub mod parser;
pub mod query;
pub mod report;
pub mod rule;
pub mod statement;

pub use behavior::Behavior;
pub use block::Block;
pub use config::RikaiConfig;
pub use error::RikaiError;
pub use operand::Operand;
pub use parser::Parser;
pub use rule::Rule;
pub use statement::Statement;
