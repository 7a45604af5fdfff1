//! Constraint generator: turns an expanded `Block` into the `match ... get
//! ...;` query text a `Database` is asked to run.
//!
//! Two identity policies, per §4.5/§9 of the node-identity design: a
//! `Variable`/`EnumValue` is addressed by its name everywhere it occurs (so
//! two uses of the same variable really do share one query variable); every
//! other node — a literal occurrence, a `Call`, a `Structure` — gets a
//! fresh counter-derived token the moment it is encountered, scoped to this
//! one `generate` call and never reused across occurrences.

use std::collections::HashSet;

use crate::block::{Block, Structure};
use crate::operand::Operand;
use crate::statement::{Call, Statement};

/// A generated query together with the bare (unprefixed) names of its
/// `get`-clause variables, in the order they were emitted — the order a
/// matcher must use to line a result row's values back up with the calls
/// that produced them (§4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuery {
    pub text: String,
    pub get_order: Vec<String>,
}

pub struct QueryGenerator;

impl QueryGenerator {
    /// Produce the query document for one expanded block.
    pub fn generate(block: &Block) -> GeneratedQuery {
        let mut ctx = GenContext::default();
        let mut statement_lines = Vec::new();
        let mut get_list = Vec::new();

        for statement in &block.statements {
            ctx.emit_statement(statement, &mut statement_lines, &mut get_list);
        }

        let mut out = String::from("match\n");
        for line in ctx.declarations.iter().chain(statement_lines.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("get ");
        out.push_str(
            &get_list
                .iter()
                .map(|name| format!("${name}"))
                .collect::<Vec<_>>()
                .join(", "),
        );
        out.push(';');
        GeneratedQuery {
            text: out,
            get_order: get_list,
        }
    }
}

#[derive(Default)]
struct GenContext {
    counter: usize,
    declared_names: HashSet<String>,
    declarations: Vec<String>,
}

impl GenContext {
    fn fresh_id(&mut self) -> String {
        let id = format!("n{}", self.counter);
        self.counter += 1;
        id
    }

    /// IDs contributed by this operand. Zero for `UnboundVariable` (never
    /// constrains), one for a leaf literal/variable, and a flattened list
    /// for `Compound`/`Condition` (transparent containers with no node of
    /// their own — see `Operand::variables`/`literals`, which never surface
    /// the wrapper itself, only its leaves).
    fn operand_ids(&mut self, operand: &Operand) -> Vec<String> {
        match operand {
            Operand::UnboundVariable => vec![],
            Operand::Variable(name) => {
                if self.declared_names.insert(name.clone()) {
                    self.declarations.push(format!("${name} isa Variable;"));
                }
                vec![name.clone()]
            }
            Operand::EnumValue { name, value } => {
                if self.declared_names.insert(name.clone()) {
                    self.declarations
                        .push(format!("${name} isa IntegerLiteral, has IntegerValue {value};"));
                }
                vec![name.clone()]
            }
            Operand::StringLiteral(value) => {
                let id = self.fresh_id();
                self.declarations
                    .push(format!("${id} isa StringLiteral, has StringValue \"{value}\";"));
                vec![id]
            }
            Operand::IntegerLiteral(value) => {
                let id = self.fresh_id();
                self.declarations
                    .push(format!("${id} isa IntegerLiteral, has IntegerValue {value};"));
                vec![id]
            }
            Operand::Compound(operands) | Operand::Condition(operands) => {
                operands.iter().flat_map(|o| self.operand_ids(o)).collect()
            }
        }
    }

    fn emit_call(&mut self, call: &Call, out: &mut Vec<String>, get_list: &mut Vec<String>) -> String {
        let call_id = self.fresh_id();
        let line_var = format!("l{call_id}");
        out.push(format!(
            "${call_id} isa Call, has Label \"{}\", has Line ${line_var};",
            call.label
        ));
        get_list.push(line_var);

        for (j, parameter) in call.parameters.iter().enumerate() {
            let index = j + 1;
            for param_id in self.operand_ids(parameter) {
                out.push(format!("(${param_id}, ${call_id}) isa Parameter, has Index {index};"));
            }
        }
        call_id
    }

    /// Emits this statement's constraints and returns the id representing
    /// it, for use as a `Conditional` edge target if it sits in a
    /// structure's body. `None` only for statements with no addressable
    /// node of their own (there are none currently, but kept for symmetry).
    fn emit_statement(
        &mut self,
        statement: &Statement,
        out: &mut Vec<String>,
        get_list: &mut Vec<String>,
    ) -> Option<String> {
        match statement {
            Statement::Call(call) => Some(self.emit_call(call, out, get_list)),
            Statement::CallAssignment { assignee, value } => {
                let call_id = self.emit_call(value, out, get_list);
                let var_ids = self.operand_ids(&Operand::Variable(assignee.clone()));
                for var_id in var_ids {
                    out.push(format!("(${var_id}, ${call_id}) isa Definition;"));
                }
                Some(call_id)
            }
            Statement::LiteralAssignment { assignee, value } => {
                let lit_ids = self.operand_ids(value);
                let var_ids = self.operand_ids(&Operand::Variable(assignee.clone()));
                for var_id in &var_ids {
                    for lit_id in &lit_ids {
                        out.push(format!("(${var_id}, ${lit_id}) isa Definition;"));
                    }
                }
                var_ids.into_iter().next()
            }
            Statement::Reference(literal) => self.operand_ids(literal).into_iter().next(),
            Statement::Structure(structure) => Some(self.emit_structure(structure, out, get_list)),
        }
    }

    fn emit_structure(
        &mut self,
        structure: &Structure,
        out: &mut Vec<String>,
        get_list: &mut Vec<String>,
    ) -> String {
        let mut body_ids = Vec::new();
        for statement in &structure.block.statements {
            if let Some(id) = self.emit_statement(statement, out, get_list) {
                body_ids.push(id);
            }
        }
        let condition_ids = self.operand_ids(&structure.condition);
        for condition_id in &condition_ids {
            for body_id in &body_ids {
                out.push(format!("(${condition_id}, ${body_id}) isa Conditional;"));
            }
        }
        self.fresh_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::StructureKind;

    fn call_block(label: &str, params: Vec<Operand>) -> Block {
        Block::new(vec![Statement::Call(Call::new(label, params))])
    }

    #[test]
    fn empty_call_scenario_one() {
        let block = call_block("foo", vec![]);
        let query = QueryGenerator::generate(&block);
        assert_eq!(
            query.text,
            "match\n$n0 isa Call, has Label \"foo\", has Line $ln0;\nget $ln0;"
        );
        assert_eq!(query.get_order, vec!["ln0".to_string()]);
    }

    #[test]
    fn string_literal_parameter_scenario_two() {
        let block = call_block("foo", vec![Operand::StringLiteral("bar".into())]);
        let query = QueryGenerator::generate(&block).text;
        assert!(query.contains("isa StringLiteral, has StringValue \"bar\";"));
        assert!(query.contains("isa Parameter, has Index 1;"));
    }

    #[test]
    fn indexed_parameters_skip_wildcards_scenario_three() {
        let block = call_block(
            "foo",
            vec![
                Operand::UnboundVariable,
                Operand::StringLiteral("test".into()),
                Operand::UnboundVariable,
                Operand::Variable("x0".into()),
            ],
        );
        let query = QueryGenerator::generate(&block).text;
        assert!(!query.contains("Index 1;"));
        assert!(query.contains("Index 2;"));
        assert!(!query.contains("Index 3;"));
        assert!(query.contains("Index 4;"));
        assert!(query.contains("$x0 isa Variable;"));
    }

    #[test]
    fn assignment_and_use_scenario_four() {
        let block = Block::new(vec![
            Statement::CallAssignment {
                assignee: "x".into(),
                value: Call::new("HttpOpenRequestA", vec![Operand::UnboundVariable; 7]),
            },
            Statement::Call(Call::new("InternetCloseHandle", vec![Operand::Variable("x".into())])),
        ]);
        let query = QueryGenerator::generate(&block).text;
        assert_eq!(query.matches("isa Variable;").count(), 1);
        assert!(query.contains("isa Definition;"));
        assert!(query.contains("isa Parameter, has Index 1;"));
    }

    #[test]
    fn variable_gets_single_declaration_across_repeated_use() {
        let block = Block::new(vec![
            Statement::Call(Call::new("a", vec![Operand::Variable("x".into())])),
            Statement::Call(Call::new("b", vec![Operand::Variable("x".into())])),
        ]);
        let query = QueryGenerator::generate(&block).text;
        assert_eq!(query.matches("$x isa Variable;").count(), 1);
    }

    #[test]
    fn unbound_variable_never_appears_in_any_constraint() {
        let block = call_block("foo", vec![Operand::UnboundVariable]);
        let query = QueryGenerator::generate(&block).text;
        assert!(!query.contains("Unbound"));
        assert!(!query.contains("isa Parameter"));
    }

    #[test]
    fn structure_emits_conditional_edges_between_condition_and_body() {
        let structure = Structure::new(
            StructureKind::Branch,
            Operand::Variable("c".into()),
            Block::new(vec![Statement::Call(Call::new("inner", vec![]))]),
        );
        let block = Block::new(vec![Statement::Structure(structure)]);
        let query = QueryGenerator::generate(&block).text;
        assert!(query.contains("$c isa Variable;"));
        assert!(query.contains("isa Conditional;"));
        assert!(query.contains("isa Call, has Label \"inner\""));
    }

    #[test]
    fn get_list_has_one_entry_per_call_in_statement_order() {
        let block = Block::new(vec![
            Statement::Call(Call::new("a", vec![])),
            Statement::CallAssignment {
                assignee: "x".into(),
                value: Call::new("b", vec![]),
            },
        ]);
        let query = QueryGenerator::generate(&block);
        let get_clause = query.text.lines().last().unwrap();
        assert_eq!(get_clause.matches('$').count(), 2);
        assert_eq!(query.get_order, vec!["ln0".to_string(), "ln1".to_string()]);
    }

    #[test]
    fn get_order_follows_get_clause_not_numeric_sort_order() {
        // Second call is assigned a lower fresh id than the first's line
        // variable only incidentally; what matters is that get_order lists
        // the calls in statement order regardless of what values a database
        // later returns for them.
        let block = Block::new(vec![
            Statement::Call(Call::new("first", vec![])),
            Statement::Call(Call::new("second", vec![])),
        ]);
        let query = QueryGenerator::generate(&block);
        assert_eq!(query.get_order, vec!["ln0".to_string(), "ln1".to_string()]);
    }

    #[test]
    fn determinism_same_block_yields_identical_query_every_time() {
        let block = call_block("foo", vec![Operand::StringLiteral("bar".into())]);
        assert_eq!(QueryGenerator::generate(&block), QueryGenerator::generate(&block));
    }
}
