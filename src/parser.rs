//! Hand-written tokenizer and recursive-descent parser for the behavior
//! pattern language (see `grammar.ebnf`). A `definitions` table, threaded
//! in from the rule file's optional `definitions` key, resolves bare
//! identifiers to `EnumValue` where they are known enum names, and to
//! `Variable` otherwise.

use std::collections::HashMap;

use crate::behavior::{Behavior, Disjunction};
use crate::block::{Block, Structure, StructureKind};
use crate::error::RikaiError;
use crate::operand::{parse_integer, Operand};
use crate::statement::{Call, Statement};
use indexmap::IndexMap;

/// A lexical token with its source position (1-indexed, for diagnostics).
#[derive(Debug, Clone)]
struct Token {
    text: String,
    line: usize,
    column: usize,
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

const SYMBOLS: &str = "(){},:+|=-";

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;
    let mut column = 1;

    while let Some(&ch) = chars.peek() {
        if ch == '\n' {
            chars.next();
            line += 1;
            column = 1;
        } else if ch.is_whitespace() {
            chars.next();
            column += 1;
        } else if ch == '"' {
            let (start_line, start_col) = (line, column);
            let mut text = String::from("\"");
            chars.next();
            column += 1;
            let mut escaped = false;
            loop {
                match chars.next() {
                    Some(c) => {
                        column += 1;
                        text.push(c);
                        if escaped {
                            escaped = false;
                        } else if c == '\\' {
                            escaped = true;
                        } else if c == '"' {
                            break;
                        }
                    }
                    None => break,
                }
            }
            tokens.push(Token {
                text,
                line: start_line,
                column: start_col,
            });
        } else if SYMBOLS.contains(ch) {
            tokens.push(Token {
                text: ch.to_string(),
                line,
                column,
            });
            chars.next();
            column += 1;
        } else {
            let (start_line, start_col) = (line, column);
            let mut text = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || SYMBOLS.contains(c) || c == '"' {
                    break;
                }
                text.push(c);
                chars.next();
                column += 1;
            }
            tokens.push(Token {
                text,
                line: start_line,
                column: start_col,
            });
        }
    }

    tokens
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn looks_like_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

fn looks_like_number_body(text: &str) -> bool {
    !text.is_empty() && text.chars().next().is_some_and(|c| c.is_ascii_digit())
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    definitions: &'a HashMap<String, i64>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &str, definitions: &'a HashMap<String, i64>) -> Self {
        Parser {
            tokens: tokenize(source),
            pos: 0,
            definitions,
        }
    }

    /// Parse a complete behavior pattern.
    pub fn parse(source: &str, definitions: &HashMap<String, i64>) -> Result<Behavior, RikaiError> {
        let mut parser = Parser::new(source, definitions);
        let behavior = parser.parse_behavior()?;
        if !parser.is_at_end() {
            return Err(parser.error_here("unexpected trailing input"));
        }
        Ok(behavior)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_text(&self) -> &str {
        self.current().map(|t| t.text.as_str()).unwrap_or("")
    }

    fn check(&self, expected: &str) -> bool {
        self.current_text() == expected
    }

    fn advance(&mut self) -> Option<Token> {
        if self.is_at_end() {
            None
        } else {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            Some(token)
        }
    }

    fn consume(&mut self, expected: &str) -> Result<Token, RikaiError> {
        if self.check(expected) {
            Ok(self.advance().expect("checked present"))
        } else {
            Err(self.error_here(&format!("expected '{expected}'")))
        }
    }

    fn error_here(&self, message: &str) -> RikaiError {
        let (line, column) = self
            .current()
            .map(|t| (t.line, t.column))
            .unwrap_or((0, 0));
        RikaiError::ParseError {
            message: message.to_string(),
            line,
            column,
        }
    }

    /// `behavior = (block | disjunction)+`
    fn parse_behavior(&mut self) -> Result<Behavior, RikaiError> {
        if self.is_at_end() {
            return Err(self.error_here("a behavior pattern must not be empty"));
        }

        let mut blocks = Vec::new();
        let mut disjunctions = Vec::new();
        let mut segment = Vec::new();

        while !self.is_at_end() {
            if self.check("switch") {
                blocks.push(Block::new(std::mem::take(&mut segment)));
                disjunctions.push(self.parse_disjunction()?);
            } else {
                segment.push(self.parse_block_item()?);
            }
        }
        blocks.push(Block::new(segment));

        Ok(Behavior::new(blocks, disjunctions))
    }

    /// `structure | statement`
    fn parse_block_item(&mut self) -> Result<Statement, RikaiError> {
        if self.check("if") || self.check("while") {
            Ok(Statement::Structure(self.parse_structure()?))
        } else {
            self.parse_statement()
        }
    }

    fn parse_structure(&mut self) -> Result<Structure, RikaiError> {
        let kind = if self.check("if") {
            self.advance();
            StructureKind::Branch
        } else {
            self.consume("while")?;
            StructureKind::Loop
        };
        self.consume("(")?;
        let condition = self.parse_condition()?;
        self.consume(")")?;
        self.consume("{")?;
        let mut statements = Vec::new();
        statements.push(self.parse_statement()?);
        while !self.check("}") {
            statements.push(self.parse_statement()?);
        }
        self.consume("}")?;
        Ok(Structure::new(kind, condition, Block::new(statements)))
    }

    /// `switch '(' operand ')' '{' case+ '}'`
    fn parse_disjunction(&mut self) -> Result<Disjunction, RikaiError> {
        self.consume("switch")?;
        self.consume("(")?;
        let value_operand = self.parse_operand()?;
        self.consume(")")?;
        self.consume("{")?;
        let mut possibilities = IndexMap::new();
        while self.check("case") {
            let (label, block) = self.parse_case()?;
            possibilities.insert(label, block);
        }
        self.consume("}")?;
        Ok(Disjunction::new(value_operand.to_string(), possibilities))
    }

    /// `'case' operand ':' statement+ 'break'`
    fn parse_case(&mut self) -> Result<(String, Block), RikaiError> {
        self.consume("case")?;
        let label_operand = self.parse_operand()?;
        self.consume(":")?;
        let mut statements = Vec::new();
        statements.push(self.parse_statement()?);
        while !self.check("break") {
            statements.push(self.parse_statement()?);
        }
        self.consume("break")?;
        Ok((label_operand.to_string(), Block::new(statements)))
    }

    /// `statement = assignment | call | reference`
    fn parse_statement(&mut self) -> Result<Statement, RikaiError> {
        if looks_like_identifier(self.current_text())
            && !self.is_keyword(self.current_text())
            && self.peek_is("=")
        {
            return self.parse_assignment();
        }
        if looks_like_identifier(self.current_text())
            && !self.is_keyword(self.current_text())
            && self.peek_is("(")
        {
            return Ok(Statement::Call(self.parse_call()?));
        }
        let operand = self.parse_operand()?;
        if operand.is_unbound() || matches!(operand, Operand::Variable(_)) {
            return Err(self.error_here("a bare variable is not a valid statement"));
        }
        Ok(Statement::Reference(operand))
    }

    fn is_keyword(&self, text: &str) -> bool {
        matches!(text, "if" | "while" | "switch" | "case" | "break")
    }

    fn peek_is(&self, expected: &str) -> bool {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.text == expected)
            .unwrap_or(false)
    }

    /// `assignment = variable '=' (call | operand)`
    fn parse_assignment(&mut self) -> Result<Statement, RikaiError> {
        let assignee = self.consume_identifier()?;
        self.consume("=")?;
        if looks_like_identifier(self.current_text()) && self.peek_is("(") {
            let call = self.parse_call()?;
            Ok(Statement::CallAssignment { assignee, value: call })
        } else {
            let value = self.parse_operand()?;
            Ok(Statement::LiteralAssignment { assignee, value })
        }
    }

    fn consume_identifier(&mut self) -> Result<String, RikaiError> {
        if !looks_like_identifier(self.current_text()) {
            return Err(self.error_here("expected an identifier"));
        }
        Ok(self.advance().expect("checked present").text)
    }

    /// `call = name '(' (operand (',' operand)*)? ')'`
    fn parse_call(&mut self) -> Result<Call, RikaiError> {
        let label = self.consume_identifier()?;
        self.consume("(")?;
        let mut parameters = Vec::new();
        if !self.check(")") {
            parameters.push(self.parse_operand()?);
            while self.check(",") {
                self.advance();
                parameters.push(self.parse_operand()?);
            }
        }
        self.consume(")")?;
        Ok(Call::new(label, parameters))
    }

    /// `condition = operand ('|' operand)*`
    fn parse_condition(&mut self) -> Result<Operand, RikaiError> {
        let mut operands = vec![self.parse_operand()?];
        while self.check("|") {
            self.advance();
            operands.push(self.parse_operand()?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            Operand::Condition(operands)
        })
    }

    /// `operand = compound | primary`
    fn parse_operand(&mut self) -> Result<Operand, RikaiError> {
        let mut operands = vec![self.parse_primary()?];
        while self.check("+") {
            self.advance();
            operands.push(self.parse_primary()?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            Operand::Compound(operands)
        })
    }

    /// `primary = integer | string | unbound | enum-name | variable`
    ///
    /// The grammar's `+`/`-` sign belongs to an immediately following
    /// integer body, never to a standalone operator in this position — the
    /// `compound`/`condition` loops above already consumed any `+`/`|` that
    /// separates operands before calling back in here.
    fn parse_primary(&mut self) -> Result<Operand, RikaiError> {
        if self.check("_") {
            self.advance();
            return Ok(Operand::UnboundVariable);
        }
        if self.current_text().starts_with('"') {
            let token = self.advance().expect("checked present");
            return Ok(Operand::StringLiteral(unescape(&token.text)));
        }
        if self.check("+") || self.check("-") {
            let sign = self.advance().expect("checked present").text;
            let body = self.consume_number_body()?;
            return Ok(Operand::IntegerLiteral(parse_integer(&format!("{sign}{body}"))?));
        }
        if looks_like_number_body(self.current_text()) {
            let body = self.consume_number_body()?;
            return Ok(Operand::IntegerLiteral(parse_integer(&body)?));
        }
        if looks_like_identifier(self.current_text()) {
            let name = self.advance().expect("checked present").text;
            return Ok(match self.definitions.get(&name) {
                Some(&value) => Operand::EnumValue { name, value },
                None => Operand::Variable(name),
            });
        }
        Err(self.error_here(&format!("unexpected token '{}'", self.current_text())))
    }

    fn consume_number_body(&mut self) -> Result<String, RikaiError> {
        if !looks_like_number_body(self.current_text()) {
            return Err(self.error_here("expected an integer literal"));
        }
        Ok(self.advance().expect("checked present").text)
    }
}

/// Un-escape a tokenized string literal, stripping its surrounding quotes.
fn unescape(quoted: &str) -> String {
    let inner = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(quoted);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}
