// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! CSS Selector parsing and matching
//!
//! Compound selectors (`tag#id.class[attr=value]`) and comma-separated
//! lists of them. Combinators are not supported.

use crate::error::{Error, Result};

use super::node::Node;

/// A parsed selector list; matches when any alternative matches
#[derive(Debug, Clone)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

/// One compound selector
#[derive(Debug, Clone)]
struct Compound {
    parts: Vec<SelectorPart>,
}

/// A part of a selector
#[derive(Debug, Clone)]
pub enum SelectorPart {
    /// Universal selector (*)
    Universal,
    /// Tag name
    Tag(String),
    /// ID selector (#id)
    Id(String),
    /// Class selector (.class)
    Class(String),
    /// Attribute selector ([attr], [attr=value], etc.)
    Attribute(AttributeSelector),
}

/// Attribute selector
#[derive(Debug, Clone)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>,
    pub value: Option<String>,
    pub case_insensitive: bool,
}

/// Attribute selector operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr=value] - exact match
    Equals,
    /// [attr~=value] - word in space-separated list
    Includes,
    /// [attr^=value] - starts with
    Prefix,
    /// [attr$=value] - ends with
    Suffix,
}

impl Selector {
    /// Parse a CSS selector string
    pub fn parse(selector: &str) -> Result<Self> {
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(Error::selector(selector, "empty selector"));
        }

        let mut parser = SelectorParser::new(trimmed);
        let mut alternatives = vec![parser.parse_compound()?];
        while parser.peek() == Some(',') {
            parser.advance();
            alternatives.push(parser.parse_compound()?);
        }

        parser.skip_whitespace();
        if let Some(c) = parser.peek() {
            return Err(Error::selector(
                selector,
                format!("unsupported token '{}'", c),
            ));
        }

        Ok(Self { alternatives })
    }

    /// Check if a node matches this selector
    pub fn matches(&self, node: &Node) -> bool {
        self.alternatives
            .iter()
            .any(|c| c.parts.iter().all(|part| part_matches(part, node)))
    }
}

fn part_matches(part: &SelectorPart, node: &Node) -> bool {
    match part {
        SelectorPart::Universal => node.is_element(),
        SelectorPart::Tag(tag) => node
            .local_name()
            .map(|n| n.eq_ignore_ascii_case(tag))
            .unwrap_or(false),
        SelectorPart::Id(id) => node
            .get_attribute("id")
            .map(|n| n == *id)
            .unwrap_or(false),
        SelectorPart::Class(class) => node
            .get_attribute("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false),
        SelectorPart::Attribute(attr) => attribute_matches(attr, node),
    }
}

fn attribute_matches(attr: &AttributeSelector, node: &Node) -> bool {
    let Some(value) = node.get_attribute(&attr.name) else {
        return false;
    };

    let (Some(op), Some(target)) = (&attr.operator, &attr.value) else {
        return true;
    };

    let (value, target) = if attr.case_insensitive {
        (value.to_lowercase(), target.to_lowercase())
    } else {
        (value, target.clone())
    };

    match op {
        AttributeOperator::Equals => value == target,
        AttributeOperator::Includes => value.split_whitespace().any(|w| w == target),
        AttributeOperator::Prefix => value.starts_with(&target),
        AttributeOperator::Suffix => value.ends_with(&target),
    }
}

struct SelectorParser<'s> {
    source: &'s str,
    input: Vec<char>,
    pos: usize,
}

impl<'s> SelectorParser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            input: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::selector(self.source, reason)
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut parts = Vec::new();
        self.skip_whitespace();

        while let Some(c) = self.peek() {
            match c {
                '#' => {
                    self.advance();
                    parts.push(SelectorPart::Id(self.read_identifier()?));
                }
                '.' => {
                    self.advance();
                    parts.push(SelectorPart::Class(self.read_identifier()?));
                }
                '[' => parts.push(SelectorPart::Attribute(self.parse_attribute()?)),
                '*' => {
                    self.advance();
                    parts.push(SelectorPart::Universal);
                }
                c if c.is_alphabetic() || c == '_' || c == '-' => {
                    let tag = self.read_identifier()?;
                    parts.push(SelectorPart::Tag(tag.to_lowercase()));
                }
                _ => break,
            }
        }
        self.skip_whitespace();

        if parts.is_empty() {
            return Err(self.error("expected a compound selector"));
        }
        Ok(Compound { parts })
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn read_identifier(&mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                result.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if result.is_empty() {
            return Err(self.error("expected identifier"));
        }
        Ok(result)
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector> {
        self.advance(); // '['

        self.skip_whitespace();
        let name = self.read_identifier()?.to_ascii_lowercase();
        self.skip_whitespace();

        let mut operator = None;
        let mut value = None;
        let mut case_insensitive = false;

        if let Some(c) = self.peek().filter(|&c| c != ']') {
            let op = match c {
                '=' => AttributeOperator::Equals,
                '~' => AttributeOperator::Includes,
                '^' => AttributeOperator::Prefix,
                '$' => AttributeOperator::Suffix,
                _ => return Err(self.error(format!("unknown operator '{}'", c))),
            };
            self.advance();
            if op != AttributeOperator::Equals {
                self.expect('=')?;
            }
            operator = Some(op);

            self.skip_whitespace();
            value = Some(self.read_string_or_ident()?);
            self.skip_whitespace();

            if let Some('i') | Some('I') = self.peek() {
                case_insensitive = true;
                self.advance();
                self.skip_whitespace();
            }
        }

        self.expect(']')?;

        Ok(AttributeSelector {
            name,
            operator,
            value,
            case_insensitive,
        })
    }

    fn read_string_or_ident(&mut self) -> Result<String> {
        let Some(quote) = self.peek().filter(|c| *c == '"' || *c == '\'') else {
            return self.read_identifier();
        };
        self.advance();

        let mut result = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => return Ok(result),
                Some('\\') => {
                    if let Some(escaped) = self.advance() {
                        result.push(escaped);
                    }
                }
                Some(c) => result.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.advance() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', got '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', got end of input", expected))),
        }
    }
}
