//! Structural path predicates.
//!
//! A small subset of XPath used by exception rules:
//!
//! ```text
//! path      := ['/' | '//'] step (('/' | '//') step)*
//! step      := ('*' | [prefix ':'] name) ('[' condition ('and' condition)* ']')*
//! condition := '@' attr
//!            | '@' attr '=' literal
//!            | '@' attr '!=' literal
//!            | 'not(' '@' attr ')'
//!            | 're:test(' '@' attr ',' literal [',' literal] ')'
//! ```
//!
//! Relative paths start from the children of the root element. Namespace
//! prefixes are ignored on both element and attribute names.

use crate::error::ParseError;
use crate::tree::{NodeId, Tree};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Local(String),
}

#[derive(Debug, Clone)]
enum Condition {
    Has(String),
    Missing(String),
    Equals(String, String),
    NotEquals(String, String),
    Matches(String, Regex),
}

impl Condition {
    fn holds(&self, tree: &Tree, id: NodeId) -> bool {
        match self {
            Self::Has(attr) => tree.attr(id, attr).is_some(),
            Self::Missing(attr) => tree.attr(id, attr).is_none(),
            Self::Equals(attr, value) => tree.attr(id, attr) == Some(value.as_str()),
            Self::NotEquals(attr, value) => {
                tree.attr(id, attr).is_some_and(|v| v != value.as_str())
            }
            Self::Matches(attr, re) => tree.attr(id, attr).is_some_and(|v| re.is_match(v)),
        }
    }
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NameTest,
    conditions: Vec<Condition>,
}

impl Step {
    fn accepts(&self, tree: &Tree, id: NodeId) -> bool {
        let name_ok = match &self.test {
            NameTest::Any => true,
            NameTest::Local(name) => tree.tag(id) == name,
        };
        name_ok && self.conditions.iter().all(|c| c.holds(tree, id))
    }
}

/// A compiled structural path.
#[derive(Debug, Clone)]
pub struct Path {
    source: String,
    absolute: bool,
    steps: Vec<Step>,
}

impl Path {
    /// Compiles a path expression.
    ///
    /// # Errors
    /// Returns `ParseError::InvalidPath` for malformed expressions and
    /// `ParseError::InvalidRegex` for bad regular expressions.
    pub fn compile(source: &str) -> Result<Self, ParseError> {
        PathParser::new(source).parse()
    }

    /// Returns the source text of the path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns every node selected by the path, in document order.
    #[must_use]
    pub fn select(&self, tree: &Tree) -> Vec<NodeId> {
        let Some(root) = tree.root() else {
            return Vec::new();
        };

        // `None` stands for the document node above the root element
        let mut context: Vec<Option<NodeId>> = if self.absolute {
            vec![None]
        } else {
            vec![Some(root)]
        };

        for step in &self.steps {
            let mut next = BTreeSet::new();
            for ctx in &context {
                let candidates = match (step.axis, ctx) {
                    (Axis::Child, None) => vec![root],
                    (Axis::Descendant, None) => tree.ids().collect(),
                    (Axis::Child, Some(id)) => tree.children(*id).to_vec(),
                    (Axis::Descendant, Some(id)) => tree.descendants(*id),
                };
                next.extend(candidates.into_iter().filter(|&id| step.accepts(tree, id)));
            }
            context = next.into_iter().map(Some).collect();
        }

        context.into_iter().flatten().collect()
    }

    /// Returns true if the path selects `id`.
    #[must_use]
    pub fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        self.select(tree).binary_search(&id).is_ok()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Path {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

/// Recursive descent parser over the path source.
struct PathParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::invalid_path(self.source, message)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let n = s.chars().count();
        let matches = self
            .chars
            .get(self.pos..self.pos + n)
            .is_some_and(|w| w.iter().copied().eq(s.chars()));
        if matches {
            self.pos += n;
        }
        matches
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ParseError> {
        self.skip_ws();
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}' at offset {}", self.pos)))
        }
    }

    fn parse(mut self) -> Result<Path, ParseError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(self.error("empty path"));
        }

        let mut absolute = false;
        let mut axis = Axis::Child;
        if self.eat_str("//") {
            absolute = true;
            axis = Axis::Descendant;
        } else if self.eat('/') {
            absolute = true;
        }

        let mut steps = Vec::new();
        loop {
            steps.push(self.parse_step(axis)?);
            self.skip_ws();
            if self.eat_str("//") {
                axis = Axis::Descendant;
            } else if self.eat('/') {
                axis = Axis::Child;
            } else if self.peek().is_none() {
                break;
            } else {
                return Err(self.error(format!("unexpected character at offset {}", self.pos)));
            }
        }

        Ok(Path {
            source: self.source.to_string(),
            absolute,
            steps,
        })
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step, ParseError> {
        self.skip_ws();
        let test = if self.eat('*') {
            NameTest::Any
        } else {
            NameTest::Local(self.parse_name()?)
        };

        let mut conditions = Vec::new();
        loop {
            self.skip_ws();
            if !self.eat('[') {
                break;
            }
            loop {
                conditions.push(self.parse_condition()?);
                self.skip_ws();
                if !self.eat_str("and") {
                    break;
                }
            }
            self.expect(']')?;
        }

        Ok(Step {
            axis,
            test,
            conditions,
        })
    }

    /// Reads a possibly prefixed name and returns its local part.
    fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error(format!("expected a name at offset {start}")));
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        Ok(match name.rsplit_once(':') {
            Some((_, local)) => local.to_string(),
            None => name,
        })
    }

    fn parse_attr(&mut self) -> Result<String, ParseError> {
        self.skip_ws();
        if !self.eat('@') {
            return Err(self.error(format!("expected '@' at offset {}", self.pos)));
        }
        self.parse_name()
    }

    fn parse_literal(&mut self) -> Result<String, ParseError> {
        self.skip_ws();
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error(format!("expected a string at offset {}", self.pos))),
        };
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != quote) {
            self.pos += 1;
        }
        if self.peek().is_none() {
            return Err(self.error("unterminated string"));
        }
        let literal = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(literal)
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        self.skip_ws();
        if self.eat_str("not(") {
            let attr = self.parse_attr()?;
            self.expect(')')?;
            return Ok(Condition::Missing(attr));
        }
        if self.eat_str("re:test(") {
            let attr = self.parse_attr()?;
            self.expect(',')?;
            let pattern = self.parse_literal()?;
            self.skip_ws();
            let mut case_insensitive = false;
            if self.eat(',') {
                let flags = self.parse_literal()?;
                case_insensitive = flags.contains('i');
            }
            self.expect(')')?;
            let re = RegexBuilder::new(&pattern)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|source| ParseError::InvalidRegex {
                    path: self.source.to_string(),
                    source,
                })?;
            return Ok(Condition::Matches(attr, re));
        }

        let attr = self.parse_attr()?;
        self.skip_ws();
        if self.eat_str("!=") {
            Ok(Condition::NotEquals(attr, self.parse_literal()?))
        } else if self.eat('=') {
            Ok(Condition::Equals(attr, self.parse_literal()?))
        } else {
            Ok(Condition::Has(attr))
        }
    }
}
