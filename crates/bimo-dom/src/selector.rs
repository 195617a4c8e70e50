#![forbid(unsafe_code)]

//! A CSS selector subset.
//!
//! Supported: type (`input`), universal (`*`), id (`#city`), class
//! (`.field`), attribute presence (`[required]`) and equality
//! (`[name=city]`, `[name="city"]`), compounds of those
//! (`input.field[type=checkbox]`), the descendant combinator (whitespace)
//! and selector lists (`a, b`).
//!
//! Child/sibling combinators and pseudo-classes are rejected with
//! [`SelectorError::Unsupported`] rather than silently mis-matched.

use crate::host::NodeId;

/// Why a selector failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected {found:?} at offset {pos}")]
    Unexpected { found: char, pos: usize },
    #[error("unsupported selector syntax {found:?} at offset {pos}")]
    Unsupported { found: char, pos: usize },
    #[error("unexpected end of selector")]
    UnexpectedEnd,
}

/// The tree view a selector matches against.
pub trait SelectorTarget {
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    /// Lower-case tag name.
    fn local_name(&self, node: NodeId) -> Option<&str>;
    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn matches<T: SelectorTarget + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        let Some(name) = tree.local_name(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(name) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if tree.attr(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class = tree.attr(node, "class").unwrap_or_default();
            if !self
                .classes
                .iter()
                .all(|c| class.split_whitespace().any(|have| have == c))
            {
                return false;
            }
        }
        self.attrs.iter().all(|test| match (tree.attr(node, &test.name), &test.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(have), Some(want)) => have == want,
        })
    }
}

/// Compounds joined by descendant combinators, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
}

impl Complex {
    fn matches<T: SelectorTarget + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        let Some((last, ancestors)) = self.compounds.split_last() else {
            return false;
        };
        if !last.matches(tree, node) {
            return false;
        }
        // Nearest matching ancestor first is sufficient for descendant-only chains.
        let mut current = node;
        for compound in ancestors.iter().rev() {
            loop {
                let Some(parent) = tree.parent(current) else {
                    return false;
                };
                current = parent;
                if compound.matches(tree, current) {
                    break;
                }
            }
        }
        true
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser::new(input).parse_list()
    }

    /// Whether `node` matches any alternative of the list.
    #[must_use]
    pub fn matches<T: SelectorTarget + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(tree, node))
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Returns whether any whitespace was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::Unexpected {
                found,
                pos: self.pos,
            },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_list(mut self) -> Result<Selector, SelectorError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }
        let mut alternatives = Vec::new();
        loop {
            self.skip_ws();
            alternatives.push(self.parse_complex()?);
            match self.peek() {
                None => break,
                Some(',') => {
                    self.pos += 1;
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(Selector { alternatives })
    }

    fn parse_complex(&mut self) -> Result<Complex, SelectorError> {
        let mut compounds = Vec::new();
        loop {
            compounds.push(self.parse_compound()?);
            let spaced = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some(found @ ('>' | '+' | '~')) => {
                    return Err(SelectorError::Unsupported {
                        found,
                        pos: self.pos,
                    });
                }
                Some(_) if spaced => {}
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(Complex { compounds })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();
        if self.peek() == Some('*') {
            self.pos += 1;
        } else if self.peek().is_some_and(is_ident_char) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(found @ ':') => {
                    return Err(SelectorError::Unsupported {
                        found,
                        pos: self.pos,
                    });
                }
                _ => break,
            }
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrTest, SelectorError> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        let value = if self.peek() == Some('=') {
            self.pos += 1;
            self.skip_ws();
            Some(self.attr_value()?)
        } else {
            None
        };
        self.skip_ws();
        match self.bump() {
            Some(']') => Ok(AttrTest { name, value }),
            Some(found) => Err(SelectorError::Unexpected {
                found,
                pos: self.pos - 1,
            }),
            None => Err(SelectorError::UnexpectedEnd),
        }
    }

    fn attr_value(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(SelectorError::UnexpectedEnd);
                }
                let value = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                Ok(value)
            }
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c != ']' && !c.is_whitespace())
                {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(self.unexpected());
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
        }
    }
}
