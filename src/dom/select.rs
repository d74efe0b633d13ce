//! A small CSS selector subset for structural queries.
//!
//! Supported: type selectors, `*`, `#id`, `.class`, `[attr]`,
//! `[attr="value"]`, the descendant combinator (whitespace) and the child
//! combinator (`>`). Matching runs right to left over ancestors.

use thiserror::Error;

use crate::dom::tree::{Document, ElementData, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected `{found}` at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
    #[error("dangling combinator")]
    DanglingCombinator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Id(String),
    Class(String),
    HasAttr(String),
    AttrEquals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

impl Compound {
    fn matches(&self, element: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.conditions.iter().all(|c| match c {
            Condition::Id(id) => element.attr("id") == Some(id.as_str()),
            Condition::Class(class) => element.has_class(class),
            Condition::HasAttr(name) => element.attr(name).is_some(),
            Condition::AttrEquals(name, value) => element.attr(name) == Some(value.as_str()),
        })
    }
}

/// A compiled selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Compounds left to right; each combinator links a compound to the
    /// one before it.
    steps: Vec<(Combinator, Compound)>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser { input, pos: 0 }.parse()
    }

    /// Whether `node` matches.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_step(doc, node, self.steps.len() - 1)
    }

    fn matches_step(&self, doc: &Document, node: NodeId, step: usize) -> bool {
        let (combinator, compound) = &self.steps[step];
        if !doc.element(node).is_some_and(|e| compound.matches(e)) {
            return false;
        }
        if step == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => doc
                .parent(node)
                .is_some_and(|p| self.matches_step(doc, p, step - 1)),
            Combinator::Descendant => doc
                .ancestors(node)
                .any(|a| self.matches_step(doc, a, step - 1)),
        }
    }

    /// All matching descendants of `root` (excluding `root`), document order.
    pub fn select_all(&self, doc: &Document, root: NodeId) -> Vec<NodeId> {
        doc.descendants(root)
            .skip(1)
            .filter(|&n| self.matches(doc, n))
            .collect()
    }

    /// First matching descendant of `root` (excluding `root`).
    pub fn select_first(&self, doc: &Document, root: NodeId) -> Option<NodeId> {
        doc.descendants(root)
            .skip(1)
            .find(|&n| self.matches(doc, n))
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.bump();
        }
        self.input[start..self.pos].to_string()
    }

    fn expect_ident(&mut self) -> Result<String, SelectorError> {
        let ident = self.ident();
        if ident.is_empty() {
            return Err(self.unexpected());
        }
        Ok(ident)
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::Unexpected { found, offset: self.pos },
            None => SelectorError::DanglingCombinator,
        }
    }

    fn parse(mut self) -> Result<Selector, SelectorError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }

        let mut steps = vec![(Combinator::Descendant, self.compound()?)];
        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.peek() {
                None => break,
                Some('>') => {
                    self.bump();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if spaced => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            if self.peek().is_none() {
                return Err(SelectorError::DanglingCombinator);
            }
            steps.push((combinator, self.compound()?));
        }

        Ok(Selector { steps })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut universal = false;

        match self.peek() {
            Some('*') => {
                self.bump();
                universal = true;
            }
            Some(c) if c.is_alphabetic() => compound.tag = Some(self.ident()),
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.conditions.push(Condition::Id(self.expect_ident()?));
                }
                Some('.') => {
                    self.bump();
                    compound.conditions.push(Condition::Class(self.expect_ident()?));
                }
                Some('[') => {
                    self.bump();
                    compound.conditions.push(self.attribute()?);
                }
                _ => break,
            }
        }

        if compound.tag.is_none() && compound.conditions.is_empty() && !universal {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<Condition, SelectorError> {
        self.skip_whitespace();
        let name = self.ident();
        if name.is_empty() {
            return Err(match self.peek() {
                None => SelectorError::UnterminatedAttribute,
                Some(_) => self.unexpected(),
            });
        }
        self.skip_whitespace();

        let condition = match self.bump() {
            Some(']') => return Ok(Condition::HasAttr(name)),
            Some('=') => {
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.bump();
                        let start = self.pos;
                        while self.peek().is_some_and(|c| c != quote) {
                            self.bump();
                        }
                        let value = self.input[start..self.pos].to_string();
                        if self.bump().is_none() {
                            return Err(SelectorError::UnterminatedAttribute);
                        }
                        value
                    }
                    _ => self.ident(),
                };
                Condition::AttrEquals(name, value)
            }
            None => return Err(SelectorError::UnterminatedAttribute),
            Some(found) => {
                return Err(SelectorError::Unexpected {
                    found,
                    offset: self.pos - found.len_utf8(),
                })
            }
        };

        self.skip_whitespace();
        match self.bump() {
            Some(']') => Ok(condition),
            _ => Err(SelectorError::UnterminatedAttribute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_document;

    const NAV: &str = r#"
        <nav id="top">
          <ul class="menu">
            <li class="item" data-weight="2"><a href="/b">B</a></li>
            <li class="item"><a href="/a">A</a><ul><li class="item"><a href="/a/1">A1</a></li></ul></li>
          </ul>
        </nav>
        <footer><li class="item"><a href="/f">F</a></li></footer>
    "#;

    fn hrefs(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
        nodes
            .iter()
            .filter_map(|&n| {
                Selector::parse("a")
                    .unwrap()
                    .select_first(doc, n)
                    .and_then(|a| doc.element(a).unwrap().attr("href").map(str::to_string))
            })
            .collect()
    }

    #[test]
    fn test_descendant_combinator() {
        let doc = parse_document(&mut NAV.as_bytes()).unwrap();
        let found = Selector::parse("nav li.item").unwrap().select_all(&doc, doc.root());
        assert_eq!(hrefs(&doc, &found), vec!["/b", "/a", "/a/1"]);
    }

    #[test]
    fn test_child_combinator() {
        let doc = parse_document(&mut NAV.as_bytes()).unwrap();
        let found = Selector::parse("ul.menu > li").unwrap().select_all(&doc, doc.root());
        assert_eq!(hrefs(&doc, &found), vec!["/b", "/a"]);
    }

    #[test]
    fn test_attribute_conditions() {
        let doc = parse_document(&mut NAV.as_bytes()).unwrap();
        let found = Selector::parse("li[data-weight]").unwrap().select_all(&doc, doc.root());
        assert_eq!(found.len(), 1);

        let found = Selector::parse(r#"a[href="/f"]"#).unwrap().select_all(&doc, doc.root());
        assert_eq!(found.len(), 1);

        let found = Selector::parse("#top *[href='/a']").unwrap().select_all(&doc, doc.root());
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("nav >"), Err(SelectorError::DanglingCombinator));
        assert_eq!(Selector::parse("li["), Err(SelectorError::UnterminatedAttribute));
        assert_eq!(Selector::parse(r#"a[href="x]"#), Err(SelectorError::UnterminatedAttribute));
        assert!(matches!(Selector::parse("a,b"), Err(SelectorError::Unexpected { found: ',', .. })));
    }
}
