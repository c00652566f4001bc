pub mod divert;

use std::fmt;
use std::ops::Range;

use serde::Deserialize;

pub use crate::element::divert::{Divert, DivertTarget};
use crate::weave::WeaveId;

/// A parsed narrative element, as handed over by the parser.
///
/// The parser only knows each weave point's indentation depth, not how the
/// elements nest; Structural Recovery works that out and splices nested
/// runs back in as [`Element::Weave`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Text(Text),
    Divert(Divert),
    Choice(Choice),
    Gather(Gather),
    Compound(Compound),
    /// A nested block produced by Structural Recovery.
    #[serde(skip)]
    Weave(WeaveId),
}

impl Element {
    pub fn as_weave_point(&self) -> Option<WeavePoint<'_>> {
        match self {
            Element::Choice(choice) => Some(WeavePoint::Choice(choice)),
            Element::Gather(gather) => Some(WeavePoint::Gather(gather)),
            _ => None,
        }
    }

    /// Indentation depth, if this element is a weave point.
    pub fn weave_point_depth(&self) -> Option<u32> {
        self.as_weave_point().map(|point| point.indentation_depth())
    }

    pub fn as_divert(&self) -> Option<&Divert> {
        match self {
            Element::Divert(divert) => Some(divert),
            _ => None,
        }
    }

    /// Whether this element is, or holds anywhere in its content, a choice.
    /// Nested blocks are not looked into.
    pub fn contains_choice(&self) -> bool {
        match self {
            Element::Choice(_) => true,
            Element::Gather(gather) => gather
                .content
                .as_deref()
                .is_some_and(|content| content.iter().any(Element::contains_choice)),
            Element::Compound(compound) => compound.content.iter().any(Element::contains_choice),
            Element::Text(_) | Element::Divert(_) | Element::Weave(_) => false,
        }
    }
}

impl From<Text> for Element {
    fn from(text: Text) -> Self {
        Element::Text(text)
    }
}

impl From<Divert> for Element {
    fn from(divert: Divert) -> Self {
        Element::Divert(divert)
    }
}

impl From<Choice> for Element {
    fn from(choice: Choice) -> Self {
        Element::Choice(choice)
    }
}

impl From<Gather> for Element {
    fn from(gather: Gather) -> Self {
        Element::Gather(gather)
    }
}

impl From<Compound> for Element {
    fn from(compound: Compound) -> Self {
        Element::Compound(compound)
    }
}

/// Plain narrative text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(default)]
    pub span: Range<usize>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Text {
            text: text.into(),
            span: 0..0,
        }
    }

    pub fn at(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }
}

/// Plain content with inner structure, such as one branch of a multi-line
/// conditional. It may contain diverts and choices of its own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Compound {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub content: Vec<Element>,
    #[serde(default)]
    pub span: Range<usize>,
}

impl Compound {
    pub fn new(label: impl Into<String>, content: Vec<Element>) -> Self {
        Compound {
            label: label.into(),
            content,
            span: 0..0,
        }
    }
}

/// A player-selectable branch (`*` or `+`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "depth")]
    pub indentation_depth: u32,
    /// Text shown to the player.
    #[serde(default)]
    pub text: String,
    /// Inline content on the choice line. `None` when the line carries
    /// nothing beyond the choice text.
    #[serde(default)]
    pub content: Option<Vec<Element>>,
    #[serde(default)]
    pub span: Range<usize>,
}

impl Choice {
    pub fn new(indentation_depth: u32, text: impl Into<String>) -> Self {
        Choice {
            name: None,
            indentation_depth,
            text: text.into(),
            content: None,
            span: 0..0,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_content(mut self, content: Vec<Element>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn at(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }

    pub fn terminating_divert(&self) -> Option<&Divert> {
        self.content.as_ref()?.last()?.as_divert()
    }

    pub fn has_terminating_divert(&self) -> bool {
        self.terminating_divert().is_some()
    }

    /// The choice ends in `->`: it wants to flow on to the next gather.
    pub fn has_explicit_gather(&self) -> bool {
        self.terminating_divert()
            .is_some_and(|divert| divert.is_to_gather())
    }
}

/// A convergence point (`-`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Gather {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "depth")]
    pub indentation_depth: u32,
    #[serde(default)]
    pub content: Option<Vec<Element>>,
    #[serde(default)]
    pub span: Range<usize>,
}

impl Gather {
    pub fn new(indentation_depth: u32) -> Self {
        Gather {
            name: None,
            indentation_depth,
            content: None,
            span: 0..0,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_content(mut self, content: Vec<Element>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn at(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }

    pub fn terminating_divert(&self) -> Option<&Divert> {
        self.content.as_ref()?.last()?.as_divert()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeavePointKind {
    Choice,
    Gather,
}

impl fmt::Display for WeavePointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeavePointKind::Choice => write!(f, "Choice"),
            WeavePointKind::Gather => write!(f, "Gather"),
        }
    }
}

/// Borrowed view over the two weave point variants.
#[derive(Debug, Clone, Copy)]
pub enum WeavePoint<'a> {
    Choice(&'a Choice),
    Gather(&'a Gather),
}

impl<'a> WeavePoint<'a> {
    pub fn kind(&self) -> WeavePointKind {
        match self {
            WeavePoint::Choice(_) => WeavePointKind::Choice,
            WeavePoint::Gather(_) => WeavePointKind::Gather,
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match self {
            WeavePoint::Choice(choice) => choice.name.as_deref(),
            WeavePoint::Gather(gather) => gather.name.as_deref(),
        }
    }

    pub fn indentation_depth(&self) -> u32 {
        match self {
            WeavePoint::Choice(choice) => choice.indentation_depth,
            WeavePoint::Gather(gather) => gather.indentation_depth,
        }
    }

    pub fn content(&self) -> Option<&'a [Element]> {
        match self {
            WeavePoint::Choice(choice) => choice.content.as_deref(),
            WeavePoint::Gather(gather) => gather.content.as_deref(),
        }
    }

    pub fn span(&self) -> Range<usize> {
        match self {
            WeavePoint::Choice(choice) => choice.span.clone(),
            WeavePoint::Gather(gather) => gather.span.clone(),
        }
    }

    pub fn terminating_divert(&self) -> Option<&'a Divert> {
        match self {
            WeavePoint::Choice(choice) => choice.terminating_divert(),
            WeavePoint::Gather(gather) => gather.terminating_divert(),
        }
    }

    /// Whether control can run off the end of this weave point and so
    /// needs wiring to the next gather.
    pub fn has_loose_end(&self) -> bool {
        if let WeavePoint::Choice(choice) = self {
            // `->` wants the next gather, so it still needs wiring.
            if choice.has_explicit_gather() {
                return true;
            }
            if choice.has_terminating_divert() {
                return false;
            }
        }

        match self.content() {
            None => true,
            Some(content) => !content
                .iter()
                .rev()
                .filter_map(Element::as_divert)
                .any(|divert| !divert.is_to_gather()),
        }
    }
}
