//! The scopes that enclose weaves: the story itself, its knots, and their
//! stitches. Each scope's content is one weave with its own label table.

pub mod compile;
pub mod scope;

use std::fmt;
use std::ops::Range;

use serde::Deserialize;

use crate::element::Element;

/// A parsed story: top-level content plus knots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Story {
    /// Source file id (for error reporting with codespan-reporting).
    #[serde(default)]
    pub file_id: usize,
    #[serde(default)]
    pub content: Vec<Element>,
    #[serde(default)]
    pub knots: Vec<Knot>,
}

/// A top-level named section (`== name ==`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Knot {
    pub name: String,
    #[serde(default)]
    pub content: Vec<Element>,
    #[serde(default)]
    pub stitches: Vec<Stitch>,
    #[serde(default)]
    pub span: Range<usize>,
}

/// A named sub-section of a knot (`= name`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Stitch {
    pub name: String,
    #[serde(default)]
    pub content: Vec<Element>,
    #[serde(default)]
    pub span: Range<usize>,
}

impl Knot {
    pub fn new(name: impl Into<String>, content: Vec<Element>) -> Self {
        Knot {
            name: name.into(),
            content,
            stitches: Vec::new(),
            span: 0..0,
        }
    }

    pub fn with_stitch(mut self, stitch: Stitch) -> Self {
        self.stitches.push(stitch);
        self
    }

    pub fn at(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }
}

impl Stitch {
    pub fn new(name: impl Into<String>, content: Vec<Element>) -> Self {
        Stitch {
            name: name.into(),
            content,
            span: 0..0,
        }
    }

    pub fn at(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Story,
    Knot,
    Stitch,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Story => write!(f, "Story"),
            ScopeKind::Knot => write!(f, "Knot"),
            ScopeKind::Stitch => write!(f, "Stitch"),
        }
    }
}
