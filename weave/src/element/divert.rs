use std::ops::Range;

use serde::Deserialize;

/// Where a divert goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<String>")]
pub enum DivertTarget {
    /// `->` on its own: jump to whatever gather comes next at this level.
    /// The target is only known once the enclosing weave has been emitted.
    #[default]
    Gather,
    /// An author-written address: `knot`, `knot.stitch`, `label`, `knot.label`.
    Named(String),
}

impl From<Option<String>> for DivertTarget {
    fn from(target: Option<String>) -> Self {
        match target {
            Some(name) => DivertTarget::Named(name),
            None => DivertTarget::Gather,
        }
    }
}

/// A control-transfer instruction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Divert {
    #[serde(default)]
    pub target: DivertTarget,
    #[serde(default)]
    pub span: Range<usize>,
}

impl Divert {
    pub fn to_gather() -> Self {
        Divert {
            target: DivertTarget::Gather,
            span: 0..0,
        }
    }

    pub fn named(target: impl Into<String>) -> Self {
        Divert {
            target: DivertTarget::Named(target.into()),
            span: 0..0,
        }
    }

    pub fn at(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }

    pub fn is_to_gather(&self) -> bool {
        matches!(self.target, DivertTarget::Gather)
    }

    pub(crate) fn to_runtime(&self) -> runtime::Divert {
        match &self.target {
            DivertTarget::Named(name) => runtime::Divert::named(name.clone()),
            DivertTarget::Gather => runtime::Divert::to_gather(),
        }
    }
}
