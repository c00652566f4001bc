use std::fmt;

use crate::container::ContainerId;
use crate::path::Path;

/// Handle to a divert stored in a [`ContainerGraph`](crate::ContainerGraph).
/// Diverts live in their own table so their targets can be written after
/// the containers that hold them have been assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DivertId(pub(crate) usize);

impl DivertId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single item of ordered container content.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeObject {
    /// Literal narrative text.
    Text(String),
    /// Marks the start of a player-selectable branch; the payload is the
    /// text shown for the choice.
    ChoicePoint(String),
    /// Control transfer; see [`Divert`].
    Divert(DivertId),
    /// A nested container, entered by falling through.
    Container(ContainerId),
}

impl RuntimeObject {
    pub fn as_container(&self) -> Option<ContainerId> {
        match self {
            RuntimeObject::Container(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_divert(&self) -> Option<DivertId> {
        match self {
            RuntimeObject::Divert(id) => Some(*id),
            _ => None,
        }
    }
}

/// A control transfer.
///
/// `target_name` is what the author wrote (absent for an implicit gather
/// divert). `target_path` stays `None` until reference resolution writes
/// the final address, so an unresolved divert is always detectable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Divert {
    pub target_name: Option<String>,
    pub target_path: Option<Path>,
}

impl Divert {
    /// A divert to whatever gather comes next.
    pub fn to_gather() -> Self {
        Divert::default()
    }

    pub fn named(target: impl Into<String>) -> Self {
        Divert {
            target_name: Some(target.into()),
            target_path: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.target_path.is_some()
    }
}

impl fmt::Display for Divert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.target_path, &self.target_name) {
            (Some(path), _) => write!(f, "-> {}", path),
            (None, Some(name)) => write!(f, "-> {} (unresolved)", name),
            (None, None) => write!(f, "-> ? (unresolved)"),
        }
    }
}
