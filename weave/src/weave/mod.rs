//! Blocks of narrative content sharing one indentation level ("weaves"),
//! and the arena that owns them for the duration of a compile.
//!
//! A compile goes through three steps, each in its own module:
//!
//! - `structure`: recover the block tree from indentation depths.
//! - [`emit`]: turn each block into a runtime container, wiring loose ends
//!   to gathers and recording the diverts whose targets are still unknown.
//! - [`resolve`]: once the whole story graph exists, write final addresses
//!   into those diverts and check weave point labels for collisions.

pub mod emit;
pub mod resolve;
mod structure;

use std::collections::BTreeMap;
use std::ops::Range;

use runtime::{ContainerId, DivertId};

use crate::element::{Element, WeavePoint};
use crate::error::WeaveError;

/// Handle to a [`Weave`] inside a [`WeaveArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeaveId(usize);

impl WeaveId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifies a weave point: the block that directly contains it and its
/// position in that block's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeavePointLocation {
    pub weave: WeaveId,
    pub index: usize,
}

/// A control path that has not been terminated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LooseEnd {
    /// A choice or gather whose content can run off its end.
    WeavePoint(WeavePointLocation),
    /// A bare `->` inside ordinary content.
    Divert { divert: DivertId, span: Range<usize> },
}

/// A divert whose target container is known but whose address is not yet
/// final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReference {
    pub divert: DivertId,
    pub target: ContainerId,
}

/// A divert to an author-written address, resolved by the scope layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedReference {
    pub divert: DivertId,
    pub target: String,
    pub span: Range<usize>,
}

/// What a weave point became in the runtime graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeavePointRuntime {
    pub container: ContainerId,
    /// The runtime divert for a trailing `->`, reused when the weave point
    /// is wired to a gather.
    pub terminating_divert: Option<DivertId>,
}

/// One block of content at a single indentation level.
#[derive(Debug, Clone, Default)]
pub struct Weave {
    base_indentation_depth: u32,
    parent: Option<WeaveId>,
    content: Vec<Element>,
    loose_ends: Vec<LooseEnd>,
    pending_references: Vec<PendingReference>,
    named_references: Vec<NamedReference>,
    /// Only present on the outermost block of a scope.
    named_weave_points: Option<BTreeMap<String, WeavePointLocation>>,
    /// Back-references from weave points in `content` (by index) to their
    /// emitted containers.
    runtime: BTreeMap<usize, WeavePointRuntime>,
    root_container: Option<ContainerId>,
}

impl Weave {
    pub fn base_indentation_depth(&self) -> u32 {
        self.base_indentation_depth
    }

    pub fn parent(&self) -> Option<WeaveId> {
        self.parent
    }

    pub fn content(&self) -> &[Element] {
        &self.content
    }

    pub fn loose_ends(&self) -> &[LooseEnd] {
        &self.loose_ends
    }

    pub fn pending_references(&self) -> &[PendingReference] {
        &self.pending_references
    }

    pub fn named_references(&self) -> &[NamedReference] {
        &self.named_references
    }

    pub fn named_weave_points(&self) -> Option<&BTreeMap<String, WeavePointLocation>> {
        self.named_weave_points.as_ref()
    }

    /// The emitted container, once [`emit`](emit::Emitter::emit) has run.
    pub fn root_container(&self) -> Option<ContainerId> {
        self.root_container
    }

    pub fn has_weave_points(&self) -> bool {
        self.content.iter().any(|e| e.as_weave_point().is_some())
    }

    /// Nested blocks directly inside this one, in content order.
    pub fn children(&self) -> impl Iterator<Item = WeaveId> + '_ {
        self.content.iter().filter_map(|element| match element {
            Element::Weave(child) => Some(*child),
            _ => None,
        })
    }
}

/// Owns every block of one compile. Blocks refer to each other by
/// [`WeaveId`] rather than by reference.
#[derive(Debug, Default)]
pub struct WeaveArena {
    weaves: Vec<Weave>,
}

impl WeaveArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.weaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weaves.is_empty()
    }

    pub fn get(&self, id: WeaveId) -> Result<&Weave, WeaveError> {
        self.weaves.get(id.0).ok_or(WeaveError::UnknownWeave(id.0))
    }

    fn get_mut(&mut self, id: WeaveId) -> Result<&mut Weave, WeaveError> {
        self.weaves.get_mut(id.0).ok_or(WeaveError::UnknownWeave(id.0))
    }

    pub fn weave_point(&self, location: WeavePointLocation) -> Result<WeavePoint<'_>, WeaveError> {
        self.get(location.weave)?
            .content
            .get(location.index)
            .and_then(Element::as_weave_point)
            .ok_or(WeaveError::NotAWeavePoint {
                weave: location.weave.0,
                index: location.index,
            })
    }

    pub fn weave_point_runtime(
        &self,
        location: WeavePointLocation,
    ) -> Result<WeavePointRuntime, WeaveError> {
        self.get(location.weave)?
            .runtime
            .get(&location.index)
            .copied()
            .ok_or(WeaveError::NotEmitted {
                weave: location.weave.0,
                index: location.index,
            })
    }

    /// Look up a label in the name table of a scope's outermost block.
    pub fn weave_point_named(
        &self,
        id: WeaveId,
        name: &str,
    ) -> Result<Option<WeavePointLocation>, WeaveError> {
        Ok(self
            .get(id)?
            .named_weave_points
            .as_ref()
            .and_then(|table| table.get(name))
            .copied())
    }

    /// The block that `id` was carved out of during Structural Recovery,
    /// or the block it was explicitly built within. `None` for the
    /// outermost block of a scope.
    pub fn closest_weave_ancestor(&self, id: WeaveId) -> Result<Option<WeaveId>, WeaveError> {
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent {
            self.get(parent)?;
        }
        Ok(parent)
    }

    pub fn receive_loose_ends(
        &mut self,
        id: WeaveId,
        loose_ends: Vec<LooseEnd>,
    ) -> Result<(), WeaveError> {
        self.get_mut(id)?.loose_ends.extend(loose_ends);
        Ok(())
    }

    /// Whether any block in the tree under `id` holds a choice.
    pub fn contains_choice(&self, id: WeaveId) -> Result<bool, WeaveError> {
        for weave in self.descendants(id)? {
            if self.get(weave)?.content.iter().any(Element::contains_choice) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `id` and every block nested below it, parents before children.
    pub fn descendants(&self, id: WeaveId) -> Result<Vec<WeaveId>, WeaveError> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children: Vec<WeaveId> = self.get(current)?.children().collect();
            stack.extend(children.into_iter().rev());
        }
        Ok(out)
    }
}
