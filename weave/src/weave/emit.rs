use std::mem;
use std::ops::Range;

use runtime::{ContainerGraph, ContainerId, DivertId, RuntimeObject};
use tracing::{debug, trace};

use crate::element::{DivertTarget, Element, WeavePoint, WeavePointKind};
use crate::error::WeaveError;
use crate::weave::{
    LooseEnd, NamedReference, PendingReference, WeaveArena, WeaveId, WeavePointLocation,
    WeavePointRuntime,
};

/// Emits runtime containers for the blocks of a [`WeaveArena`].
///
/// Children are emitted before their parents finish, since a parent needs a
/// child's root container as an opaque content item. Each block is emitted
/// at most once; later calls return the cached container.
pub struct Emitter<'a> {
    arena: &'a mut WeaveArena,
    graph: &'a mut ContainerGraph,
}

/// Working state of one block's emission.
#[derive(Debug)]
struct EmitState {
    /// Where general content goes; a gather replaces it with its own container.
    current: ContainerId,
    previous_weave_point: Option<WeavePointLocation>,
    /// Content after a loose choice belongs inside that choice.
    add_to_previous_weave_point: bool,
    /// Decides whether the next gather is entered by fallthrough.
    has_seen_choice_in_section: bool,
    unnamed_gather_count: usize,
}

impl EmitState {
    fn new(root: ContainerId) -> Self {
        EmitState {
            current: root,
            previous_weave_point: None,
            add_to_previous_weave_point: false,
            has_seen_choice_in_section: false,
            unnamed_gather_count: 0,
        }
    }
}

enum Step {
    WeavePoint(WeavePointKind),
    Nested(WeaveId),
    Other,
}

impl<'a> Emitter<'a> {
    pub fn new(arena: &'a mut WeaveArena, graph: &'a mut ContainerGraph) -> Self {
        Emitter { arena, graph }
    }

    pub fn emit(&mut self, id: WeaveId) -> Result<ContainerId, WeaveError> {
        if let Some(root) = self.arena.get(id)?.root_container {
            return Ok(root);
        }

        let root = self.graph.new_container(None);
        let mut state = EmitState::new(root);

        // Normal content is nested under choices and gathers, deeper blocks
        // recurse, and loose ends are collected for the next gather.
        let len = self.arena.get(id)?.content.len();
        for index in 0..len {
            let location = WeavePointLocation { weave: id, index };
            match self.step_for(location)? {
                Step::WeavePoint(kind) => self.add_weave_point(&mut state, location, kind)?,
                Step::Nested(child) => self.add_nested_weave(&mut state, id, child)?,
                Step::Other => self.add_other_content(&mut state, location)?,
            }
        }

        self.pass_loose_ends_to_ancestors(id)?;

        let weave = self.arena.get_mut(id)?;
        weave.root_container = Some(root);
        debug!(
            weave = id.0,
            container = root.index(),
            pending = weave.pending_references.len(),
            loose_ends = weave.loose_ends.len(),
            "emitted weave"
        );

        Ok(root)
    }

    fn step_for(&self, location: WeavePointLocation) -> Result<Step, WeaveError> {
        let weave = self.arena.get(location.weave)?;
        Ok(match weave.content.get(location.index) {
            Some(Element::Weave(child)) => Step::Nested(*child),
            Some(element) => match element.as_weave_point() {
                Some(point) => Step::WeavePoint(point.kind()),
                None => Step::Other,
            },
            None => Step::Other,
        })
    }

    fn add_weave_point(
        &mut self,
        state: &mut EmitState,
        location: WeavePointLocation,
        kind: WeavePointKind,
    ) -> Result<(), WeaveError> {
        let runtime = self.lower_weave_point(location)?;

        match kind {
            WeavePointKind::Gather => self.add_gather(state, location, runtime)?,
            WeavePointKind::Choice => {
                // A gather that goes straight into a choice is no longer a
                // loose end: the choice is its content.
                if let Some(previous) = state.previous_weave_point {
                    if self.arena.weave_point(previous)?.kind() == WeavePointKind::Gather {
                        self.remove_loose_end(previous)?;
                    }
                }

                self.graph
                    .add_content(state.current, RuntimeObject::Container(runtime.container))?;
                state.has_seen_choice_in_section = true;
            }
        }

        state.add_to_previous_weave_point = false;
        let point = self.arena.weave_point(location)?;
        if point.has_loose_end() {
            let explicit_gather =
                matches!(point, WeavePoint::Choice(choice) if choice.has_explicit_gather());

            self.arena
                .get_mut(location.weave)?
                .loose_ends
                .push(LooseEnd::WeavePoint(location));

            // A choice ending in `->` has said where it goes; anything else
            // that follows belongs to the choice.
            if kind == WeavePointKind::Choice && !explicit_gather {
                state.add_to_previous_weave_point = true;
            }
        }
        state.previous_weave_point = Some(location);

        Ok(())
    }

    /// Collect the loose ends so far into this gather and make it the
    /// container for whatever follows.
    fn add_gather(
        &mut self,
        state: &mut EmitState,
        location: WeavePointLocation,
        runtime: WeavePointRuntime,
    ) -> Result<(), WeaveError> {
        // Auto-entered only if there were no choices since the last gather.
        let auto_enter = !state.has_seen_choice_in_section;
        state.has_seen_choice_in_section = false;

        let gather = self.arena.weave_point(location)?;
        let depth = gather.indentation_depth();
        let gather_container = runtime.container;

        if gather.name().is_none() {
            // '-' can't appear in a label, so this never collides.
            let name = format!("g-{}", state.unnamed_gather_count);
            state.unnamed_gather_count += 1;
            self.graph.set_name(gather_container, name)?;
        }

        if auto_enter {
            self.graph
                .add_content(state.current, RuntimeObject::Container(gather_container))?;
        } else {
            self.graph
                .add_to_named_content_only(state.current, gather_container)?;
        }

        let loose_ends = mem::take(&mut self.arena.get_mut(location.weave)?.loose_ends);
        let mut pending = Vec::with_capacity(loose_ends.len());

        for loose_end in loose_ends {
            let divert = match loose_end {
                LooseEnd::Divert { divert, .. } => divert,
                LooseEnd::WeavePoint(loose) => {
                    let point = self.arena.weave_point(loose)?;

                    // An earlier gather at this depth holds this one as its
                    // content, so falling through already gets here.
                    if auto_enter
                        && point.kind() == WeavePointKind::Gather
                        && point.indentation_depth() == depth
                    {
                        trace!(weave = loose.weave.0, index = loose.index, "gather falls through");
                        continue;
                    }

                    self.divert_for_weave_point(loose)?
                }
            };

            trace!(
                divert = divert.index(),
                gather = gather_container.index(),
                "loose end wired to gather"
            );
            pending.push(PendingReference {
                divert,
                target: gather_container,
            });
        }

        self.arena
            .get_mut(location.weave)?
            .pending_references
            .extend(pending);

        state.current = gather_container;
        Ok(())
    }

    /// Reuse a trailing `->` if the weave point has one, otherwise append a
    /// fresh divert to its container.
    fn divert_for_weave_point(&mut self, location: WeavePointLocation) -> Result<DivertId, WeaveError> {
        let runtime = self.arena.weave_point_runtime(location)?;
        if let Some(divert) = runtime.terminating_divert {
            return Ok(divert);
        }

        let divert = self.graph.push_divert(runtime::Divert::to_gather());
        self.graph
            .add_content(runtime.container, RuntimeObject::Divert(divert))?;
        Ok(divert)
    }

    /// Create the container for a weave point and record it as the weave
    /// point's back-reference.
    fn lower_weave_point(
        &mut self,
        location: WeavePointLocation,
    ) -> Result<WeavePointRuntime, WeaveError> {
        let point = self.arena.weave_point(location)?;
        let container = self.graph.new_container(point.name().map(str::to_string));

        if let WeavePoint::Choice(choice) = point {
            self.graph
                .add_content(container, RuntimeObject::ChoicePoint(choice.text.clone()))?;
        }

        let mut lowered = Lowered::default();
        for element in point.content().unwrap_or_default() {
            if let Some(object) = lower_element(self.graph, element, &mut lowered)? {
                self.graph.add_content(container, object)?;
            }
        }

        let terminating_divert = match point.terminating_divert() {
            Some(divert) if divert.is_to_gather() => self
                .graph
                .get(container)
                .and_then(|c| c.content.last())
                .and_then(RuntimeObject::as_divert),
            _ => None,
        };

        let runtime = WeavePointRuntime {
            container,
            terminating_divert,
        };

        let weave = self.arena.get_mut(location.weave)?;
        weave.runtime.insert(location.index, runtime);
        weave.named_references.extend(lowered.named_references);

        Ok(runtime)
    }

    /// Add a block at a deeper indentation level.
    fn add_nested_weave(
        &mut self,
        state: &mut EmitState,
        id: WeaveId,
        child: WeaveId,
    ) -> Result<(), WeaveError> {
        let child_root = self.emit(child)?;
        self.add_general_content(state, RuntimeObject::Container(child_root))?;

        let child_weave = self.arena.get(child)?;
        let pending = child_weave.pending_references.clone();
        let named = child_weave.named_references.clone();

        let weave = self.arena.get_mut(id)?;
        weave.pending_references.extend(pending);
        weave.named_references.extend(named);

        // The previous weave point now has somewhere to go.
        if let Some(previous) = state.previous_weave_point {
            self.remove_loose_end(previous)?;
            state.add_to_previous_weave_point = false;
        }

        // Deeper choices still stop the next gather being entered by fallthrough.
        if self.arena.contains_choice(child)? {
            state.has_seen_choice_in_section = true;
        }

        Ok(())
    }

    /// Plain content, possibly with structure of its own.
    fn add_other_content(
        &mut self,
        state: &mut EmitState,
        location: WeavePointLocation,
    ) -> Result<(), WeaveError> {
        let mut lowered = Lowered::default();
        let object = match self.arena.get(location.weave)?.content.get(location.index) {
            Some(element) => lower_element(self.graph, element, &mut lowered)?,
            None => None,
        };

        // Any `->` in here, however deeply nested, is an unterminated path.
        let weave = self.arena.get_mut(location.weave)?;
        weave.loose_ends.extend(
            lowered
                .gather_diverts
                .into_iter()
                .map(|(divert, span)| LooseEnd::Divert { divert, span }),
        );
        weave.named_references.extend(lowered.named_references);

        if let Some(object) = object {
            self.add_general_content(state, object)?;
        }

        if lowered.contains_choice {
            state.has_seen_choice_in_section = true;
        }

        Ok(())
    }

    /// General content goes into the previous weave point when it is still
    /// open, otherwise into the current container.
    fn add_general_content(
        &mut self,
        state: &EmitState,
        object: RuntimeObject,
    ) -> Result<(), WeaveError> {
        let target = match state.previous_weave_point {
            Some(previous) if state.add_to_previous_weave_point => {
                self.arena.weave_point_runtime(previous)?.container
            }
            _ => state.current,
        };
        self.graph.add_content(target, object)?;
        Ok(())
    }

    fn remove_loose_end(&mut self, location: WeavePointLocation) -> Result<(), WeaveError> {
        let loose_ends = &mut self.arena.get_mut(location.weave)?.loose_ends;
        if let Some(position) = loose_ends
            .iter()
            .position(|loose_end| *loose_end == LooseEnd::WeavePoint(location))
        {
            loose_ends.remove(position);
        }
        Ok(())
    }

    fn pass_loose_ends_to_ancestors(&mut self, id: WeaveId) -> Result<(), WeaveError> {
        if self.arena.get(id)?.loose_ends.is_empty() {
            return Ok(());
        }

        if let Some(ancestor) = self.arena.closest_weave_ancestor(id)? {
            let loose_ends = mem::take(&mut self.arena.get_mut(id)?.loose_ends);
            trace!(
                weave = id.0,
                ancestor = ancestor.0,
                count = loose_ends.len(),
                "passing loose ends up"
            );
            self.arena.receive_loose_ends(ancestor, loose_ends)?;
        }

        Ok(())
    }
}

/// Side products of lowering a piece of content.
#[derive(Debug, Default)]
struct Lowered {
    /// Every `->` found, with its source span.
    gather_diverts: Vec<(DivertId, Range<usize>)>,
    named_references: Vec<NamedReference>,
    contains_choice: bool,
}

/// Runtime form of a single element. Nested content is lowered into fresh
/// anonymous (or, for weave points, named) containers.
fn lower_element(
    graph: &mut ContainerGraph,
    element: &Element,
    lowered: &mut Lowered,
) -> Result<Option<RuntimeObject>, WeaveError> {
    let object = match element {
        Element::Text(text) => RuntimeObject::Text(text.text.clone()),
        Element::Divert(divert) => {
            let id = graph.push_divert(divert.to_runtime());
            match &divert.target {
                DivertTarget::Gather => lowered.gather_diverts.push((id, divert.span.clone())),
                DivertTarget::Named(target) => lowered.named_references.push(NamedReference {
                    divert: id,
                    target: target.clone(),
                    span: divert.span.clone(),
                }),
            }
            RuntimeObject::Divert(id)
        }
        Element::Choice(choice) => {
            lowered.contains_choice = true;
            let container = graph.new_container(choice.name.clone());
            graph.add_content(container, RuntimeObject::ChoicePoint(choice.text.clone()))?;
            lower_into(graph, container, choice.content.as_deref().unwrap_or_default(), lowered)?;
            RuntimeObject::Container(container)
        }
        Element::Gather(gather) => {
            let container = graph.new_container(gather.name.clone());
            lower_into(graph, container, gather.content.as_deref().unwrap_or_default(), lowered)?;
            RuntimeObject::Container(container)
        }
        Element::Compound(compound) => {
            let container = graph.new_container(None);
            lower_into(graph, container, &compound.content, lowered)?;
            RuntimeObject::Container(container)
        }
        Element::Weave(id) => return Err(WeaveError::MisplacedWeave(id.index())),
    };

    Ok(Some(object))
}

fn lower_into(
    graph: &mut ContainerGraph,
    container: ContainerId,
    elements: &[Element],
    lowered: &mut Lowered,
) -> Result<(), WeaveError> {
    for element in elements {
        if let Some(object) = lower_element(graph, element, lowered)? {
            graph.add_content(container, object)?;
        }
    }
    Ok(())
}
