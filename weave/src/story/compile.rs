use std::ops::Range;

use runtime::{ContainerGraph, ContainerId, Path};
use tracing::debug;

use crate::diagnostic::{CompileDiagnostic, DiagnosticKind, DiagnosticSink};
use crate::element::{Element, WeavePointKind};
use crate::error::WeaveError;
use crate::options::CompileOptions;
use crate::story::scope::{Resolved, Scope, ScopeId, ScopeTable, ScopeView};
use crate::story::{ScopeKind, Story};
use crate::weave::emit::Emitter;
use crate::weave::resolve::{ScopeLookup, check_collisions, resolve_pending};
use crate::weave::{LooseEnd, PendingReference, WeaveArena};

/// The result of compiling a story: the runtime graph plus everything
/// needed to inspect how it was built.
#[derive(Debug)]
pub struct Compilation {
    pub graph: ContainerGraph,
    pub arena: WeaveArena,
    pub scopes: ScopeTable,
    /// The story's own scope.
    pub story: ScopeId,
    /// The story's container, which is also the graph root.
    pub root: ContainerId,
}

impl Compilation {
    /// Container of a knot, stitch or label, addressed as an author would
    /// write it at the top level of the story (`forest.clearing.camp`).
    pub fn container_for(&self, target: &str) -> Option<ContainerId> {
        let resolved = self.scopes.resolve_target(&self.arena, self.story, target)?;
        self.scopes.container_of(&self.arena, resolved)
    }

    /// Final runtime address of `target`.
    pub fn path_of(&self, target: &str) -> Option<Path> {
        self.graph.path_of(self.container_for(target)?)
    }

    /// The scope of a knot (`forest`) or stitch (`forest.clearing`).
    pub fn scope(&self, target: &str) -> Option<&Scope> {
        match self.scopes.resolve_target(&self.arena, self.story, target)? {
            Resolved::Scope(id) => self.scopes.get(id),
            Resolved::WeavePoint(_) => None,
        }
    }
}

/// Run the weave pass over a whole story.
///
/// Problems in the story are sent to `sink` and never stop compilation. An
/// `Err` means the pass itself got into an inconsistent state.
pub fn compile_story(
    story: &Story,
    options: &CompileOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<Compilation, WeaveError> {
    let file_id = story.file_id;
    let mut arena = WeaveArena::new();
    let mut graph = ContainerGraph::new();
    let mut scopes = ScopeTable::default();

    let story_weave = arena.build(story.content.clone(), Some(0));
    let root = Emitter::new(&mut arena, &mut graph).emit(story_weave)?;
    graph.set_root(root)?;
    let story_scope = scopes.add(ScopeKind::Story, None, 0..0, None, story_weave, root);

    for knot in &story.knots {
        if let Some(existing) = scopes.sub_scope(story_scope, &knot.name) {
            report_duplicate(&scopes, existing, &knot.name, knot.span.clone(), file_id, sink);
            continue;
        }

        let knot_scope = add_scope(
            &mut arena,
            &mut graph,
            &mut scopes,
            ScopeKind::Knot,
            &knot.name,
            &knot.content,
            knot.span.clone(),
            story_scope,
        )?;

        for stitch in &knot.stitches {
            if let Some(existing) = scopes.sub_scope(knot_scope, &stitch.name) {
                report_duplicate(&scopes, existing, &stitch.name, stitch.span.clone(), file_id, sink);
                continue;
            }

            add_scope(
                &mut arena,
                &mut graph,
                &mut scopes,
                ScopeKind::Stitch,
                &stitch.name,
                &stitch.content,
                stitch.span.clone(),
                knot_scope,
            )?;
        }
    }

    let ids: Vec<ScopeId> = scopes.iter().map(|(id, _)| id).collect();

    for &id in &ids {
        let Some(scope) = scopes.get(id) else {
            continue;
        };

        report_loose_ends(&arena, scope, options, file_id, sink)?;

        // A label whose name a knot or stitch took over is already reported
        // as a collision; it has no address of its own.
        let hidden =
            |target: ContainerId| options.check_naming_collisions && graph.is_shadowed(target);
        let pending: Vec<PendingReference> = arena
            .get(scope.weave)?
            .pending_references()
            .iter()
            .filter(|reference| !hidden(reference.target))
            .copied()
            .collect();

        if let Err(errors) = resolve_pending(&mut graph, &pending) {
            for err in errors {
                sink.report(CompileDiagnostic::bug(
                    DiagnosticKind::DanglingReference,
                    err.to_string(),
                    scope.span.clone(),
                    file_id,
                ));
            }
        }

        resolve_named_references(&arena, &scopes, id, &mut graph, options, file_id, sink)?;
    }

    if options.check_naming_collisions {
        for &id in &ids {
            let Some(scope) = scopes.get(id) else {
                continue;
            };
            let views: Vec<ScopeView<'_>> = scopes
                .ancestry(id)
                .into_iter()
                .map(|scope| ScopeView {
                    table: &scopes,
                    arena: &arena,
                    scope,
                })
                .collect();
            let lookups: Vec<&dyn ScopeLookup> =
                views.iter().map(|view| view as &dyn ScopeLookup).collect();

            check_collisions(&arena, scope.weave, &lookups, file_id, sink)?;
        }
    }

    debug!(
        scopes = scopes.len(),
        weaves = arena.len(),
        containers = graph.len(),
        "compiled story"
    );

    Ok(Compilation {
        graph,
        arena,
        scopes,
        story: story_scope,
        root,
    })
}

/// Build and emit one knot or stitch, and hang its container under its
/// parent's by name.
#[allow(clippy::too_many_arguments)]
fn add_scope(
    arena: &mut WeaveArena,
    graph: &mut ContainerGraph,
    scopes: &mut ScopeTable,
    kind: ScopeKind,
    name: &str,
    content: &[Element],
    span: Range<usize>,
    parent: ScopeId,
) -> Result<ScopeId, WeaveError> {
    let weave = arena.build(content.to_vec(), Some(0));
    let container = Emitter::new(arena, graph).emit(weave)?;

    if let Some(parent_scope) = scopes.get(parent) {
        graph.set_name(container, name)?;
        graph.add_to_named_content_only(parent_scope.container, container)?;
    }

    debug!(kind = %kind, name, weave = weave.index(), "compiled scope");
    Ok(scopes.add(kind, Some(name.to_string()), span, Some(parent), weave, container))
}

fn report_duplicate(
    scopes: &ScopeTable,
    existing: ScopeId,
    name: &str,
    span: Range<usize>,
    file_id: usize,
    sink: &mut dyn DiagnosticSink,
) {
    let Some(existing) = scopes.get(existing) else {
        return;
    };
    sink.report(
        CompileDiagnostic::error(
            DiagnosticKind::DuplicateScope,
            format!("{} '{}' is defined more than once", existing.kind, name),
            span,
            file_id,
        )
        .with_secondary(existing.span.clone(), "first defined here")
        .with_note("the later definition is ignored"),
    );
}

/// Whatever is still a loose end at the outermost block of a scope runs
/// off the end of the scope.
fn report_loose_ends(
    arena: &WeaveArena,
    scope: &Scope,
    options: &CompileOptions,
    file_id: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), WeaveError> {
    for loose_end in arena.get(scope.weave)?.loose_ends() {
        match loose_end {
            LooseEnd::Divert { span, .. } => sink.report(
                CompileDiagnostic::error(
                    DiagnosticKind::LooseEnd,
                    format!("'->' at the end of {} has no gather to go to", scope.describe()),
                    span.clone(),
                    file_id,
                )
                .with_note("add a gather ('-') after it, or divert to a named target"),
            ),
            LooseEnd::WeavePoint(location) => {
                let point = arena.weave_point(*location)?;
                match point.kind() {
                    WeavePointKind::Choice => sink.report(
                        CompileDiagnostic::error(
                            DiagnosticKind::LooseEnd,
                            format!("choice runs out of content at the end of {}", scope.describe()),
                            point.span(),
                            file_id,
                        )
                        .with_note("add a divert to the choice, or a gather after it"),
                    ),
                    WeavePointKind::Gather if options.warn_on_loose_gathers => sink.report(
                        CompileDiagnostic::warning(
                            DiagnosticKind::LooseEnd,
                            format!("gather runs out of content at the end of {}", scope.describe()),
                            point.span(),
                            file_id,
                        ),
                    ),
                    WeavePointKind::Gather => {}
                }
            }
        }
    }
    Ok(())
}

fn resolve_named_references(
    arena: &WeaveArena,
    scopes: &ScopeTable,
    id: ScopeId,
    graph: &mut ContainerGraph,
    options: &CompileOptions,
    file_id: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), WeaveError> {
    let Some(scope) = scopes.get(id) else {
        return Ok(());
    };

    for reference in arena.get(scope.weave)?.named_references() {
        let container = scopes
            .resolve_target(arena, id, &reference.target)
            .and_then(|resolved| scopes.container_of(arena, resolved));

        let Some(container) = container else {
            sink.report(CompileDiagnostic::error(
                DiagnosticKind::UnresolvedTarget,
                format!(
                    "divert target not found: '{}' in {}",
                    reference.target,
                    scope.describe()
                ),
                reference.span.clone(),
                file_id,
            ));
            continue;
        };

        match graph.path_of(container) {
            Some(path) => graph.set_divert_target(reference.divert, path)?,
            None if options.check_naming_collisions && graph.is_shadowed(container) => {}
            None => sink.report(CompileDiagnostic::bug(
                DiagnosticKind::DanglingReference,
                format!("'{}' has no address in the story", reference.target),
                reference.span.clone(),
                file_id,
            )),
        }
    }

    Ok(())
}
