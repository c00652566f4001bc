use std::ops::Range;

use runtime::ContainerGraph;
use tracing::warn;

use crate::diagnostic::{CompileDiagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::WeaveError;
use crate::weave::{PendingReference, WeaveArena, WeaveId, WeavePointLocation};

/// Write final addresses into diverts that were wired to gathers.
///
/// Must run after the whole story graph has been assembled. Every pair is
/// attempted; those whose target has no address are returned as
/// [`WeaveError::DanglingReference`] and their divert is left unresolved.
pub fn resolve_pending(
    graph: &mut ContainerGraph,
    pending: &[PendingReference],
) -> Result<(), Vec<WeaveError>> {
    let mut errors = Vec::new();

    for reference in pending {
        let Some(path) = graph.path_of(reference.target) else {
            warn!(
                divert = reference.divert.index(),
                target = reference.target.index(),
                "gather has no address"
            );
            errors.push(WeaveError::DanglingReference {
                divert: reference.divert.index(),
                target: reference.target.index(),
            });
            continue;
        };

        if let Err(err) = graph.set_divert_target(reference.divert, path) {
            errors.push(err.into());
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Something a weave point label can clash with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedContent {
    /// Human-readable kind, e.g. `Knot` or `Gather`.
    pub kind: String,
    pub span: Range<usize>,
    /// Set when the content is itself a weave point.
    pub weave_point: Option<WeavePointLocation>,
}

/// A scope enclosing a weave, searchable by name one level deep.
pub trait ScopeLookup {
    fn content_with_name_at_level(&self, name: &str) -> Option<NamedContent>;
}

/// Report every named weave point of `root` that shares its name with
/// something else in one of `ancestors` (innermost first).
pub fn check_collisions(
    arena: &WeaveArena,
    root: WeaveId,
    ancestors: &[&dyn ScopeLookup],
    file_id: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), WeaveError> {
    let Some(table) = arena.get(root)?.named_weave_points.as_ref() else {
        return Ok(());
    };

    for (name, location) in table {
        let point = arena.weave_point(*location)?;
        // A knot is found both as itself and as a sub-scope of the story.
        let mut reported: Vec<NamedContent> = Vec::new();

        for ancestor in ancestors {
            let Some(other) = ancestor.content_with_name_at_level(name) else {
                continue;
            };
            if other.weave_point == Some(*location) || reported.contains(&other) {
                continue;
            }
            reported.push(other.clone());

            sink.report(
                CompileDiagnostic::error(
                    DiagnosticKind::NamingCollision,
                    format!(
                        "{} '{}' has the same label name as a {}",
                        point.kind(),
                        name,
                        other.kind
                    ),
                    point.span(),
                    file_id,
                )
                .with_secondary(other.span, format!("{} '{}' is defined here", other.kind, name)),
            );
        }
    }

    Ok(())
}
