use serde::Deserialize;

/// Knobs for [`compile_story`](crate::compile_story).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Report weave point labels that clash with an enclosing knot or stitch.
    pub check_naming_collisions: bool,
    /// Warn when a gather runs off the end of its knot, stitch or story.
    /// Choices and `->` diverts in that position are always errors.
    pub warn_on_loose_gathers: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            check_naming_collisions: true,
            warn_on_loose_gathers: true,
        }
    }
}
