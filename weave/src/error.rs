use runtime::GraphError;
use thiserror::Error;

/// Internal consistency faults of the weave pass.
///
/// Problems in the story itself are never reported through this type; they
/// go to the [`DiagnosticSink`](crate::diagnostic::DiagnosticSink) and
/// compilation carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeaveError {
    #[error("unknown weave #{0}")]
    UnknownWeave(usize),

    #[error("no weave point at index {index} of weave #{weave}")]
    NotAWeavePoint { weave: usize, index: usize },

    #[error("weave point at index {index} of weave #{weave} has not been emitted")]
    NotEmitted { weave: usize, index: usize },

    #[error("nested weave #{0} found outside of weave content")]
    MisplacedWeave(usize),

    #[error("divert #{divert} targets container #{target}, which has no address in the story")]
    DanglingReference { divert: usize, target: usize },

    #[error(transparent)]
    Graph(#[from] GraphError),
}
