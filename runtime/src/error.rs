use thiserror::Error;

/// Faults raised by the container graph. These indicate a bug in whatever
/// is assembling the graph, never a problem in the story being compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("unknown container #{0}")]
    UnknownContainer(usize),

    #[error("unknown divert #{0}")]
    UnknownDivert(usize),

    #[error("container #{0} is already attached to a parent")]
    AlreadyAttached(usize),

    #[error("container #{0} has no name and cannot be added as named content")]
    UnnamedContainer(usize),

    #[error("adding container #{child} under #{parent} would create a cycle")]
    Cycle { child: usize, parent: usize },

    #[error("invalid path `{0}`")]
    InvalidPath(String),
}
