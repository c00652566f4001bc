pub mod diagnostic;
pub mod element;
pub mod error;
pub mod options;
pub mod story;
pub mod weave;

pub use crate::diagnostic::{CompileDiagnostic, DiagnosticKind, DiagnosticSink};
pub use crate::element::{
    Choice, Compound, Divert, DivertTarget, Element, Gather, Text, WeavePoint, WeavePointKind,
};
pub use crate::error::WeaveError;
pub use crate::options::CompileOptions;
pub use crate::story::compile::{Compilation, compile_story};
pub use crate::story::scope::{Resolved, Scope, ScopeId, ScopeTable};
pub use crate::story::{Knot, ScopeKind, Stitch, Story};
pub use crate::weave::emit::Emitter;
pub use crate::weave::{LooseEnd, Weave, WeaveArena, WeaveId, WeavePointLocation};
