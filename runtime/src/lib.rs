pub mod container;
pub mod error;
pub mod object;
pub mod path;

pub use container::{Container, ContainerGraph, ContainerId};
pub use error::GraphError;
pub use object::{Divert, DivertId, RuntimeObject};
pub use path::{Path, PathComponent};
