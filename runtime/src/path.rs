use std::fmt;
use std::str::FromStr;

use crate::error::GraphError;

/// One step of a [`Path`]: either a child's name or its index in the
/// parent's ordered content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    Name(String),
    Index(usize),
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::Name(name) => write!(f, "{}", name),
            PathComponent::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Absolute address of a container, measured from the graph root.
/// The root itself has the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    components: Vec<PathComponent>,
}

impl Path {
    pub fn new(components: Vec<PathComponent>) -> Self {
        Path { components }
    }

    pub fn root() -> Self {
        Path::default()
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = GraphError;

    /// Parse a dot-separated path. Purely numeric components are indices.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Path::root());
        }

        let mut components = Vec::new();
        for part in s.split('.') {
            if part.is_empty() {
                return Err(GraphError::InvalidPath(s.to_string()));
            }
            let component = match part.parse::<usize>() {
                Ok(index) => PathComponent::Index(index),
                Err(_) => PathComponent::Name(part.to_string()),
            };
            components.push(component);
        }
        Ok(Path { components })
    }
}
