use std::collections::BTreeMap;

use tracing::trace;

use crate::error::GraphError;
use crate::object::{Divert, DivertId, RuntimeObject};
use crate::path::{Path, PathComponent};

/// Handle to a container stored in a [`ContainerGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub(crate) usize);

impl ContainerId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A graph node: ordered content plus a name table.
///
/// `named_content` addresses children by name. A child can be in both
/// tables (entered by fallthrough *and* addressable), or only in
/// `named_content` (reachable by an explicit divert only).
#[derive(Debug, Clone, Default)]
pub struct Container {
    pub name: Option<String>,
    pub content: Vec<RuntimeObject>,
    pub named_content: BTreeMap<String, ContainerId>,
    pub parent: Option<ContainerId>,
}

impl Container {
    /// Named children that are not also part of the ordered content.
    pub fn named_only_content(&self) -> impl Iterator<Item = (&str, ContainerId)> + '_ {
        self.named_content
            .iter()
            .filter(|(_, id)| !self.content.contains(&RuntimeObject::Container(**id)))
            .map(|(name, id)| (name.as_str(), *id))
    }
}

/// Arena owning every container and divert produced by one compile.
#[derive(Debug, Default)]
pub struct ContainerGraph {
    containers: Vec<Container>,
    diverts: Vec<Divert>,
    root: Option<ContainerId>,
}

impl ContainerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_container(&mut self, name: Option<String>) -> ContainerId {
        let id = ContainerId(self.containers.len());
        self.containers.push(Container {
            name,
            ..Container::default()
        });
        id
    }

    pub fn get(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    fn get_mut(&mut self, id: ContainerId) -> Result<&mut Container, GraphError> {
        self.containers
            .get_mut(id.0)
            .ok_or(GraphError::UnknownContainer(id.0))
    }

    /// Rename a container that has not been attached anywhere yet.
    pub fn set_name(&mut self, id: ContainerId, name: impl Into<String>) -> Result<(), GraphError> {
        let container = self.get_mut(id)?;
        if container.parent.is_some() {
            return Err(GraphError::AlreadyAttached(id.0));
        }
        container.name = Some(name.into());
        Ok(())
    }

    pub fn root(&self) -> Option<ContainerId> {
        self.root
    }

    /// Mark the container every path is measured from.
    pub fn set_root(&mut self, id: ContainerId) -> Result<(), GraphError> {
        let container = self.get_mut(id)?;
        if container.parent.is_some() {
            return Err(GraphError::AlreadyAttached(id.0));
        }
        self.root = Some(id);
        Ok(())
    }

    /// Append an object to a container's ordered content. Named child
    /// containers are registered in the name table as well.
    pub fn add_content(
        &mut self,
        parent: ContainerId,
        object: RuntimeObject,
    ) -> Result<(), GraphError> {
        if let RuntimeObject::Container(child) = object {
            self.attach(parent, child)?;
            if let Some(name) = self.get_mut(child)?.name.clone() {
                self.get_mut(parent)?.named_content.insert(name, child);
            }
        } else if let RuntimeObject::Divert(divert) = object {
            if divert.0 >= self.diverts.len() {
                return Err(GraphError::UnknownDivert(divert.0));
            }
        }

        self.get_mut(parent)?.content.push(object);
        Ok(())
    }

    /// Register a child by name only. It will not be entered by
    /// fallthrough, only through a divert to its path.
    pub fn add_to_named_content_only(
        &mut self,
        parent: ContainerId,
        child: ContainerId,
    ) -> Result<(), GraphError> {
        let Some(name) = self.get_mut(child)?.name.clone() else {
            return Err(GraphError::UnnamedContainer(child.0));
        };
        self.attach(parent, child)?;
        self.get_mut(parent)?.named_content.insert(name, child);
        Ok(())
    }

    fn attach(&mut self, parent: ContainerId, child: ContainerId) -> Result<(), GraphError> {
        if self.get_mut(child)?.parent.is_some() || self.root == Some(child) {
            return Err(GraphError::AlreadyAttached(child.0));
        }

        // Refuse to hang a container underneath itself.
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(GraphError::Cycle {
                    child: child.0,
                    parent: parent.0,
                });
            }
            ancestor = self.get_mut(id)?.parent;
        }

        trace!(parent = parent.0, child = child.0, "attach container");
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn push_divert(&mut self, divert: Divert) -> DivertId {
        let id = DivertId(self.diverts.len());
        self.diverts.push(divert);
        id
    }

    pub fn divert(&self, id: DivertId) -> Option<&Divert> {
        self.diverts.get(id.0)
    }

    pub fn diverts(&self) -> impl Iterator<Item = (DivertId, &Divert)> {
        self.diverts
            .iter()
            .enumerate()
            .map(|(i, divert)| (DivertId(i), divert))
    }

    pub fn set_divert_target(&mut self, id: DivertId, path: Path) -> Result<(), GraphError> {
        let divert = self
            .diverts
            .get_mut(id.0)
            .ok_or(GraphError::UnknownDivert(id.0))?;
        divert.target_path = Some(path);
        Ok(())
    }

    /// Final address of a container, or `None` when its parent chain does
    /// not reach the root (the container is not part of the story yet).
    pub fn path_of(&self, id: ContainerId) -> Option<Path> {
        let root = self.root?;
        let mut components = Vec::new();
        let mut current = id;

        while current != root {
            let container = self.get(current)?;
            let parent_id = container.parent?;
            let parent = self.get(parent_id)?;

            let by_name = container
                .name
                .as_ref()
                .filter(|name| parent.named_content.get(name.as_str()) == Some(&current));

            let component = match by_name {
                Some(name) => PathComponent::Name(name.clone()),
                None => {
                    let index = parent
                        .content
                        .iter()
                        .position(|object| *object == RuntimeObject::Container(current))?;
                    PathComponent::Index(index)
                }
            };

            components.push(component);
            current = parent_id;
        }

        components.reverse();
        Some(Path::new(components))
    }

    /// A named container whose name in its parent's table now belongs to a
    /// different container.
    pub fn is_shadowed(&self, id: ContainerId) -> bool {
        let Some(container) = self.get(id) else {
            return false;
        };
        let (Some(name), Some(parent)) = (&container.name, container.parent) else {
            return false;
        };
        self.get(parent)
            .and_then(|parent| parent.named_content.get(name))
            .is_some_and(|owner| *owner != id)
    }

    /// Follow a path down from the root.
    pub fn container_at_path(&self, path: &Path) -> Option<ContainerId> {
        let mut current = self.root?;
        for component in path.components() {
            let container = self.get(current)?;
            current = match component {
                PathComponent::Name(name) => *container.named_content.get(name)?,
                PathComponent::Index(index) => container.content.get(*index)?.as_container()?,
            };
        }
        Some(current)
    }

    /// Depth-first walk in document order: ordered content first, then
    /// named-only children. Each entry carries its nesting depth below `id`.
    pub fn flatten(&self, id: ContainerId) -> Vec<(usize, RuntimeObject)> {
        let mut out = Vec::new();
        self.flatten_into(id, 0, &mut out);
        out
    }

    fn flatten_into(&self, id: ContainerId, depth: usize, out: &mut Vec<(usize, RuntimeObject)>) {
        let Some(container) = self.get(id) else {
            return;
        };

        for object in &container.content {
            out.push((depth, object.clone()));
            if let RuntimeObject::Container(child) = object {
                self.flatten_into(*child, depth + 1, out);
            }
        }

        for (_, child) in container.named_only_content() {
            out.push((depth, RuntimeObject::Container(child)));
            self.flatten_into(child, depth + 1, out);
        }
    }

    /// Render a container tree as indented text, one object per line.
    pub fn dump(&self, id: ContainerId) -> String {
        let mut out = String::new();
        self.dump_container(id, 0, "", &mut out);
        out
    }

    fn dump_container(&self, id: ContainerId, depth: usize, prefix: &str, out: &mut String) {
        let Some(container) = self.get(id) else {
            return;
        };

        let pad = "  ".repeat(depth);
        out.push_str(&format!(
            "{}{}[{}]\n",
            pad,
            prefix,
            container.name.as_deref().unwrap_or("")
        ));

        let inner = "  ".repeat(depth + 1);
        for object in &container.content {
            match object {
                RuntimeObject::Text(text) => out.push_str(&format!("{}{:?}\n", inner, text)),
                RuntimeObject::ChoicePoint(text) => out.push_str(&format!("{}* {}\n", inner, text)),
                RuntimeObject::Divert(divert) => match self.divert(*divert) {
                    Some(divert) => out.push_str(&format!("{}{}\n", inner, divert)),
                    None => out.push_str(&format!("{}-> <missing>\n", inner)),
                },
                RuntimeObject::Container(child) => self.dump_container(*child, depth + 1, "", out),
            }
        }

        for (_, child) in container.named_only_content() {
            self.dump_container(child, depth + 1, "(named) ", out);
        }
    }
}
