use std::collections::BTreeMap;

use tracing::debug;

use crate::element::Element;
use crate::weave::{Weave, WeaveArena, WeaveId, WeavePointLocation};

impl WeaveArena {
    /// Build the block tree for a flat element list.
    ///
    /// `base` is the indentation depth of the block; when `None` it is taken
    /// from the first weave point in `elements`. Passing `Some(0)` marks the
    /// outermost block of a scope, which is the only kind of block that
    /// keeps a table of named weave points.
    pub fn build(&mut self, elements: Vec<Element>, base: Option<u32>) -> WeaveId {
        self.recover(elements, base, None)
    }

    fn recover(&mut self, elements: Vec<Element>, base: Option<u32>, parent: Option<WeaveId>) -> WeaveId {
        let base_depth = base.unwrap_or_else(|| base_indentation_from_content(&elements));

        let id = WeaveId(self.weaves.len());
        self.weaves.push(Weave {
            base_indentation_depth: base_depth,
            parent,
            ..Weave::default()
        });

        // Replace every run of deeper weave points (plus whatever content
        // sits between them) with a nested block.
        let mut content = elements;
        let mut index = 0;
        while index < content.len() {
            if let Some(inner_depth) = content[index]
                .weave_point_depth()
                .filter(|depth| *depth > base_depth)
            {
                let start = index;
                while index < content.len() {
                    if content[index]
                        .weave_point_depth()
                        .is_some_and(|depth| depth <= base_depth)
                    {
                        break;
                    }
                    index += 1;
                }

                let run: Vec<Element> = content.drain(start..index).collect();
                let child = self.recover(run, Some(inner_depth), Some(id));
                content.insert(start, Element::Weave(child));

                // Carry on after the nested block.
                index = start;
            }
            index += 1;
        }

        debug!(
            weave = id.0,
            base_depth,
            elements = content.len(),
            "recovered weave"
        );

        if let Some(weave) = self.weaves.get_mut(id.0) {
            weave.content = content;
        }

        if base == Some(0) {
            let table = self.collect_named_weave_points(id);
            if let Some(weave) = self.weaves.get_mut(id.0) {
                weave.named_weave_points = Some(table);
            }
        }

        id
    }

    /// Every named weave point in the block tree under `root`. A later
    /// label with the same name (in document order) replaces an earlier one.
    fn collect_named_weave_points(&self, root: WeaveId) -> BTreeMap<String, WeavePointLocation> {
        let mut table = BTreeMap::new();
        self.collect_named_into(root, &mut table);
        table
    }

    fn collect_named_into(&self, id: WeaveId, table: &mut BTreeMap<String, WeavePointLocation>) {
        let Some(weave) = self.weaves.get(id.0) else {
            return;
        };

        for (index, element) in weave.content.iter().enumerate() {
            if let Element::Weave(child) = element {
                self.collect_named_into(*child, table);
                continue;
            }
            let Some(name) = element.as_weave_point().and_then(|point| point.name()) else {
                continue;
            };
            if !name.is_empty() {
                table.insert(name.to_string(), WeavePointLocation { weave: id, index });
            }
        }
    }
}

/// Depth of the first weave point, or 0 when there is none.
fn base_indentation_from_content(elements: &[Element]) -> u32 {
    elements
        .iter()
        .find_map(Element::weave_point_depth)
        .unwrap_or(0)
}
