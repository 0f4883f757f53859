//! # Document
//!
//! Owner of the element tree and the id generator. The document itself is
//! deliberately dumb: it resolves ids, walks the tree, and hands out mutable
//! references. All policy (what may be deleted, merged, split; which
//! placeholders must exist) lives in the editor crate's fixers and commands.
//!
//! A new document starts with a root, one paragraph, and the paragraph's
//! content placeholder, the smallest tree satisfying the structural
//! invariants.

use crate::element::{Element, ElementId, ElementKind, PlaceholderKind};
use crate::format::Format;
use crate::id_generator::IdGenerator;
use serde::{Deserialize, Serialize};

/// Where an element sits in the tree: parent id plus linear child index
/// (row-major for grid parents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub parent: ElementId,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    root: Element,
    ids: IdGenerator,
}

// IdGenerator carries no structural state worth comparing
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Document {
    pub fn new(name: &str) -> Self {
        let mut ids = IdGenerator::new(name);
        let mut root = Element::new(ids.new_id(), ElementKind::Root, Format::default());
        let mut paragraph = Element::new(ids.new_id(), ElementKind::Paragraph, Format::default());
        paragraph.append_child(Element::new(
            ids.new_id(),
            ElementKind::Placeholder(PlaceholderKind::Generic),
            Format::default(),
        ));
        root.append_child(paragraph);
        Self { root, ids }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn root_id(&self) -> &str {
        self.root.id()
    }

    pub fn new_id(&mut self) -> ElementId {
        self.ids.new_id()
    }

    pub fn ids_mut(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    /// Create a bare, unattached element with a fresh id
    pub fn create_element(&mut self, kind: ElementKind, format: Format) -> Element {
        Element::new(self.ids.new_id(), kind, format)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.root.contains(id)
    }

    pub fn find(&self, id: &str) -> Option<&Element> {
        Self::find_in(&self.root, id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        Self::find_in_mut(&mut self.root, id)
    }

    fn find_in<'a>(element: &'a Element, id: &str) -> Option<&'a Element> {
        if element.id() == id {
            return Some(element);
        }
        element
            .children()
            .iter()
            .find_map(|child| Self::find_in(child, id))
    }

    fn find_in_mut<'a>(element: &'a mut Element, id: &str) -> Option<&'a mut Element> {
        if element.id() == id {
            return Some(element);
        }
        element
            .children_mut()
            .iter_mut()
            .find_map(|child| Self::find_in_mut(child, id))
    }

    /// Locate an element's parent and child index; `None` for the root and
    /// for unknown ids
    pub fn locate(&self, id: &str) -> Option<Location> {
        Self::locate_in(&self.root, id)
    }

    fn locate_in(element: &Element, id: &str) -> Option<Location> {
        if let Some(index) = element.index_of(id) {
            return Some(Location {
                parent: element.id().to_string(),
                index,
            });
        }
        element
            .children()
            .iter()
            .find_map(|child| Self::locate_in(child, id))
    }

    pub fn parent_of(&self, id: &str) -> Option<&Element> {
        let location = self.locate(id)?;
        self.find(&location.parent)
    }

    /// Ancestor chain from the element's parent up to the root (inclusive)
    pub fn ancestors(&self, id: &str) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut current = id.to_string();
        while let Some(location) = self.locate(&current) {
            chain.push(location.parent.clone());
            current = location.parent;
        }
        chain
    }

    /// The root child whose subtree contains `id` (the id itself if it is a
    /// root child); `None` for the root and unknown ids
    pub fn top_level_ancestor(&self, id: &str) -> Option<ElementId> {
        if self.root.index_of(id).is_some() {
            return Some(id.to_string());
        }
        let chain = self.ancestors(id);
        if chain.is_empty() {
            return None;
        }
        // chain ends at the root; the entry before it is the top-level child
        if chain.len() == 1 {
            // parent is the root, so id itself is top-level; handled above
            // unless id was unknown
            return self.contains(id).then(|| id.to_string());
        }
        Some(chain[chain.len() - 2].clone())
    }

    /// Detach the positional child at `location`, returning it
    pub fn detach(&mut self, location: &Location) -> Element {
        let parent = self
            .find_mut(&location.parent)
            .expect("detach location must reference a live parent");
        parent.remove_child(location.index)
    }

    /// Preorder visit of every element
    pub fn for_each(&self, mut visit: impl FnMut(&Element)) {
        fn walk(element: &Element, visit: &mut impl FnMut(&Element)) {
            visit(element);
            for child in element.children() {
                walk(child, visit);
            }
        }
        walk(&self.root, &mut visit);
    }
}
