//! # Fixer Policy Framework
//!
//! All kind-specific structural rules live here, so the command layer stays
//! kind-agnostic. One fixer is registered per structural category; commands
//! look it up through the [`crate::EditContext`] and consult it before and
//! after every tree mutation.
//!
//! Fixers are pure policy plus repair: the query methods answer "is this
//! edit legal", the mutating hooks restore the structural invariants the
//! edit may have broken (missing FIXED slots, lost trailing placeholders,
//! empty grid rows). Defaults are conservative: merging and splitting are
//! opt-in, deletion is allowed, repair hooks are no-ops.

mod function;
mod grid;
mod list;
mod operator;
mod paragraph;
mod placeholder;
mod root;
mod text;

pub use function::FunctionFixer;
pub use grid::GridFixer;
pub use list::ListFixer;
pub use operator::OperatorFixer;
pub use paragraph::ParagraphFixer;
pub use placeholder::PlaceholderFixer;
pub use root::RootFixer;
pub use text::TextFixer;

use crate::errors::{EditError, EditResult};
use mathdoc_model::{
    Category, ChildPlacement, CursorStateCollection, Document, Element, ElementCursor, ElementKind,
    Format, IdGenerator, PlaceholderKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Why an element is being deleted; placeholder policy keys on this
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteReason {
    /// Explicit user delete of a single element
    UserDelete,
    /// Deletion as part of a selection delete
    SelectionDelete,
    /// Removal of the right-hand element after a merge
    MergeCleanup,
    /// Internal repair (placeholder pruning, slot refill)
    StructureCleanup,
}

/// Why an element is being split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitReason {
    InsertElement,
    Paste,
}

/// Per-category structural policy
///
/// All operations take explicit document/element arguments; fixers hold no
/// state and are registered once per process-equivalent context.
pub trait Fixer: fmt::Debug + Send + Sync {
    /// May this element itself be deleted for `reason`?
    fn is_delete_allowed(&self, _doc: &Document, _element: &str, _reason: DeleteReason) -> bool {
        true
    }

    /// Parent-level veto over deleting one of its children
    fn is_delete_child_allowed(
        &self,
        _doc: &Document,
        _parent: &str,
        _child: &str,
        _reason: DeleteReason,
    ) -> bool {
        true
    }

    /// May `left` and `right` (adjacent siblings) coalesce into one element?
    /// Consulted on both elements; `checking_left` says which side this call
    /// is for.
    fn is_merge_allowed(
        &self,
        _doc: &Document,
        _left: &str,
        _right: &str,
        _checking_left: bool,
        _check_formats: bool,
    ) -> bool {
        false
    }

    /// Parent-level veto over merging two of its children. The default
    /// requires common ancestry; grid kinds additionally require common
    /// group (row) membership.
    fn is_merge_children_allowed(&self, doc: &Document, first: &str, second: &str) -> bool {
        match (doc.locate(first), doc.locate(second)) {
            (Some(a), Some(b)) => a.parent == b.parent,
            _ => false,
        }
    }

    /// Perform the merge, keeping the left element's format and retargeting
    /// cursors that pointed into the right element. Returns the cursor at
    /// the junction, or `Invalid` when no retargeting was needed or the
    /// preconditions did not actually hold (defensive re-check; the command
    /// layer validates first).
    fn merge_elements(
        &self,
        _doc: &mut Document,
        _left: &str,
        _right: &str,
        _cursors: &mut CursorStateCollection,
    ) -> ElementCursor {
        ElementCursor::Invalid
    }

    /// May this element be split in two at `cursor`?
    fn is_split_allowed(
        &self,
        _doc: &Document,
        _element: &str,
        _reason: SplitReason,
        _cursor: &ElementCursor,
    ) -> bool {
        false
    }

    /// Post-split repair on the two halves (both already attached)
    fn process_split_children(
        &self,
        _doc: &mut Document,
        _left: &str,
        _right: &str,
        _reason: SplitReason,
        _cursors: &mut CursorStateCollection,
    ) {
    }

    /// Normalize a detached element's children before it enters the tree
    /// (fill FIXED slots, ensure required trailing placeholders)
    fn pre_insert(&self, _element: &mut Element, _ids: &mut IdGenerator) {}

    /// The single mutating entry point for removing a child. Guarantees
    /// afterwards that FIXED parents have no vacant slot and that
    /// required-non-empty POSITIONAL parents keep at least one child.
    fn delete_child(
        &self,
        doc: &mut Document,
        parent: &str,
        child: &str,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        let placement = doc
            .find(parent)
            .ok_or_else(|| EditError::ElementNotFound(parent.to_string()))?
            .placement();
        match placement {
            ChildPlacement::Positional => {
                remove_positional_child(doc, parent, child, cursors)?;
                Ok(())
            }
            ChildPlacement::Fixed | ChildPlacement::Grid => {
                refill_slot(doc, parent, child, PlaceholderKind::Generic, cursors)
            }
            ChildPlacement::None => Err(EditError::WrongPlacement),
        }
    }

    /// Cleanup after a paste inserted the child at `child_index`
    fn post_paste_child(
        &self,
        _doc: &mut Document,
        _parent: &str,
        _child_index: usize,
        _cursors: &mut CursorStateCollection,
    ) {
    }

    /// Whole-element cleanup after a paste completed
    fn post_paste(&self, _doc: &mut Document, _element: &str, _cursors: &mut CursorStateCollection) {
    }

    /// React to a format change on an attached element (kinds whose required
    /// children depend on format)
    fn post_format_change(
        &self,
        _doc: &mut Document,
        _element: &str,
        _old_format: &Format,
        _cursors: &mut CursorStateCollection,
    ) {
    }

    /// Post-copy cleanup on a detached clipboard clone
    fn process_copied_clone(&self, _element: &mut Element) {}

    /// Default per-cell content for a new grid row (grid kinds only)
    fn pre_insert_row(&self, _doc: &mut Document, _element: &str) -> Vec<Element> {
        Vec::new()
    }

    /// Default per-cell content for a new grid column (grid kinds only)
    fn pre_insert_column(&self, _doc: &mut Document, _element: &str) -> Vec<Element> {
        Vec::new()
    }
}

/// Catch-all policy for kinds without structural rules of their own
/// (page breaks)
#[derive(Debug)]
pub struct DefaultFixer;

impl Fixer for DefaultFixer {}

/// Immutable-after-init category → fixer lookup table
#[derive(Debug)]
pub struct FixerRegistry {
    fixers: HashMap<Category, Box<dyn Fixer>>,
    fallback: DefaultFixer,
}

impl FixerRegistry {
    /// Registry with the standard fixer per category
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            fixers: HashMap::new(),
            fallback: DefaultFixer,
        };
        registry.register(Category::Root, Box::new(RootFixer));
        registry.register(Category::Paragraph, Box::new(ParagraphFixer));
        registry.register(Category::Text, Box::new(TextFixer));
        registry.register(Category::Placeholder, Box::new(PlaceholderFixer));
        registry.register(Category::Operator, Box::new(OperatorFixer));
        registry.register(Category::List, Box::new(ListFixer));
        registry.register(Category::Grid, Box::new(GridFixer));
        registry.register(Category::Function, Box::new(FunctionFixer));
        registry.register(Category::PageBreak, Box::new(DefaultFixer));
        registry
    }

    /// Replace the fixer for a category; meant for startup configuration,
    /// before the registry is shared
    pub fn register(&mut self, category: Category, fixer: Box<dyn Fixer>) {
        self.fixers.insert(category, fixer);
    }

    pub fn for_kind(&self, kind: &ElementKind) -> &dyn Fixer {
        self.for_category(kind.category())
    }

    pub fn for_category(&self, category: Category) -> &dyn Fixer {
        self.fixers
            .get(&category)
            .map(Box::as_ref)
            .unwrap_or(&self.fallback)
    }
}

// ---- shared repair helpers ----

pub(crate) fn make_placeholder(ids: &mut IdGenerator, kind: PlaceholderKind) -> Element {
    Element::new(ids.new_id(), ElementKind::Placeholder(kind), Format::default())
}

/// Remove a positional child. Stranded cursors move to the next sibling,
/// falling back to the previous sibling and then the parent.
pub(crate) fn remove_positional_child(
    doc: &mut Document,
    parent: &str,
    child: &str,
    cursors: &mut CursorStateCollection,
) -> EditResult<Element> {
    let parent_el = doc
        .find_mut(parent)
        .ok_or_else(|| EditError::ElementNotFound(parent.to_string()))?;
    let index = parent_el
        .index_of(child)
        .ok_or_else(|| EditError::ElementNotFound(child.to_string()))?;
    let removed = parent_el.remove_child(index);

    let successor = parent_el
        .child(index)
        .or_else(|| index.checked_sub(1).and_then(|i| parent_el.child(i)))
        .map(|sibling| ElementCursor::At(sibling.id().to_string()))
        .unwrap_or_else(|| ElementCursor::At(parent.to_string()));
    cursors.notify_removed(&removed, successor);
    Ok(removed)
}

/// Swap the slot holding `child` for a fresh placeholder of `kind`
pub(crate) fn refill_slot(
    doc: &mut Document,
    parent: &str,
    child: &str,
    kind: PlaceholderKind,
    cursors: &mut CursorStateCollection,
) -> EditResult<()> {
    let placeholder = make_placeholder(doc.ids_mut(), kind);
    let placeholder_id = placeholder.id().to_string();

    let parent_el = doc
        .find_mut(parent)
        .ok_or_else(|| EditError::ElementNotFound(parent.to_string()))?;
    let index = parent_el
        .index_of(child)
        .ok_or_else(|| EditError::ElementNotFound(child.to_string()))?;
    let old = parent_el.replace_child(index, placeholder);
    cursors.notify_replaced(&old, &placeholder_id);
    Ok(())
}

/// Append a trailing placeholder of `kind` unless the last child already is
/// a placeholder. Returns whether one was added.
pub(crate) fn ensure_trailing_placeholder(
    element: &mut Element,
    ids: &mut IdGenerator,
    kind: PlaceholderKind,
) -> bool {
    let needs = element
        .children()
        .last()
        .map_or(true, |last| !last.is_placeholder());
    if needs {
        element.append_child(make_placeholder(ids, kind));
    }
    needs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_category() {
        let registry = FixerRegistry::with_defaults();

        // Each category resolves to a registered fixer with its own policy;
        // the probe: text opts into merging, page break keeps the defaults
        let doc = Document::new("test");
        assert!(!registry
            .for_kind(&ElementKind::PageBreak)
            .is_merge_allowed(&doc, "a", "b", true, false));
        assert!(registry
            .for_category(Category::Placeholder)
            .is_delete_allowed(&doc, "a", DeleteReason::UserDelete));
    }

    #[test]
    fn test_default_merge_children_requires_common_parent() {
        let mut doc = Document::new("test");
        let paragraph_id = doc.root().child(0).unwrap().id().to_string();
        let a = doc.create_element(ElementKind::Text, Format::default());
        let b = doc.create_element(ElementKind::Text, Format::default());
        let (a_id, b_id) = (a.id().to_string(), b.id().to_string());
        {
            let paragraph = doc.find_mut(&paragraph_id).unwrap();
            paragraph.append_child(a);
            paragraph.append_child(b);
        }

        let fixer = DefaultFixer;
        assert!(fixer.is_merge_children_allowed(&doc, &a_id, &b_id));
        assert!(!fixer.is_merge_children_allowed(&doc, &a_id, &paragraph_id));
        assert!(!fixer.is_merge_children_allowed(&doc, &a_id, "missing"));
    }
}
