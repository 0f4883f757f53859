//! # Cursors
//!
//! Position descriptors into the element tree, and the registry that keeps
//! every live cursor valid while the tree mutates underneath it.
//!
//! Cursors hold element ids, never references: removing an element can never
//! dangle a cursor, only strand it, and the registry's notify hooks repair or
//! explicitly invalidate stranded cursors. Every structural mutation calls
//! exactly one notify hook, which is what makes the liveness invariant
//! checkable: after any completed mutation, each registered cursor either is
//! `Invalid` or resolves in the current tree.

use crate::document::Document;
use crate::element::{Element, ElementId};
use serde::{Deserialize, Serialize};

/// A position in the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementCursor {
    /// Explicitly nowhere; the sentinel every repair falls back to
    Invalid,

    /// Whole-element selection
    At(ElementId),

    /// Offset into a text-bearing element's content, in characters
    Text { element: ElementId, offset: usize },
}

impl ElementCursor {
    pub fn is_valid(&self) -> bool {
        !matches!(self, ElementCursor::Invalid)
    }

    pub fn element(&self) -> Option<&ElementId> {
        match self {
            ElementCursor::Invalid => None,
            ElementCursor::At(id) => Some(id),
            ElementCursor::Text { element, .. } => Some(element),
        }
    }

    pub fn text_offset(&self) -> Option<usize> {
        match self {
            ElementCursor::Text { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Whether this cursor denotes a reachable position in `doc`
    pub fn resolves_in(&self, doc: &Document) -> bool {
        match self {
            ElementCursor::Invalid => false,
            ElementCursor::At(id) => doc.contains(id),
            ElementCursor::Text { element, offset } => doc
                .find(element)
                .is_some_and(|el| *offset <= el.text_len()),
        }
    }
}

/// Stable handle into a [`CursorStateCollection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorId(usize);

/// Registry of all live cursors (editor cursor plus selection endpoints)
///
/// An empty collection is the null object for non-interactive edits: every
/// hook is a no-op when nothing is registered.
#[derive(Debug, Default)]
pub struct CursorStateCollection {
    cursors: Vec<ElementCursor>,
}

impl CursorStateCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit "no cursors to track" collection for programmatic edits
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn add(&mut self, cursor: ElementCursor) -> CursorId {
        self.cursors.push(cursor);
        CursorId(self.cursors.len() - 1)
    }

    pub fn get(&self, id: CursorId) -> &ElementCursor {
        &self.cursors[id.0]
    }

    pub fn set(&mut self, id: CursorId, cursor: ElementCursor) {
        self.cursors[id.0] = cursor;
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementCursor> {
        self.cursors.iter()
    }

    /// The first registered cursor (the editor cursor by convention)
    pub fn primary(&self) -> ElementCursor {
        self.cursors
            .first()
            .cloned()
            .unwrap_or(ElementCursor::Invalid)
    }

    pub fn set_primary(&mut self, cursor: ElementCursor) {
        if let Some(slot) = self.cursors.first_mut() {
            *slot = cursor;
        }
    }

    // ---- undo support ----

    pub fn snapshot(&self) -> Vec<ElementCursor> {
        self.cursors.clone()
    }

    /// Restore a snapshot taken on the same collection. Cursors added since
    /// the snapshot are invalidated rather than dropped: handles stay stable.
    pub fn restore(&mut self, snapshot: Vec<ElementCursor>) {
        for (index, slot) in self.cursors.iter_mut().enumerate() {
            *slot = snapshot
                .get(index)
                .cloned()
                .unwrap_or(ElementCursor::Invalid);
        }
    }

    // ---- mutation notifications ----

    /// A subtree was removed. Cursors inside it move to `successor`
    /// (typically a sibling or the parent), or `Invalid` when no reasonable
    /// successor exists.
    pub fn notify_removed(&mut self, removed: &Element, successor: ElementCursor) {
        for cursor in &mut self.cursors {
            if cursor
                .element()
                .is_some_and(|id| removed.contains(id))
            {
                *cursor = successor.clone();
            }
        }
    }

    /// A subtree was swapped for another element (placeholder filled, slot
    /// refilled). Cursors anywhere in the old subtree select the replacement.
    pub fn notify_replaced(&mut self, old: &Element, replacement: &str) {
        for cursor in &mut self.cursors {
            if cursor.element().is_some_and(|id| old.contains(id)) {
                *cursor = ElementCursor::At(replacement.to_string());
            }
        }
    }

    /// Only an element's shell died; its children were adopted elsewhere.
    /// Cursors referencing exactly that shell move to `successor`.
    pub fn notify_shell_removed(&mut self, shell: &str, successor: ElementCursor) {
        for cursor in &mut self.cursors {
            if cursor.element().is_some_and(|id| id == shell) {
                *cursor = successor.clone();
            }
        }
    }

    /// A text element was split at `at`; offsets past the split point now
    /// live in `right`.
    pub fn notify_text_split(&mut self, element: &str, at: usize, right: &str) {
        for cursor in &mut self.cursors {
            if let ElementCursor::Text {
                element: id,
                offset,
            } = cursor
            {
                if id == element && *offset > at {
                    *cursor = ElementCursor::Text {
                        element: right.to_string(),
                        offset: *offset - at,
                    };
                }
            }
        }
    }

    /// Text element `from` was merged into `into`, whose original content
    /// length was `base`. Offsets shift by `base`; whole-element selections
    /// of `from` select `into`.
    pub fn notify_text_merged(&mut self, from: &str, into: &str, base: usize) {
        for cursor in &mut self.cursors {
            match cursor {
                ElementCursor::Text {
                    element: id,
                    offset,
                } if id == from => {
                    *cursor = ElementCursor::Text {
                        element: into.to_string(),
                        offset: *offset + base,
                    };
                }
                ElementCursor::At(id) if id == from => {
                    *cursor = ElementCursor::At(into.to_string());
                }
                _ => {}
            }
        }
    }

    /// Debug check of the liveness invariant
    pub fn all_resolve_in(&self, doc: &Document) -> bool {
        self.cursors
            .iter()
            .all(|cursor| !cursor.is_valid() || cursor.resolves_in(doc))
    }
}
