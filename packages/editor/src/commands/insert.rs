//! Element insertion. The most involved command in the crate: depending on
//! the target cursor and the requested location it fills a placeholder,
//! splits a text run (possibly all the way up to the root), or inserts at a
//! sibling position. Whichever strategy it picks is remembered so redo can
//! detect a diverged document.

use super::Command;
use crate::context::EditContext;
use crate::errors::{EditError, EditResult};
use crate::fixers::SplitReason;
use mathdoc_model::{
    ChildPlacement, CursorStateCollection, Document, Element, ElementCursor, ElementId,
    ElementKind,
};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Where the new element should go, relative to the target cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertionLocation {
    /// At the cursor: fill a placeholder, split a text run, or insert
    /// before the selected element
    AtCursor,

    /// Replace the selected placeholder; disallowed on anything else
    ReplaceElement,

    /// After the selected element (or after the cursor's text run)
    AfterCursor,

    /// As a direct child of the root, splitting the enclosing top-level
    /// element at the cursor when the whole ancestor chain permits it
    UnderRoot,
}

/// Strategy the command settled on during its first execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertionMode {
    NoInsertionPerformed,
    InsertIntoEmptyPosition,
    SplitAndInsert,
    SplitAtRootAndInsert,
    InsertAtPosition,
}

/// Where the primary cursor lands after a successful insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalCursorPosition {
    /// Leave cursors wherever the structural notifications put them
    Unchanged,
    ElementWhole,
    ElementStartOfText,
    ElementEndOfText,
    FirstChildElement,
    FirstChildStartOfText,
}

/// Resolved placement decision for one execution
#[derive(Debug)]
enum Plan {
    EmptyPosition { placeholder: ElementId },
    Split { text: ElementId, offset: usize },
    SplitAtRoot { text: ElementId, offset: usize },
    Position { parent: ElementId, index: usize },
}

impl Plan {
    fn mode(&self) -> InsertionMode {
        match self {
            Plan::EmptyPosition { .. } => InsertionMode::InsertIntoEmptyPosition,
            Plan::Split { .. } => InsertionMode::SplitAndInsert,
            Plan::SplitAtRoot { .. } => InsertionMode::SplitAtRootAndInsert,
            Plan::Position { .. } => InsertionMode::InsertAtPosition,
        }
    }
}

/// Ids minted during the first execution, replayed in order when the command
/// re-executes, so redo rebuilds the recorded tree with identical ids
#[derive(Debug, Default)]
struct MintedIds {
    ids: Vec<ElementId>,
    next: usize,
}

impl MintedIds {
    fn rewind(&mut self) {
        self.next = 0;
    }

    fn mint(&mut self, doc: &mut Document) -> ElementId {
        match self.ids.get(self.next) {
            Some(id) => {
                self.next += 1;
                id.clone()
            }
            None => {
                let id = doc.new_id();
                self.ids.push(id.clone());
                self.next += 1;
                id
            }
        }
    }
}

/// Undo record for one execution
#[derive(Debug)]
struct SavedInsert {
    parent: ElementId,
    /// Index of the insertion anchor within `parent`: the inserted element
    /// for position/placeholder modes, the left split half for split modes
    index: usize,
    inserted: Vec<ElementId>,
    /// Placeholder swapped out by `InsertIntoEmptyPosition`
    replaced: Option<Element>,
    /// Pre-split clone of the element the split halves reassemble into
    split_left: Option<(ElementId, Element)>,
    split_right: Option<ElementId>,
    cursors_before: Vec<ElementCursor>,
}

#[derive(Debug)]
pub struct InsertElementCommand {
    element: Element,
    location: InsertionLocation,
    final_cursor: FinalCursorPosition,
    /// Explicit target; `None` binds to the primary cursor on first execute
    target: Option<ElementCursor>,
    resolved_target: Option<ElementCursor>,
    mode: InsertionMode,
    /// Prototype clone as actually inserted, children the fixer minted
    /// included; redo re-inserts this so ids stay stable across the history
    materialized: Option<Element>,
    minted: MintedIds,
    saved: Option<SavedInsert>,
}

impl InsertElementCommand {
    pub fn new(
        element: Element,
        location: InsertionLocation,
        final_cursor: FinalCursorPosition,
    ) -> Self {
        Self {
            element,
            location,
            final_cursor,
            target: None,
            resolved_target: None,
            mode: InsertionMode::NoInsertionPerformed,
            materialized: None,
            minted: MintedIds::default(),
            saved: None,
        }
    }

    pub fn at_target(mut self, target: ElementCursor) -> Self {
        self.target = Some(target);
        self
    }

    /// Strategy chosen by the last execution
    pub fn mode(&self) -> InsertionMode {
        self.mode
    }

    fn is_placeholder_accepting(&self, doc: &Document, id: &str) -> bool {
        doc.find(id)
            .is_some_and(|el| el.is_placeholder() && self.element.kind().is_inline_content())
    }

    /// Sibling insertion only works in ordered parents; FIXED and GRID slots
    /// take content exclusively through placeholder replacement
    fn require_positional(doc: &Document, parent: &str) -> EditResult<()> {
        let positional = doc
            .find(parent)
            .is_some_and(|el| el.placement() == ChildPlacement::Positional);
        if positional {
            Ok(())
        } else {
            Err(EditError::WrongPlacement)
        }
    }

    /// Position just after `id` among its siblings
    fn position_after(doc: &Document, id: &str) -> EditResult<Plan> {
        let location = doc
            .locate(id)
            .ok_or_else(|| EditError::ElementNotFound(id.to_string()))?;
        Self::require_positional(doc, &location.parent)?;
        Ok(Plan::Position {
            parent: location.parent,
            index: location.index + 1,
        })
    }

    fn position_before(doc: &Document, id: &str) -> EditResult<Plan> {
        let location = doc
            .locate(id)
            .ok_or_else(|| EditError::ElementNotFound(id.to_string()))?;
        Self::require_positional(doc, &location.parent)?;
        Ok(Plan::Position {
            parent: location.parent,
            index: location.index,
        })
    }

    /// Whether the text run and every shell between it and the root agree
    /// to be split
    fn root_split_allowed(
        doc: &Document,
        ctx: &EditContext,
        cursor: &ElementCursor,
        text: &str,
    ) -> bool {
        let text_ok = doc.find(text).is_some_and(|el| {
            ctx.fixer(el.kind())
                .is_split_allowed(doc, text, SplitReason::InsertElement, cursor)
        });
        if !text_ok {
            return false;
        }
        let chain = doc.ancestors(text);
        // every ancestor below the root must cooperate
        chain
            .iter()
            .take(chain.len().saturating_sub(1))
            .all(|ancestor| {
                doc.find(ancestor).is_some_and(|el| {
                    ctx.fixer(el.kind()).is_split_allowed(
                        doc,
                        ancestor,
                        SplitReason::InsertElement,
                        cursor,
                    )
                })
            })
    }

    fn decide(
        &self,
        doc: &Document,
        ctx: &EditContext,
        target: &ElementCursor,
    ) -> EditResult<Plan> {
        if !target.resolves_in(doc) {
            return Err(EditError::InvalidTarget);
        }

        match (self.location, target) {
            (InsertionLocation::ReplaceElement, ElementCursor::At(id)) => {
                if self.is_placeholder_accepting(doc, id) {
                    Ok(Plan::EmptyPosition {
                        placeholder: id.clone(),
                    })
                } else {
                    Err(EditError::Disallowed(
                        "only placeholders can be replaced by an insert",
                    ))
                }
            }
            (InsertionLocation::ReplaceElement, _) => Err(EditError::Disallowed(
                "replace-element insertion needs a whole-element target",
            )),

            (InsertionLocation::AtCursor, ElementCursor::At(id)) => {
                if self.is_placeholder_accepting(doc, id) {
                    Ok(Plan::EmptyPosition {
                        placeholder: id.clone(),
                    })
                } else {
                    Self::position_before(doc, id)
                }
            }
            (InsertionLocation::AtCursor, ElementCursor::Text { element, offset }) => {
                let text_el = doc
                    .find(element)
                    .ok_or_else(|| EditError::ElementNotFound(element.clone()))?;
                // Splitting and sibling insertion both need an ordered parent
                let parent = doc
                    .locate(element)
                    .ok_or_else(|| EditError::ElementNotFound(element.clone()))?
                    .parent;
                Self::require_positional(doc, &parent)?;
                let interior = *offset > 0 && *offset < text_el.text_len();
                let splittable = interior
                    && ctx.fixer(text_el.kind()).is_split_allowed(
                        doc,
                        element,
                        SplitReason::InsertElement,
                        target,
                    );
                if splittable {
                    Ok(Plan::Split {
                        text: element.clone(),
                        offset: *offset,
                    })
                } else if *offset == 0 {
                    Self::position_before(doc, element)
                } else {
                    Self::position_after(doc, element)
                }
            }

            (InsertionLocation::AfterCursor, ElementCursor::At(id))
            | (
                InsertionLocation::AfterCursor,
                ElementCursor::Text { element: id, .. },
            ) => Self::position_after(doc, id),

            (InsertionLocation::UnderRoot, cursor) => {
                if let ElementCursor::Text { element, offset } = cursor {
                    let interior = doc
                        .find(element)
                        .is_some_and(|el| *offset > 0 && *offset < el.text_len());
                    if interior && Self::root_split_allowed(doc, ctx, cursor, element) {
                        return Ok(Plan::SplitAtRoot {
                            text: element.clone(),
                            offset: *offset,
                        });
                    }
                }

                let anchor = cursor.element().ok_or(EditError::InvalidTarget)?;
                if anchor == doc.root_id() {
                    return Ok(Plan::Position {
                        parent: doc.root_id().to_string(),
                        index: doc.root().child_count(),
                    });
                }
                let top = doc
                    .top_level_ancestor(anchor)
                    .ok_or(EditError::InvalidTarget)?;
                Self::position_after(doc, &top)
            }

            (_, ElementCursor::Invalid) => Err(EditError::InvalidTarget),
        }
    }

    /// Clone the prototype and let its fixer normalize the clone's shape.
    /// The normalized clone is cached so a re-execution inserts the same
    /// element, minted children and all.
    fn materialize(&mut self, doc: &mut Document, ctx: &EditContext) -> Element {
        if let Some(element) = &self.materialized {
            return element.clone();
        }
        let mut element = self.element.clone();
        ctx.fixer(element.kind()).pre_insert(&mut element, doc.ids_mut());
        self.materialized = Some(element.clone());
        element
    }

    /// Split a text run at a character offset; the left half keeps the id,
    /// the right half takes `right_id`. Returns the right half's id.
    pub(super) fn split_text_run(
        doc: &mut Document,
        text: &str,
        offset: usize,
        right_id: ElementId,
    ) -> EditResult<ElementId> {
        let location = doc
            .locate(text)
            .ok_or_else(|| EditError::ElementNotFound(text.to_string()))?;
        Self::require_positional(doc, &location.parent)?;
        let (format, left_content, right_content) = {
            let el = doc
                .find(text)
                .ok_or_else(|| EditError::ElementNotFound(text.to_string()))?;
            let content = el.text().unwrap_or_default();
            let byte = content
                .char_indices()
                .nth(offset)
                .map(|(i, _)| i)
                .unwrap_or(content.len());
            (
                el.format().clone(),
                content[..byte].to_string(),
                content[byte..].to_string(),
            )
        };

        let mut right = Element::new(right_id.clone(), ElementKind::Text, format);
        right.set_text(right_content);

        if let Some(el) = doc.find_mut(text) {
            el.set_text(left_content);
        }
        doc.find_mut(&location.parent)
            .ok_or_else(|| EditError::ElementNotFound(location.parent.clone()))?
            .insert_child(location.index + 1, right);
        Ok(right_id)
    }

    /// Split every shell from the text run's parent up to (excluding) the
    /// root, so the halves become root children. Returns the two root-level
    /// halves.
    fn split_chain_to_root(
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
        text: &str,
        offset: usize,
        minted: &mut MintedIds,
    ) -> EditResult<(ElementId, ElementId)> {
        let right_id = minted.mint(doc);
        let right_text = Self::split_text_run(doc, text, offset, right_id)?;
        cursors.notify_text_split(text, offset, &right_text);

        let mut left = text.to_string();
        let mut right = right_text;
        loop {
            let location = doc
                .locate(&left)
                .ok_or_else(|| EditError::ElementNotFound(left.clone()))?;
            if location.parent == doc.root_id() {
                return Ok((left, right));
            }

            let shell_id = location.parent.clone();
            let boundary = location.index + 1;
            let (kind, format) = {
                let shell = doc
                    .find(&shell_id)
                    .ok_or_else(|| EditError::ElementNotFound(shell_id.clone()))?;
                (*shell.kind(), shell.format().clone())
            };

            let tail_id = minted.mint(doc);
            let mut tail = Element::new(tail_id.clone(), kind, format);
            let mut moved = Vec::new();
            {
                let shell = doc
                    .find_mut(&shell_id)
                    .ok_or_else(|| EditError::ElementNotFound(shell_id.clone()))?;
                while shell.child_count() > boundary {
                    moved.push(shell.remove_child(boundary));
                }
            }
            for child in moved {
                tail.append_child(child);
            }

            let shell_location = doc
                .locate(&shell_id)
                .ok_or_else(|| EditError::ElementNotFound(shell_id.clone()))?;
            doc.find_mut(&shell_location.parent)
                .ok_or_else(|| EditError::ElementNotFound(shell_location.parent.clone()))?
                .insert_child(shell_location.index + 1, tail);

            ctx.fixer(&kind).process_split_children(
                doc,
                &shell_id,
                &tail_id,
                SplitReason::InsertElement,
                cursors,
            );

            left = shell_id;
            right = tail_id;
        }
    }

    fn apply_final_cursor(
        &self,
        doc: &Document,
        cursors: &mut CursorStateCollection,
        inserted: &str,
    ) {
        let cursor = match self.final_cursor {
            FinalCursorPosition::Unchanged => return,
            FinalCursorPosition::ElementWhole => ElementCursor::At(inserted.to_string()),
            FinalCursorPosition::ElementStartOfText => text_cursor(doc, inserted, 0),
            FinalCursorPosition::ElementEndOfText => {
                let len = doc.find(inserted).map_or(0, Element::text_len);
                text_cursor(doc, inserted, len)
            }
            FinalCursorPosition::FirstChildElement => {
                match doc.find(inserted).and_then(|el| el.child(0)) {
                    Some(child) => ElementCursor::At(child.id().to_string()),
                    None => ElementCursor::At(inserted.to_string()),
                }
            }
            FinalCursorPosition::FirstChildStartOfText => {
                match doc.find(inserted).and_then(|el| el.child(0)) {
                    Some(child) => text_cursor(doc, child.id(), 0),
                    None => ElementCursor::At(inserted.to_string()),
                }
            }
        };
        cursors.set_primary(cursor);
    }
}

/// Text cursor when the element bears text, whole-element cursor otherwise
fn text_cursor(doc: &Document, id: &str, offset: usize) -> ElementCursor {
    if doc.find(id).is_some_and(|el| el.kind().is_text_bearing()) {
        ElementCursor::Text {
            element: id.to_string(),
            offset,
        }
    } else {
        ElementCursor::At(id.to_string())
    }
}

impl Command for InsertElementCommand {
    fn execute(
        &mut self,
        doc: &mut Document,
        ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        let target = match &self.resolved_target {
            Some(target) => target.clone(),
            None => {
                let target = self
                    .target
                    .clone()
                    .unwrap_or_else(|| cursors.primary());
                self.resolved_target = Some(target.clone());
                target
            }
        };

        let plan = self.decide(doc, ctx, &target)?;
        let mode = plan.mode();
        if self.mode != InsertionMode::NoInsertionPerformed && plan.mode() != self.mode {
            return Err(EditError::UndoDesync(format!(
                "insertion strategy changed from {:?} to {:?}",
                self.mode,
                plan.mode()
            )));
        }
        tracing::debug!(
            mode = ?plan.mode(),
            kind = self.element.kind().label(),
            "inserting element"
        );

        self.minted.rewind();
        let cursors_before = cursors.snapshot();
        let saved = match plan {
            Plan::EmptyPosition { placeholder } => {
                let location = doc
                    .locate(&placeholder)
                    .ok_or_else(|| EditError::ElementNotFound(placeholder.clone()))?;
                let inserted = self.materialize(doc, ctx);
                let inserted_id = inserted.id().to_string();
                let old = doc
                    .find_mut(&location.parent)
                    .ok_or_else(|| EditError::ElementNotFound(location.parent.clone()))?
                    .replace_child(location.index, inserted);
                cursors.notify_replaced(&old, &inserted_id);
                self.apply_final_cursor(doc, cursors, &inserted_id);
                SavedInsert {
                    parent: location.parent,
                    index: location.index,
                    inserted: vec![inserted_id],
                    replaced: Some(old),
                    split_left: None,
                    split_right: None,
                    cursors_before,
                }
            }

            Plan::Split { text, offset } => {
                let original = doc
                    .find(&text)
                    .cloned()
                    .ok_or_else(|| EditError::ElementNotFound(text.clone()))?;
                let right_id = self.minted.mint(doc);
                let right = Self::split_text_run(doc, &text, offset, right_id)?;
                cursors.notify_text_split(&text, offset, &right);

                let right_location = doc
                    .locate(&right)
                    .ok_or_else(|| EditError::ElementNotFound(right.clone()))?;
                let inserted = self.materialize(doc, ctx);
                let inserted_id = inserted.id().to_string();
                doc.find_mut(&right_location.parent)
                    .ok_or_else(|| EditError::ElementNotFound(right_location.parent.clone()))?
                    .insert_child(right_location.index, inserted);
                self.apply_final_cursor(doc, cursors, &inserted_id);
                SavedInsert {
                    parent: right_location.parent,
                    index: right_location.index - 1,
                    inserted: vec![inserted_id],
                    replaced: None,
                    split_left: Some((text, original)),
                    split_right: Some(right),
                    cursors_before,
                }
            }

            Plan::SplitAtRoot { text, offset } => {
                let top = doc
                    .top_level_ancestor(&text)
                    .ok_or_else(|| EditError::ElementNotFound(text.clone()))?;
                let original = doc
                    .find(&top)
                    .cloned()
                    .ok_or_else(|| EditError::ElementNotFound(top.clone()))?;
                let (left, right) =
                    Self::split_chain_to_root(doc, ctx, cursors, &text, offset, &mut self.minted)?;

                let right_location = doc
                    .locate(&right)
                    .ok_or_else(|| EditError::ElementNotFound(right.clone()))?;
                let inserted = self.materialize(doc, ctx);
                let inserted_id = inserted.id().to_string();
                doc.find_mut(&right_location.parent)
                    .ok_or_else(|| EditError::ElementNotFound(right_location.parent.clone()))?
                    .insert_child(right_location.index, inserted);
                self.apply_final_cursor(doc, cursors, &inserted_id);
                SavedInsert {
                    parent: right_location.parent,
                    index: right_location.index - 1,
                    inserted: vec![inserted_id],
                    replaced: None,
                    split_left: Some((left, original)),
                    split_right: Some(right),
                    cursors_before,
                }
            }

            Plan::Position { parent, index } => {
                let inserted = self.materialize(doc, ctx);
                let inserted_id = inserted.id().to_string();
                doc.find_mut(&parent)
                    .ok_or_else(|| EditError::ElementNotFound(parent.clone()))?
                    .insert_child(index, inserted);
                self.apply_final_cursor(doc, cursors, &inserted_id);
                SavedInsert {
                    parent,
                    index,
                    inserted: vec![inserted_id],
                    replaced: None,
                    split_left: None,
                    split_right: None,
                    cursors_before,
                }
            }
        };

        self.mode = mode;
        self.saved = Some(saved);
        Ok(())
    }

    fn undo(
        &mut self,
        doc: &mut Document,
        _ctx: &EditContext,
        cursors: &mut CursorStateCollection,
    ) -> EditResult<()> {
        let saved = self
            .saved
            .take()
            .ok_or_else(|| EditError::UndoDesync("insert was never executed".to_string()))?;

        let result = undo_saved(doc, &saved, self.mode);
        match result {
            Ok(()) => {
                cursors.restore(saved.cursors_before);
                Ok(())
            }
            Err(err) => {
                // Keep the record so a later retry still has it
                self.saved = Some(saved);
                Err(err)
            }
        }
    }

    fn merge(&mut self, other: &dyn Command) -> bool {
        let Some(other) = other.as_any().downcast_ref::<InsertElementCommand>() else {
            return false;
        };
        // Only plain positional inserts of single-character text runs
        // coalesce (keystroke batching)
        let coalescable = self.mode == InsertionMode::InsertAtPosition
            && other.mode == InsertionMode::InsertAtPosition
            && self.element.kind().is_text_bearing()
            && other.element.kind().is_text_bearing()
            && self.element.text_len() == 1
            && other.element.text_len() == 1;
        if !coalescable {
            return false;
        }
        let (Some(mine), Some(theirs)) = (self.saved.as_mut(), other.saved.as_ref()) else {
            return false;
        };
        let adjacent =
            mine.parent == theirs.parent && theirs.index == mine.index + mine.inserted.len();
        if !adjacent {
            return false;
        }
        mine.inserted.extend(theirs.inserted.iter().cloned());
        true
    }

    fn description(&self) -> String {
        format!("Insert {}", self.element.kind().label())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn undo_saved(doc: &mut Document, saved: &SavedInsert, mode: InsertionMode) -> EditResult<()> {
    let desync = |detail: &str| EditError::UndoDesync(detail.to_string());

    match mode {
        InsertionMode::InsertIntoEmptyPosition => {
            let placeholder = saved
                .replaced
                .as_ref()
                .ok_or_else(|| desync("missing replaced placeholder"))?;
            let parent = doc
                .find_mut(&saved.parent)
                .ok_or_else(|| desync("insert parent vanished"))?;
            let current = parent
                .child(saved.index)
                .ok_or_else(|| desync("inserted element vanished"))?;
            if Some(current.id()) != saved.inserted.first().map(String::as_str) {
                return Err(desync("unexpected element at insertion slot"));
            }
            parent.replace_child(saved.index, placeholder.clone());
            Ok(())
        }

        InsertionMode::SplitAndInsert | InsertionMode::SplitAtRootAndInsert => {
            let (left_id, original) = saved
                .split_left
                .as_ref()
                .ok_or_else(|| desync("missing split record"))?;
            let right_id = saved
                .split_right
                .as_ref()
                .ok_or_else(|| desync("missing split record"))?;
            let inserted_id = saved
                .inserted
                .first()
                .ok_or_else(|| desync("missing insert record"))?;

            let parent = doc
                .find_mut(&saved.parent)
                .ok_or_else(|| desync("split parent vanished"))?;
            let span_ok = parent.child(saved.index).map(Element::id) == Some(left_id.as_str())
                && parent.child(saved.index + 1).map(Element::id)
                    == Some(inserted_id.as_str())
                && parent.child(saved.index + 2).map(Element::id) == Some(right_id.as_str());
            if !span_ok {
                return Err(desync("split span no longer intact"));
            }
            parent.remove_child(saved.index + 2);
            parent.remove_child(saved.index + 1);
            parent.replace_child(saved.index, original.clone());
            Ok(())
        }

        InsertionMode::InsertAtPosition => {
            // Reverse order keeps earlier indices stable
            for inserted in saved.inserted.iter().rev() {
                let location = doc
                    .locate(inserted)
                    .ok_or_else(|| desync("inserted element vanished"))?;
                if location.parent != saved.parent {
                    return Err(desync("inserted element moved"));
                }
                doc.find_mut(&location.parent)
                    .ok_or_else(|| desync("insert parent vanished"))?
                    .remove_child(location.index);
            }
            Ok(())
        }

        InsertionMode::NoInsertionPerformed => {
            Err(desync("insert was never executed"))
        }
    }
}
