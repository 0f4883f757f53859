//! Longer command chains: history integrity over whole editing sessions,
//! keystroke coalescing, and recovery when redo meets a diverged document.

mod common;

use common::{assert_tree_integrity, init_tracing, text_run};
use mathdoc_editor::{
    ChangeEvent, DeleteElementCommand, DeleteReason, EditError, FinalCursorPosition,
    InsertElementCommand, InsertionLocation, MergeElementsCommand, PasteElementsCommand,
};
use mathdoc_editor::EditSession;
use mathdoc_model::{ElementCursor, ElementKind, Format};
use std::cell::RefCell;
use std::rc::Rc;

fn insert_at_cursor(session: &mut EditSession, content: &str) {
    let run = text_run(session, content);
    session
        .execute(Box::new(InsertElementCommand::new(
            run,
            InsertionLocation::AtCursor,
            FinalCursorPosition::ElementEndOfText,
        )))
        .unwrap();
}

#[test]
fn test_full_history_walk_restores_every_state() {
    init_tracing();
    let mut session = EditSession::new("doc");
    let mut states = vec![session.document().clone()];

    insert_at_cursor(&mut session, "hello");
    states.push(session.document().clone());

    let run_id = session.cursor().element().unwrap().clone();
    session
        .set_cursor(ElementCursor::Text {
            element: run_id,
            offset: 2,
        })
        .unwrap();
    let fraction = session.create_element(ElementKind::Operator { slots: 2 }, Format::default());
    session
        .execute(Box::new(InsertElementCommand::new(
            fraction,
            InsertionLocation::AtCursor,
            FinalCursorPosition::FirstChildElement,
        )))
        .unwrap();
    states.push(session.document().clone());

    let numerator = text_run(&mut session, "1");
    session
        .execute(Box::new(InsertElementCommand::new(
            numerator,
            InsertionLocation::ReplaceElement,
            FinalCursorPosition::ElementEndOfText,
        )))
        .unwrap();
    states.push(session.document().clone());

    // Walk all the way back, checking each intermediate state
    for expected in states.iter().rev().skip(1) {
        assert!(session.undo().unwrap());
        assert_eq!(session.document(), expected);
        assert_tree_integrity(&session);
    }
    assert!(!session.undo().unwrap());

    // And all the way forward again
    for expected in states.iter().skip(1) {
        assert!(session.redo().unwrap());
        assert_eq!(session.document(), expected);
        assert_tree_integrity(&session);
    }
    assert!(!session.redo().unwrap());
}

#[test]
fn test_single_character_inserts_coalesce() {
    init_tracing();
    let mut session = EditSession::new("doc");
    insert_at_cursor(&mut session, "a");

    // Each keystroke lands after the previous run
    for content in ["b", "c", "d"] {
        let anchor = session.cursor().element().unwrap().clone();
        let run = text_run(&mut session, content);
        session
            .execute(Box::new(
                InsertElementCommand::new(
                    run,
                    InsertionLocation::AfterCursor,
                    FinalCursorPosition::ElementEndOfText,
                )
                .at_target(ElementCursor::At(anchor)),
            ))
            .unwrap();
    }

    // One undo removes the whole coalesced burst
    let paragraph = session.document().root().child(0).unwrap();
    assert_eq!(paragraph.child_count(), 4);
    assert_eq!(session.undo_description(), Some("Insert text".to_string()));

    session.undo().unwrap();
    let paragraph = session.document().root().child(0).unwrap();
    assert_eq!(paragraph.child_count(), 1);
    assert_eq!(paragraph.child(0).unwrap().text(), Some("a"));
    assert_tree_integrity(&session);
}

#[test]
fn test_paste_twice_then_unwind() -> anyhow::Result<()> {
    init_tracing();
    let mut session = EditSession::new("doc");
    insert_at_cursor(&mut session, "base");
    let base_id = session.cursor().element().unwrap().clone();
    let clipboard = vec![session.copy_element(&base_id)?];

    session.execute(Box::new(
        PasteElementsCommand::new(clipboard.clone()).at_target(ElementCursor::At(base_id.clone())),
    ))?;
    let second_anchor = session.cursor().element().unwrap().clone();
    session.execute(Box::new(
        PasteElementsCommand::new(clipboard).at_target(ElementCursor::At(second_anchor)),
    ))?;

    let paragraph = session.document().root().child(0).unwrap();
    assert_eq!(paragraph.child_count(), 3);
    assert_tree_integrity(&session);

    session.undo()?;
    session.undo()?;
    let paragraph = session.document().root().child(0).unwrap();
    assert_eq!(paragraph.child_count(), 1);
    assert_eq!(paragraph.child(0).unwrap().text(), Some("base"));
    assert_tree_integrity(&session);
    Ok(())
}

#[test]
fn test_delete_merge_delete_sequence() {
    init_tracing();
    let mut session = EditSession::new("doc");
    insert_at_cursor(&mut session, "abc");
    let left_id = session.cursor().element().unwrap().clone();
    let run = text_run(&mut session, "def");
    let right_id = run.id().to_string();
    session
        .execute(Box::new(
            InsertElementCommand::new(
                run,
                InsertionLocation::AfterCursor,
                FinalCursorPosition::ElementEndOfText,
            )
            .at_target(ElementCursor::At(left_id.clone())),
        ))
        .unwrap();

    session
        .execute(Box::new(MergeElementsCommand::new(
            left_id.clone(),
            right_id,
        )))
        .unwrap();
    assert_eq!(
        session.document().find(&left_id).unwrap().text(),
        Some("abcdef")
    );

    session
        .execute(Box::new(DeleteElementCommand::new(
            left_id,
            DeleteReason::UserDelete,
        )))
        .unwrap();
    let paragraph = session.document().root().child(0).unwrap();
    assert!(paragraph.child(0).unwrap().is_placeholder());
    assert_tree_integrity(&session);

    // Unwind the entire session
    while session.undo().unwrap() {}
    assert_eq!(session.document(), EditSession::new("doc").document());
    assert_tree_integrity(&session);
}

#[test]
fn test_new_edit_clears_pending_redo() {
    init_tracing();
    let mut session = EditSession::new("doc");
    insert_at_cursor(&mut session, "abcd");
    let run_id = session.cursor().element().unwrap().clone();
    session
        .set_cursor(ElementCursor::Text {
            element: run_id.clone(),
            offset: 2,
        })
        .unwrap();
    let fraction = session.create_element(ElementKind::Operator { slots: 2 }, Format::default());
    session
        .execute(Box::new(InsertElementCommand::new(
            fraction,
            InsertionLocation::AtCursor,
            FinalCursorPosition::ElementWhole,
        )))
        .unwrap();
    session.undo().unwrap();

    // A fresh edit after undo drops the pending redo entry
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    session
        .execute(Box::new(DeleteElementCommand::new(
            run_id,
            DeleteReason::UserDelete,
        )))
        .unwrap();

    // The redo entry was cleared by the new edit; redo is simply empty
    assert!(!session.redo().unwrap());
    assert!(matches!(
        events.borrow().first(),
        Some(ChangeEvent::TreeChanged { .. })
    ));
    assert_tree_integrity(&session);
}

#[test]
fn test_undo_desync_surfaces_through_stack() {
    init_tracing();
    let mut doc = mathdoc_model::Document::new("doc");
    let ctx = mathdoc_editor::EditContext::with_defaults();
    let mut cursors = mathdoc_model::CursorStateCollection::new();
    let placeholder = doc
        .root()
        .child(0)
        .unwrap()
        .child(0)
        .unwrap()
        .id()
        .to_string();
    cursors.add(ElementCursor::At(placeholder));

    let mut run = doc.create_element(ElementKind::Text, Format::default());
    run.set_text("abcd");
    let run_id = run.id().to_string();
    let mut stack = mathdoc_editor::UndoStack::new();
    stack
        .apply(
            Box::new(InsertElementCommand::new(
                run,
                InsertionLocation::AtCursor,
                FinalCursorPosition::ElementWhole,
            )),
            &mut doc,
            &ctx,
            &mut cursors,
        )
        .unwrap();

    // Corrupt the tree behind the stack's back, then try to undo
    let paragraph_id = doc.root().child(0).unwrap().id().to_string();
    let index = doc.find(&paragraph_id).unwrap().index_of(&run_id).unwrap();
    doc.find_mut(&paragraph_id).unwrap().remove_child(index);

    let result = stack.undo(&mut doc, &ctx, &mut cursors);
    assert!(matches!(result, Err(EditError::UndoDesync(_))));
    // The entry is retained for inspection and explicit disposal
    assert!(stack.can_undo());
    assert!(stack.discard_failed());
    assert!(!stack.can_undo());
}
