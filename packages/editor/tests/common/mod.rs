//! Shared helpers for the integration suites.

use mathdoc_editor::EditSession;
use mathdoc_model::{Element, ElementKind, Format, PlaceholderKind};
use std::collections::HashSet;
use std::sync::Once;

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Walk the whole tree and check every structural invariant the fixers are
/// supposed to maintain, plus cursor liveness.
pub fn assert_tree_integrity(session: &EditSession) {
    let doc = session.document();
    let mut seen = HashSet::new();
    doc.for_each(|el| {
        assert!(
            seen.insert(el.id().to_string()),
            "duplicate element id {}",
            el.id()
        );
        check_element(el);
    });

    assert!(doc.root().child_count() > 0, "root must keep a child");
    for cursor in session.cursors().iter() {
        assert!(
            !cursor.is_valid() || cursor.resolves_in(doc),
            "cursor {cursor:?} does not resolve"
        );
    }
}

fn check_element(el: &Element) {
    match el.kind() {
        ElementKind::Paragraph => {
            assert!(el.child_count() > 0, "paragraph {} is childless", el.id());
        }
        ElementKind::Operator { slots } => {
            assert_eq!(
                el.child_count(),
                *slots,
                "operator {} has wrong slot count",
                el.id()
            );
        }
        ElementKind::List(_) => {
            assert!(
                el.children().last().is_some_and(Element::is_placeholder),
                "list {} lost its trailing placeholder",
                el.id()
            );
        }
        ElementKind::Function => {
            let required = if el
                .format()
                .flag_enabled(mathdoc_model::SUBSCRIPTED_PARAMETER)
            {
                2
            } else {
                1
            };
            assert!(
                el.child_count() >= required,
                "function {} is under-populated",
                el.id()
            );
            assert!(
                matches!(
                    el.children().last().map(Element::kind),
                    Some(ElementKind::Placeholder(PlaceholderKind::Function))
                ),
                "function {} lost its trailing placeholder",
                el.id()
            );
        }
        ElementKind::Grid => {
            let grid = el.grid();
            assert_eq!(
                grid.cells().len(),
                grid.rows() * grid.columns(),
                "grid {} has inconsistent dimensions",
                el.id()
            );
            assert!(
                grid.rows() >= 1 && grid.columns() >= 1,
                "grid {} collapsed below 1x1",
                el.id()
            );
        }
        _ => {}
    }

    if el.placement() == mathdoc_model::ChildPlacement::None {
        assert_eq!(el.child_count(), 0);
    }
}

/// Detached text run minted through the session
pub fn text_run(session: &mut EditSession, content: &str) -> Element {
    let mut el = session.create_element(ElementKind::Text, Format::default());
    el.set_text(content);
    el
}
