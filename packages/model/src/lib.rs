//! # Mathdoc Model
//!
//! Data model for tree-structured technical documents: the typed element
//! tree, its child-placement capabilities, opaque formats, element ids, and
//! the cursor registry.
//!
//! This crate is policy-free. It knows how to store and address children for
//! each placement style and how to keep cursors consistent when told about a
//! mutation, but it does not decide which mutations are legal; that is the
//! editor crate's fixer framework. The split mirrors the line between "what
//! the tree is" and "what edits mean".

pub mod cursor;
pub mod document;
pub mod element;
pub mod format;
pub mod grid;
pub mod id_generator;

pub use cursor::{CursorId, CursorStateCollection, ElementCursor};
pub use document::{Document, Location};
pub use element::{
    Category, ChildPlacement, ChildStore, Element, ElementId, ElementKind, ListKind,
    PlaceholderKind,
};
pub use format::{Format, SUBSCRIPTED_PARAMETER};
pub use grid::GridStore;
pub use id_generator::IdGenerator;
