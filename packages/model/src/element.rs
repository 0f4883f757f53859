//! # Element Tree
//!
//! Typed nodes of the document tree. Every element declares, through its
//! kind, a child-placement capability that is immutable for the kind:
//!
//! - `None`: no children (text runs, placeholders, page breaks)
//! - `Positional`: ordered, variable length (root, paragraphs, lists,
//!   functions)
//! - `Fixed`: a fixed number of slots that are swapped, never removed
//!   (operators such as fractions and radicals)
//! - `Grid`: two-dimensional cell storage (tables, matrices)
//!
//! Children are exclusively owned by their parent: the tree is a tree, not a
//! DAG, and external references (cursors, undo records) hold ids or clones,
//! never aliases.
//!
//! Structural operations on the wrong placement, and out-of-range indices,
//! are programming-contract violations and panic. Callers that cannot
//! guarantee the contract check `placement()` first.

use crate::format::Format;
use crate::grid::GridStore;
use crate::id_generator::IdGenerator;
use serde::{Deserialize, Serialize};

/// Non-owning handle to an element; unique within one document
pub type ElementId = String;

/// Child-placement capability of an element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChildPlacement {
    None,
    Positional,
    Fixed,
    Grid,
}

/// Structural category a placeholder keeps valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceholderKind {
    Generic,
    List,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    Array,
    Set,
    Sequence,
}

/// Element kind discriminant: grammar and behavior selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Document root; children are paragraphs and block elements
    Root,

    /// A line of inline content
    Paragraph,

    /// Text run (literals, variable names)
    Text,

    /// Designated empty-content element keeping required slots valid
    Placeholder(PlaceholderKind),

    /// Fixed-arity operator (fraction: 2 slots, radical: 1, ...)
    Operator { slots: usize },

    /// Ordered collection (array, set, sequence)
    List(ListKind),

    /// Table / matrix
    Grid,

    /// Variable-arity function application
    Function,

    /// Page break marker
    PageBreak,
}

/// Structural category used to key fixer and factory registries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Root,
    Paragraph,
    Text,
    Placeholder,
    Operator,
    List,
    Grid,
    Function,
    PageBreak,
}

impl ElementKind {
    pub fn placement(&self) -> ChildPlacement {
        match self {
            ElementKind::Root
            | ElementKind::Paragraph
            | ElementKind::List(_)
            | ElementKind::Function => ChildPlacement::Positional,
            ElementKind::Operator { .. } => ChildPlacement::Fixed,
            ElementKind::Grid => ChildPlacement::Grid,
            ElementKind::Text | ElementKind::Placeholder(_) | ElementKind::PageBreak => {
                ChildPlacement::None
            }
        }
    }

    pub fn category(&self) -> Category {
        match self {
            ElementKind::Root => Category::Root,
            ElementKind::Paragraph => Category::Paragraph,
            ElementKind::Text => Category::Text,
            ElementKind::Placeholder(_) => Category::Placeholder,
            ElementKind::Operator { .. } => Category::Operator,
            ElementKind::List(_) => Category::List,
            ElementKind::Grid => Category::Grid,
            ElementKind::Function => Category::Function,
            ElementKind::PageBreak => Category::PageBreak,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ElementKind::Placeholder(_))
    }

    pub fn is_text_bearing(&self) -> bool {
        matches!(self, ElementKind::Text)
    }

    /// Kinds that may occupy an expression slot (placeholder replacement)
    pub fn is_inline_content(&self) -> bool {
        matches!(
            self,
            ElementKind::Text
                | ElementKind::Operator { .. }
                | ElementKind::List(_)
                | ElementKind::Grid
                | ElementKind::Function
        )
    }

    /// Human-readable label for undo descriptions
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Root => "document",
            ElementKind::Paragraph => "paragraph",
            ElementKind::Text => "text",
            ElementKind::Placeholder(_) => "placeholder",
            ElementKind::Operator { .. } => "operator",
            ElementKind::List(ListKind::Array) => "array",
            ElementKind::List(ListKind::Set) => "set",
            ElementKind::List(ListKind::Sequence) => "sequence",
            ElementKind::Grid => "table",
            ElementKind::Function => "function",
            ElementKind::PageBreak => "page break",
        }
    }
}

/// Child storage, matching the kind's placement capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChildStore {
    None,
    Positional(Vec<Element>),
    Fixed(Vec<Element>),
    Grid(GridStore),
}

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    id: ElementId,
    kind: ElementKind,
    format: Format,
    children: ChildStore,
    text: Option<String>,
}

impl Element {
    /// Create a bare element; fixers normalize children before attach
    pub fn new(id: ElementId, kind: ElementKind, format: Format) -> Self {
        let children = match kind.placement() {
            ChildPlacement::None => ChildStore::None,
            ChildPlacement::Positional => ChildStore::Positional(Vec::new()),
            ChildPlacement::Fixed => ChildStore::Fixed(Vec::new()),
            ChildPlacement::Grid => ChildStore::Grid(GridStore::empty()),
        };
        let text = kind.is_text_bearing().then(String::new);
        Self {
            id,
            kind,
            format,
            children,
            text,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Direct format write; `post_format_change` policy runs at the command
    /// layer, not here
    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    pub fn placement(&self) -> ChildPlacement {
        self.kind.placement()
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind.is_placeholder()
    }

    // ---- text content ----

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn text_len(&self) -> usize {
        self.text.as_ref().map_or(0, |t| t.chars().count())
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        assert!(
            self.kind.is_text_bearing(),
            "set_text on non-text-bearing element {:?}",
            self.kind
        );
        self.text = Some(text.into());
    }

    pub fn text_mut(&mut self) -> &mut String {
        assert!(
            self.kind.is_text_bearing(),
            "text_mut on non-text-bearing element {:?}",
            self.kind
        );
        self.text.as_mut().expect("text-bearing element has text")
    }

    // ---- child access (uniform across placements) ----

    /// All children in document order (grid cells row-major); empty slice for
    /// NONE placement
    pub fn children(&self) -> &[Element] {
        match &self.children {
            ChildStore::None => &[],
            ChildStore::Positional(children) | ChildStore::Fixed(children) => children,
            ChildStore::Grid(grid) => grid.cells(),
        }
    }

    pub fn children_mut(&mut self) -> &mut [Element] {
        match &mut self.children {
            ChildStore::None => &mut [],
            ChildStore::Positional(children) | ChildStore::Fixed(children) => children,
            ChildStore::Grid(grid) => grid.cells_mut(),
        }
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn child(&self, index: usize) -> Option<&Element> {
        self.children().get(index)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.children_mut().get_mut(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.children().iter().position(|child| child.id == id)
    }

    // ---- structural mutation (placement-checked) ----

    fn positional_mut(&mut self) -> &mut Vec<Element> {
        match &mut self.children {
            ChildStore::Positional(children) => children,
            _ => panic!(
                "ordered-child mutation on {:?} element (placement {:?})",
                self.kind,
                self.kind.placement()
            ),
        }
    }

    /// Insert into a POSITIONAL element before `index`
    pub fn insert_child(&mut self, index: usize, element: Element) {
        let children = self.positional_mut();
        assert!(index <= children.len(), "child insertion index out of range");
        children.insert(index, element);
    }

    pub fn append_child(&mut self, element: Element) {
        self.positional_mut().push(element);
    }

    /// Remove from a POSITIONAL element; FIXED and GRID slots are swapped via
    /// `replace_child`, never removed
    pub fn remove_child(&mut self, index: usize) -> Element {
        let children = self.positional_mut();
        assert!(index < children.len(), "child removal index out of range");
        children.remove(index)
    }

    /// Swap the child at `index` (linear, row-major for grids), returning the
    /// old child
    pub fn replace_child(&mut self, index: usize, element: Element) -> Element {
        match &mut self.children {
            ChildStore::Positional(children) | ChildStore::Fixed(children) => {
                assert!(index < children.len(), "child index out of range");
                std::mem::replace(&mut children[index], element)
            }
            ChildStore::Grid(grid) => {
                let (row, column) = grid.position_of(index);
                grid.replace_cell(row, column, element)
            }
            ChildStore::None => panic!(
                "child replacement on NONE-placement element {:?}",
                self.kind
            ),
        }
    }

    /// Fill an under-populated FIXED element up to `slots` using `make`
    pub fn pad_fixed_slots(&mut self, slots: usize, mut make: impl FnMut() -> Element) {
        match &mut self.children {
            ChildStore::Fixed(children) => {
                while children.len() < slots {
                    children.push(make());
                }
            }
            _ => panic!("pad_fixed_slots on non-FIXED element {:?}", self.kind),
        }
    }

    pub fn grid(&self) -> &GridStore {
        match &self.children {
            ChildStore::Grid(grid) => grid,
            _ => panic!("grid access on non-GRID element {:?}", self.kind),
        }
    }

    pub fn grid_mut(&mut self) -> &mut GridStore {
        match &mut self.children {
            ChildStore::Grid(grid) => grid,
            _ => panic!("grid access on non-GRID element {:?}", self.kind),
        }
    }

    pub fn set_grid(&mut self, grid: GridStore) {
        match &mut self.children {
            ChildStore::Grid(slot) => *slot = grid,
            _ => panic!("grid storage on non-GRID element {:?}", self.kind),
        }
    }

    // ---- subtree queries ----

    /// This element's id and every descendant id, preorder
    pub fn collect_subtree_ids(&self, out: &mut Vec<ElementId>) {
        out.push(self.id.clone());
        for child in self.children() {
            child.collect_subtree_ids(out);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id == id || self.children().iter().any(|child| child.contains(id))
    }

    /// Assign fresh ids to this element and its whole subtree (clipboard
    /// clones must not collide with tree ids)
    pub fn reassign_ids(&mut self, ids: &mut IdGenerator) {
        self.id = ids.new_id();
        for child in self.children_mut() {
            child.reassign_ids(ids);
        }
    }

    /// Structural equality ignoring ids, for undo round-trip checks
    pub fn same_shape(&self, other: &Element) -> bool {
        self.kind == other.kind
            && self.format == other.format
            && self.text == other.text
            && self.child_count() == other.child_count()
            && self
                .children()
                .iter()
                .zip(other.children())
                .all(|(a, b)| a.same_shape(b))
    }
}
