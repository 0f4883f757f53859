//! Shared services commands run against: the fixer registry and the element
//! factory. One context typically lives for the whole editing session.

use crate::fixers::{Fixer, FixerRegistry};
use mathdoc_model::{Category, Document, Element, ElementKind, Format};
use std::collections::HashMap;

/// Builds a detached element of one category. Registered per category so an
/// embedder can seed new elements with defaults (a grid with its initial
/// cell count, a text run with inherited styling).
pub type ElementBuilder = fn(&mut Document, ElementKind, Format) -> Element;

fn bare_element(doc: &mut Document, kind: ElementKind, format: Format) -> Element {
    doc.create_element(kind, format)
}

#[derive(Debug)]
pub struct ElementFactory {
    builders: HashMap<Category, ElementBuilder>,
}

impl ElementFactory {
    pub fn with_defaults() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    pub fn register(&mut self, category: Category, builder: ElementBuilder) {
        self.builders.insert(category, builder);
    }

    /// Build a detached element. Structural normalization (placeholder
    /// slots) happens later, in the kind's `pre_insert`.
    pub fn create(&self, doc: &mut Document, kind: ElementKind, format: Format) -> Element {
        let builder = self
            .builders
            .get(&kind.category())
            .copied()
            .unwrap_or(bare_element);
        builder(doc, kind, format)
    }
}

/// Everything a command needs besides the document and cursors
#[derive(Debug)]
pub struct EditContext {
    fixers: FixerRegistry,
    factory: ElementFactory,
}

impl EditContext {
    pub fn with_defaults() -> Self {
        Self {
            fixers: FixerRegistry::with_defaults(),
            factory: ElementFactory::with_defaults(),
        }
    }

    pub fn new(fixers: FixerRegistry, factory: ElementFactory) -> Self {
        Self { fixers, factory }
    }

    pub fn fixer(&self, kind: &ElementKind) -> &dyn Fixer {
        self.fixers.for_kind(kind)
    }

    pub fn fixers(&self) -> &FixerRegistry {
        &self.fixers
    }

    pub fn create(&self, doc: &mut Document, kind: ElementKind, format: Format) -> Element {
        self.factory.create(doc, kind, format)
    }
}

impl Default for EditContext {
    fn default() -> Self {
        Self::with_defaults()
    }
}
