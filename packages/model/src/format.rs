//! # Format
//!
//! Opaque styling/semantic payload attached to every element.
//!
//! The editing core never interprets formats beyond identity comparison and
//! the few structural flags fixers key on; presentation layers own the actual
//! styling semantics. Formats are plain values: cloning one when an element
//! is split or copied is always correct.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flag that gives a function element a second required parameter slot.
pub const SUBSCRIPTED_PARAMETER: &str = "subscripted-parameter";

/// Opaque format value object
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Format {
    /// Presentation-layer identity (font family, semantic tag, ...)
    pub name: String,

    /// Structural flags; string-valued so the core stays agnostic
    pub flags: BTreeMap<String, String>,
}

impl Format {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: BTreeMap::new(),
        }
    }

    pub fn with_flag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.flags.insert(key.into(), value.into());
        self
    }

    pub fn flag(&self, key: &str) -> Option<&str> {
        self.flags.get(key).map(String::as_str)
    }

    pub fn flag_enabled(&self, key: &str) -> bool {
        self.flag(key) == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_lookup() {
        let format = Format::named("serif").with_flag(SUBSCRIPTED_PARAMETER, "true");

        assert!(format.flag_enabled(SUBSCRIPTED_PARAMETER));
        assert_eq!(format.flag("missing"), None);
        assert!(!Format::named("serif").flag_enabled(SUBSCRIPTED_PARAMETER));
    }

    #[test]
    fn test_identity_comparison() {
        let a = Format::named("serif");
        let b = Format::named("serif");
        let c = Format::named("mono");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
