//! Keyword schema registry.
//!
//! The registry owns every [`KeywordSchema`] the parser can recognize. It is
//! built once, then shared by reference with any number of parsers. A
//! [`Parser`](crate::parser::Parser) borrows it immutably, so no schema can
//! be registered while a parse is running.
//!
//! # Lookup order
//!
//! [`Registry::find`] tries exact names first (canonical name, then deck
//! name aliases), then wildcard patterns. Wildcard patterns are tried in
//! registration order and the first match wins. Replacing a wildcard schema
//! keeps its original position.
//!
//! # Example
//!
//! ```
//! use ecldeck::registry::Registry;
//!
//! let registry = Registry::builtin().unwrap();
//! assert!(registry.lookup("DIMENS").is_some());
//! assert_eq!(registry.find("WOPR").unwrap().name, "WELLVEC");
//! ```

mod loader;

pub use loader::{is_descriptor_file, load_directory, load_file};

use std::collections::HashMap;

use crate::error::Result;
use crate::schema::{builtin, KeywordSchema};

/// Catalogue of keyword schemas.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    schemas: Vec<KeywordSchema>,
    /// Canonical name to slot.
    by_name: HashMap<String, usize>,
    /// Deck name alias to slot.
    by_deck_name: HashMap<String, usize>,
    /// Slots of wildcard schemas, in registration order.
    wildcards: Vec<usize>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the compiled-in keywords.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for schema in builtin::keywords()? {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    /// Add a schema, replacing any schema with the same canonical name.
    ///
    /// Returns the replaced schema, if any.
    pub fn register(&mut self, schema: KeywordSchema) -> Result<Option<KeywordSchema>> {
        schema.validate()?;

        if let Some(&slot) = self.by_name.get(&schema.name) {
            let old = std::mem::replace(&mut self.schemas[slot], schema);
            self.by_deck_name.retain(|_, s| *s != slot);
            self.index_slot(slot);
            tracing::debug!(keyword = %old.name, "replaced schema");
            return Ok(Some(old));
        }

        let slot = self.schemas.len();
        self.schemas.push(schema);
        self.by_name.insert(self.schemas[slot].name.clone(), slot);
        self.index_slot(slot);
        Ok(None)
    }

    fn index_slot(&mut self, slot: usize) {
        let schema = &self.schemas[slot];
        for alias in &schema.deck_names {
            self.by_deck_name.insert(alias.clone(), slot);
        }

        let listed = self.wildcards.contains(&slot);
        match (schema.is_wildcard(), listed) {
            (true, false) => self.wildcards.push(slot),
            (false, true) => self.wildcards.retain(|s| *s != slot),
            _ => {}
        }
    }

    /// Add every schema in a list, in order.
    pub fn register_all(&mut self, schemas: impl IntoIterator<Item = KeywordSchema>) -> Result<()> {
        for schema in schemas {
            self.register(schema)?;
        }
        Ok(())
    }

    /// Exact lookup by canonical name or deck name.
    pub fn lookup(&self, name: &str) -> Option<&KeywordSchema> {
        self.by_name
            .get(name)
            .or_else(|| self.by_deck_name.get(name))
            .map(|&slot| &self.schemas[slot])
    }

    /// First wildcard schema whose pattern matches `name`.
    pub fn lookup_wildcard(&self, name: &str) -> Option<&KeywordSchema> {
        self.wildcards
            .iter()
            .map(|&slot| &self.schemas[slot])
            .find(|schema| schema.matches_pattern(name))
    }

    /// Exact lookup, then wildcard lookup.
    pub fn find(&self, name: &str) -> Option<&KeywordSchema> {
        self.lookup(name).or_else(|| self.lookup_wildcard(name))
    }

    pub fn is_recognized(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Canonical names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.name.as_str())
    }

    /// Schemas in registration order.
    pub fn schemas(&self) -> impl Iterator<Item = &KeywordSchema> {
        self.schemas.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ItemSchema, RecordSchema, SizeRule};

    fn wildcard(name: &str, pattern: &str) -> KeywordSchema {
        KeywordSchema::new(name).with_match(pattern).unwrap()
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }

    #[test]
    fn test_lookup_by_name_and_alias() {
        let mut registry = Registry::new();
        registry
            .register(KeywordSchema::new("GRIDFILE").with_deck_name("GRIDFILX"))
            .unwrap();

        assert_eq!(registry.lookup("GRIDFILE").unwrap().name, "GRIDFILE");
        assert_eq!(registry.lookup("GRIDFILX").unwrap().name, "GRIDFILE");
        assert!(registry.lookup("GRIDFIL").is_none());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = Registry::new();
        registry.register(KeywordSchema::new("DIMENS")).unwrap();

        let replacement = KeywordSchema::new("DIMENS")
            .with_size(SizeRule::Fixed(1))
            .with_record(RecordSchema::new(vec![ItemSchema::int("NX")]));
        let old = registry.register(replacement).unwrap();

        assert!(old.is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("DIMENS").unwrap().size, SizeRule::Fixed(1));
    }

    #[test]
    fn test_replacing_drops_stale_aliases() {
        let mut registry = Registry::new();
        registry
            .register(KeywordSchema::new("OLDNAME").with_deck_name("ALIAS"))
            .unwrap();
        registry.register(KeywordSchema::new("OLDNAME")).unwrap();

        assert!(registry.lookup("ALIAS").is_none());
    }

    #[test]
    fn test_wildcard_first_registered_wins() {
        let mut registry = Registry::new();
        registry.register(wildcard("BROAD", "W[A-Z]*")).unwrap();
        registry.register(wildcard("NARROW", "WOPR")).unwrap();

        assert_eq!(registry.lookup_wildcard("WOPR").unwrap().name, "BROAD");
    }

    #[test]
    fn test_replaced_wildcard_keeps_its_slot() {
        let mut registry = Registry::new();
        registry.register(wildcard("FIRST", "W[A-Z]*")).unwrap();
        registry.register(wildcard("SECOND", "W[A-Z]*")).unwrap();
        registry
            .register(wildcard("FIRST", "W[A-Z]*").with_description("updated"))
            .unwrap();

        let hit = registry.lookup_wildcard("WBHP").unwrap();
        assert_eq!(hit.name, "FIRST");
        assert_eq!(hit.description.as_deref(), Some("updated"));
    }

    #[test]
    fn test_exact_beats_wildcard() {
        let mut registry = Registry::new();
        registry.register(wildcard("WELLVEC", "W[A-Z]+")).unwrap();
        registry.register(KeywordSchema::new("WELSPECS")).unwrap();

        assert_eq!(registry.find("WELSPECS").unwrap().name, "WELSPECS");
        assert_eq!(registry.find("WBHP").unwrap().name, "WELLVEC");
        assert!(!registry.is_recognized("XYZ"));
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let mut registry = Registry::new();
        assert!(registry.register(KeywordSchema::new("1BAD")).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_builtin_registry() {
        let registry = Registry::builtin().unwrap();
        assert!(registry.lookup("RUNSPEC").is_some());
        assert!(registry.lookup("PVT-M").is_some());
        assert_eq!(registry.find("FOPT").unwrap().name, "FIELDVEC");
        assert_eq!(registry.find("GOPR").unwrap().name, "GROUPVEC");
        assert_eq!(registry.names().next(), Some("RUNSPEC"));
    }
}
