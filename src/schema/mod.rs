//! Keyword schemas.
//!
//! A [`KeywordSchema`] describes everything the parser needs to read one
//! keyword: the names it answers to, how many records follow it, what the
//! items of each record look like and in which sections it may appear.
//! Schemas are immutable once registered.
//!
//! # Example
//!
//! ```
//! use ecldeck::schema::{ItemSchema, KeywordSchema, RecordSchema, SizeRule};
//!
//! let dimens = KeywordSchema::new("DIMENS")
//!     .with_size(SizeRule::Fixed(1))
//!     .with_record(RecordSchema::new(vec![
//!         ItemSchema::int("NX"),
//!         ItemSchema::int("NY"),
//!         ItemSchema::int("NZ"),
//!     ]));
//! assert_eq!(dimens.records.len(), 1);
//! ```

pub mod builtin;
pub mod descriptor;
mod item;

pub use item::{ItemKind, ItemSchema, ItemSize};

use regex::Regex;
use serde::Serialize;

use crate::deck::Section;
use crate::error::{DeckError, Result};

/// Maximum significant length of a keyword name.
pub const MAX_KEYWORD_LENGTH: usize = 8;

/// True for names made of a letter followed by letters, digits, `_`, `-`
/// or `+`.
pub fn is_valid_deck_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+'))
}

/// Reference to an integer item of an earlier keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeRef {
    pub keyword: String,
    pub item: String,
    pub shift: i64,
}

impl SizeRef {
    pub fn new(keyword: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            item: item.into(),
            shift: 0,
        }
    }

    pub fn with_shift(mut self, shift: i64) -> Self {
        self.shift = shift;
        self
    }
}

/// How the number of records of a keyword is determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SizeRule {
    /// A constant number of records.
    Fixed(usize),
    /// Read from an item of the most recent occurrence of another keyword.
    KeywordDependent(SizeRef),
    /// Records until a lone terminator record.
    Unbounded,
    /// Sub-tables, each closed by an empty record. With `tables` the count
    /// of sub-tables comes from another keyword, otherwise the collection
    /// ends at a second consecutive empty record.
    TableCollection { tables: Option<SizeRef> },
    /// Records until the next recognized keyword.
    UntilNextKeyword,
}

/// Ordered item schemas of one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordSchema {
    pub items: Vec<ItemSchema>,
}

impl RecordSchema {
    pub fn new(items: Vec<ItemSchema>) -> Self {
        Self { items }
    }

    pub fn item(&self, name: &str) -> Option<&ItemSchema> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|i| i.name == name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Schema of one keyword.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordSchema {
    /// Canonical name.
    pub name: String,
    /// Extra names recognized in decks.
    pub deck_names: Vec<String>,
    /// Anchored pattern for wildcard keywords such as summary vectors.
    pub match_pattern: Option<String>,
    #[serde(skip)]
    match_regex: Option<Regex>,
    pub size: SizeRule,
    pub records: Vec<RecordSchema>,
    /// Sections the keyword may appear in. Empty means anywhere.
    pub sections: Vec<Section>,
    /// Single array of values, e.g. grid properties.
    pub data: bool,
    /// End marker of a code block keyword.
    pub code_end: Option<String>,
    /// Records cycle through `records` instead of repeating the last one.
    pub alternating: bool,
    /// Table collection whose sub-tables start with a header record.
    pub double_records: bool,
    pub requires: Vec<String>,
    pub prohibits: Vec<String>,
    /// Minimum records for keywords read until the next keyword.
    pub min_size: Option<usize>,
    pub description: Option<String>,
}

impl KeywordSchema {
    /// A keyword with no records.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deck_names: Vec::new(),
            match_pattern: None,
            match_regex: None,
            size: SizeRule::Fixed(0),
            records: Vec::new(),
            sections: Vec::new(),
            data: false,
            code_end: None,
            alternating: false,
            double_records: false,
            requires: Vec::new(),
            prohibits: Vec::new(),
            min_size: None,
            description: None,
        }
    }

    pub fn with_size(mut self, size: SizeRule) -> Self {
        self.size = size;
        self
    }

    pub fn with_record(mut self, record: RecordSchema) -> Self {
        self.records.push(record);
        self
    }

    pub fn with_deck_name(mut self, name: impl Into<String>) -> Self {
        self.deck_names.push(name.into());
        self
    }

    /// Match deck names against `pattern`. The pattern is anchored at both
    /// ends.
    pub fn with_match(mut self, pattern: &str) -> Result<Self> {
        let anchored = format!("^(?:{})$", pattern);
        let regex = Regex::new(&anchored).map_err(|e| DeckError::Schema {
            message: format!("invalid match pattern for {}: {}", self.name, e),
            help: Some("Patterns use regex syntax, e.g. \"F[A-Z0-9_]*\"".to_string()),
        })?;
        self.match_pattern = Some(pattern.to_string());
        self.match_regex = Some(regex);
        Ok(self)
    }

    pub fn in_sections(mut self, sections: &[Section]) -> Self {
        self.sections = sections.to_vec();
        self
    }

    /// Make this a data keyword: one record holding one array item.
    pub fn as_data(mut self, item: ItemSchema) -> Self {
        self.data = true;
        self.size = SizeRule::Fixed(1);
        self.records = vec![RecordSchema::new(vec![item.with_size(ItemSize::All)])];
        self
    }

    /// Make this a code keyword: verbatim lines up to `end`.
    pub fn as_code(mut self, end: impl Into<String>, item: ItemSchema) -> Self {
        self.code_end = Some(end.into());
        self.size = SizeRule::Fixed(1);
        self.records = vec![RecordSchema::new(vec![item])];
        self
    }

    pub fn alternating(mut self) -> Self {
        self.alternating = true;
        self
    }

    pub fn with_double_records(mut self) -> Self {
        self.double_records = true;
        self
    }

    pub fn requiring(mut self, keyword: impl Into<String>) -> Self {
        self.requires.push(keyword.into());
        self
    }

    pub fn prohibiting(mut self, keyword: impl Into<String>) -> Self {
        self.prohibits.push(keyword.into());
        self
    }

    pub fn with_min_size(mut self, min: usize) -> Self {
        self.min_size = Some(min);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Names this keyword is matched by exactly: the canonical name and
    /// every deck name.
    pub fn exact_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.deck_names.iter().map(String::as_str))
    }

    pub fn is_wildcard(&self) -> bool {
        self.match_regex.is_some()
    }

    pub fn matches_pattern(&self, name: &str) -> bool {
        self.match_regex
            .as_ref()
            .map(|re| re.is_match(name))
            .unwrap_or(false)
    }

    pub fn is_code(&self) -> bool {
        self.code_end.is_some()
    }

    /// Tokens of this keyword keep their text verbatim and the record ends
    /// at the last slash on a line.
    pub fn is_raw_string(&self) -> bool {
        self.records
            .first()
            .map(|r| r.items.iter().any(|i| i.kind == ItemKind::RawString))
            .unwrap_or(false)
    }

    pub fn is_table_collection(&self) -> bool {
        matches!(self.size, SizeRule::TableCollection { .. })
    }

    /// Whether the keyword may appear in `section`.
    pub fn valid_in(&self, section: Section) -> bool {
        self.sections.is_empty() || self.sections.contains(&section)
    }

    /// Record schema used for record number `index`.
    ///
    /// Alternating keywords cycle through their record schemas. Other
    /// keywords repeat the last schema for every record past the end.
    pub fn record_schema(&self, index: usize) -> Option<&RecordSchema> {
        let n = self.records.len();
        if n == 0 {
            return None;
        }
        if self.alternating {
            self.records.get(index % n)
        } else {
            self.records.get(index.min(n - 1))
        }
    }

    /// Check internal consistency. Called when a schema is registered.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(DeckError::schema(message));

        if !is_valid_deck_name(&self.name) {
            return fail(format!("invalid keyword name '{}'", self.name));
        }
        for alias in &self.deck_names {
            if !is_valid_deck_name(alias) {
                return fail(format!("invalid deck name '{}' for {}", alias, self.name));
            }
        }
        if self.data {
            let single = self.records.len() == 1 && self.records[0].items.len() == 1;
            if !single {
                return fail(format!(
                    "data keyword {} must have exactly one record with one item",
                    self.name
                ));
            }
        }
        if self.double_records && self.records.len() != 2 {
            return fail(format!(
                "keyword {} with double records needs exactly two record schemas",
                self.name
            ));
        }
        if self.alternating && self.records.is_empty() {
            return fail(format!("alternating keyword {} has no records", self.name));
        }
        if let SizeRule::Fixed(n) = self.size {
            if n > 0 && self.records.is_empty() {
                return fail(format!(
                    "keyword {} has {} records but no record schema",
                    self.name, n
                ));
            }
        }
        for record in &self.records {
            for (i, item) in record.items.iter().enumerate() {
                if item.size == ItemSize::All && i + 1 != record.items.len() {
                    return fail(format!(
                        "item {} of {} takes all remaining values but is not last",
                        item.name, self.name
                    ));
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for KeywordSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.deck_names == other.deck_names
            && self.match_pattern == other.match_pattern
            && self.size == other.size
            && self.records == other.records
            && self.sections == other.sections
            && self.data == other.data
            && self.code_end == other.code_end
            && self.alternating == other.alternating
            && self.double_records == other.double_records
            && self.requires == other.requires
            && self.prohibits == other.prohibits
            && self.min_size == other.min_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_deck_names() {
        assert!(is_valid_deck_name("DIMENS"));
        assert!(is_valid_deck_name("PVT-M"));
        assert!(is_valid_deck_name("WCONPROD"));
        assert!(is_valid_deck_name("A+B_1"));
        assert!(!is_valid_deck_name("1ABC"));
        assert!(!is_valid_deck_name(""));
        assert!(!is_valid_deck_name("'PROD'"));
        assert!(!is_valid_deck_name("F*"));
    }

    #[test]
    fn test_record_schema_repeats_last() {
        let kw = KeywordSchema::new("WELSPECS")
            .with_size(SizeRule::Unbounded)
            .with_record(RecordSchema::new(vec![ItemSchema::string("WELL")]));

        assert!(kw.record_schema(0).is_some());
        assert_eq!(kw.record_schema(5), kw.record_schema(0));
    }

    #[test]
    fn test_record_schema_alternates() {
        let first = RecordSchema::new(vec![ItemSchema::string("A")]);
        let second = RecordSchema::new(vec![ItemSchema::int("B")]);
        let kw = KeywordSchema::new("ALT")
            .with_size(SizeRule::Fixed(4))
            .with_record(first.clone())
            .with_record(second.clone())
            .alternating();

        assert_eq!(kw.record_schema(0), Some(&first));
        assert_eq!(kw.record_schema(1), Some(&second));
        assert_eq!(kw.record_schema(2), Some(&first));
        assert_eq!(kw.record_schema(3), Some(&second));
    }

    #[test]
    fn test_match_pattern_is_anchored() {
        let kw = KeywordSchema::new("FIELDVEC").with_match("F[A-Z]+").unwrap();
        assert!(kw.is_wildcard());
        assert!(kw.matches_pattern("FOPR"));
        assert!(!kw.matches_pattern("WFOPR"));
        assert!(!kw.matches_pattern("FOPR1"));
    }

    #[test]
    fn test_bad_pattern_is_schema_error() {
        let err = KeywordSchema::new("BAD").with_match("(").unwrap_err();
        assert!(matches!(err, DeckError::Schema { .. }));
    }

    #[test]
    fn test_data_keyword_shape() {
        let poro = KeywordSchema::new("PORO").as_data(ItemSchema::double("data"));
        assert!(poro.data);
        assert_eq!(poro.size, SizeRule::Fixed(1));
        assert_eq!(poro.records[0].items[0].size, ItemSize::All);
        poro.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_inconsistent_schemas() {
        let bad_name = KeywordSchema::new("9LIVES");
        assert!(bad_name.validate().is_err());

        let no_records = KeywordSchema::new("EMPTY").with_size(SizeRule::Fixed(2));
        assert!(no_records.validate().is_err());

        let all_not_last = KeywordSchema::new("ODD")
            .with_size(SizeRule::Fixed(1))
            .with_record(RecordSchema::new(vec![
                ItemSchema::double("X").with_size(ItemSize::All),
                ItemSchema::int("Y"),
            ]));
        assert!(all_not_last.validate().is_err());
    }

    #[test]
    fn test_raw_string_detection() {
        let kw = KeywordSchema::new("UDQ")
            .with_size(SizeRule::Unbounded)
            .with_record(RecordSchema::new(vec![
                ItemSchema::raw_string("DATA").with_size(ItemSize::All),
            ]));
        assert!(kw.is_raw_string());
    }

    #[test]
    fn test_valid_in_any_section_when_unrestricted() {
        let kw = KeywordSchema::new("INCLUDE");
        assert!(kw.valid_in(Section::Schedule));

        let grid_only = KeywordSchema::new("PORO").in_sections(&[Section::Grid]);
        assert!(grid_only.valid_in(Section::Grid));
        assert!(!grid_only.valid_in(Section::Props));
    }
}
