//! Parsed keywords and records.

use std::ops::Range;

use serde::Serialize;

use super::item::DeckItem;
use super::section::Section;
use crate::error::{DeckError, Result};
use crate::parser::Location;

/// One record: the items of a record schema, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeckRecord {
    items: Vec<DeckItem>,
}

impl DeckRecord {
    pub fn new(items: Vec<DeckItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item by position.
    pub fn get(&self, index: usize) -> Option<&DeckItem> {
        self.items.get(index)
    }

    /// Item by name.
    pub fn item(&self, name: &str) -> Option<&DeckItem> {
        self.items.iter().find(|i| i.name() == name)
    }

    /// Item by name, as an error when absent.
    pub fn require(&self, name: &str) -> Result<&DeckItem> {
        self.item(name)
            .ok_or_else(|| DeckError::value(format!("record has no item named {}", name)))
    }

    pub fn items(&self) -> impl Iterator<Item = &DeckItem> {
        self.items.iter()
    }
}

/// How a keyword's data is closed in input text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Each record ends with a slash and nothing closes the keyword.
    #[default]
    Records,
    /// A lone slash closes the keyword.
    Terminated,
    /// Records are lines of text with no terminator.
    Verbatim,
    /// Verbatim lines followed by this end marker.
    Code(String),
}

/// One keyword occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckKeyword {
    name: String,
    location: Location,
    section: Section,
    records: Vec<DeckRecord>,
    /// Record ranges of sub-tables, for table collections.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tables: Vec<Range<usize>>,
    #[serde(skip)]
    layout: Layout,
}

impl DeckKeyword {
    pub fn new(name: impl Into<String>, location: Location, section: Section) -> Self {
        Self {
            name: name.into(),
            location,
            section,
            records: Vec::new(),
            tables: Vec::new(),
            layout: Layout::Records,
        }
    }

    pub fn with_records(mut self, records: Vec<DeckRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn with_tables(mut self, tables: Vec<Range<usize>>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Section the keyword was read in.
    pub fn section(&self) -> Section {
        self.section
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, index: usize) -> Option<&DeckRecord> {
        self.records.get(index)
    }

    /// Record by position, as an error when absent.
    pub fn require_record(&self, index: usize) -> Result<&DeckRecord> {
        self.record(index).ok_or_else(|| {
            DeckError::value(format!(
                "{} has {} records, index {} is out of range",
                self.name,
                self.records.len(),
                index
            ))
        })
    }

    pub fn records(&self) -> impl Iterator<Item = &DeckRecord> {
        self.records.iter()
    }

    /// Number of sub-tables. Zero unless the keyword is a table collection.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Records of sub-table `index`.
    pub fn table(&self, index: usize) -> Option<&[DeckRecord]> {
        self.tables
            .get(index)
            .map(|range| &self.records[range.clone()])
    }

    pub fn tables(&self) -> impl Iterator<Item = &[DeckRecord]> {
        self.tables.iter().map(|range| &self.records[range.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Value;
    use crate::schema::ItemSchema;

    fn int_record(name: &str, v: i64) -> DeckRecord {
        let mut item = DeckItem::new(&ItemSchema::int(name));
        item.push(Value::Int(v));
        DeckRecord::new(vec![item])
    }

    #[test]
    fn test_record_lookup() {
        let record = int_record("NX", 4);
        assert_eq!(record.item("NX").unwrap().get_int(0).unwrap(), 4);
        assert!(record.item("NY").is_none());
        assert!(record.require("NY").is_err());
        assert_eq!(record.get(0).unwrap().name(), "NX");
    }

    #[test]
    fn test_tables() {
        let kw = DeckKeyword::new("PVTO", Location::default(), Section::Props)
            .with_records(vec![int_record("A", 1), int_record("A", 2), int_record("A", 3)])
            .with_tables(vec![0..2, 2..3]);

        assert_eq!(kw.table_count(), 2);
        assert_eq!(kw.table(0).unwrap().len(), 2);
        assert_eq!(kw.table(1).unwrap().len(), 1);
        assert!(kw.table(2).is_none());
    }

    #[test]
    fn test_require_record_out_of_range() {
        let kw = DeckKeyword::new("GRID", Location::default(), Section::Grid);
        assert!(kw.is_empty());
        assert!(kw.require_record(0).is_err());
    }
}
