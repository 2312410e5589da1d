//! The parsed deck.
//!
//! A [`Deck`] owns every keyword read from the input, in input order, and
//! indexes them by name. Consumers borrow keywords, records and items from
//! it; nothing in the deck refers back to the schema registry.
//!
//! # Example
//!
//! ```
//! use ecldeck::parser::Parser;
//! use ecldeck::registry::Registry;
//! use ecldeck::context::ParseContext;
//!
//! let registry = Registry::builtin().unwrap();
//! let parsed = Parser::new(&registry)
//!     .parse_string("RUNSPEC\nDIMENS\n 4 3 2 /\n", &ParseContext::new())
//!     .unwrap();
//!
//! let dimens = parsed.deck.last("DIMENS").unwrap();
//! let nx = dimens.record(0).unwrap().item("NX").unwrap();
//! assert_eq!(nx.get_int(0).unwrap(), 4);
//! ```

mod assembler;
mod item;
mod keyword;
mod section;
mod value;
mod writer;

pub use assembler::DeckAssembler;
pub use item::DeckItem;
pub use keyword::{DeckKeyword, DeckRecord, Layout};
pub use section::{Section, SectionTracker, Transition};
pub use value::{UdaValue, Value};
pub(crate) use value::{parse_double, parse_int};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::units::{UnitSystem, UnitSystemKind};

/// Ordered, indexed collection of parsed keywords.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Deck {
    keywords: Vec<DeckKeyword>,
    #[serde(skip)]
    index: HashMap<String, Vec<usize>>,
    #[serde(skip)]
    default_units: UnitSystem,
    active_units: UnitSystem,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_file: Option<PathBuf>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a keyword and index it by name.
    pub fn push(&mut self, keyword: DeckKeyword) {
        let position = self.keywords.len();
        self.index
            .entry(keyword.name().to_string())
            .or_default()
            .push(position);
        self.keywords.push(keyword);
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keywords in input order.
    pub fn iter(&self) -> impl Iterator<Item = &DeckKeyword> {
        self.keywords.iter()
    }

    /// Keyword at input position `index`.
    pub fn get(&self, index: usize) -> Option<&DeckKeyword> {
        self.keywords.get(index)
    }

    /// Most recent occurrence of `name`.
    pub fn last(&self, name: &str) -> Option<&DeckKeyword> {
        self.positions(name)
            .last()
            .map(|&position| &self.keywords[position])
    }

    /// Occurrence number `n` of `name`, counting from zero.
    pub fn occurrence(&self, name: &str, n: usize) -> Option<&DeckKeyword> {
        self.positions(name)
            .get(n)
            .map(|&position| &self.keywords[position])
    }

    /// Every occurrence of `name`, in input order.
    pub fn all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a DeckKeyword> + 'a {
        self.positions(name)
            .iter()
            .map(move |&position| &self.keywords[position])
    }

    pub fn count(&self, name: &str) -> usize {
        self.positions(name).len()
    }

    /// Input positions of every occurrence of `name`.
    pub fn positions(&self, name: &str) -> &[usize] {
        self.index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_keyword(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Keywords read while `section` was current.
    pub fn section(&self, section: Section) -> impl Iterator<Item = &DeckKeyword> {
        self.keywords.iter().filter(move |k| k.section() == section)
    }

    /// Sections with at least one keyword, in order of first appearance.
    pub fn sections(&self) -> Vec<Section> {
        let mut seen: Vec<Section> = Vec::new();
        for keyword in &self.keywords {
            if !seen.contains(&keyword.section()) {
                seen.push(keyword.section());
            }
        }
        seen
    }

    /// System that schema defaults are written in.
    pub fn default_units(&self) -> &UnitSystem {
        &self.default_units
    }

    /// System selected by the last unit marker keyword.
    pub fn active_units(&self) -> &UnitSystem {
        &self.active_units
    }

    pub fn set_active_unit_system(&mut self, kind: UnitSystemKind) {
        self.active_units = UnitSystem::new(kind);
    }

    /// Path of the root data file, when parsed from a file.
    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    pub fn set_data_file(&mut self, path: impl Into<PathBuf>) {
        self.data_file = Some(path.into());
    }

    /// Element `index` of `item` in SI units, using this deck's systems.
    ///
    /// The value is cached in the item on first use. See
    /// [`DeckItem::to_canonical`].
    pub fn to_canonical(&self, item: &DeckItem, index: usize) -> Result<f64> {
        item.to_canonical(index, &self.active_units, &self.default_units)
    }
}

impl<'a> IntoIterator for &'a Deck {
    type Item = &'a DeckKeyword;
    type IntoIter = std::slice::Iter<'a, DeckKeyword>;

    fn into_iter(self) -> Self::IntoIter {
        self.keywords.iter()
    }
}
