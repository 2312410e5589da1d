//! Item schemas: one named field of a record.

use std::fmt;

use serde::Serialize;

use crate::deck::Value;
use crate::units::Dimension;

/// Primitive type of an item's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Int,
    Double,
    String,
    /// Token text kept verbatim, quotes included.
    RawString,
    /// Number or the name of a user-defined quantity.
    Uda,
}

impl ItemKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ItemKind::Int | ItemKind::Double | ItemKind::Uda)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemKind::Int => "INT",
            ItemKind::Double => "DOUBLE",
            ItemKind::String => "STRING",
            ItemKind::RawString => "RAW_STRING",
            ItemKind::Uda => "UDA",
        };
        f.write_str(name)
    }
}

/// How many elements an item holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemSize {
    Single,
    /// Exactly `n` elements; missing trailing elements are defaulted.
    Fixed(usize),
    /// Every remaining token of the record.
    All,
}

impl ItemSize {
    /// Upper bound on elements, if any.
    pub fn max_elements(self) -> Option<usize> {
        match self {
            ItemSize::Single => Some(1),
            ItemSize::Fixed(n) => Some(n),
            ItemSize::All => None,
        }
    }
}

/// Schema for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSchema {
    pub name: String,
    pub kind: ItemKind,
    pub size: ItemSize,
    /// `None` means the value must be supplied.
    pub default: Option<Value>,
    /// Dimensions of numeric elements. Several entries are applied
    /// cyclically, one per element.
    pub dimensions: Vec<Dimension>,
    /// Maximum string width.
    pub width: Option<usize>,
}

impl ItemSchema {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: ItemSize::Single,
            default: None,
            dimensions: Vec::new(),
            width: None,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Int)
    }

    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Double)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::String)
    }

    pub fn raw_string(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::RawString)
    }

    pub fn uda(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Uda)
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_size(mut self, size: ItemSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Dimension applying to element `index`, if the item has any.
    pub fn dimension_for(&self, index: usize) -> Option<&Dimension> {
        if self.dimensions.is_empty() {
            None
        } else {
            self.dimensions.get(index % self.dimensions.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let item = ItemSchema::double("PRESSURE")
            .with_default(Value::Double(1.0))
            .with_dimension(Dimension::parse("Pressure").unwrap());

        assert_eq!(item.kind, ItemKind::Double);
        assert_eq!(item.size, ItemSize::Single);
        assert_eq!(item.default, Some(Value::Double(1.0)));
        assert_eq!(item.dimensions.len(), 1);
    }

    #[test]
    fn test_dimension_cycles_per_element() {
        let item = ItemSchema::double("DATA")
            .with_size(ItemSize::All)
            .with_dimension(Dimension::dimensionless())
            .with_dimension(Dimension::parse("Pressure").unwrap());

        assert!(item.dimension_for(0).unwrap().is_dimensionless());
        assert_eq!(item.dimension_for(1).unwrap().label(), "Pressure");
        assert!(item.dimension_for(2).unwrap().is_dimensionless());
        assert!(ItemSchema::int("N").dimension_for(0).is_none());
    }

    #[test]
    fn test_max_elements() {
        assert_eq!(ItemSize::Single.max_elements(), Some(1));
        assert_eq!(ItemSize::Fixed(5).max_elements(), Some(5));
        assert_eq!(ItemSize::All.max_elements(), None);
    }
}
