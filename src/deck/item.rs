//! Parsed items and their canonical-unit cache.

use std::sync::OnceLock;

use serde::Serialize;

use super::value::{UdaValue, Value};
use crate::error::{DeckError, Result};
use crate::schema::{ItemKind, ItemSchema};
use crate::units::{Dimension, UnitSystem};

/// One item of a parsed record.
///
/// Every element carries a flag telling whether it was written in the
/// deck or filled in from the schema default. A defaulted element whose
/// schema has no default holds no value.
///
/// Numeric elements are converted to SI units on first request and cached.
/// Later requests return the cached value even if a different unit system
/// is passed in.
#[derive(Debug, Clone, Serialize)]
pub struct DeckItem {
    name: String,
    kind: ItemKind,
    values: Vec<Option<Value>>,
    defaulted: Vec<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dimensions: Vec<Dimension>,
    #[serde(skip)]
    canonical: Vec<OnceLock<f64>>,
}

impl DeckItem {
    /// An empty item shaped by `schema`.
    pub fn new(schema: &ItemSchema) -> Self {
        Self {
            name: schema.name.clone(),
            kind: schema.kind,
            values: Vec::new(),
            defaulted: Vec::new(),
            dimensions: schema.dimensions.clone(),
            canonical: Vec::new(),
        }
    }

    /// Append an element written in the deck.
    pub fn push(&mut self, value: Value) {
        self.push_element(Some(value), false);
    }

    /// Append a defaulted element.
    pub fn push_default(&mut self, value: Option<Value>) {
        self.push_element(value, true);
    }

    fn push_element(&mut self, value: Option<Value>, defaulted: bool) {
        self.values.push(value);
        self.defaulted.push(defaulted);
        self.canonical.push(OnceLock::new());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of element `index`, if it has one.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<&Value>> {
        self.values.iter().map(Option::as_ref)
    }

    /// True when element `index` was filled in rather than written.
    pub fn is_defaulted(&self, index: usize) -> bool {
        self.defaulted.get(index).copied().unwrap_or(false)
    }

    /// True when the item is empty or every element is defaulted.
    pub fn all_defaulted(&self) -> bool {
        self.defaulted.iter().all(|d| *d)
    }

    /// True when element `index` holds a value.
    pub fn has_value(&self, index: usize) -> bool {
        self.value(index).is_some()
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Dimension of element `index`. Several dimensions apply cyclically.
    pub fn dimension_for(&self, index: usize) -> Option<&Dimension> {
        if self.dimensions.is_empty() {
            None
        } else {
            self.dimensions.get(index % self.dimensions.len())
        }
    }

    fn require(&self, index: usize) -> Result<&Value> {
        if index >= self.values.len() {
            return Err(DeckError::value(format!(
                "item {} has {} elements, index {} is out of range",
                self.name,
                self.values.len(),
                index
            )));
        }
        self.value(index).ok_or_else(|| {
            DeckError::value(format!(
                "item {} element {} is defaulted and has no default value",
                self.name, index
            ))
        })
    }

    fn mismatch(&self, index: usize, expected: &str, found: &Value) -> DeckError {
        DeckError::value(format!(
            "item {} element {} is {}, not {}",
            self.name,
            index,
            found.type_name(),
            expected
        ))
    }

    pub fn get_int(&self, index: usize) -> Result<i64> {
        let value = self.require(index)?;
        value
            .as_int()
            .ok_or_else(|| self.mismatch(index, "an integer", value))
    }

    /// Numeric value in input units. Integers widen to `f64`.
    pub fn get_double(&self, index: usize) -> Result<f64> {
        let value = self.require(index)?;
        value
            .as_double()
            .ok_or_else(|| self.mismatch(index, "a number", value))
    }

    pub fn get_str(&self, index: usize) -> Result<&str> {
        let value = self.require(index)?;
        value
            .as_str()
            .ok_or_else(|| self.mismatch(index, "a string", value))
    }

    pub fn get_uda(&self, index: usize) -> Result<UdaValue> {
        let value = self.require(index)?;
        value
            .as_uda()
            .ok_or_else(|| self.mismatch(index, "a UDA value", value))
    }

    /// Every element as `f64`. Fails on the first element without a number.
    pub fn get_doubles(&self) -> Result<Vec<f64>> {
        (0..self.len()).map(|i| self.get_double(i)).collect()
    }

    /// Element `index` converted to SI units.
    ///
    /// Explicit elements are converted with `active`, defaulted elements
    /// with `default` since schema defaults are written in that system.
    /// The first successful conversion is cached; the systems passed to
    /// later calls are ignored.
    pub fn to_canonical(
        &self,
        index: usize,
        active: &UnitSystem,
        default: &UnitSystem,
    ) -> Result<f64> {
        if let Some(cached) = self.canonical.get(index).and_then(OnceLock::get) {
            return Ok(*cached);
        }

        let raw = self.get_double(index)?;
        let converted = match self.dimension_for(index) {
            Some(dimension) => {
                let system = if self.is_defaulted(index) { default } else { active };
                system.to_si(dimension, raw)
            }
            None => raw,
        };

        Ok(*self.canonical[index].get_or_init(|| converted))
    }

    /// Cached canonical value of element `index`, if it was computed.
    pub fn cached_canonical(&self, index: usize) -> Option<f64> {
        self.canonical.get(index).and_then(OnceLock::get).copied()
    }
}

impl PartialEq for DeckItem {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.values == other.values
            && self.defaulted == other.defaulted
            && self.dimensions == other.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Dimension;

    fn pressure_item() -> DeckItem {
        let schema = ItemSchema::double("PRESSURE")
            .with_default(Value::Double(1.0))
            .with_dimension(Dimension::parse("Pressure").unwrap());
        DeckItem::new(&schema)
    }

    #[test]
    fn test_typed_getters() {
        let mut item = DeckItem::new(&ItemSchema::int("NX"));
        item.push(Value::Int(4));

        assert_eq!(item.get_int(0).unwrap(), 4);
        assert_eq!(item.get_double(0).unwrap(), 4.0);
        assert!(item.get_str(0).is_err());
        assert!(item.get_int(1).is_err());
    }

    #[test]
    fn test_defaulted_without_value() {
        let mut item = DeckItem::new(&ItemSchema::double("P"));
        item.push_default(None);

        assert!(item.is_defaulted(0));
        assert!(!item.has_value(0));
        let err = item.get_double(0).unwrap_err();
        assert!(err.to_string().contains("no default value"));
    }

    #[test]
    fn test_to_canonical_uses_active_for_explicit() {
        let mut item = pressure_item();
        item.push(Value::Double(100.0));

        let field = UnitSystem::field();
        let metric = UnitSystem::metric();
        let si = item.to_canonical(0, &field, &metric).unwrap();
        assert!((si - 100.0 * 6894.757293168361).abs() < 1e-6);
    }

    #[test]
    fn test_to_canonical_uses_default_for_defaulted() {
        let mut item = pressure_item();
        item.push_default(Some(Value::Double(1.0)));

        let si = item
            .to_canonical(0, &UnitSystem::field(), &UnitSystem::metric())
            .unwrap();
        assert_eq!(si, 1.0e5);
    }

    #[test]
    fn test_first_access_wins() {
        let mut item = pressure_item();
        item.push(Value::Double(2.0));
        item.push(Value::Double(2.0));

        let metric = UnitSystem::metric();
        let field = UnitSystem::field();

        let first = item.to_canonical(0, &metric, &metric).unwrap();
        let again = item.to_canonical(0, &field, &metric).unwrap();
        assert_eq!(first, again);
        assert_eq!(item.cached_canonical(0), Some(2.0e5));

        // Each element is cached on its own first access.
        assert_eq!(item.cached_canonical(1), None);
        let second = item.to_canonical(1, &field, &metric).unwrap();
        assert_ne!(second, first);
    }

    #[test]
    fn test_dimensionless_passthrough() {
        let mut item = DeckItem::new(&ItemSchema::double("SKIN"));
        item.push(Value::Double(0.5));
        let v = item
            .to_canonical(0, &UnitSystem::lab(), &UnitSystem::metric())
            .unwrap();
        assert_eq!(v, 0.5);
    }

    #[test]
    fn test_uda_name_has_no_canonical_value() {
        let mut item = DeckItem::new(&ItemSchema::uda("ORAT"));
        item.push(Value::Uda(UdaValue::Name("WUOPRL".into())));

        assert_eq!(
            item.get_uda(0).unwrap(),
            UdaValue::Name("WUOPRL".into())
        );
        assert!(item
            .to_canonical(0, &UnitSystem::metric(), &UnitSystem::metric())
            .is_err());
    }

    #[test]
    fn test_equality_ignores_cache() {
        let mut a = pressure_item();
        a.push(Value::Double(3.0));
        let b = a.clone();
        a.to_canonical(0, &UnitSystem::metric(), &UnitSystem::metric())
            .unwrap();
        assert_eq!(a, b);
    }
}
