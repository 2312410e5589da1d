//! Serialized keyword descriptors.
//!
//! Descriptors are JSON or YAML documents, one keyword per file:
//!
//! ```json
//! {
//!   "name": "EQUIL",
//!   "sections": ["SOLUTION"],
//!   "size": {"keyword": "EQLDIMS", "item": "NTEQUL"},
//!   "items": [
//!     {"name": "DATUM_DEPTH", "value_type": "DOUBLE", "default": 0, "dimension": "Length"},
//!     {"name": "DATUM_PRESSURE", "value_type": "DOUBLE", "dimension": "Pressure"}
//!   ]
//! }
//! ```
//!
//! Any malformed descriptor is a schema error. There is no partial load.

use serde::Deserialize;

use super::{ItemKind, ItemSchema, ItemSize, KeywordSchema, RecordSchema, SizeRef, SizeRule};
use crate::deck::{Section, UdaValue, Value};
use crate::error::{DeckError, Result};
use crate::units::Dimension;

/// One keyword as written in a descriptor file.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordDescriptor {
    pub name: String,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub size: Option<SizeDescriptor>,
    #[serde(default)]
    pub num_tables: Option<SizeRefDescriptor>,
    #[serde(default)]
    pub deck_names: Vec<String>,
    #[serde(default)]
    pub deck_name_regex: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<ItemDescriptor>>,
    #[serde(default)]
    pub records: Option<Vec<Vec<ItemDescriptor>>>,
    #[serde(default)]
    pub alternating_records: Option<Vec<Vec<ItemDescriptor>>>,
    #[serde(default)]
    pub records_set: Option<Vec<Vec<ItemDescriptor>>>,
    #[serde(default)]
    pub data: Option<ItemDescriptor>,
    #[serde(default)]
    pub code: Option<CodeDescriptor>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub prohibits: Vec<String>,
    #[serde(default)]
    pub min_size: Option<usize>,
    #[serde(default, alias = "comment")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SizeDescriptor {
    Count(usize),
    Named(String),
    Reference(SizeRefDescriptor),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SizeRefDescriptor {
    pub keyword: String,
    pub item: String,
    #[serde(default)]
    pub shift: i64,
}

impl From<SizeRefDescriptor> for SizeRef {
    fn from(d: SizeRefDescriptor) -> Self {
        SizeRef::new(d.keyword, d.item).with_shift(d.shift)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeDescriptor {
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DimensionDescriptor {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    pub value_type: String,
    #[serde(default)]
    pub size_type: Option<String>,
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub dimension: Option<DimensionDescriptor>,
    #[serde(default)]
    pub width: Option<usize>,
}

/// Parse a JSON descriptor. `origin` names the source in error messages.
pub fn from_json(text: &str, origin: &str) -> Result<KeywordSchema> {
    let descriptor: KeywordDescriptor =
        serde_json::from_str(text).map_err(|e| load_error(origin, e))?;
    descriptor.into_schema()
}

/// Parse a YAML descriptor.
pub fn from_yaml(text: &str, origin: &str) -> Result<KeywordSchema> {
    let descriptor: KeywordDescriptor =
        serde_yaml::from_str(text).map_err(|e| load_error(origin, e))?;
    descriptor.into_schema()
}

/// Parse a YAML list of descriptors.
pub fn list_from_yaml(text: &str, origin: &str) -> Result<Vec<KeywordSchema>> {
    let descriptors: Vec<KeywordDescriptor> =
        serde_yaml::from_str(text).map_err(|e| load_error(origin, e))?;
    descriptors.into_iter().map(KeywordDescriptor::into_schema).collect()
}

fn load_error(origin: &str, e: impl std::fmt::Display) -> DeckError {
    DeckError::Schema {
        message: format!("malformed descriptor {}: {}", origin, e),
        help: Some("Each descriptor must hold one keyword object with at least a name".to_string()),
    }
}

impl KeywordDescriptor {
    /// Convert to a validated schema.
    pub fn into_schema(self) -> Result<KeywordSchema> {
        let name = self.name;
        let err = |message: String| DeckError::schema(format!("{}: {}", name, message));

        let mut schema = KeywordSchema::new(name.clone());
        schema.deck_names = self.deck_names;
        schema.requires = self.requires;
        schema.prohibits = self.prohibits;
        schema.min_size = self.min_size;
        schema.description = self.description;

        for section in &self.sections {
            let parsed = Section::from_name(section)
                .ok_or_else(|| err(format!("unknown section '{}'", section)))?;
            schema.sections.push(parsed);
        }

        let record_sources = [
            self.items.is_some(),
            self.records.is_some(),
            self.alternating_records.is_some(),
            self.records_set.is_some(),
            self.data.is_some(),
            self.code.is_some(),
        ];
        if record_sources.iter().filter(|s| **s).count() > 1 {
            return Err(err(
                "only one of items, records, alternating_records, records_set, data and code may be given"
                    .to_string(),
            ));
        }

        if let Some(items) = self.items {
            schema.records.push(convert_record(items, &name)?);
        }
        if let Some(records) = self.records {
            for record in records {
                schema.records.push(convert_record(record, &name)?);
            }
        }
        if let Some(records) = self.alternating_records {
            for record in records {
                schema.records.push(convert_record(record, &name)?);
            }
            schema.alternating = true;
        }
        let has_records_set = self.records_set.is_some();
        if let Some(records) = self.records_set {
            for record in records {
                schema.records.push(convert_record(record, &name)?);
            }
            schema.double_records = true;
        }
        let has_data = self.data.is_some();
        if let Some(data) = self.data {
            let item = convert_item(data, "data", &name)?;
            schema = schema.as_data(item);
        }
        let has_code = self.code.is_some();
        if let Some(code) = self.code {
            schema = schema.as_code(code.end, ItemSchema::string("code"));
        }

        schema.size = match (self.size, self.num_tables) {
            (Some(_), Some(_)) => {
                return Err(err("size and num_tables are mutually exclusive".to_string()))
            }
            (Some(SizeDescriptor::Count(n)), None) => SizeRule::Fixed(n),
            (Some(SizeDescriptor::Named(kind)), None) => match kind.as_str() {
                "SLASH_TERMINATED" => SizeRule::Unbounded,
                "UNKNOWN" => SizeRule::UntilNextKeyword,
                "DOUBLE_SLASH_TERMINATED" => SizeRule::TableCollection { tables: None },
                other => return Err(err(format!("unknown size '{}'", other))),
            },
            (Some(SizeDescriptor::Reference(r)), None) => SizeRule::KeywordDependent(r.into()),
            (None, Some(tables)) => SizeRule::TableCollection {
                tables: Some(tables.into()),
            },
            (None, None) if has_records_set => SizeRule::TableCollection { tables: None },
            (None, None) if has_code || has_data => SizeRule::Fixed(1),
            (None, None) if schema.records.is_empty() => SizeRule::Fixed(0),
            (None, None) => SizeRule::Unbounded,
        };

        if let Some(pattern) = self.deck_name_regex {
            schema = schema.with_match(&pattern)?;
        }

        schema.validate()?;
        Ok(schema)
    }
}

fn convert_record(items: Vec<ItemDescriptor>, keyword: &str) -> Result<RecordSchema> {
    let items = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| convert_item(item, &format!("ITEM{}", i + 1), keyword))
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordSchema::new(items))
}

fn convert_item(d: ItemDescriptor, fallback_name: &str, keyword: &str) -> Result<ItemSchema> {
    let name = d.name.unwrap_or_else(|| fallback_name.to_string());
    let err = |message: String| DeckError::schema(format!("{} item {}: {}", keyword, name, message));

    let kind = match d.value_type.as_str() {
        "INT" => ItemKind::Int,
        "DOUBLE" => ItemKind::Double,
        "STRING" => ItemKind::String,
        "RAW_STRING" => ItemKind::RawString,
        "UDA" => ItemKind::Uda,
        other => return Err(err(format!("unknown value_type '{}'", other))),
    };

    let size = match (d.size_type.as_deref(), d.length) {
        (None | Some("SINGLE"), None) => ItemSize::Single,
        (None, Some(n)) if n > 0 => ItemSize::Fixed(n),
        (Some("ALL"), None) => ItemSize::All,
        (Some(other), None) => return Err(err(format!("unknown size_type '{}'", other))),
        _ => return Err(err("length must be positive and cannot be combined with size_type".to_string())),
    };

    let default = d
        .default
        .map(|v| convert_default(kind, v))
        .transpose()
        .map_err(|message| err(message))?;

    let mut item = ItemSchema::new(name.clone(), kind).with_size(size);
    item.default = default;
    item.width = d.width;

    let labels = match d.dimension {
        None => Vec::new(),
        Some(DimensionDescriptor::One(label)) => vec![label],
        Some(DimensionDescriptor::Many(labels)) => labels,
    };
    if !labels.is_empty() && !matches!(kind, ItemKind::Double | ItemKind::Uda) {
        return Err(err(format!("dimension given for {} item", kind)));
    }
    for label in labels {
        item = item.with_dimension(Dimension::parse(&label)?);
    }

    Ok(item)
}

fn convert_default(kind: ItemKind, v: serde_json::Value) -> std::result::Result<Value, String> {
    use serde_json::Value as Json;

    match (kind, &v) {
        (ItemKind::Int, Json::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| format!("default {} is not an integer", n)),
        (ItemKind::Double, Json::Number(n)) => n
            .as_f64()
            .map(Value::Double)
            .ok_or_else(|| format!("default {} is not a number", n)),
        (ItemKind::String | ItemKind::RawString, Json::String(s)) => Ok(Value::Str(s.clone())),
        (ItemKind::Uda, Json::Number(n)) => n
            .as_f64()
            .map(|f| Value::Uda(UdaValue::Number(f)))
            .ok_or_else(|| format!("default {} is not a number", n)),
        (ItemKind::Uda, Json::String(s)) => Ok(Value::Uda(UdaValue::Name(s.clone()))),
        _ => Err(format!("default {} does not match value_type {}", v, kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_fixed_keyword() {
        let schema = from_json(
            r#"{"name": "DIMENS", "sections": ["RUNSPEC"], "size": 1,
                "items": [
                  {"name": "NX", "value_type": "INT"},
                  {"name": "NY", "value_type": "INT"},
                  {"name": "NZ", "value_type": "INT"}
                ]}"#,
            "DIMENS",
        )
        .unwrap();

        assert_eq!(schema.size, SizeRule::Fixed(1));
        assert_eq!(schema.sections, vec![Section::Runspec]);
        assert_eq!(schema.records[0].items.len(), 3);
    }

    #[test]
    fn test_keyword_dependent_size() {
        let schema = from_json(
            r#"{"name": "EQUIL", "size": {"keyword": "EQLDIMS", "item": "NTEQUL", "shift": 1},
                "items": [{"name": "DATUM_DEPTH", "value_type": "DOUBLE", "default": 0, "dimension": "Length"}]}"#,
            "EQUIL",
        )
        .unwrap();

        assert_eq!(
            schema.size,
            SizeRule::KeywordDependent(SizeRef::new("EQLDIMS", "NTEQUL").with_shift(1))
        );
        let item = &schema.records[0].items[0];
        assert_eq!(item.default, Some(Value::Double(0.0)));
        assert_eq!(item.dimensions[0].label(), "Length");
    }

    #[test]
    fn test_yaml_descriptor_with_regex_and_data() {
        let schema = from_yaml(
            "name: PERMX\nsections: [GRID]\ndata:\n  value_type: DOUBLE\n  dimension: Permeability\n",
            "PERMX.yaml",
        )
        .unwrap();
        assert!(schema.data);
        assert_eq!(schema.records[0].items[0].name, "data");

        let wildcard = from_yaml(
            "name: WELLVEC\nsize: 1\ndeck_name_regex: 'W[A-Z]+'\nitems:\n  - {name: WELLS, value_type: STRING, size_type: ALL}\n",
            "WELLVEC.yaml",
        )
        .unwrap();
        assert!(wildcard.matches_pattern("WOPR"));
    }

    #[test]
    fn test_size_defaults() {
        let slash = from_json(
            r#"{"name": "WELSPECS", "items": [{"name": "WELL", "value_type": "STRING"}]}"#,
            "x",
        )
        .unwrap();
        assert_eq!(slash.size, SizeRule::Unbounded);

        let header = from_json(r#"{"name": "GRID"}"#, "x").unwrap();
        assert_eq!(header.size, SizeRule::Fixed(0));

        let unknown = from_json(
            r#"{"name": "VFPPROD", "size": "UNKNOWN", "items": [{"name": "X", "value_type": "DOUBLE", "size_type": "ALL"}]}"#,
            "x",
        )
        .unwrap();
        assert_eq!(unknown.size, SizeRule::UntilNextKeyword);
    }

    #[test]
    fn test_records_set_is_double_record_collection() {
        let schema = from_json(
            r#"{"name": "GCUTBACT", "records_set": [
                  [{"name": "GROUP", "value_type": "STRING"}],
                  [{"name": "LIMIT", "value_type": "DOUBLE"}]
               ]}"#,
            "x",
        )
        .unwrap();
        assert!(schema.double_records);
        assert_eq!(schema.size, SizeRule::TableCollection { tables: None });
    }

    #[test]
    fn test_code_keyword() {
        let schema = from_json(r#"{"name": "PYINPUT", "code": {"end": "PYEND"}}"#, "x").unwrap();
        assert_eq!(schema.code_end.as_deref(), Some("PYEND"));
        assert_eq!(schema.size, SizeRule::Fixed(1));
    }

    #[test]
    fn test_malformed_descriptors_fail() {
        assert!(from_json("{", "x").is_err());
        assert!(from_json(r#"{"sections": []}"#, "x").is_err());
        assert!(from_json(
            r#"{"name": "X", "items": [{"name": "A", "value_type": "FLOAT"}]}"#,
            "x"
        )
        .is_err());
        assert!(from_json(
            r#"{"name": "X", "items": [{"name": "A", "value_type": "INT", "default": "one"}]}"#,
            "x"
        )
        .is_err());
        assert!(from_json(r#"{"name": "X", "sections": ["NOWHERE"]}"#, "x").is_err());
        assert!(from_json(
            r#"{"name": "X", "items": [{"name": "A", "value_type": "DOUBLE", "dimension": "Furlong"}]}"#,
            "x"
        )
        .is_err());
        assert!(from_json(r#"{"name": "X", "size": "SOMETIMES"}"#, "x").is_err());
    }

    #[test]
    fn test_uda_defaults() {
        let schema = from_json(
            r#"{"name": "WCONPROD", "items": [
                 {"name": "ORAT", "value_type": "UDA", "default": 0},
                 {"name": "WRAT", "value_type": "UDA", "default": "WUWRAT"}
               ]}"#,
            "x",
        )
        .unwrap();
        let items = &schema.records[0].items;
        assert_eq!(items[0].default, Some(Value::Uda(UdaValue::Number(0.0))));
        assert_eq!(items[1].default, Some(Value::Uda(UdaValue::Name("WUWRAT".into()))));
    }
}
