//! Keyword schemas compiled into the binary.

use super::descriptor;
use super::KeywordSchema;
use crate::error::Result;

const BUILTIN_DESCRIPTORS: &str = include_str!("builtin.yaml");

/// Every built-in schema, in registration order.
pub fn keywords() -> Result<Vec<KeywordSchema>> {
    descriptor::list_from_yaml(BUILTIN_DESCRIPTORS, "builtin.yaml")
}

/// Names of the section header keywords.
pub const SECTION_HEADERS: [&str; 8] = [
    "RUNSPEC", "GRID", "EDIT", "PROPS", "REGIONS", "SOLUTION", "SUMMARY", "SCHEDULE",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SizeRule;

    #[test]
    fn test_builtins_load() {
        let schemas = keywords().unwrap();
        assert!(schemas.len() > 40);

        for header in SECTION_HEADERS {
            let schema = schemas.iter().find(|s| s.name == header).unwrap();
            assert_eq!(schema.size, SizeRule::Fixed(0));
        }
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let schemas = keywords().unwrap();
        let mut names: Vec<_> = schemas.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_wildcards_keep_file_order() {
        let schemas = keywords().unwrap();
        let wildcards: Vec<_> = schemas
            .iter()
            .filter(|s| s.is_wildcard())
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(wildcards, vec!["FIELDVEC", "WELLVEC", "GROUPVEC"]);
    }
}
