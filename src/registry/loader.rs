//! Loading schema descriptors from disk.
//!
//! A schema directory is walked recursively. Every descriptor file holds
//! exactly one keyword. Loading stops at the first malformed file.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use super::Registry;
use crate::error::{DeckError, Result};
use crate::schema::{descriptor, is_valid_deck_name, KeywordSchema};

/// Format of a descriptor file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

fn detect_format(path: &Path) -> Option<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Some(Format::Json),
        Some("yaml") | Some("yml") => Some(Format::Yaml),
        Some(_) => None,
        // Keyword trees often name files after the keyword with no extension.
        None => {
            let name = path.file_name()?.to_str()?;
            is_valid_deck_name(name).then_some(Format::Json)
        }
    }
}

/// Whether `path` looks like a descriptor file.
pub fn is_descriptor_file(path: &Path) -> bool {
    detect_format(path).is_some()
}

/// Load a single descriptor file.
pub fn load_file(path: &Path) -> Result<KeywordSchema> {
    let format = detect_format(path).ok_or_else(|| DeckError::Schema {
        message: format!("{} is not a descriptor file", path.display()),
        help: Some("Descriptor files end in .json, .yaml or .yml".to_string()),
    })?;

    let content = fs::read_to_string(path).map_err(|e| DeckError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read descriptor: {}", e),
    })?;

    let origin = path.display().to_string();
    match format {
        Format::Json => descriptor::from_json(&content, &origin),
        Format::Yaml => descriptor::from_yaml(&content, &origin),
    }
}

/// Load every descriptor under `dir` into `registry`.
///
/// Files are visited in sorted path order, so later files replace earlier
/// ones deterministically. Returns the number of schemas loaded.
pub fn load_directory(dir: &Path, registry: &mut Registry) -> Result<usize> {
    if !dir.is_dir() {
        return Err(DeckError::Io {
            path: dir.to_path_buf(),
            message: "schema directory does not exist".to_string(),
        });
    }

    let mut loaded = 0;
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| DeckError::Io {
            path: dir.to_path_buf(),
            message: format!("Failed to walk schema directory: {}", e),
        })?;
        let path = entry.path();

        if !entry.file_type().is_file() || !is_descriptor_file(path) {
            continue;
        }
        // Hidden files such as editor swap files.
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        let schema = load_file(path)?;
        tracing::debug!(keyword = %schema.name, path = %path.display(), "loaded schema");
        registry.register(schema)?;
        loaded += 1;
    }

    tracing::info!(count = loaded, dir = %dir.display(), "loaded schema directory");
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SizeRule;
    use tempfile::tempdir;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("a/DIMENS.json")), Some(Format::Json));
        assert_eq!(detect_format(Path::new("a/DIMENS.yml")), Some(Format::Yaml));
        assert_eq!(detect_format(Path::new("a/001_core/DIMENS")), Some(Format::Json));
        assert_eq!(detect_format(Path::new("a/README.md")), None);
        assert_eq!(detect_format(Path::new("a/1234")), None);
    }

    #[test]
    fn test_load_directory_recursive() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("001_core").join("D");
        fs::create_dir_all(&nested).unwrap();

        fs::write(
            nested.join("DIMENS"),
            r#"{"name": "DIMENS", "size": 1, "items": [{"name": "NX", "value_type": "INT"}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("GRID.yaml"), "name: GRID\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a schema").unwrap();

        let mut registry = Registry::new();
        let count = load_directory(dir.path(), &mut registry).unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.lookup("DIMENS").unwrap().size, SizeRule::Fixed(1));
        assert!(registry.lookup("GRID").is_some());
    }

    #[test]
    fn test_malformed_file_fails_whole_load() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("A.json"), r#"{"name": "A"}"#).unwrap();
        fs::write(dir.path().join("B.json"), r#"{"name": "B", "size": "#).unwrap();

        let mut registry = Registry::new();
        let err = load_directory(dir.path(), &mut registry).unwrap_err();
        assert!(matches!(err, DeckError::Schema { .. }));
    }

    #[test]
    fn test_missing_directory() {
        let mut registry = Registry::new();
        let err = load_directory(Path::new("/no/such/schemas"), &mut registry).unwrap_err();
        assert!(matches!(err, DeckError::Io { .. }));
    }

    #[test]
    fn test_directory_overrides_builtin() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("TABDIMS.json"),
            r#"{"name": "TABDIMS", "size": 1, "items": [{"name": "NTSFUN", "value_type": "INT", "default": 3}]}"#,
        )
        .unwrap();

        let mut registry = Registry::builtin().unwrap();
        let before = registry.len();
        load_directory(dir.path(), &mut registry).unwrap();

        assert_eq!(registry.len(), before);
        let items = &registry.lookup("TABDIMS").unwrap().records[0].items;
        assert_eq!(items.len(), 1);
    }
}
