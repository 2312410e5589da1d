//! Source location tracking for diagnostics.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Name used for input that did not come from a file.
pub const MEMORY_SOURCE: &str = "<memory string>";

/// A position in deck input (file and 1-indexed line).
///
/// The file name is shared between every location that points into the
/// same input, so cloning a location is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Arc<str>,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<Arc<str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location with the same file on another line.
    pub fn with_line(&self, line: u32) -> Self {
        Self {
            file: Arc::clone(&self.file),
            line,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(MEMORY_SOURCE, 0)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Location", 2)?;
        state.serialize_field("file", &*self.file)?;
        state.serialize_field("line", &self.line)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let loc = Location::new("CASE.DATA", 12);
        assert_eq!(loc.to_string(), "CASE.DATA:12");
    }

    #[test]
    fn test_with_line_shares_file() {
        let loc = Location::new("CASE.DATA", 1);
        let next = loc.with_line(7);

        assert!(Arc::ptr_eq(&loc.file, &next.file));
        assert_eq!(next.line, 7);
    }

    #[test]
    fn test_location_serializes_flat() {
        let loc = Location::new("A.INC", 3);
        let json = serde_json::to_string(&loc).unwrap();
        assert_eq!(json, r#"{"file":"A.INC","line":3}"#);
    }
}
