//! The stack of open input sources.
//!
//! The root deck sits at the bottom. Each INCLUDE pushes a new lexer,
//! which is read to completion before the including file resumes. The
//! canonical path of every open file is kept so that a file including
//! itself, directly or through others, is caught before it is opened.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::lexer::Lexer;
use crate::error::{DeckError, Result};

/// Why an include could not be opened.
#[derive(Debug)]
pub enum IncludeError {
    /// The file does not exist or is not readable.
    Missing(PathBuf),
    /// The file is already open further down the stack.
    Cycle(Vec<PathBuf>),
}

#[derive(Debug)]
struct Frame {
    lexer: Lexer,
    /// Canonical path, `None` for in-memory input.
    path: Option<PathBuf>,
}

/// Open inputs, innermost last.
#[derive(Debug)]
pub struct InputStack {
    frames: Vec<Frame>,
    /// Directory relative include paths are resolved against.
    root_dir: PathBuf,
    /// `$NAME` substitutions from PATHS.
    aliases: HashMap<String, String>,
}

impl InputStack {
    /// Stack holding the root data file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| DeckError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read deck: {}", e),
        })?;
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let root_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            frames: vec![Frame {
                lexer: Lexer::new(path.display().to_string(), text),
                path: Some(canonical),
            }],
            root_dir,
            aliases: HashMap::new(),
        })
    }

    /// Stack holding in-memory text. Includes resolve against `root_dir`.
    pub fn from_text(name: &str, text: &str, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            frames: vec![Frame {
                lexer: Lexer::new(name, text),
                path: None,
            }],
            root_dir: root_dir.into(),
            aliases: HashMap::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Innermost lexer.
    pub fn current(&mut self) -> Option<&mut Lexer> {
        self.frames.last_mut().map(|f| &mut f.lexer)
    }

    /// Close the innermost input.
    pub fn pop(&mut self) {
        if let Some(frame) = self.frames.pop() {
            tracing::debug!(source = %frame.lexer.source(), "closed input");
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn add_alias(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.aliases.insert(name.into(), value.into());
    }

    /// Turn an INCLUDE argument into a path.
    ///
    /// Backslashes become slashes, a leading `$NAME` is replaced by its
    /// PATHS value, and relative paths are taken from the root deck's
    /// directory. Unknown aliases are returned as `Err` with the alias name.
    pub fn resolve(&self, argument: &str) -> std::result::Result<PathBuf, String> {
        let mut text = argument.trim().to_string();
        if text.contains('\\') {
            tracing::warn!(path = %text, "replacing backslashes in include path");
            text = text.replace('\\', "/");
        }

        if let Some(rest) = text.strip_prefix('$') {
            let (alias, tail) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, ""),
            };
            let value = self.aliases.get(alias).ok_or_else(|| alias.to_string())?;
            text = format!("{}{}", value, tail);
        }

        let path = PathBuf::from(text);
        Ok(if path.is_absolute() {
            path
        } else {
            self.root_dir.join(path)
        })
    }

    /// Open `path` on top of the stack.
    pub fn push_file(&mut self, path: &Path) -> std::result::Result<(), IncludeError> {
        let canonical =
            fs::canonicalize(path).map_err(|_| IncludeError::Missing(path.to_path_buf()))?;

        if self
            .frames
            .iter()
            .any(|f| f.path.as_deref() == Some(canonical.as_path()))
        {
            let mut chain: Vec<PathBuf> = self.frames.iter().filter_map(|f| f.path.clone()).collect();
            chain.push(canonical);
            return Err(IncludeError::Cycle(chain));
        }

        let text =
            fs::read_to_string(&canonical).map_err(|_| IncludeError::Missing(path.to_path_buf()))?;
        tracing::info!(path = %path.display(), depth = self.frames.len(), "including file");

        self.frames.push(Frame {
            lexer: Lexer::new(path.display().to_string(), text),
            path: Some(canonical),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_relative_to_root() {
        let stack = InputStack::from_text("<memory string>", "", "/data/case");
        assert_eq!(
            stack.resolve(" grid.inc ").unwrap(),
            PathBuf::from("/data/case/grid.inc")
        );
        assert_eq!(
            stack.resolve("include\\grid.inc").unwrap(),
            PathBuf::from("/data/case/include/grid.inc")
        );
        assert_eq!(stack.resolve("/abs/x.inc").unwrap(), PathBuf::from("/abs/x.inc"));
    }

    #[test]
    fn test_resolve_alias() {
        let mut stack = InputStack::from_text("<memory string>", "", "/data/case");
        stack.add_alias("INC", "/shared/include");

        assert_eq!(
            stack.resolve("$INC/pvt.inc").unwrap(),
            PathBuf::from("/shared/include/pvt.inc")
        );
        assert_eq!(stack.resolve("$NOPE/pvt.inc").unwrap_err(), "NOPE");
    }

    #[test]
    fn test_push_detects_cycle() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("A.INC");
        fs::write(&a, "INCLUDE\n 'A.INC' /\n").unwrap();

        let mut stack = InputStack::from_file(&a).unwrap();
        match stack.push_file(&a) {
            Err(IncludeError::Cycle(chain)) => assert_eq!(chain.len(), 2),
            other => panic!("expected cycle, got {:?}", other),
        }
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_push_missing() {
        let dir = tempdir().unwrap();
        let mut stack = InputStack::from_text("<memory string>", "", dir.path());
        let missing = dir.path().join("NOPE.INC");
        assert!(matches!(
            stack.push_file(&missing),
            Err(IncludeError::Missing(_))
        ));
    }

    #[test]
    fn test_push_and_pop() {
        let dir = tempdir().unwrap();
        let inc = dir.path().join("GRID.INC");
        fs::write(&inc, "PORO\n 4*0.2 /\n").unwrap();

        let mut stack = InputStack::from_text("<memory string>", "", dir.path());
        stack.push_file(&inc).unwrap();
        assert_eq!(stack.depth(), 2);
        stack.pop();
        assert_eq!(stack.depth(), 1);
    }
}
