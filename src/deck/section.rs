//! Deck sections and the section state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeckError;

/// A coarse phase of the input language. Sections are totally ordered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Section {
    Runspec,
    Grid,
    Edit,
    Props,
    Regions,
    Solution,
    Summary,
    Schedule,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Runspec,
        Section::Grid,
        Section::Edit,
        Section::Props,
        Section::Regions,
        Section::Solution,
        Section::Summary,
        Section::Schedule,
    ];

    /// The header keyword that opens this section.
    pub fn name(self) -> &'static str {
        match self {
            Section::Runspec => "RUNSPEC",
            Section::Grid => "GRID",
            Section::Edit => "EDIT",
            Section::Props => "PROPS",
            Section::Regions => "REGIONS",
            Section::Solution => "SOLUTION",
            Section::Summary => "SUMMARY",
            Section::Schedule => "SCHEDULE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }

    pub fn is_header(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Section {
    type Err = DeckError;

    /// Case-insensitive header name, e.g. `props`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(&s.trim().to_ascii_uppercase()).ok_or_else(|| DeckError::Config {
            message: format!("unknown section '{}'", s),
            help: Some("Expected a section header such as RUNSPEC or PROPS".to_string()),
        })
    }
}

/// Outcome of a section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved forward to a later section.
    Advanced,
    /// Header of the current section again.
    Repeated,
    /// Header of an earlier section; the tracker did not move.
    Backward,
}

/// Tracks the current section. Starts in RUNSPEC and only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionTracker {
    current: Section,
    seen_header: bool,
}

impl Default for SectionTracker {
    fn default() -> Self {
        Self {
            current: Section::Runspec,
            seen_header: false,
        }
    }
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Section {
        self.current
    }

    /// Whether any section header has been seen yet.
    pub fn seen_header(&self) -> bool {
        self.seen_header
    }

    /// Apply a section header.
    pub fn enter(&mut self, section: Section) -> Transition {
        let transition = match section.cmp(&self.current) {
            std::cmp::Ordering::Greater => {
                self.current = section;
                Transition::Advanced
            }
            std::cmp::Ordering::Equal => Transition::Repeated,
            std::cmp::Ordering::Less => Transition::Backward,
        };
        self.seen_header = true;
        transition
    }
}
