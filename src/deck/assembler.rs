//! Builds a [`Deck`] one keyword at a time.

use std::path::PathBuf;

use super::section::{Section, SectionTracker, Transition};
use super::{Deck, DeckKeyword};
use crate::schema::KeywordSchema;
use crate::units::UnitSystemKind;

/// Owns the deck under construction and the section state machine.
///
/// The assembler does not apply error policy. Checks return a message
/// describing the problem and the caller decides what to do with it.
#[derive(Debug, Default)]
pub struct DeckAssembler {
    deck: Deck,
    tracker: SectionTracker,
}

impl DeckAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_section(&self) -> Section {
        self.tracker.current()
    }

    /// The deck read so far, for size resolution.
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Apply a section header keyword.
    pub fn enter_section(&mut self, section: Section) -> Transition {
        let transition = self.tracker.enter(section);
        tracing::debug!(%section, ?transition, "section header");
        transition
    }

    /// Message when `schema` is restricted to sections other than the
    /// current one.
    pub fn check_section(&self, schema: &KeywordSchema) -> Option<String> {
        let current = self.current_section();
        if schema.valid_in(current) {
            return None;
        }
        let allowed: Vec<&str> = schema.sections.iter().map(|s| s.name()).collect();
        Some(format!(
            "{} is not valid in the {} section (allowed: {})",
            schema.name,
            current,
            allowed.join(", ")
        ))
    }

    /// Message when a required keyword is absent or a prohibited one is
    /// present.
    pub fn check_combination(&self, schema: &KeywordSchema) -> Option<String> {
        let missing: Vec<&str> = schema
            .requires
            .iter()
            .filter(|name| !self.deck.has_keyword(name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Some(format!(
                "{} requires {}, which has not been seen",
                schema.name,
                missing.join(", ")
            ));
        }

        let present: Vec<&str> = schema
            .prohibits
            .iter()
            .filter(|name| self.deck.has_keyword(name))
            .map(String::as_str)
            .collect();
        if !present.is_empty() {
            return Some(format!(
                "{} cannot be combined with {}",
                schema.name,
                present.join(", ")
            ));
        }
        None
    }

    /// Append a typed keyword. Unit marker keywords switch the active unit
    /// system.
    pub fn append(&mut self, keyword: DeckKeyword) {
        if let Some(kind) = UnitSystemKind::from_keyword(keyword.name()) {
            tracing::debug!(units = %kind, "unit system selected");
            self.deck.set_active_unit_system(kind);
        }
        self.deck.push(keyword);
    }

    pub fn set_data_file(&mut self, path: impl Into<PathBuf>) {
        self.deck.set_data_file(path);
    }

    pub fn finish(self) -> Deck {
        self.deck
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Location;

    fn kw(name: &str, section: Section) -> DeckKeyword {
        DeckKeyword::new(name, Location::default(), section)
    }

    #[test]
    fn test_section_restriction() {
        let mut assembler = DeckAssembler::new();
        let swof = KeywordSchema::new("SWOF").in_sections(&[Section::Props]);

        assert!(assembler
            .check_section(&swof)
            .unwrap()
            .contains("not valid in the RUNSPEC section"));

        assembler.enter_section(Section::Props);
        assert!(assembler.check_section(&swof).is_none());
        assert!(assembler.check_section(&KeywordSchema::new("ECHO")).is_none());
    }

    #[test]
    fn test_backward_header_keeps_section() {
        let mut assembler = DeckAssembler::new();
        assert_eq!(assembler.enter_section(Section::Props), Transition::Advanced);
        assert_eq!(assembler.enter_section(Section::Grid), Transition::Backward);
        assert_eq!(assembler.current_section(), Section::Props);
    }

    #[test]
    fn test_combinations() {
        let mut assembler = DeckAssembler::new();
        let vapoil = KeywordSchema::new("VAPOIL").requiring("OIL").prohibiting("NOVAPOIL");

        let message = assembler.check_combination(&vapoil).unwrap();
        assert!(message.contains("requires OIL"));

        assembler.append(kw("OIL", Section::Runspec));
        assert!(assembler.check_combination(&vapoil).is_none());

        assembler.append(kw("NOVAPOIL", Section::Runspec));
        assert!(assembler
            .check_combination(&vapoil)
            .unwrap()
            .contains("cannot be combined with NOVAPOIL"));
    }

    #[test]
    fn test_unit_marker_switches_system() {
        let mut assembler = DeckAssembler::new();
        assembler.append(kw("FIELD", Section::Runspec));
        let deck = assembler.finish();

        assert_eq!(deck.active_units().kind(), UnitSystemKind::Field);
        assert_eq!(deck.default_units().kind(), UnitSystemKind::Metric);
        assert!(deck.has_keyword("FIELD"));
    }
}
