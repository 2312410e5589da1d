//! Structural checks on a parsed deck.
//!
//! Each check takes the deck (and the registry where schemas matter) and
//! returns its findings as `Diagnostics`.

use crate::context::{Diagnostic, Diagnostics, ErrorKind};
use crate::deck::{Deck, DeckKeyword, Section};
use crate::registry::Registry;
use crate::units::UnitSystemKind;

/// Sections a complete simulation deck must contain.
pub const REQUIRED_SECTIONS: [Section; 5] = [
    Section::Runspec,
    Section::Grid,
    Section::Props,
    Section::Solution,
    Section::Schedule,
];

fn section_headers(deck: &Deck) -> impl Iterator<Item = (&DeckKeyword, Section)> {
    deck.iter()
        .filter_map(|k| Section::from_name(k.name()).map(|s| (k, s)))
}

fn at(diagnostic: Diagnostic, keyword: &DeckKeyword) -> Diagnostic {
    diagnostic
        .at(Some(keyword.location()))
        .in_keyword(Some(keyword.name()))
}

/// The first keyword must be the RUNSPEC header.
pub fn check_starts_with_runspec(deck: &Deck) -> Diagnostics {
    let mut result = Diagnostics::new();

    match deck.get(0) {
        Some(first) if first.name() == Section::Runspec.name() => {}
        Some(first) => result.push(
            at(
                Diagnostic::error(
                    ErrorKind::SectionViolation,
                    format!("deck starts with {} instead of RUNSPEC", first.name()),
                ),
                first,
            )
            .with_help("Put RUNSPEC on the first keyword line of the data file"),
        ),
        None => result.push(Diagnostic::error(
            ErrorKind::SectionViolation,
            "deck is empty",
        )),
    }

    result
}

/// Section headers must appear in canonical order. Repeats are allowed.
pub fn check_section_order(deck: &Deck) -> Diagnostics {
    let mut result = Diagnostics::new();
    let mut latest: Option<Section> = None;

    for (keyword, section) in section_headers(deck) {
        match latest {
            // Headers after SCHEDULE are reported by check_schedule_last.
            Some(Section::Schedule) => {}
            Some(previous) if section < previous => result.push(at(
                Diagnostic::error(
                    ErrorKind::SectionViolation,
                    format!("{} section after {}", section, previous),
                ),
                keyword,
            )),
            _ => latest = Some(section),
        }
    }

    result
}

/// Nothing but SCHEDULE content may follow the SCHEDULE header.
pub fn check_schedule_last(deck: &Deck) -> Diagnostics {
    let mut result = Diagnostics::new();
    let mut in_schedule = false;

    for (keyword, section) in section_headers(deck) {
        if in_schedule && section != Section::Schedule {
            result.push(
                at(
                    Diagnostic::error(
                        ErrorKind::SectionViolation,
                        format!("{} header after SCHEDULE", section),
                    ),
                    keyword,
                )
                .with_help("SCHEDULE must be the last section"),
            );
        }
        in_schedule |= section == Section::Schedule;
    }

    result
}

/// Warn about missing sections of a complete deck.
pub fn check_required_sections(deck: &Deck) -> Diagnostics {
    let mut result = Diagnostics::new();

    for section in REQUIRED_SECTIONS {
        if !deck.has_keyword(section.name()) {
            result.push(Diagnostic::warning(
                ErrorKind::SectionViolation,
                format!("deck has no {} section", section),
            ));
        }
    }

    result
}

/// At most one unit system marker.
pub fn check_unit_markers(deck: &Deck) -> Diagnostics {
    let mut result = Diagnostics::new();

    let markers: Vec<&DeckKeyword> = deck
        .iter()
        .filter(|k| UnitSystemKind::from_keyword(k.name()).is_some())
        .collect();

    if let [first, rest @ ..] = markers.as_slice() {
        for extra in rest {
            result.push(
                at(
                    Diagnostic::error(
                        ErrorKind::KeywordCombination,
                        format!(
                            "{} selects a second unit system after {} at {}",
                            extra.name(),
                            first.name(),
                            first.location()
                        ),
                    ),
                    extra,
                )
                .with_help("Keep one of METRIC, FIELD, LAB or PVT-M"),
            );
        }
    }

    result
}

/// Keywords must sit in a section their schema allows.
pub fn check_keyword_sections(deck: &Deck, registry: &Registry) -> Diagnostics {
    let mut result = Diagnostics::new();

    for keyword in deck {
        let Some(schema) = registry.find(keyword.name()) else {
            continue;
        };
        if !schema.valid_in(keyword.section()) {
            result.push(at(
                Diagnostic::warning(
                    ErrorKind::SectionViolation,
                    format!(
                        "{} appears in the {} section",
                        keyword.name(),
                        keyword.section()
                    ),
                ),
                keyword,
            ));
        }
    }

    result
}
