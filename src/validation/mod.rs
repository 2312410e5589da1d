//! Deck-level validation.
//!
//! Runs structural checks against a parsed deck: section topology, unit
//! markers and keyword placement. Used by `ecldeck check`.

mod checks;

pub use checks::REQUIRED_SECTIONS;

use crate::context::Diagnostics;
use crate::deck::Deck;
use crate::registry::Registry;

/// Run all validation checks against the deck.
pub fn validate_deck(deck: &Deck, registry: &Registry) -> Diagnostics {
    let mut result = Diagnostics::new();

    result.merge(checks::check_starts_with_runspec(deck));
    result.merge(checks::check_section_order(deck));
    result.merge(checks::check_schedule_last(deck));
    result.merge(checks::check_required_sections(deck));
    result.merge(checks::check_unit_markers(deck));
    result.merge(checks::check_keyword_sections(deck, registry));

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParseContext;
    use crate::parser::Parser;

    const COMPLETE: &str = "\
RUNSPEC
DIMENS
 1 1 1 /
GRID
PROPS
SOLUTION
SCHEDULE
";

    fn validate(text: &str) -> Diagnostics {
        let registry = Registry::builtin().unwrap();
        let parsed = Parser::new(&registry)
            .parse_string(text, &ParseContext::lenient())
            .unwrap();
        validate_deck(&parsed.deck, &registry)
    }

    #[test]
    fn test_validate_complete_deck() {
        assert!(validate(COMPLETE).is_empty());
    }

    #[test]
    fn test_validate_empty_deck() {
        let result = validate("");
        assert!(result.has_errors());
        assert_eq!(result.warning_count(), REQUIRED_SECTIONS.len());
    }

    #[test]
    fn test_validate_out_of_order() {
        let result = validate("RUNSPEC\nPROPS\nGRID\nSOLUTION\nSCHEDULE\n");
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_validate_two_unit_systems() {
        let text = COMPLETE.replace("RUNSPEC\n", "RUNSPEC\nFIELD\nMETRIC\n");
        let result = validate(&text);
        assert_eq!(result.error_count(), 1);
    }
}
