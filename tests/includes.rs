//! INCLUDE, PATHS and ENDINC handling against files on disk.

use std::fs;
use std::path::Path;

use ecldeck::context::{Action, ErrorKind, ParseContext};
use ecldeck::deck::Section;
use ecldeck::error::DeckError;
use ecldeck::parser::{Parsed, Parser};
use ecldeck::registry::Registry;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn parse_file(path: &Path, ctx: &ParseContext) -> ecldeck::error::Result<Parsed> {
    let registry = Registry::builtin().unwrap();
    Parser::new(&registry).parse_file(path, ctx)
}

#[test]
fn test_include_is_read_in_place() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "CASE.DATA",
        "RUNSPEC\nINCLUDE\n 'include/dims.inc' /\nOIL\n",
    );
    write(dir.path(), "include/dims.inc", "DIMENS\n 3 3 1 /\n");

    let parsed = parse_file(&dir.path().join("CASE.DATA"), &ParseContext::new()).unwrap();
    let names: Vec<&str> = parsed.deck.iter().map(|k| k.name()).collect();
    assert_eq!(names, vec!["RUNSPEC", "DIMENS", "OIL"]);

    let dimens = parsed.deck.last("DIMENS").unwrap();
    assert!(dimens.location().file.ends_with("dims.inc"));
    assert_eq!(dimens.location().line, 1);
    assert_eq!(parsed.deck.last("OIL").unwrap().location().line, 4);
}

#[test]
fn test_nested_includes_resolve_from_root_directory() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "CASE.DATA",
        "RUNSPEC\nINCLUDE\n 'include/runspec.inc' /\n",
    );
    write(
        dir.path(),
        "include/runspec.inc",
        "DIMENS\n 3 3 1 /\nINCLUDE\n 'include/tables.inc' /\nWATER\n",
    );
    write(dir.path(), "include/tables.inc", "TABDIMS\n 2 /\n");

    let parsed = parse_file(&dir.path().join("CASE.DATA"), &ParseContext::new()).unwrap();
    let names: Vec<&str> = parsed.deck.iter().map(|k| k.name()).collect();
    assert_eq!(names, vec!["RUNSPEC", "DIMENS", "TABDIMS", "WATER"]);
    assert!(parsed.diagnostics.is_empty());
}

#[test]
fn test_paths_alias() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "CASE.DATA",
        "PATHS\n 'INC' 'shared/runspec' /\n/\nRUNSPEC\nINCLUDE\n '$INC/dims.inc' /\n",
    );
    write(dir.path(), "shared/runspec/dims.inc", "DIMENS\n 5 1 1 /\n");

    let parsed = parse_file(&dir.path().join("CASE.DATA"), &ParseContext::new()).unwrap();
    assert!(!parsed.deck.has_keyword("PATHS"));
    let nx = parsed.deck.last("DIMENS").unwrap().record(0).unwrap();
    assert_eq!(nx.item("NX").unwrap().get_int(0).unwrap(), 5);
}

#[test]
fn test_unknown_alias_is_a_missing_include() {
    let dir = tempdir().unwrap();
    write(dir.path(), "CASE.DATA", "RUNSPEC\nINCLUDE\n '$NOWHERE/dims.inc' /\nOIL\n");

    let path = dir.path().join("CASE.DATA");
    let err = parse_file(&path, &ParseContext::new()).unwrap_err();
    assert_eq!(err.diagnostics().last().unwrap().kind, ErrorKind::MissingInclude);

    let ctx = ParseContext::new().with(ErrorKind::MissingInclude, Action::Warn);
    let parsed = parse_file(&path, &ctx).unwrap();
    assert!(parsed.deck.has_keyword("OIL"));
    assert_eq!(parsed.diagnostics.count_kind(ErrorKind::MissingInclude), 1);
}

#[test]
fn test_inclusion_cycle_is_fatal_even_when_lenient() {
    let dir = tempdir().unwrap();
    write(dir.path(), "CASE.DATA", "RUNSPEC\nINCLUDE\n 'a.inc' /\n");
    write(dir.path(), "a.inc", "OIL\nINCLUDE\n 'b.inc' /\n");
    write(dir.path(), "b.inc", "WATER\nINCLUDE\n 'a.inc' /\n");

    let err = parse_file(&dir.path().join("CASE.DATA"), &ParseContext::lenient()).unwrap_err();
    assert!(matches!(err, DeckError::Parse { .. }));
    let trigger = err.diagnostics().last().unwrap();
    assert_eq!(trigger.kind, ErrorKind::InclusionCycle);
    assert!(trigger.message.contains("a.inc"));
}

#[test]
fn test_root_file_cannot_include_itself() {
    let dir = tempdir().unwrap();
    write(dir.path(), "CASE.DATA", "RUNSPEC\nINCLUDE\n 'CASE.DATA' /\n");

    let err = parse_file(&dir.path().join("CASE.DATA"), &ParseContext::lenient()).unwrap_err();
    assert_eq!(err.diagnostics().last().unwrap().kind, ErrorKind::InclusionCycle);
}

#[test]
fn test_endinc_closes_the_include() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "CASE.DATA",
        "RUNSPEC\nINCLUDE\n 'props.inc' /\nGAS\n",
    );
    write(dir.path(), "props.inc", "OIL\nENDINC\nWATER\n");

    let parsed = parse_file(&dir.path().join("CASE.DATA"), &ParseContext::new()).unwrap();
    let names: Vec<&str> = parsed.deck.iter().map(|k| k.name()).collect();
    assert_eq!(names, vec!["RUNSPEC", "OIL", "GAS"]);
}

#[test]
fn test_endinc_in_root_file_is_ignored() {
    let dir = tempdir().unwrap();
    write(dir.path(), "CASE.DATA", "RUNSPEC\nENDINC\nOIL\n");

    let parsed = parse_file(&dir.path().join("CASE.DATA"), &ParseContext::new()).unwrap();
    assert!(parsed.deck.has_keyword("OIL"));
    assert!(!parsed.deck.has_keyword("ENDINC"));
}

#[test]
fn test_records_do_not_span_include_boundaries() {
    let dir = tempdir().unwrap();
    write(dir.path(), "CASE.DATA", "SCHEDULE\nINCLUDE\n 'wells.inc' /\nTSTEP\n 1 /\n");
    write(dir.path(), "wells.inc", "WELSPECS\n 'P1' 'G1' 1 1 1* 'OIL' /\n");

    let ctx = ParseContext::new().with(ErrorKind::RecordCount, Action::Warn);
    let parsed = parse_file(&dir.path().join("CASE.DATA"), &ctx).unwrap();

    assert_eq!(parsed.deck.last("WELSPECS").unwrap().len(), 1);
    assert_eq!(parsed.diagnostics.count_kind(ErrorKind::RecordCount), 1);
    assert!(parsed.deck.has_keyword("TSTEP"));
}

#[test]
fn test_in_memory_text_uses_include_dir() {
    let dir = tempdir().unwrap();
    write(dir.path(), "dims.inc", "DIMENS\n 2 2 2 /\n");

    let registry = Registry::builtin().unwrap();
    let parsed = Parser::new(&registry)
        .with_include_dir(dir.path())
        .parse_string("RUNSPEC\nINCLUDE\n 'dims.inc' /\n", &ParseContext::new())
        .unwrap();
    assert!(parsed.deck.has_keyword("DIMENS"));
    assert!(parsed.deck.data_file().is_none());
}

#[test]
fn test_partial_parse_follows_includes_in_skipped_sections() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "CASE.DATA",
        "RUNSPEC\nEQLDIMS\n 1 /\nGRID\nPROPS\nINCLUDE\n 'rest.inc' /\n",
    );
    write(
        dir.path(),
        "rest.inc",
        "PVTW\n 1 1 1 1 1 /\nSOLUTION\nEQUIL\n 2000 200 /\n",
    );

    let registry = Registry::builtin().unwrap();
    let parsed = Parser::new(&registry)
        .parse_partial(
            ecldeck::parser::Input::File(dir.path().join("CASE.DATA")),
            &[Section::Grid, Section::Solution],
            &ParseContext::new(),
        )
        .unwrap();
    let deck = &parsed.deck;

    assert!(deck.has_keyword("EQUIL"));
    assert_eq!(deck.last("EQUIL").unwrap().section(), Section::Solution);
    assert!(!deck.has_keyword("PVTW"));
    assert!(!deck.has_keyword("PROPS"));
    assert_eq!(
        deck.sections(),
        vec![Section::Runspec, Section::Grid, Section::Solution]
    );
}
