//! Renders a deck back to input text.
//!
//! Runs of defaulted elements are written as `N*`, strings are quoted and
//! blank-padded to eight characters. Re-reading the output with the same
//! registry yields the same keywords, records and values.

use std::fmt::{self, Write};

use super::item::DeckItem;
use super::keyword::{DeckKeyword, DeckRecord, Layout};
use super::value::{UdaValue, Value};
use super::Deck;
use crate::schema::ItemKind;

/// Field width strings are padded to.
pub const STRING_WIDTH: usize = 8;

fn write_value(out: &mut String, kind: ItemKind, value: &Value) -> fmt::Result {
    match value {
        Value::Str(s) if kind == ItemKind::RawString => out.write_str(s),
        Value::Str(s) | Value::Uda(UdaValue::Name(s)) => {
            write!(out, "'{:<width$}'", s, width = STRING_WIDTH)
        }
        other => write!(out, "{}", other),
    }
}

fn flush_defaults(tokens: &mut Vec<String>, run: &mut usize) {
    if *run > 0 {
        tokens.push(format!("{}*", run));
        *run = 0;
    }
}

fn record_tokens(record: &DeckRecord) -> Result<Vec<String>, fmt::Error> {
    let mut tokens = Vec::new();
    let mut run = 0;
    for item in record.items() {
        item_tokens(item, &mut tokens, &mut run)?;
    }
    flush_defaults(&mut tokens, &mut run);
    Ok(tokens)
}

fn item_tokens(item: &DeckItem, tokens: &mut Vec<String>, run: &mut usize) -> fmt::Result {
    for (index, value) in item.values().enumerate() {
        match value {
            Some(value) if !item.is_defaulted(index) => {
                flush_defaults(tokens, run);
                let mut token = String::new();
                write_value(&mut token, item.kind(), value)?;
                tokens.push(token);
            }
            _ => *run += 1,
        }
    }
    Ok(())
}

impl fmt::Display for DeckRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = record_tokens(self)?;
        if tokens.is_empty() {
            f.write_str("/")
        } else {
            write!(f, "  {} /", tokens.join(" "))
        }
    }
}

fn verbatim_text(record: &DeckRecord) -> &str {
    record
        .get(0)
        .and_then(|item| item.value(0))
        .and_then(Value::as_str)
        .unwrap_or("")
}

impl fmt::Display for DeckKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name())?;

        match self.layout() {
            Layout::Verbatim => {
                for record in self.records() {
                    writeln!(f, "{}", verbatim_text(record))?;
                }
                return Ok(());
            }
            Layout::Code(end) => {
                for record in self.records() {
                    writeln!(f, "{}", verbatim_text(record))?;
                }
                return writeln!(f, "{}", end);
            }
            Layout::Records | Layout::Terminated => {}
        }

        if self.table_count() > 0 {
            for table in self.tables() {
                for record in table {
                    writeln!(f, "{}", record)?;
                }
                writeln!(f, "/")?;
            }
        } else {
            for record in self.records() {
                writeln!(f, "{}", record)?;
            }
        }

        if *self.layout() == Layout::Terminated {
            writeln!(f, "/")?;
        }
        Ok(())
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for keyword in self {
            writeln!(f, "{}", keyword)?;
        }
        Ok(())
    }
}
