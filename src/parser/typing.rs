//! Record and item typing.
//!
//! Tokens of a raw record are matched left to right against the items of
//! its record schema. `N*` supplies `N` defaulted elements and `N*V`
//! supplies `N` copies of `V`; a repeat may run across several items.

use std::ops::Range;

use super::location::Location;
use super::raw::{unquote, RawKeyword, RawRecord, RawToken};
use super::token::{split_repeat, Repeat};
use crate::context::{Diagnostics, ErrorKind, ParseContext};
use crate::deck::{
    parse_double, parse_int, Deck, DeckItem, DeckKeyword, DeckRecord, Layout, Section, UdaValue,
    Value,
};
use crate::error::Result;
use crate::schema::{ItemKind, ItemSchema, ItemSize, KeywordSchema, RecordSchema, SizeRule};

/// One element drawn from the token stream.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Element<'t> {
    Explicit(&'t str, u32),
    Default,
}

/// Largest repeat count accepted, unless DIMENS declares a larger grid.
pub const MAX_REPEAT: usize = 1 << 24;

/// Element limit for items read after `deck`: the DIMENS cell count, but
/// never below [`MAX_REPEAT`].
pub(crate) fn element_limit(deck: &Deck) -> usize {
    let cells = deck
        .last("DIMENS")
        .and_then(|keyword| keyword.record(0))
        .and_then(|record| {
            ["NX", "NY", "NZ"].iter().try_fold(1usize, |cells, name| {
                let n = record.item(name)?.get_int(0).ok()?;
                cells.checked_mul(usize::try_from(n).ok()?)
            })
        });
    cells.map_or(MAX_REPEAT, |cells| cells.max(MAX_REPEAT))
}

struct Pending<'t> {
    element: Element<'t>,
    count: usize,
}

/// Tokens of one record with repeat counts expanded on demand.
struct TokenQueue<'t> {
    tokens: std::slice::Iter<'t, RawToken>,
    pending: Option<Pending<'t>>,
    limit: usize,
    /// Repeat counts above `limit` with their lines. They are read as `limit`.
    oversized: Vec<(usize, u32)>,
}

impl<'t> TokenQueue<'t> {
    fn new(tokens: &'t [RawToken], limit: usize) -> Self {
        Self {
            tokens: tokens.iter(),
            pending: None,
            limit,
            oversized: Vec::new(),
        }
    }

    /// Next element together with how many times it repeats.
    fn next_run(&mut self) -> Option<(Element<'t>, usize)> {
        if let Some(pending) = self.pending.take() {
            return Some((pending.element, pending.count));
        }

        let token = self.tokens.next()?;
        Some(match split_repeat(&token.text) {
            Repeat::Single(text) => (Element::Explicit(text, token.line), 1),
            Repeat::Many { count, value } => {
                let element = match value {
                    Some(value) => Element::Explicit(value, token.line),
                    None => Element::Default,
                };
                let count = if count > self.limit {
                    self.oversized.push((count, token.line));
                    self.limit
                } else {
                    count
                };
                (element, count)
            }
        })
    }

    fn next(&mut self) -> Option<Element<'t>> {
        let (element, count) = self.next_run()?;
        if count > 1 {
            self.pending = Some(Pending {
                element,
                count: count - 1,
            });
        }
        Some(element)
    }

    /// Explicit values left over. Leftover defaults are not counted.
    fn surplus(&mut self) -> usize {
        let mut surplus = 0usize;
        while let Some((element, count)) = self.next_run() {
            if matches!(element, Element::Explicit(..)) {
                surplus = surplus.saturating_add(count);
            }
        }
        surplus
    }
}

/// Types the records of one keyword occurrence.
pub struct RecordTyper<'a> {
    ctx: &'a ParseContext,
    keyword: &'a str,
    diagnostics: &'a mut Diagnostics,
    element_limit: usize,
}

impl<'a> RecordTyper<'a> {
    pub fn new(ctx: &'a ParseContext, keyword: &'a str, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            ctx,
            keyword,
            diagnostics,
            element_limit: MAX_REPEAT,
        }
    }

    /// Bound on the elements of one item and on any repeat count.
    pub fn with_element_limit(mut self, limit: usize) -> Self {
        self.element_limit = limit.max(1);
        self
    }

    fn report(&mut self, kind: ErrorKind, message: String, location: &Location) -> Result<()> {
        self.ctx.handle(
            kind,
            message,
            Some(location),
            Some(self.keyword),
            self.diagnostics,
        )
    }

    /// Type one record against `schema`.
    pub fn type_record(&mut self, raw: &RawRecord, schema: &RecordSchema) -> Result<DeckRecord> {
        let mut queue = TokenQueue::new(&raw.tokens, self.element_limit);
        let mut items = Vec::with_capacity(schema.items.len());

        for item_schema in &schema.items {
            let mut item = DeckItem::new(item_schema);
            match item_schema.size {
                ItemSize::Single => self.fill(&mut item, item_schema, &mut queue, 1, raw)?,
                ItemSize::Fixed(n) => self.fill(&mut item, item_schema, &mut queue, n, raw)?,
                ItemSize::All => self.fill_all(&mut item, item_schema, &mut queue, raw)?,
            }
            items.push(item);
        }

        let surplus = queue.surplus();
        for (count, line) in std::mem::take(&mut queue.oversized) {
            self.report(
                ErrorKind::MalformedRecord,
                format!(
                    "repeat count {} exceeds the limit of {}",
                    count, self.element_limit
                ),
                &raw.location.with_line(line),
            )?;
        }
        if surplus > 0 {
            self.report(
                ErrorKind::MalformedRecord,
                format!(
                    "{} surplus value{} at end of record ignored",
                    surplus,
                    if surplus == 1 { "" } else { "s" }
                ),
                &raw.location,
            )?;
        }

        Ok(DeckRecord::new(items))
    }

    fn fill(
        &mut self,
        item: &mut DeckItem,
        schema: &ItemSchema,
        queue: &mut TokenQueue<'_>,
        count: usize,
        raw: &RawRecord,
    ) -> Result<()> {
        for filled in 0..count {
            match queue.next() {
                Some(element) => self.push_element(item, schema, element, &raw.location)?,
                None => {
                    if schema.default.is_none() {
                        self.report(
                            ErrorKind::MissingRequiredValue,
                            format!("no value for item {}, which has no default", schema.name),
                            &raw.location,
                        )?;
                    }
                    for _ in filled..count {
                        item.push_default(schema.default.clone());
                    }
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Every remaining element goes into `item`, up to the element limit.
    fn fill_all(
        &mut self,
        item: &mut DeckItem,
        schema: &ItemSchema,
        queue: &mut TokenQueue<'_>,
        raw: &RawRecord,
    ) -> Result<()> {
        while let Some((element, count)) = queue.next_run() {
            let room = self.element_limit.saturating_sub(item.len());
            if count > room {
                self.report(
                    ErrorKind::MalformedRecord,
                    format!(
                        "item {} holds more than {} elements, the rest is dropped",
                        schema.name, self.element_limit
                    ),
                    &raw.location,
                )?;
                self.push_run(item, schema, element, room, &raw.location)?;
                while queue.next_run().is_some() {}
                return Ok(());
            }
            self.push_run(item, schema, element, count, &raw.location)?;
        }
        Ok(())
    }

    fn push_element(
        &mut self,
        item: &mut DeckItem,
        schema: &ItemSchema,
        element: Element<'_>,
        record_location: &Location,
    ) -> Result<()> {
        self.push_run(item, schema, element, 1, record_location)
    }

    /// Push `count` copies of one element. The token is converted once.
    fn push_run(
        &mut self,
        item: &mut DeckItem,
        schema: &ItemSchema,
        element: Element<'_>,
        count: usize,
        record_location: &Location,
    ) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let value = match element {
            Element::Default => None,
            Element::Explicit(text, line) => {
                let location = record_location.with_line(line);
                self.convert(schema, text, &location)?
            }
        };
        for _ in 0..count {
            match &value {
                Some(value) => item.push(value.clone()),
                None => item.push_default(schema.default.clone()),
            }
        }
        Ok(())
    }

    /// Convert one token. `None` after a recorded malformed value.
    fn convert(
        &mut self,
        schema: &ItemSchema,
        text: &str,
        location: &Location,
    ) -> Result<Option<Value>> {
        let value = match schema.kind {
            ItemKind::Int => parse_int(text).map(Value::Int),
            ItemKind::Double => parse_double(text).map(Value::Double),
            ItemKind::String => {
                let value = unquote(text).trim();
                if let Some(width) = schema.width {
                    if value.chars().count() > width {
                        self.report(
                            ErrorKind::MalformedRecord,
                            format!(
                                "'{}' is longer than {} characters for item {}",
                                value, width, schema.name
                            ),
                            location,
                        )?;
                    }
                }
                Some(Value::Str(value.to_string()))
            }
            ItemKind::RawString => Some(Value::Str(text.to_string())),
            ItemKind::Uda => Some(Value::Uda(match parse_double(text) {
                Some(number) if !super::raw::is_quoted(text) => UdaValue::Number(number),
                _ => UdaValue::Name(unquote(text).trim().to_string()),
            })),
        };

        if value.is_none() {
            self.report(
                ErrorKind::MalformedRecord,
                format!(
                    "could not read '{}' as {} for item {}",
                    text,
                    match schema.kind {
                        ItemKind::Int => "an integer",
                        _ => "a number",
                    },
                    schema.name
                ),
                location,
            )?;
        }
        Ok(value)
    }

    /// Record whose first item holds the raw text unchanged, for code and
    /// title keywords.
    pub fn verbatim_record(&mut self, raw: &RawRecord, schema: &RecordSchema) -> DeckRecord {
        let text = raw
            .tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let items = schema
            .items
            .iter()
            .enumerate()
            .map(|(i, item_schema)| {
                let mut item = DeckItem::new(item_schema);
                if i == 0 {
                    item.push(Value::Str(text.clone()));
                } else {
                    item.push_default(item_schema.default.clone());
                }
                item
            })
            .collect();
        DeckRecord::new(items)
    }

    /// Type every record of a keyword occurrence.
    pub fn type_keyword(
        &mut self,
        raw: &RawKeyword,
        schema: &KeywordSchema,
        section: Section,
    ) -> Result<DeckKeyword> {
        let verbatim = schema.is_code() || schema.name == super::size::TITLE;
        let mut records = Vec::with_capacity(raw.records.len());
        let mut tables: Vec<Range<usize>> = Vec::new();

        let mut table_start = 0;
        let mut ends = raw.table_ends.iter().copied().peekable();
        for (index, record) in raw.records.iter().enumerate() {
            while ends.peek() == Some(&index) && index > table_start {
                tables.push(table_start..index);
                table_start = index;
                ends.next();
            }
            while ends.peek() == Some(&index) {
                // Empty sub-table.
                tables.push(index..index);
                ends.next();
            }

            let in_table = index - table_start;
            let record_schema = if schema.double_records {
                schema.records.get(in_table.min(1))
            } else if schema.is_table_collection() && !schema.alternating {
                schema.record_schema(in_table)
            } else {
                schema.record_schema(index)
            };

            let typed = match record_schema {
                Some(rs) if verbatim => self.verbatim_record(record, rs),
                Some(rs) => self.type_record(record, rs)?,
                None => {
                    if !record.is_empty() {
                        self.report(
                            ErrorKind::MalformedRecord,
                            format!("{} takes no data", schema.name),
                            &record.location,
                        )?;
                    }
                    DeckRecord::default()
                }
            };
            records.push(typed);
        }

        let total = raw.records.len();
        for end in ends {
            tables.push(table_start.min(end)..end);
            table_start = end;
        }
        if schema.is_table_collection() && table_start < total {
            tables.push(table_start..total);
        }

        Ok(DeckKeyword::new(raw.name.clone(), raw.location.clone(), section)
            .with_records(records)
            .with_tables(tables)
            .with_layout(layout_of(schema)))
    }
}

fn layout_of(schema: &KeywordSchema) -> Layout {
    if let Some(end) = &schema.code_end {
        return Layout::Code(end.clone());
    }
    if schema.name == super::size::TITLE {
        return Layout::Verbatim;
    }
    match schema.size {
        SizeRule::Unbounded | SizeRule::TableCollection { tables: None } => Layout::Terminated,
        _ => Layout::Records,
    }
}
