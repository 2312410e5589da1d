//! Record count resolution.

use super::lexer::RecordShape;
use crate::deck::Deck;
use crate::schema::{KeywordSchema, SizeRef, SizeRule};

/// Keyword whose single record is the next line of text.
pub const TITLE: &str = "TITLE";

/// Work out how the records of `schema` are laid out, given the deck read
/// so far.
///
/// Fails with a message when a keyword-dependent size cannot be read from
/// the deck.
pub fn resolve(schema: &KeywordSchema, deck: &Deck) -> Result<RecordShape, String> {
    if let Some(end) = &schema.code_end {
        return Ok(RecordShape::Code(end.clone()));
    }
    if schema.name == TITLE {
        return Ok(RecordShape::Line);
    }

    match &schema.size {
        SizeRule::Fixed(0) => Ok(RecordShape::None),
        SizeRule::Fixed(n) => Ok(RecordShape::Fixed(*n)),
        SizeRule::KeywordDependent(size_ref) => {
            let mut count = read_size(size_ref, deck)?;
            if schema.alternating {
                count *= schema.records.len();
            }
            Ok(RecordShape::Fixed(count))
        }
        SizeRule::Unbounded => Ok(RecordShape::Terminated),
        SizeRule::TableCollection { tables: Some(size_ref) } => {
            Ok(RecordShape::Tables(Some(read_size(size_ref, deck)?)))
        }
        SizeRule::TableCollection { tables: None } => Ok(RecordShape::Tables(None)),
        SizeRule::UntilNextKeyword => Ok(RecordShape::UntilKeyword),
    }
}

/// Value of the referenced item plus its shift.
pub fn read_size(size_ref: &SizeRef, deck: &Deck) -> Result<usize, String> {
    let keyword = deck.last(&size_ref.keyword).ok_or_else(|| {
        format!(
            "size depends on {}, which has not been seen",
            size_ref.keyword
        )
    })?;
    let record = keyword
        .record(0)
        .ok_or_else(|| format!("{} has no records", size_ref.keyword))?;
    let item = record
        .item(&size_ref.item)
        .ok_or_else(|| format!("{} has no item {}", size_ref.keyword, size_ref.item))?;
    let value = item.get_int(0).map_err(|e| e.to_string())?;

    let total = value + size_ref.shift;
    usize::try_from(total).map_err(|_| {
        format!(
            "{} {} gives a negative size {}",
            size_ref.keyword, size_ref.item, total
        )
    })
}

/// Whether the shape fixes the number of records in advance.
pub fn is_bounded(shape: &RecordShape) -> bool {
    matches!(
        shape,
        RecordShape::None | RecordShape::Fixed(_) | RecordShape::Line | RecordShape::Code(_)
    )
}
