//! CSV parsing with strict schema validation.
//!
//! The upstream feed is a six-column CSV with a header row. Columns are
//! located by name, so a feed that reorders them still parses. Every field is
//! trimmed before interpretation, empty counts read as zero, and the first bad
//! row aborts the whole parse: a dataset is either complete or not produced.

use crate::error::{IngestError, IngestResult};
use crate::record::{DailyRecord, Dataset};
use chrono::NaiveDate;
use csv::StringRecord;
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

/// Number of columns in the upstream schema.
pub const COLUMN_COUNT: usize = 6;

/// Required column names.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "date",
    "location",
    "new_cases",
    "new_deaths",
    "total_cases",
    "total_deaths",
];

/// Format of the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a CSV stream into a [`Dataset`], keeping input order.
///
/// A stream holding only the header row yields an empty dataset. The whole
/// stream is tokenized before any field is interpreted, so a quoting error
/// anywhere is reported ahead of row-level errors.
///
/// # Errors
///
/// - [`IngestError::StreamFormat`] if the input has no header row or cannot be
///   tokenized, e.g. an unterminated quoted field or a quote inside an
///   unquoted field
/// - [`IngestError::Schema`] if the header is not exactly the six required columns
/// - [`IngestError::MalformedRow`] if a row does not have six fields
/// - [`IngestError::DateFormat`] if a date is not `YYYY-MM-DD`
/// - [`IngestError::NumericField`] if a count is neither empty nor an integer
/// - [`IngestError::MissingLocation`] if a location is empty
pub fn parse_dataset<R: Read>(mut input: R) -> IngestResult<Dataset> {
    let mut raw = Vec::new();
    input
        .read_to_end(&mut raw)
        .map_err(|e| stream_error("Failed to read CSV stream", e.into()))?;
    check_quoting(&raw)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_slice());

    let headers = reader
        .headers()
        .map_err(|e| stream_error("Failed to read CSV header", e))?;
    if headers.is_empty() {
        return Err(IngestError::stream_format("Stream contains no header row"));
    }
    let columns = ColumnIndex::from_headers(headers)?;

    let mut records = Vec::new();
    let mut row = StringRecord::new();
    while reader
        .read_record(&mut row)
        .map_err(|e| stream_error("Failed to read CSV row", e))?
    {
        records.push(columns.parse_row(&row)?);
    }

    debug!(rows = records.len(), "Parsed CSV stream");
    Ok(Dataset::new(records))
}

/// Positions of the required columns, resolved once from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndex {
    date: usize,
    location: usize,
    new_cases: usize,
    new_deaths: usize,
    total_cases: usize,
    total_deaths: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> IngestResult<Self> {
        if headers.len() != COLUMN_COUNT {
            return Err(IngestError::schema(format!(
                "expected {COLUMN_COUNT} columns ({}), found {}",
                COLUMNS.join(", "),
                headers.len()
            )));
        }

        let positions: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header_name(name), idx))
            .collect();

        let position = |name: &str| {
            positions.get(name).copied().ok_or_else(|| {
                IngestError::schema(format!("No such column {name:?} in CSV header"))
            })
        };

        Ok(Self {
            date: position("date")?,
            location: position("location")?,
            new_cases: position("new_cases")?,
            new_deaths: position("new_deaths")?,
            total_cases: position("total_cases")?,
            total_deaths: position("total_deaths")?,
        })
    }

    fn parse_row(&self, row: &StringRecord) -> IngestResult<DailyRecord> {
        let line = row.position().map_or(0, csv::Position::line);

        if row.len() != COLUMN_COUNT {
            return Err(IngestError::MalformedRow {
                line,
                expected: COLUMN_COUNT,
                found: row.len(),
            });
        }

        let raw_date = &row[self.date];
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|source| {
            IngestError::DateFormat {
                line,
                value: raw_date.to_string(),
                source,
            }
        })?;

        let location = &row[self.location];
        if location.is_empty() {
            return Err(IngestError::MissingLocation { line });
        }

        Ok(DailyRecord::new(
            date,
            location,
            parse_count(&row[self.new_cases], "new_cases", line)?,
            parse_count(&row[self.new_deaths], "new_deaths", line)?,
            parse_count(&row[self.total_cases], "total_cases", line)?,
            parse_count(&row[self.total_deaths], "total_deaths", line)?,
        ))
    }
}

#[derive(Clone, Copy)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
    AfterQuoted,
}

/// Rejects quoting the lenient CSV reader would silently accept.
fn check_quoting(raw: &[u8]) -> IngestResult<()> {
    let body = raw.strip_prefix(b"\xef\xbb\xbf").unwrap_or(raw);
    let mut state = QuoteState::FieldStart;
    let mut line = 1u64;
    let mut quote_line = 1u64;

    for &byte in body {
        state = match (state, byte) {
            (QuoteState::Quoted, b'"') => QuoteState::QuoteInQuoted,
            (QuoteState::Quoted, _) => QuoteState::Quoted,
            (QuoteState::QuoteInQuoted, b'"') => QuoteState::Quoted,
            (QuoteState::FieldStart, b'"') => {
                quote_line = line;
                QuoteState::Quoted
            }
            (_, b'"') => {
                return Err(IngestError::stream_format(format!(
                    "bare quote in unquoted field at line {line}"
                )))
            }
            (_, b',' | b'\n') => QuoteState::FieldStart,
            (QuoteState::QuoteInQuoted | QuoteState::AfterQuoted, b' ' | b'\t' | b'\r') => {
                QuoteState::AfterQuoted
            }
            (QuoteState::QuoteInQuoted | QuoteState::AfterQuoted, _) => {
                return Err(IngestError::stream_format(format!(
                    "extraneous data after quoted field at line {line}"
                )))
            }
            (QuoteState::FieldStart | QuoteState::Unquoted, _) => QuoteState::Unquoted,
        };
        if byte == b'\n' {
            line += 1;
        }
    }

    if matches!(state, QuoteState::Quoted) {
        return Err(IngestError::stream_format(format!(
            "quoted field opened at line {quote_line} is never closed"
        )));
    }
    Ok(())
}

fn normalize_header_name(name: &str) -> &str {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}')
}

fn parse_count(value: &str, column: &'static str, line: u64) -> IngestResult<i64> {
    if value.is_empty() {
        return Ok(0);
    }

    value.parse().map_err(|source| IngestError::NumericField {
        line,
        column,
        value: value.to_string(),
        source,
    })
}

fn stream_error(message: &str, source: csv::Error) -> IngestError {
    IngestError::StreamFormat {
        message: format!("{message}: {source}"),
        source: Some(source),
    }
}
