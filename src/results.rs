//! Result tables
//!
//! A result table has a header row `Trial,<Factor1>,...,<FactorN>,Response`
//! and one row per trial in presentation order, numbered from 1. Magnitudes
//! are written in default decimal form, discrete levels by label (or index
//! when unlabelled). Unanswered trials carry the sentinel `-1`.

use std::io;

use crate::design::TrialSequence;
use crate::store::ResultStore;
use crate::{Error, Result};

/// Header of the 1-based trial number column.
pub const TRIAL_COLUMN: &str = "Trial";

/// Header of the response column.
pub const RESPONSE_COLUMN: &str = "Response";

/// Text written for a trial with no response.
const UNANSWERED: &str = "-1";

/// One data row of a result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    trial: usize,
    values: Vec<String>,
    response: Option<u32>,
}

impl ResultRow {
    /// 1-based trial number.
    #[must_use]
    pub const fn trial(&self) -> usize {
        self.trial
    }

    /// Factor values as written, in column order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Recorded response category, `None` if unanswered.
    #[must_use]
    pub const fn response(&self) -> Option<u32> {
        self.response
    }
}

/// A trial-by-trial result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Build a table from a trial sequence and its response records.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDesign` if `responses` is not in 1:1 correspondence
    /// with the sequence.
    pub fn from_responses(sequence: &TrialSequence, responses: &[Option<u32>]) -> Result<Self> {
        if responses.len() != sequence.len() {
            return Err(Error::InvalidDesign(format!(
                "{} responses recorded for {} trials",
                responses.len(),
                sequence.len()
            )));
        }

        let rows = sequence
            .iter()
            .zip(responses)
            .enumerate()
            .map(|(i, (trial, &response))| ResultRow {
                trial: i + 1,
                values: trial.levels().iter().map(ToString::to_string).collect(),
                response,
            })
            .collect();

        Ok(Self {
            columns: sequence.columns().to_vec(),
            rows,
        })
    }

    /// Factor column names (excluding `Trial` and `Response`).
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows in trial order.
    #[must_use]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as comma-separated text, every row newline-terminated.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str(TRIAL_COLUMN);
        for column in &self.columns {
            out.push(',');
            push_field(&mut out, column);
        }
        out.push(',');
        out.push_str(RESPONSE_COLUMN);
        out.push('\n');

        for row in &self.rows {
            out.push_str(&row.trial.to_string());
            for value in &row.values {
                out.push(',');
                push_field(&mut out, value);
            }
            out.push(',');
            match row.response {
                Some(response) => out.push_str(&response.to_string()),
                None => out.push_str(UNANSWERED),
            }
            out.push('\n');
        }

        out
    }

    /// Write the rendered table to `writer`.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }

    /// Parse a rendered table back into rows.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the header is missing its `Trial`/`Response`
    /// columns, a row has the wrong number of fields, or a trial number or
    /// response is not an integer.
    pub fn parse(text: &str) -> Result<Self> {
        let mut records = split_records(text)?.into_iter();

        let header = records
            .next()
            .ok_or_else(|| Error::ParseError("missing header row".to_string()))?;
        if header.len() < 2
            || header[0] != TRIAL_COLUMN
            || header[header.len() - 1] != RESPONSE_COLUMN
        {
            return Err(Error::ParseError(format!(
                "header must start with '{TRIAL_COLUMN}' and end with '{RESPONSE_COLUMN}'"
            )));
        }
        let columns = header[1..header.len() - 1].to_vec();

        let mut rows = Vec::new();
        for (line_no, mut fields) in records.enumerate() {
            if fields.len() != header.len() {
                return Err(Error::ParseError(format!(
                    "row {} has {} fields, expected {}",
                    line_no + 1,
                    fields.len(),
                    header.len()
                )));
            }

            let response = fields.pop().unwrap_or_default();
            let response = if response == UNANSWERED {
                None
            } else {
                Some(response.parse::<u32>().map_err(|e| {
                    Error::ParseError(format!("row {}: bad response '{response}': {e}", line_no + 1))
                })?)
            };

            let trial = fields[0].parse::<usize>().map_err(|e| {
                Error::ParseError(format!(
                    "row {}: bad trial number '{}': {e}",
                    line_no + 1,
                    fields[0]
                ))
            })?;

            rows.push(ResultRow {
                trial,
                values: fields.split_off(1),
                response,
            });
        }

        Ok(Self { columns, rows })
    }
}

/// Serialize a trial sequence and its responses to `location` in `store`.
///
/// # Errors
///
/// Returns `StorageWriteFailed` if the store cannot persist the table, or
/// `InvalidDesign` if the responses do not match the sequence.
pub fn serialize<S: ResultStore + ?Sized>(
    sequence: &TrialSequence,
    responses: &[Option<u32>],
    store: &S,
    location: &str,
) -> Result<()> {
    let table = ResultTable::from_responses(sequence, responses)?;
    store.write(location, &table.render())
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Split text into records of fields. Quoted fields may contain commas,
/// doubled quotes and line breaks; blank lines are skipped.
fn split_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = text.chars().peekable();
    let mut quoted = false;
    let mut started = false;

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => quoted = false,
            ('"', false) if field.is_empty() => {
                quoted = true;
                started = true;
            }
            (',', false) => {
                fields.push(std::mem::take(&mut field));
                started = true;
            }
            ('\r', false) if chars.peek() == Some(&'\n') => {}
            ('\n', false) => {
                if started || !field.is_empty() {
                    fields.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut fields));
                }
                started = false;
            }
            (c, _) => {
                field.push(c);
                started = true;
            }
        }
    }

    if quoted {
        return Err(Error::ParseError(format!(
            "unterminated quote in record {}",
            records.len() + 1
        )));
    }
    if started || !field.is_empty() {
        fields.push(field);
        records.push(fields);
    }
    Ok(records)
}
