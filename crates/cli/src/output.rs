//! Plain-text tables and JSON rows for stdout.

use std::io::{self, Write};

use serde::Serialize;

use mpcfill_core::{Candidate, CardType};

/// One `search` result row.
#[derive(Debug, Serialize)]
pub struct SearchRow<'a> {
    #[serde(rename = "Type")]
    pub card_type: CardType,
    #[serde(rename = "Name")]
    pub name: &'a str,
    #[serde(rename = "ID")]
    pub id: &'a str,
}

impl<'a> From<&'a Candidate> for SearchRow<'a> {
    fn from(candidate: &'a Candidate) -> Self {
        Self {
            card_type: candidate.card_type,
            name: &candidate.name,
            id: &candidate.identifier,
        }
    }
}

impl SearchRow<'_> {
    pub const HEADERS: [&'static str; 3] = ["Type", "Name", "ID"];

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.card_type.to_string(),
            self.name.to_string(),
            self.id.to_string(),
        ]
    }
}

/// Write `rows` as left-aligned columns with a dashed rule under the header.
/// Columns are two spaces apart; trailing padding is dropped.
///
/// Nothing is written when `rows` is empty.
pub fn write_table<W: Write>(
    out: &mut W,
    headers: &[&str],
    rows: &[Vec<String>],
) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    write_row(out, &header_cells, &widths)?;

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(out, &rule, &widths)?;

    for row in rows {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let line = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{:<width$}", cell, width = *width)
        })
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())
}

/// Write `rows` as a single-line JSON array.
pub fn write_json<W: Write, T: Serialize>(out: &mut W, rows: &[T]) -> io::Result<()> {
    serde_json::to_writer(&mut *out, rows)?;
    writeln!(out)
}
