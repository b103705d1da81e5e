//! Serialising extracted tables.
//!
//! CSV is the primary format. With `all_tables` unset only the first table
//! is written; otherwise every table is written and each one after the first
//! is preceded by exactly one blank line.

use crate::error::TableExtractError;
use crate::table::Table;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::Write;

fn selected(tables: &[Table], all_tables: bool) -> &[Table] {
    if all_tables {
        tables
    } else {
        &tables[..tables.len().min(1)]
    }
}

/// Write tables as CSV into `sink`.
///
/// Nothing is written when `tables` is empty.
pub fn write_csv<W: Write>(
    tables: &[Table],
    mut sink: W,
    all_tables: bool,
) -> Result<(), TableExtractError> {
    for (i, table) in selected(tables, all_tables).iter().enumerate() {
        if i > 0 {
            // csv writes a zero-field record as `""`; the separator must be a bare line.
            sink.write_all(b"\r\n")?;
        }
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::CRLF)
            .from_writer(&mut sink);
        for row in table.rows() {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }

    sink.flush()?;
    Ok(())
}

/// Render tables as a CSV string. Same bytes as [`write_csv`].
pub fn tables_to_csv(tables: &[Table], all_tables: bool) -> Result<String, TableExtractError> {
    let mut buf = Vec::new();
    write_csv(tables, &mut buf, all_tables)?;
    String::from_utf8(buf)
        .map_err(|e| TableExtractError::Internal(format!("CSV output is not UTF-8: {e}")))
}

/// Render the same table selection as a pretty-printed JSON array.
pub fn tables_to_json(tables: &[Table], all_tables: bool) -> serde_json::Result<String> {
    serde_json::to_string_pretty(selected(tables, all_tables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Table> {
        vec![
            Table::from(vec![vec!["Name", "Salary"], vec!["Alice", "$105,000"]]),
            Table::from(vec![vec!["k", "v"], vec!["a", "1"]]),
            Table::from(vec![vec!["only"]]),
        ]
    }

    fn read_back(csv_text: &str) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(csv_text.as_bytes())
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(tables_to_csv(&[], true).unwrap(), "");
        assert_eq!(tables_to_csv(&[], false).unwrap(), "");
    }

    #[test]
    fn empty_input_writes_nothing_to_sink() {
        let mut sink = Vec::new();
        write_csv(&[], &mut sink, true).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn first_table_only_by_default() {
        let out = tables_to_csv(&sample(), false).unwrap();
        assert_eq!(out, "Name,Salary\r\nAlice,\"$105,000\"\r\n");
    }

    #[test]
    fn all_tables_separated_by_one_blank_row() {
        let out = tables_to_csv(&sample(), true).unwrap();
        assert_eq!(
            out,
            "Name,Salary\r\nAlice,\"$105,000\"\r\n\r\nk,v\r\na,1\r\n\r\nonly\r\n"
        );
        let blank_rows = out.split("\r\n").filter(|l| l.is_empty()).count() - 1;
        assert_eq!(blank_rows, 2);
    }

    #[test]
    fn sink_and_string_modes_match() {
        let mut sink = Vec::new();
        write_csv(&sample(), &mut sink, true).unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), tables_to_csv(&sample(), true).unwrap());
    }

    #[test]
    fn awkward_cells_round_trip() {
        let rows = vec![
            vec!["comma, inside", "quote \"here\"", "line\nbreak"],
            vec!["plain", "", "crlf\r\nbreak"],
        ];
        let table = Table::from(rows.clone());
        let out = tables_to_csv(&[table], false).unwrap();
        let expected: Vec<Vec<String>> = rows
            .into_iter()
            .map(|r| r.into_iter().map(String::from).collect())
            .collect();
        assert_eq!(read_back(&out), expected);
    }

    #[test]
    fn ragged_rows_are_not_padded() {
        let table = Table::from(vec![vec!["a", "b", "c"], vec!["1"]]);
        assert_eq!(tables_to_csv(&[table], false).unwrap(), "a,b,c\r\n1\r\n");
    }

    #[test]
    fn json_respects_selection() {
        let json = tables_to_json(&sample(), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["rows"][1][1], "$105,000");
        assert!(value[0]["page"].is_null());
    }
}
