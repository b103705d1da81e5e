//! The normalised table shape every backend produces.

use serde::{Deserialize, Serialize};

/// One row of cell strings. Rows of the same table may differ in length.
pub type Row = Vec<String>;

/// An extracted table: ordered rows of string cells.
///
/// The first row is conventionally the header, but nothing enforces it.
/// `page` is the 0-indexed page the table was found on, when the backend
/// knows it; it never appears in CSV output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    page: Option<usize>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { page: None, rows }
    }

    /// Attach page provenance at construction time.
    pub fn on_page(self, page: usize) -> Self {
        Self {
            page: Some(page),
            ..self
        }
    }

    pub fn page(&self) -> Option<usize> {
        self.page
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<S: Into<String>> From<Vec<Vec<S>>> for Table {
    fn from(rows: Vec<Vec<S>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }
}

/// A labelled grid as table engines hand it back: column labels plus body
/// rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Frame {
    /// A frame whose columns are labelled by position (`"0"`, `"1"`, …).
    pub fn unlabelled(rows: Vec<Row>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            columns: (0..width).map(|i| i.to_string()).collect(),
            rows,
        }
    }

    /// No columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    /// Every body cell is blank.
    pub fn is_blank(&self) -> bool {
        self.rows
            .iter()
            .flatten()
            .all(|cell| cell.trim().is_empty())
    }

    /// Header row of column labels followed by the body rows.
    pub fn into_table(self) -> Table {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(self.columns);
        rows.extend(self.rows);
        Table::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_flattens_header_first() {
        let frame = Frame {
            columns: vec!["Name".into(), "Qty".into()],
            rows: vec![vec!["apple".into(), "3".into()]],
        };
        let table = frame.into_table();
        assert_eq!(
            table.rows(),
            &[
                vec!["Name".to_string(), "Qty".to_string()],
                vec!["apple".to_string(), "3".to_string()],
            ]
        );
        assert_eq!(table.page(), None);
    }

    #[test]
    fn unlabelled_frame_uses_positions() {
        let frame = Frame::unlabelled(vec![vec!["a".into()], vec!["b".into(), "c".into()]]);
        assert_eq!(frame.columns, vec!["0", "1"]);
    }

    #[test]
    fn blank_and_empty_frames() {
        assert!(Frame::default().is_empty());
        let blank = Frame::unlabelled(vec![vec![" ".into(), String::new()]]);
        assert!(!blank.is_empty());
        assert!(blank.is_blank());
    }

    #[test]
    fn provenance_is_attached_once() {
        let t = Table::from(vec![vec!["x"]]).on_page(4);
        assert_eq!(t.page(), Some(4));
        assert_eq!(t.row_count(), 1);
    }
}
