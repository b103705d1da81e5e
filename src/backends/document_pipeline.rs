//! Document-pipeline backend: the `docling` CLI with TableFormer in fast mode.
//!
//! `docling` converts the whole document, so a page filter is applied to
//! the tables it returns rather than to its input. Tables are read from the
//! JSON document it writes and flattened the way its dataframe export does:
//! the leading rows holding any column-header cell become the column labels.

use crate::config::ExtractionConfig;
use crate::error::TableExtractError;
use crate::pages::PageSet;
use crate::pipeline::engine::Engine;
use crate::progress::ProgressCallback;
use crate::table::{Frame, Table};
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

pub(crate) const INSTALL_HINT: &str = "Install with: pip install docling";

/// Extracts tables with the `docling` CLI.
#[derive(Clone)]
pub struct DocumentPipelineBackend {
    bin: PathBuf,
    progress: ProgressCallback,
}

impl DocumentPipelineBackend {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            bin: config.docling_bin.clone(),
            progress: config.progress.clone(),
        }
    }

    fn engine(&self) -> Engine<'_> {
        Engine {
            name: "docling",
            bin: &self.bin,
            install_hint: INSTALL_HINT,
        }
    }

    pub async fn extract(
        &self,
        path: &Path,
        pages: Option<&PageSet>,
    ) -> Result<Vec<Table>, TableExtractError> {
        self.progress.on_extraction_start("document-pipeline", 0);

        let out_dir = TempDir::new()?;
        let args = [
            OsStr::new("--to"),
            OsStr::new("json"),
            OsStr::new("--table-mode"),
            OsStr::new("fast"),
            OsStr::new("--output"),
            out_dir.path().as_os_str(),
            path.as_os_str(),
        ];
        self.engine().run(args).await?;

        let json_path = find_json(out_dir.path())?;
        let bytes = tokio::fs::read(&json_path).await?;
        let doc: DoclingDocument =
            serde_json::from_slice(&bytes).map_err(|e| TableExtractError::EngineOutput {
                engine: "docling".to_string(),
                detail: format!("{}: {e}", json_path.display()),
            })?;

        info!("docling reported {} table(s)", doc.tables.len());
        let tables = tables_from_document(doc, pages);
        self.progress.on_extraction_complete(tables.len());
        Ok(tables)
    }
}

fn find_json(dir: &Path) -> Result<PathBuf, TableExtractError> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    found.sort();

    found
        .into_iter()
        .next()
        .ok_or_else(|| TableExtractError::EngineOutput {
            engine: "docling".to_string(),
            detail: format!("no JSON document written to {}", dir.display()),
        })
}

// ── docling JSON model ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct DoclingDocument {
    #[serde(default)]
    tables: Vec<DoclingTable>,
}

#[derive(Debug, Deserialize)]
struct DoclingTable {
    #[serde(default)]
    prov: Vec<Provenance>,
    data: TableData,
}

#[derive(Debug, Deserialize)]
struct Provenance {
    page_no: usize,
}

#[derive(Debug, Deserialize)]
struct TableData {
    #[serde(default)]
    num_rows: usize,
    #[serde(default)]
    num_cols: usize,
    #[serde(default)]
    grid: Option<Vec<Vec<TableCell>>>,
    #[serde(default)]
    table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TableCell {
    #[serde(default)]
    text: String,
    #[serde(default)]
    column_header: bool,
    #[serde(default)]
    start_row_offset_idx: usize,
    #[serde(default)]
    end_row_offset_idx: usize,
    #[serde(default)]
    start_col_offset_idx: usize,
    #[serde(default)]
    end_col_offset_idx: usize,
}

impl TableData {
    /// The stored grid, or one rebuilt from the cell list.
    fn into_grid(self) -> Vec<Vec<TableCell>> {
        if let Some(grid) = self.grid.filter(|g| !g.is_empty()) {
            return grid;
        }

        let mut grid = vec![vec![TableCell::default(); self.num_cols]; self.num_rows];
        for cell in &self.table_cells {
            let rows = cell.start_row_offset_idx..cell.end_row_offset_idx.min(self.num_rows);
            for r in rows {
                let cols = cell.start_col_offset_idx..cell.end_col_offset_idx.min(self.num_cols);
                for c in cols {
                    grid[r][c] = cell.clone();
                }
            }
        }
        grid
    }
}

/// Leading header rows become the labels, joined per column with `.`.
fn grid_to_frame(grid: Vec<Vec<TableCell>>) -> Frame {
    let num_headers = grid
        .iter()
        .take_while(|row| row.iter().any(|c| c.column_header))
        .count();

    let mut rows = grid.into_iter();
    let header_rows: Vec<Vec<TableCell>> = rows.by_ref().take(num_headers).collect();
    let body: Vec<Vec<String>> = rows
        .map(|row| row.into_iter().map(|c| c.text).collect())
        .collect();

    if header_rows.is_empty() {
        return Frame::unlabelled(body);
    }

    let width = header_rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut columns = vec![String::new(); width];
    for row in &header_rows {
        for (label, cell) in columns.iter_mut().zip(row) {
            if !label.is_empty() {
                label.push('.');
            }
            label.push_str(&cell.text);
        }
    }
    Frame {
        columns,
        rows: body,
    }
}

pub(crate) fn tables_from_document(doc: DoclingDocument, pages: Option<&PageSet>) -> Vec<Table> {
    doc.tables
        .into_iter()
        .filter_map(|t| {
            let page = t.prov.first().map(|p| p.page_no.saturating_sub(1));
            if let (Some(set), Some(p)) = (pages, page) {
                if !set.contains(p) {
                    debug!("Dropping table on page {} (not selected)", p + 1);
                    return None;
                }
            }

            let grid = t.data.into_grid();
            if grid.iter().all(Vec::is_empty) {
                debug!("Dropping table with an empty grid");
                return None;
            }

            let table = grid_to_frame(grid).into_table();
            Some(match page {
                Some(p) => table.on_page(p),
                None => table,
            })
        })
        .collect()
}
