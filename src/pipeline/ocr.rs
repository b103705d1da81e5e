//! Tesseract adapter: word boxes from TSV output, assigned to table cells.
//!
//! Tesseract runs once per page in sparse-text mode (`--psm 11`), which
//! finds isolated words in cells better than the default layout analysis.
//! Its TSV has one row per page, block, paragraph, line and word; only
//! level-5 (word) rows with a confidence and some text are kept.

use crate::error::TableExtractError;
use crate::pipeline::engine::Engine;
use crate::pipeline::grid::DetectedTable;
use crate::table::Row;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, warn};

/// TSV level of a single word.
const WORD_LEVEL: u32 = 5;

/// One word recognised by tesseract.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OcrWord {
    pub level: u32,
    #[serde(default)]
    pub block_num: u32,
    #[serde(default)]
    pub par_num: u32,
    #[serde(default)]
    pub line_num: u32,
    #[serde(default)]
    pub word_num: u32,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub conf: f32,
    #[serde(default)]
    pub text: String,
}

impl OcrWord {
    pub fn centre(&self) -> (u32, u32) {
        (self.left + self.width / 2, self.top + self.height / 2)
    }

    fn line_key(&self) -> (u32, u32, u32) {
        (self.block_num, self.par_num, self.line_num)
    }
}

/// Run tesseract on a PNG and return its words.
pub async fn recognise(
    engine: &Engine<'_>,
    png: &Path,
    lang: &str,
) -> Result<Vec<OcrWord>, TableExtractError> {
    let args = [
        png.as_os_str(),
        OsStr::new("stdout"),
        OsStr::new("-l"),
        OsStr::new(lang),
        OsStr::new("--psm"),
        OsStr::new("11"),
        OsStr::new("tsv"),
    ];
    let tsv = engine.run(args).await?;
    let words = parse_tsv(&tsv);
    debug!("tesseract found {} word(s)", words.len());
    Ok(words)
}

/// Word rows of tesseract TSV output. Unreadable rows are skipped.
pub fn parse_tsv(tsv: &[u8]) -> Vec<OcrWord> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(tsv);

    let mut words = Vec::new();
    for row in reader.deserialize::<OcrWord>() {
        match row {
            Ok(word) if is_word(&word) => words.push(word),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable tesseract row: {e}"),
        }
    }
    words
}

fn is_word(row: &OcrWord) -> bool {
    row.level == WORD_LEVEL && row.conf >= 0.0 && !row.text.trim().is_empty()
}

/// Cell texts of `table`, row-major. Slots covered by a merged cell other
/// than its top-left one stay empty.
pub fn cell_texts(table: &DetectedTable, words: &[OcrWord]) -> Vec<Row> {
    let mut rows = vec![vec![String::new(); table.cols]; table.rows];

    for cell in &table.cells {
        let inside: Vec<&OcrWord> = words
            .iter()
            .filter(|w| {
                let (x, y) = w.centre();
                cell.rect.contains(x, y)
            })
            .collect();
        rows[cell.row][cell.col] = join_words(inside);
    }
    rows
}

/// Words on the same OCR line joined by a space, lines by a newline.
fn join_words(words: Vec<&OcrWord>) -> String {
    let mut by_line: BTreeMap<(u32, u32, u32), Vec<&OcrWord>> = BTreeMap::new();
    for word in words {
        by_line.entry(word.line_key()).or_default().push(word);
    }

    let mut lines: Vec<Vec<&OcrWord>> = by_line.into_values().collect();
    for line in &mut lines {
        line.sort_by_key(|w| w.left);
    }
    lines.sort_by_key(|line| (line.iter().map(|w| w.top).min(), line[0].left));

    lines
        .iter()
        .map(|line| {
            line.iter()
                .map(|w| w.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
