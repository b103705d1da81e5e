//! Instruction prompt for the vision-model backend.
//!
//! The prompt pins down the reply grammar that
//! [`crate::pipeline::response::parse_csv_response`] understands: bare CSV,
//! header row first, one blank line between tables. Models do not always
//! comply (fences are common), so the parser stays lenient anyway.

/// Prompt sent with every page image.
pub const EXTRACT_PROMPT: &str = r#"Extract ALL tables from this image into CSV format.
Rules:
- Output ONLY the CSV data, no explanations or markdown fences.
- Use commas as delimiters.
- Include the header row.
- If there are multiple tables, separate them with a single blank line.
- Preserve the exact text from each cell.
"#;
