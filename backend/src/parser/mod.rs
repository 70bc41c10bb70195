//! Response row loading with encoding and delimiter auto-detection.
//!
//! Rows come either as a JSON array of [`ResponseRow`] objects or as a CSV
//! file whose header names the row fields. CSV files may be UTF-8, Latin-1 or
//! Windows-1252 and use `,`, `;`, tab or `|` as separator.

use csv::{ReaderBuilder, StringRecord};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::models::ResponseRow;

/// Header columns a CSV row file must have.
pub const REQUIRED_COLUMNS: [&str; 5] = ["user", "timestamp", "timezone", "survey_id", "prompt_id"];

/// Loaded rows plus what was detected about the input.
#[derive(Debug, Clone)]
pub struct LoadedRows {
    pub rows: Vec<ResponseRow>,
    /// Detected encoding (`utf-8` for JSON input).
    pub encoding: String,
    /// Detected delimiter, `None` for JSON input.
    pub delimiter: Option<char>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> LoadResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .map_err(|e| LoadError::Encoding(format!("invalid UTF-8: {}", e))),
        "iso-8859-1" | "latin-1" | "latin1" => Ok(encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()),
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()),
        _ => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Detect the delimiter by counting occurrences in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;
    for sep in [',', ';', '\t', '|'] {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }
    best_sep
}

// =============================================================================
// JSON
// =============================================================================

/// Parse a JSON array of rows.
pub fn parse_json_rows(bytes: &[u8]) -> LoadResult<Vec<ResponseRow>> {
    Ok(serde_json::from_slice(bytes)?)
}

// =============================================================================
// CSV
// =============================================================================

/// Parse CSV rows from decoded text with an explicit delimiter.
pub fn parse_csv_rows(content: &str, delimiter: char) -> LoadResult<Vec<ResponseRow>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_string(), i))
        .collect();

    for required in REQUIRED_COLUMNS {
        if !headers.contains_key(required) {
            return Err(LoadError::Row {
                line: 1,
                message: format!("missing column '{}'", required),
            });
        }
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        // +1 for 0-index, +1 for header
        rows.push(row_from_record(&headers, &record, idx + 2)?);
    }
    Ok(rows)
}

fn row_from_record(headers: &HashMap<String, usize>, record: &StringRecord, line: usize) -> LoadResult<ResponseRow> {
    let text = |name: &str| -> String {
        headers
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
            .to_string()
    };
    let optional = |name: &str| -> Option<String> { Some(text(name)).filter(|s| !s.is_empty()) };
    let integer = |name: &str| -> LoadResult<Option<i64>> {
        optional(name)
            .map(|v| {
                v.parse::<i64>().map_err(|e| LoadError::Row {
                    line,
                    message: format!("column '{}' (value '{}'): {}", name, v, e),
                })
            })
            .transpose()
    };

    let choice_glossary = optional("choice_glossary")
        .map(|raw| {
            serde_json::from_str::<Value>(&raw).map_err(|e| LoadError::Row {
                line,
                message: format!("column 'choice_glossary': {}", e),
            })
        })
        .transpose()?;

    Ok(ResponseRow {
        user: text("user"),
        client: text("client"),
        timestamp: text("timestamp"),
        timezone: text("timezone"),
        survey_id: text("survey_id"),
        survey_title: text("survey_title"),
        survey_description: text("survey_description"),
        privacy_state: text("privacy_state"),
        repeatable_set_id: optional("repeatable_set_id"),
        repeatable_set_iteration: integer("repeatable_set_iteration")?,
        prompt_id: text("prompt_id"),
        prompt_type: text("prompt_type"),
        display_type: text("display_type"),
        display_label: text("display_label"),
        display_value: text("display_value"),
        unit: optional("unit"),
        location: optional("location"),
        location_status: optional("location_status"),
        launch_context: optional("launch_context"),
        choice_glossary,
        row_id: integer("row_id")?,
    })
}

// =============================================================================
// Entry points
// =============================================================================

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_bytes_auto(bytes: &[u8]) -> LoadResult<LoadedRows> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let rows = parse_csv_rows(&content, delimiter)?;
    Ok(LoadedRows {
        rows,
        encoding,
        delimiter: Some(delimiter),
    })
}

/// Load rows from a file: `.csv` files as CSV, anything else as JSON.
pub fn load_rows_file<P: AsRef<Path>>(path: P) -> LoadResult<LoadedRows> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        parse_csv_bytes_auto(&bytes)
    } else {
        Ok(LoadedRows {
            rows: parse_json_rows(&bytes)?,
            encoding: "utf-8".to_string(),
            delimiter: None,
        })
    }
}
