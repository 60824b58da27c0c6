//! Delimited-text reader and writer.
//!
//! The reader turns CSV text into [`Record`]s keyed by header name; the writer
//! turns records back into fully quoted CSV. The two are not exact inverses:
//! the reader splits on every delimiter, so a comma inside a quoted field
//! breaks that field apart. Fields without delimiters or quotes round-trip.

use serde_json::Value;
use std::path::Path;

use crate::error::{BulkError, BulkResult};
use crate::models::Record;

/// Default field delimiter.
pub const DEFAULT_DELIMITER: char = ',';

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode uploaded bytes to text.
///
/// Binary payloads (NUL bytes) and invalid UTF-8 are rejected as
/// [`BulkError::MalformedInput`]. Single-byte Western encodings are
/// transcoded; a UTF-8 byte order mark is dropped.
pub fn decode_content(bytes: &[u8]) -> BulkResult<String> {
    if bytes.contains(&0) {
        return Err(BulkError::MalformedInput(
            "input contains binary data".to_string(),
        ));
    }

    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    // Valid UTF-8 wins regardless of what detection guesses.
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    match detect_encoding(bytes).as_str() {
        "iso-8859-1" => Ok(encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()),
        "windows-1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()),
        other => Err(BulkError::MalformedInput(format!(
            "input is not valid UTF-8 text (detected {})",
            other
        ))),
    }
}

/// Read and decode a CSV file.
pub fn read_csv_file<P: AsRef<Path>>(path: P) -> BulkResult<String> {
    let bytes = std::fs::read(path.as_ref()).map_err(|e| {
        BulkError::MalformedInput(format!(
            "cannot read '{}': {}",
            path.as_ref().display(),
            e
        ))
    })?;
    decode_content(&bytes)
}

/// Trim a raw cell and strip one surrounding double quote from each end.
fn clean_cell(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    trimmed.strip_suffix('"').unwrap_or(trimmed)
}

/// Parse comma-delimited text into records.
///
/// # Example
/// ```
/// use pharmplus_bulk::parse_records;
///
/// let rows = parse_records("name,age\nAlice,30\nBob,25");
///
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0]["name"], "Alice");
/// assert_eq!(rows[1]["age"], "25");
/// ```
pub fn parse_records(text: &str) -> Vec<Record> {
    parse_records_with(text, DEFAULT_DELIMITER)
}

/// Parse delimited text into records with an explicit delimiter.
///
/// The first non-empty line is the header. Blank lines are skipped. Short
/// rows are padded with empty strings and extra values are ignored. Input
/// with fewer than two non-empty lines yields no records.
pub fn parse_records_with(text: &str, delimiter: char) -> Vec<Record> {
    parse_numbered_records(text, delimiter)
        .into_iter()
        .map(|(_, record)| record)
        .collect()
}

/// Like [`parse_records_with`], pairing each record with its line number.
///
/// The header is line 1 and lines are counted from it, blank ones included,
/// so a record's number is the line it sits on in the file.
pub fn parse_numbered_records(text: &str, delimiter: char) -> Vec<(usize, Record)> {
    let mut lines = strip_bom(text)
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_index, headers): (usize, Vec<String>) = match lines.next() {
        Some((index, header_line)) => (
            index,
            header_line
                .split(delimiter)
                .map(|h| clean_cell(h).to_string())
                .collect(),
        ),
        None => return Vec::new(),
    };

    lines
        .map(|(index, line)| {
            let values: Vec<&str> = line.split(delimiter).map(clean_cell).collect();
            let record = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = values.get(i).copied().unwrap_or("");
                    (header.clone(), Value::String(value.to_string()))
                })
                .collect::<Record>();
            (index - header_index + 1, record)
        })
        .collect()
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

/// Header names of delimited text, or an empty list when there is no header.
pub fn parse_headers(text: &str, delimiter: char) -> Vec<String> {
    strip_bom(text)
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(delimiter)
                .map(|h| clean_cell(h).to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Render one value as CSV cell text (before quoting).
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => number_text(n),
        Some(other) => other.to_string(),
    }
}

/// Whole floats print without a fractional part (`85.0` as `85`).
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Serialize records as fully quoted CSV.
///
/// The header is `columns` when given, otherwise the keys of the first
/// record. Rows are joined with `\n` and there is no trailing newline. An
/// empty record set produces empty text.
pub fn write_records(records: &[Record], columns: Option<&[String]>) -> BulkResult<String> {
    let Some(first) = records.first() else {
        return Ok(String::new());
    };

    let headers: Vec<String> = match columns {
        Some(cols) => cols.to_vec(),
        None => first.keys().cloned().collect(),
    };

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&headers)?;
    for record in records {
        writer.write_record(headers.iter().map(|h| cell_text(record.get(h))))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| BulkError::Write(e.to_string()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| BulkError::Write(e.to_string()))?;

    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Quoted, comma-joined header line with a trailing newline.
pub fn header_line<S: AsRef<str>>(columns: &[S]) -> String {
    let mut line = columns
        .iter()
        .map(|c| format!("\"{}\"", c.as_ref().replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_simple_csv() {
        let rows = parse_records("name,age\nAlice,30\nBob,25");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Alice");
        assert_eq!(rows[0]["age"], "30");
        assert_eq!(rows[1]["name"], "Bob");
        assert_eq!(rows[1]["age"], "25");
    }

    #[test]
    fn test_semicolon_delimiter() {
        let rows = parse_records_with("a;b;c\n1;2;3", ';');

        assert_eq!(rows[0]["a"], "1");
        assert_eq!(rows[0]["b"], "2");
        assert_eq!(rows[0]["c"], "3");
    }

    #[test]
    fn test_quoted_values() {
        let csv = "\"name\",\"value\"\n\"Alice\",\"Hello World\"";
        let rows = parse_records(csv);

        assert_eq!(rows[0]["name"], "Alice");
        assert_eq!(rows[0]["value"], "Hello World");
    }

    #[test]
    fn test_only_one_surrounding_quote_stripped() {
        let rows = parse_records("a\n\"Tendai \"\"TK\"\"\"");
        assert_eq!(rows[0]["a"], "Tendai \"\"TK\"\"");
    }

    #[test]
    fn test_quoted_comma_splits_field() {
        let rows = parse_records("first,second\n\"Tendai, Jr.\",Moyo");

        assert_eq!(rows[0]["first"], "Tendai");
        assert_eq!(rows[0]["second"], "Jr.");
    }

    #[test]
    fn test_crlf_line_endings() {
        let rows = parse_records("a,b\r\n1,2\r\n");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["b"], "2");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let rows = parse_records("\na,b\n1,2\n\n3,4\n");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_line_numbers_count_blank_lines() {
        let rows = parse_numbered_records("\na,b\n\n1,2\n3,4\n\n\n5,6", ',');
        let lines: Vec<usize> = rows.iter().map(|(line, _)| *line).collect();

        assert_eq!(lines, vec![3, 4, 7]);
        assert_eq!(rows[2].1["a"], "5");
    }

    #[test]
    fn test_bom_in_text_stripped() {
        let rows = parse_records("\u{FEFF}name,age\nAlice,30");

        assert_eq!(rows[0]["name"], "Alice");
        assert_eq!(parse_headers("\u{FEFF}name,age", ','), vec!["name", "age"]);
    }

    #[test]
    fn test_missing_values() {
        let rows = parse_records("a,b,c\n1");

        assert_eq!(rows[0]["a"], "1");
        assert_eq!(rows[0]["b"], "");
        assert_eq!(rows[0]["c"], "");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let rows = parse_records("a,b\n1,2,3,4");

        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0]["b"], "2");
    }

    #[test]
    fn test_header_only_or_empty() {
        assert!(parse_records("").is_empty());
        assert!(parse_records("a,b,c").is_empty());
        assert!(parse_records("\n\n").is_empty());
    }

    #[test]
    fn test_header_order_preserved() {
        let rows = parse_records("zeta,alpha,mid\n1,2,3");
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parse_headers() {
        assert_eq!(parse_headers("\n\"a\", b ,c\n1,2,3", ','), vec!["a", "b", "c"]);
        assert!(parse_headers("", ',').is_empty());
    }

    #[test]
    fn test_write_empty() {
        assert_eq!(write_records(&[], None).unwrap(), "");
    }

    #[test]
    fn test_write_quotes_everything() {
        let records = vec![record(json!({ "name": "Tendai", "note": "say \"hi\"" }))];
        let csv = write_records(&records, None).unwrap();

        assert_eq!(csv, "\"name\",\"note\"\n\"Tendai\",\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_values_by_type() {
        let records = vec![record(json!({
            "n": 45.5,
            "w": 85.0,
            "i": 12,
            "b": true,
            "z": null,
            "o": { "k": "v" },
        }))];
        let cols: Vec<String> = ["n", "w", "i", "b", "z", "o", "missing"].iter().map(|s| s.to_string()).collect();
        let csv = write_records(&records, Some(&cols)).unwrap();
        let data_line = csv.lines().nth(1).unwrap();

        assert_eq!(data_line, "\"45.5\",\"85\",\"12\",\"true\",\"\",\"{\"\"k\"\":\"\"v\"\"}\",\"\"");
    }

    #[test]
    fn test_write_has_no_trailing_newline() {
        let records = vec![record(json!({ "a": "1" })), record(json!({ "a": "2" }))];
        let csv = write_records(&records, None).unwrap();

        assert_eq!(csv.lines().count(), 3);
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_header_line() {
        assert_eq!(header_line(&["a", "b"]), "\"a\",\"b\"\n");
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBFname\nAlice";
        assert_eq!(decode_content(bytes).unwrap(), "name\nAlice");
    }

    #[test]
    fn test_decode_rejects_binary() {
        let result = decode_content(&[0x50, 0x4B, 0x03, 0x04, 0x00, 0x00]);
        assert!(matches!(result, Err(BulkError::MalformedInput(_))));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        match decode_content(bytes) {
            Ok(decoded) => assert!(decoded.starts_with("Soci")),
            Err(e) => assert!(matches!(e, BulkError::MalformedInput(_))),
        }
    }

    #[test]
    fn test_read_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a,b\n1,2\n").unwrap();

        let text = read_csv_file(file.path()).unwrap();
        assert_eq!(parse_records(&text).len(), 1);
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_csv_file("/definitely/not/here.csv");
        assert!(matches!(result, Err(BulkError::MalformedInput(_))));
    }
}
