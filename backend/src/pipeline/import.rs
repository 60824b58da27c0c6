//! Batch import: parse, validate every row, accumulate.
//!
//! ```text
//! bytes ──decode──▶ text ──parse──▶ rows ──validate (row 2, 3, ...)──▶ BatchResult
//! ```
//!
//! Bad rows never abort a batch. The only failures are structural ones
//! (undecodable input), reported as [`crate::error::BulkError`] before any row
//! is looked at.

use crate::error::BulkResult;
use crate::models::{BatchResult, EntityKind, Record};
use crate::parser::{decode_content, parse_numbered_records, DEFAULT_DELIMITER};
use crate::validation::RowValidator;

/// Line number of the first data row; the header is line 1.
pub const FIRST_DATA_ROW: usize = 2;

/// Validate already-parsed rows with the given validator.
///
/// Rows are numbered from [`FIRST_DATA_ROW`] in slice order. Use
/// [`import_numbered_rows`] when the source line of each row is known.
pub fn import_rows(rows: &[Record], validator: &RowValidator) -> BatchResult {
    let numbered: Vec<(usize, &Record)> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| (index + FIRST_DATA_ROW, row))
        .collect();
    validate_all(numbered, validator)
}

/// Validate rows paired with the file line they came from.
pub fn import_numbered_rows(rows: &[(usize, Record)], validator: &RowValidator) -> BatchResult {
    validate_all(rows.iter().map(|(line, row)| (*line, row)), validator)
}

fn validate_all<'a, I>(rows: I, validator: &RowValidator) -> BatchResult
where
    I: IntoIterator<Item = (usize, &'a Record)>,
{
    let mut result = BatchResult::default();

    for (line, row) in rows {
        result.push(validator.validate(row, line));
    }

    tracing::info!(
        entity = %validator.kind(),
        total = result.total_rows,
        imported = result.imported_count,
        failed = result.failed_count,
        warnings = result.warnings.len(),
        "import batch validated"
    );

    result
}

/// Import comma-delimited text as records of `kind`.
///
/// ```
/// use pharmplus_bulk::{import_batch, EntityKind};
///
/// let csv = "firstName,surname,email,phone,idNumber,dateOfBirth\n\
///            ,Moyo,tendai@test.com,+263771234567,63-123456-A-78,1985-06-15";
/// let result = import_batch(csv, EntityKind::Members);
///
/// assert_eq!(result.total_rows, 1);
/// assert_eq!(result.failed_count, 1);
/// assert_eq!(result.errors[0].field, "firstName");
/// ```
pub fn import_batch(text: &str, kind: EntityKind) -> BatchResult {
    import_batch_with(text, DEFAULT_DELIMITER, &RowValidator::new(kind))
}

/// Import delimited text with an explicit delimiter and validator.
pub fn import_batch_with(text: &str, delimiter: char, validator: &RowValidator) -> BatchResult {
    import_numbered_rows(&parse_numbered_records(text, delimiter), validator)
}

/// Import raw uploaded bytes.
///
/// Fails with [`crate::error::BulkError::MalformedInput`] when the bytes are not text.
pub fn import_bytes(bytes: &[u8], kind: EntityKind) -> BulkResult<BatchResult> {
    let text = decode_content(bytes)?;
    Ok(import_batch(&text, kind))
}
