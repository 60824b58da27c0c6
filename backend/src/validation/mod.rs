//! Row validation for bulk imports.
//!
//! Each entity kind has a fixed field schema (see [`rules`]). A row is checked
//! field by field in schema order and every failing check is collected, so one
//! row can report several problems at once.
//!
//! # Precedence per field
//!
//! 1. Required presence: an empty required field is an error and no further
//!    checks run on it.
//! 2. Format checks (email, number): errors.
//! 3. Semantic checks (dates not in the future, positive amounts, known codes):
//!    errors.
//! 4. Soft-format checks (phone, national ID, ...): warnings only.
//!
//! A row is accepted iff it produced no errors. Accepted rows are normalized
//! (trimmed, case-folded per field) and warnings are kept either way.
//!
//! # Example
//!
//! ```
//! use pharmplus_bulk::{parse_records, EntityKind, RowValidator};
//!
//! let rows = parse_records("firstName,surname,email,phone,idNumber,dateOfBirth\n\
//!                           Tendai,Moyo,TENDAI@test.com,+263771234567,63-123456-A-78,1985-06-15");
//! let outcome = RowValidator::new(EntityKind::Members).validate(&rows[0], 2);
//!
//! assert!(outcome.accepted);
//! assert_eq!(outcome.normalized_record.unwrap()["email"], "tendai@test.com");
//! ```

pub mod rules;

use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::models::{EntityKind, ImportOutcome, Record, RowError, RowWarning};
use rules::{schema, FieldSpec, Finding};

/// Validates rows of one entity kind against a reference date.
#[derive(Debug, Clone)]
pub struct RowValidator {
    kind: EntityKind,
    today: NaiveDate,
}

impl RowValidator {
    /// Validator whose "today" is the current UTC date.
    pub fn new(kind: EntityKind) -> Self {
        Self::with_reference_date(kind, Utc::now().date_naive())
    }

    /// Validator with a fixed "today", for reproducible runs.
    pub fn with_reference_date(kind: EntityKind, today: NaiveDate) -> Self {
        Self { kind, today }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Fields inspected by this validator, in template order.
    pub fn fields(&self) -> &'static [FieldSpec] {
        schema(self.kind)
    }

    /// Validate one parsed row. `row_number` is the 1-based line in the source
    /// file, so the first data row after the header is row 2.
    pub fn validate(&self, row: &Record, row_number: usize) -> ImportOutcome {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for field in self.fields() {
            let raw = field_value(row, field.name);
            let value = raw.trim();

            if value.is_empty() {
                if field.required {
                    errors.push(RowError {
                        row: row_number,
                        field: field.name.to_string(),
                        raw_value: raw.clone(),
                        message: format!("{} is required", field.name),
                    });
                }
                continue;
            }

            for check in field.checks {
                match check.evaluate(field.name, value, self.today) {
                    Some(Finding::Error(message)) => errors.push(RowError {
                        row: row_number,
                        field: field.name.to_string(),
                        raw_value: raw.clone(),
                        message,
                    }),
                    Some(Finding::Warning(message)) => warnings.push(RowWarning {
                        row: row_number,
                        field: field.name.to_string(),
                        message,
                    }),
                    None => {}
                }
            }
        }

        if !errors.is_empty() {
            tracing::debug!(
                row = row_number,
                entity = %self.kind,
                errors = errors.len(),
                "row rejected"
            );
            return ImportOutcome {
                row_number,
                accepted: false,
                normalized_record: None,
                errors,
                warnings,
            };
        }

        ImportOutcome {
            row_number,
            accepted: true,
            normalized_record: Some(self.normalize(row)),
            errors,
            warnings,
        }
    }

    /// Normalized copy of a row restricted to the schema fields.
    /// Blank optional fields become `null`.
    fn normalize(&self, row: &Record) -> Record {
        self.fields()
            .iter()
            .map(|field| {
                let raw = field_value(row, field.name);
                let value = if raw.trim().is_empty() {
                    Value::Null
                } else {
                    Value::String(field.normalize(&raw))
                };
                (field.name.to_string(), value)
            })
            .collect()
    }
}

/// Raw text of a field; missing and null read as empty.
fn field_value(row: &Record, name: &str) -> String {
    match row.get(name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Validate one row with a validator for today's date.
pub fn validate_row(kind: EntityKind, row: &Record, row_number: usize) -> ImportOutcome {
    RowValidator::new(kind).validate(row, row_number)
}

/// Quick check: true when the row would be accepted.
pub fn is_valid_row(kind: EntityKind, row: &Record) -> bool {
    validate_row(kind, row, 2).accepted
}
