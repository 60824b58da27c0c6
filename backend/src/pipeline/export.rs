//! Batch export: project records onto columns and serialize.
//!
//! Records handed to the exporter are already fetched and filtered by the
//! record source; the exporter neither filters nor validates them.

use serde_json::Value;

use crate::error::BulkResult;
use crate::models::{ExportSpec, Record};
use crate::parser::write_records;

/// Copy each record restricted to `columns`, in that order.
/// Columns a record lacks are filled with `null`.
pub fn project_records(records: &[Record], columns: &[String]) -> Vec<Record> {
    records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|col| (col.clone(), record.get(col).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect()
}

/// Serialize records for download according to `spec`.
///
/// ```
/// use pharmplus_bulk::{export_batch, EntityKind, ExportSpec};
/// use serde_json::json;
///
/// let records = vec![json!({ "claimNumber": "CLM-2024-000123", "amount": 85.0 })
///     .as_object().cloned().unwrap()];
/// let spec = ExportSpec::new(EntityKind::Claims).with_columns(["amount"]);
///
/// assert_eq!(export_batch(&records, &spec).unwrap(), "\"amount\"\n\"85\"");
/// ```
pub fn export_batch(records: &[Record], spec: &ExportSpec) -> BulkResult<String> {
    let columns = spec.resolved_columns();
    let projected = project_records(records, &columns);
    let text = write_records(&projected, Some(&columns))?;

    tracing::info!(
        entity = %spec.entity,
        records = records.len(),
        columns = columns.len(),
        "export serialized"
    );

    Ok(text)
}

/// Suggested download name, e.g. `claims_export_2024-03-16.csv`.
pub fn export_file_name(spec: &ExportSpec, date: chrono::NaiveDate) -> String {
    format!("{}_export_{}.csv", spec.entity, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;
    use crate::parser::parse_records;
    use serde_json::json;

    fn members() -> Vec<Record> {
        vec![
            json!({
                "membershipNumber": "PP-2024-001234",
                "firstName": "Tendai",
                "surname": "Moyo",
                "email": "tendai.moyo@email.co.zw",
                "phone": "+263771234567",
                "dependents": 3,
            }),
            json!({
                "membershipNumber": "PP-2024-001235",
                "firstName": "Chipo",
                "surname": "Ndlovu",
                "email": "chipo.ndlovu@email.co.zw",
                "phone": "+263772345678",
                "dependents": 0,
            }),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
    }

    #[test]
    fn test_export_natural_columns() {
        let csv = export_batch(&members(), &ExportSpec::new(EntityKind::Members)).unwrap();
        let header = csv.lines().next().unwrap();

        assert!(header.starts_with("\"membershipNumber\",\"firstName\",\"surname\",\"email\""));
        assert_eq!(header.split(',').count(), EntityKind::Members.export_columns().len());
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_export_column_projection() {
        let spec = ExportSpec::new(EntityKind::Members).with_columns(["surname", "membershipNumber"]);
        let csv = export_batch(&members(), &spec).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "\"surname\",\"membershipNumber\"");
        assert_eq!(lines[1], "\"Moyo\",\"PP-2024-001234\"");
        assert!(!lines[0].contains("phone"));
    }

    #[test]
    fn test_export_missing_column_is_empty() {
        let spec = ExportSpec::new(EntityKind::Members).with_columns(["firstName", "validUntil"]);
        let csv = export_batch(&members(), &spec).unwrap();

        assert_eq!(csv.lines().nth(1).unwrap(), "\"Tendai\",\"\"");
    }

    #[test]
    fn test_export_empty_set() {
        let csv = export_batch(&[], &ExportSpec::new(EntityKind::Claims)).unwrap();
        assert_eq!(csv, "");
    }

    #[test]
    fn test_round_trip_safe_data() {
        let spec = ExportSpec::new(EntityKind::Members)
            .with_columns(["membershipNumber", "firstName", "surname", "email", "phone", "dependents"]);
        let csv = export_batch(&members(), &spec).unwrap();
        let parsed = parse_records(&csv);

        assert_eq!(parsed.len(), 2);
        for (original, reparsed) in members().iter().zip(&parsed) {
            for (key, value) in original {
                let expected = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                assert_eq!(reparsed[key], expected, "column {}", key);
            }
        }
    }

    #[test]
    fn test_project_records() {
        let cols = vec!["phone".to_string(), "nope".to_string()];
        let projected = project_records(&members(), &cols);

        assert_eq!(projected[0].len(), 2);
        assert_eq!(projected[0]["phone"], "+263771234567");
        assert_eq!(projected[0]["nope"], Value::Null);
    }

    #[test]
    fn test_export_file_name() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
        let spec = ExportSpec::new(EntityKind::Claims);
        assert_eq!(export_file_name(&spec, date), "claims_export_2024-03-16.csv");
    }
}
