//! REST API request and response types.
//!
//! Wire names are camelCase to match the existing PharmPlus clients.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{BatchResult, EntityKind, ExportSpec, Record};

/// Response to a bulk import upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    /// True when every row was accepted
    pub success: bool,

    /// Unique job identifier
    pub job_id: String,

    /// Row counts, errors and warnings
    pub data: BatchResult,

    /// Number of records handed to the store
    pub persisted: usize,

    /// Human-readable summary
    pub message: String,
}

impl ImportResponse {
    pub fn new(data: BatchResult, persisted: usize) -> Self {
        Self {
            success: data.success,
            job_id: uuid::Uuid::new_v4().to_string(),
            message: data.summary(),
            data,
            persisted,
        }
    }
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("csv") => Some(Self::Csv),
            Some("json") => Some(Self::Json),
            Some("xlsx") => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// `?entity=` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityQuery {
    pub entity: Option<String>,
}

/// Query string of `GET /api/v1/bulk/export`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub entity: Option<String>,
    pub format: Option<String>,
    /// Comma-separated column names
    pub columns: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub status: Option<String>,
}

/// Body of `POST /api/v1/bulk/export`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBody {
    pub entity: Option<String>,
    pub format: Option<String>,
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub filters: ExportFilters,
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportFilters {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// An export request after entity resolution, whatever route it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub spec: ExportSpec,
    pub format: ExportFormat,
}

/// Split a `a,b,c` column list, dropping blanks.
pub fn split_columns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ExportQuery {
    pub fn into_request(self, entity: EntityKind, format: ExportFormat) -> ExportRequest {
        ExportRequest {
            spec: ExportSpec {
                entity,
                columns: self.columns.as_deref().map(split_columns).filter(|c| !c.is_empty()),
                date_from: non_empty(self.date_from),
                date_to: non_empty(self.date_to),
                status: non_empty(self.status),
            },
            format,
        }
    }
}

impl ExportBody {
    pub fn into_request(self, entity: EntityKind, format: ExportFormat) -> ExportRequest {
        let range = self.date_range.unwrap_or_default();
        ExportRequest {
            spec: ExportSpec {
                entity,
                columns: self.columns.filter(|c| !c.is_empty()),
                date_from: non_empty(range.from),
                date_to: non_empty(range.to),
                status: non_empty(self.filters.status),
            },
            format,
        }
    }
}

/// JSON rendition of an export.
pub fn json_export_response(spec: &ExportSpec, data: Vec<Record>) -> Value {
    json!({
        "success": true,
        "meta": {
            "entity": spec.entity,
            "exportedAt": chrono::Utc::now().to_rfc3339(),
            "totalRecords": data.len(),
            "filters": {
                "dateFrom": spec.date_from,
                "dateTo": spec.date_to,
                "status": spec.status,
            },
        },
        "data": data,
    })
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "success": false,
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_response_message() {
        let response = ImportResponse::new(BatchResult::default(), 0);
        assert!(response.success);
        assert_eq!(response.message, "Successfully imported 0 of 0 records");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["totalRows"], 0);
        assert!(json["jobId"].is_string());
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!(ExportFormat::parse(None), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse(Some("JSON")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::parse(Some("pdf")), None);
    }

    #[test]
    fn test_query_into_request() {
        let query = ExportQuery {
            columns: Some("membershipNumber, firstName,,surname".into()),
            status: Some("".into()),
            date_from: Some("2024-01-01".into()),
            ..Default::default()
        };
        let request = query.into_request(EntityKind::Members, ExportFormat::Csv);

        assert_eq!(
            request.spec.columns,
            Some(vec!["membershipNumber".into(), "firstName".into(), "surname".into()])
        );
        assert_eq!(request.spec.status, None);
        assert_eq!(request.spec.date_from.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_body_deserialize() {
        let body: ExportBody = serde_json::from_value(json!({
            "entity": "claims",
            "columns": ["claimNumber", "amount"],
            "filters": { "status": "APPROVED" },
            "dateRange": { "from": "2024-03-01", "to": "2024-03-31" }
        }))
        .unwrap();
        let request = body.into_request(EntityKind::Claims, ExportFormat::Json);

        assert_eq!(request.spec.status.as_deref(), Some("APPROVED"));
        assert_eq!(request.spec.date_to.as_deref(), Some("2024-03-31"));
        assert_eq!(request.spec.columns.unwrap().len(), 2);
    }

    #[test]
    fn test_error_response() {
        let body = error_response("No file provided");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No file provided");
    }
}
