//! Domain models for the bulk transfer engine.
//!
//! - [`EntityKind`] - Closed set of importable/exportable entities
//! - [`Record`] - One tabular row (column name to value)
//! - [`RowError`] / [`RowWarning`] - Per-row validation notes
//! - [`ImportOutcome`] - Result of validating one row
//! - [`BatchResult`] - Aggregate over one import call
//! - [`ExportSpec`] - Column selection and filters for an export

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::BulkError;

/// A tabular row keyed by column name. Key order follows the source header.
pub type Record = Map<String, Value>;

// =============================================================================
// Entity Kind
// =============================================================================

/// Kind of record carried by a bulk import or export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Scheme members.
    Members,
    /// Membership applications.
    Applications,
    /// Medical claims.
    Claims,
    /// Payment transactions.
    Transactions,
}

impl EntityKind {
    /// Every supported kind, in display order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Members,
        EntityKind::Applications,
        EntityKind::Claims,
        EntityKind::Transactions,
    ];

    /// Wire name (`members`, `claims`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::Applications => "applications",
            Self::Claims => "claims",
            Self::Transactions => "transactions",
        }
    }

    /// Full column set used when an export does not select columns.
    pub fn export_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Members => &[
                "membershipNumber",
                "firstName",
                "surname",
                "email",
                "phone",
                "idNumber",
                "dateOfBirth",
                "address",
                "status",
                "package",
                "validFrom",
                "validUntil",
                "dependents",
            ],
            Self::Applications => &[
                "applicationNumber",
                "firstName",
                "surname",
                "email",
                "phone",
                "idNumber",
                "dateOfBirth",
                "address",
                "employerName",
                "packageId",
                "status",
                "submittedAt",
            ],
            Self::Claims => &[
                "claimNumber",
                "membershipNumber",
                "memberName",
                "type",
                "provider",
                "serviceDate",
                "submissionDate",
                "amount",
                "approvedAmount",
                "status",
            ],
            Self::Transactions => &[
                "transactionId",
                "membershipNumber",
                "memberName",
                "type",
                "method",
                "amount",
                "currency",
                "status",
                "date",
                "reference",
            ],
        }
    }

    /// Column that export date-range filters apply to.
    pub fn date_column(&self) -> &'static str {
        match self {
            Self::Members => "validFrom",
            Self::Applications => "submittedAt",
            Self::Claims => "serviceDate",
            Self::Transactions => "date",
        }
    }

    /// Comma-separated list of wire names, for error messages.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "members" | "member" => Ok(Self::Members),
            "applications" | "application" => Ok(Self::Applications),
            "claims" | "claim" => Ok(Self::Claims),
            "transactions" | "transaction" => Ok(Self::Transactions),
            _ => Err(BulkError::UnsupportedEntity(s.to_string())),
        }
    }
}

// =============================================================================
// Row Outcomes
// =============================================================================

/// A blocking validation failure on one field of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row: usize,
    pub field: String,
    pub raw_value: String,
    pub message: String,
}

/// A non-blocking note on one field of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowWarning {
    pub row: usize,
    pub field: String,
    pub message: String,
}

/// Result of validating a single row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// 1-based line number; the header is row 1.
    pub row_number: usize,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_record: Option<Record>,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
}

// =============================================================================
// Batch Result
// =============================================================================

/// Aggregate result of one import call.
///
/// `imported_count + failed_count == total_rows` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success: bool,
    pub total_rows: usize,
    pub imported_count: usize,
    pub failed_count: usize,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
    /// Accepted, normalized records in row order. Persisting them is the caller's job.
    #[serde(skip)]
    pub records: Vec<Record>,
}

impl Default for BatchResult {
    fn default() -> Self {
        Self {
            success: true,
            total_rows: 0,
            imported_count: 0,
            failed_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            records: Vec::new(),
        }
    }
}

impl BatchResult {
    /// Fold one row outcome into the batch.
    pub fn push(&mut self, outcome: ImportOutcome) {
        self.total_rows += 1;
        self.warnings.extend(outcome.warnings);
        match outcome.normalized_record {
            Some(record) if outcome.accepted => {
                self.imported_count += 1;
                self.records.push(record);
            }
            _ => {
                self.failed_count += 1;
                self.errors.extend(outcome.errors);
            }
        }
        self.success = self.failed_count == 0;
    }

    /// Human-readable summary used by the API and the CLI.
    pub fn summary(&self) -> String {
        if self.success {
            format!(
                "Successfully imported {} of {} records",
                self.imported_count, self.total_rows
            )
        } else {
            format!("Import completed with {} errors", self.failed_count)
        }
    }
}

// =============================================================================
// Export Spec
// =============================================================================

/// What to export and how to narrow it.
///
/// Date and status filters are not interpreted by the engine; the record
/// source applies them before records reach the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSpec {
    pub entity: EntityKind,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ExportSpec {
    /// Export every natural column of `entity`, unfiltered.
    pub fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            columns: None,
            date_from: None,
            date_to: None,
            status: None,
        }
    }

    /// Restrict the export to these columns, in this order.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Columns to write: the explicit selection or the entity's natural set.
    pub fn resolved_columns(&self) -> Vec<String> {
        match &self.columns {
            Some(cols) if !cols.is_empty() => cols.clone(),
            _ => self
                .entity
                .export_columns()
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
