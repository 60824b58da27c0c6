//! # PharmPlus Bulk - CSV bulk import validation and export
//!
//! Turns uploaded CSV files into validated, normalized records for the
//! PharmPlus domain entities (members, applications, claims, transactions),
//! and renders stored records back into CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Validator  │────▶│ BatchResult │
//! │  (UTF8/ISO) │     │ (header map)│     │ (per entity)│     │ (rows+errs) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Records   │────▶│  Projection │────▶│  CSV export │
//! │  (store)    │     │  (columns)  │     │  (quoted)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use pharmplus_bulk::{import_batch, EntityKind};
//!
//! let csv = "firstName,surname,email,phone,idNumber,dateOfBirth\n\
//!            Tendai,Moyo,tendai@test.com,+263771234567,63-123456-A-78,1985-06-15";
//! let result = import_batch(csv, EntityKind::Members);
//! assert_eq!(result.imported_count, 1);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Entity kinds, batch results, export specs
//! - [`parser`] - CSV decoding, parsing and writing
//! - [`validation`] - Per-entity field rules
//! - [`template`] - Import templates
//! - [`pipeline`] - Import and export drivers
//! - [`store`] - Record storage seam
//! - [`config`] - Environment settings
//! - [`logger`] - Tracing subscriber setup
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod logger;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Validation
pub mod validation;
pub mod template;

// Import / export
pub mod pipeline;
pub mod store;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    BulkError,
    BulkResult,
    ConfigError,
    ServerError,
    ServerResult,
    StoreError,
    StoreResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    BatchResult,
    EntityKind,
    ExportSpec,
    ImportOutcome,
    Record,
    RowError,
    RowWarning,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_encoding,
    header_line,
    parse_headers,
    parse_numbered_records,
    parse_records,
    parse_records_with,
    read_csv_file,
    write_records,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid_row, validate_row, RowValidator};
pub use template::{import_template, template_columns, template_file_name};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    export_batch,
    export_file_name,
    import_batch,
    import_batch_with,
    import_bytes,
    import_numbered_rows,
    import_rows,
    project_records,
};

pub use store::{InMemoryStore, RecordStore};
pub use config::Settings;

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ExportFormat, ImportResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
