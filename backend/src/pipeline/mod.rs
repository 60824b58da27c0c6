//! Batch orchestration.
//!
//! - `import`: text in, [`crate::models::BatchResult`] out
//! - `export`: records in, CSV text out

pub mod export;
pub mod import;

pub use export::{export_batch, export_file_name, project_records};
pub use import::{
    import_batch, import_batch_with, import_bytes, import_numbered_rows, import_rows, FIRST_DATA_ROW,
};
