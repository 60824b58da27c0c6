//! Record storage used by the HTTP layer.
//!
//! The engine never persists anything itself. The server persists accepted
//! import records and fetches export records through [`RecordStore`]. The
//! bundled [`InMemoryStore`] is an explicit instance owned by the server
//! state; there is no process-wide store.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::models::{EntityKind, ExportSpec, Record};
use crate::validation::rules::parse_date;

/// Persistence collaborator for bulk transfers.
pub trait RecordStore: Send + Sync {
    /// Save accepted records; returns how many were stored.
    fn persist(&self, kind: EntityKind, records: Vec<Record>) -> StoreResult<usize>;

    /// Records of `spec.entity` matching its date range and status filters.
    fn fetch(&self, spec: &ExportSpec) -> StoreResult<Vec<Record>>;
}

/// Thread-safe store keeping records in memory, per entity kind.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<EntityKind, Vec<Record>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of `kind`.
    pub fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        let guard = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(&kind).map_or(0, Vec::len))
    }
}

impl RecordStore for InMemoryStore {
    fn persist(&self, kind: EntityKind, records: Vec<Record>) -> StoreResult<usize> {
        let count = records.len();
        let mut guard = self.records.write().map_err(|_| StoreError::Poisoned)?;
        guard.entry(kind).or_default().extend(records);
        Ok(count)
    }

    fn fetch(&self, spec: &ExportSpec) -> StoreResult<Vec<Record>> {
        let guard = self.records.read().map_err(|_| StoreError::Poisoned)?;
        let Some(records) = guard.get(&spec.entity) else {
            return Ok(Vec::new());
        };

        let filter = RecordFilter::from_spec(spec);
        Ok(records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

/// Date-range and status predicate derived from an [`ExportSpec`].
struct RecordFilter<'a> {
    date_column: &'static str,
    from: Option<chrono::NaiveDate>,
    to: Option<chrono::NaiveDate>,
    status: Option<&'a str>,
}

impl<'a> RecordFilter<'a> {
    fn from_spec(spec: &'a ExportSpec) -> Self {
        Self {
            date_column: spec.entity.date_column(),
            from: spec.date_from.as_deref().and_then(parse_date),
            to: spec.date_to.as_deref().and_then(parse_date),
            status: spec.status.as_deref().filter(|s| !s.is_empty()),
        }
    }

    fn matches(&self, record: &Record) -> bool {
        if let Some(status) = self.status {
            let actual = record.get("status").and_then(Value::as_str).unwrap_or("");
            if !actual.eq_ignore_ascii_case(status) {
                return false;
            }
        }

        if self.from.is_none() && self.to.is_none() {
            return true;
        }

        let Some(date) = record
            .get(self.date_column)
            .and_then(Value::as_str)
            .and_then(parse_date)
        else {
            return false;
        };

        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}
