// Operations layer: everything the menu can do, expressed against a
// `RecordStore` trait instead of the concrete HTTP client. The manager
// owns the store handle; the UI borrows the manager for the lifetime of
// the menu loop. No printing happens here, callers get typed results.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::error::{AppError, StoreError};
use crate::schema::{validate_record, Kind, Record};

/// Backend access needed by the operations layer. `api::ApiClient` is
/// the real implementation; tests substitute an in-memory store.
pub trait RecordStore {
    /// All rows of the kind's table.
    fn select_all(&self, kind: Kind) -> Result<Vec<Record>, StoreError>;

    /// Only the identifiers, for bulk deletion.
    fn select_ids(&self, kind: Kind) -> Result<Vec<String>, StoreError>;

    /// Zero or one row matching the identifier.
    fn find_by_id(&self, kind: Kind, id: &str) -> Result<Option<Record>, StoreError>;

    /// Case-insensitive substring match on one field.
    fn search(&self, kind: Kind, field: &str, needle: &str) -> Result<Vec<Record>, StoreError>;

    /// Insert one record; returns the stored row including its new id.
    fn insert(&self, kind: Kind, record: &Record) -> Result<Record, StoreError>;

    /// Partial field replacement. `None` when no row has the id.
    fn update(&self, kind: Kind, id: &str, changes: &Record) -> Result<Option<Record>, StoreError>;

    fn delete(&self, kind: Kind, id: &str) -> Result<(), StoreError>;
}

/// Outcome of a batch insert: how many made it, and which did not.
/// Indexes are 1-based, matching the numbering shown during entry.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub inserted: usize,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub index: usize,
    pub error: StoreError,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.inserted + self.failures.len()
    }
}

/// Outcome of an export: where the file landed and how many rows it holds.
#[derive(Debug)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub exported: usize,
}

/// The single entry point for record operations, constructed once at
/// startup around the API client and passed by reference to the UI.
pub struct RecordManager<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> RecordManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetch all records of a kind, truncated to `limit` when given.
    pub fn list_all(&self, kind: Kind, limit: Option<usize>) -> Result<Vec<Record>, AppError> {
        let mut records = self.store.select_all(kind)?;
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    /// Substring search on one field. An absent needle is an empty
    /// result, not an error.
    pub fn search(&self, kind: Kind, field: &str, needle: &str) -> Result<Vec<Record>, AppError> {
        Ok(self.store.search(kind, field, needle)?)
    }

    pub fn fetch(&self, kind: Kind, id: &str) -> Result<Option<Record>, AppError> {
        Ok(self.store.find_by_id(kind, id)?)
    }

    /// Validate then insert a single record; returns the stored row.
    pub fn create(&self, kind: Kind, record: &Record) -> Result<Record, AppError> {
        validate_record(kind, record)?;
        Ok(self.store.insert(kind, record)?)
    }

    /// Send only the changed fields. `None` when the id does not exist.
    pub fn update(
        &self,
        kind: Kind,
        id: &str,
        changes: &Record,
    ) -> Result<Option<Record>, AppError> {
        Ok(self.store.update(kind, id, changes)?)
    }

    pub fn delete(&self, kind: Kind, id: &str) -> Result<(), AppError> {
        Ok(self.store.delete(kind, id)?)
    }

    /// Insert a sequence of records, one remote call each. Validation
    /// runs over the whole batch first, so an invalid record fails the
    /// batch before anything is sent. Remote failures are isolated per
    /// record: the batch continues and the report names the casualties.
    pub fn batch_insert(&self, kind: Kind, records: &[Record]) -> Result<BatchReport, AppError> {
        for (index, record) in records.iter().enumerate() {
            validate_record(kind, record)
                .map_err(|source| AppError::Record { index: index + 1, source })?;
        }

        let mut report = BatchReport::default();
        for (index, record) in records.iter().enumerate() {
            match self.store.insert(kind, record) {
                Ok(_) => report.inserted += 1,
                Err(error) => report.failures.push(BatchFailure { index: index + 1, error }),
            }
        }
        info!(
            table = kind.table(),
            inserted = report.inserted,
            failed = report.failures.len(),
            "batch insert finished"
        );
        Ok(report)
    }

    /// Delete every record of a kind, one call per identifier. There is
    /// no atomicity: a failed delete stops the pass and the error says
    /// how many deletions already went through.
    pub fn clear_table(&self, kind: Kind) -> Result<usize, AppError> {
        let ids = self.store.select_ids(kind)?;
        let mut deleted = 0;
        for id in &ids {
            self.store
                .delete(kind, id)
                .map_err(|source| AppError::ClearInterrupted { deleted, source })?;
            deleted += 1;
        }
        info!(table = kind.table(), deleted, "table cleared");
        Ok(deleted)
    }

    /// Write all records of a kind to a JSON file, ids included. With no
    /// path given the file lands in the working directory under a
    /// timestamped name.
    pub fn export_table(
        &self,
        kind: Kind,
        path: Option<PathBuf>,
    ) -> Result<ExportSummary, AppError> {
        let records = self.store.select_all(kind)?;
        let path = path.unwrap_or_else(|| PathBuf::from(default_export_name(kind)));

        let body = serde_json::to_string_pretty(&records)
            .map_err(|source| AppError::MalformedJson { path: path.clone(), source })?;
        fs::write(&path, body).map_err(|source| AppError::File { path: path.clone(), source })?;

        debug!(table = kind.table(), path = %path.display(), "export written");
        Ok(ExportSummary { path, exported: records.len() })
    }

    /// Read a JSON array of records, drop any pre-existing `id` so the
    /// rows are treated as new, and feed them through `batch_insert`.
    pub fn import_from_json(&self, kind: Kind, path: &Path) -> Result<BatchReport, AppError> {
        let body = fs::read_to_string(path)
            .map_err(|source| AppError::File { path: path.to_path_buf(), source })?;
        let mut records: Vec<Record> = serde_json::from_str(&body)
            .map_err(|source| AppError::MalformedJson { path: path.to_path_buf(), source })?;

        for record in &mut records {
            record.remove("id");
        }
        self.batch_insert(kind, &records)
    }
}

/// `{table}_export_{timestamp}.json`, local time.
pub fn default_export_name(kind: Kind) -> String {
    format!(
        "{}_export_{}.json",
        kind.table(),
        Local::now().format("%Y%m%d_%H%M%S")
    )
}
