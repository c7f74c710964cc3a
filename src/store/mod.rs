use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::{COLUMNS, MarketSnapshot};

// ── Dataset ─────────────────────────────────────────────────────────

/// The persisted dataset in schema-generic form: a header plus rows of
/// cells aligned to it. Generic on purpose — the store must be able to
/// read a file written under an older schema and migrate it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of a column by name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Sort rows by the `Date` column ascending. ISO dates sort
    /// correctly as strings.
    pub fn sort_by_date(&mut self) {
        if let Some(idx) = self.column("Date") {
            self.rows.sort_by(|a, b| a[idx].cmp(&b[idx]));
        }
    }
}

// ── Store ───────────────────────────────────────────────────────────

/// What to do with existing rows when the persisted schema differs
/// from the canonical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MigrationPolicy {
    /// Re-project prior rows onto the new schema; cells for columns the
    /// old schema lacked stay empty (empty, not the 0 sentinel).
    #[default]
    Preserve,
    /// Discard all prior rows and start over under the new schema.
    Rewrite,
}

/// Read/modify/atomic-write access to the dataset file. One run is one
/// load → upsert → persist cycle; persist goes through a temp file and
/// rename so a crash mid-write cannot corrupt the previous dataset.
pub struct DatasetStore {
    path: PathBuf,
    migration: MigrationPolicy,
}

impl DatasetStore {
    pub fn new(path: &Path, migration: MigrationPolicy) -> Self {
        Self {
            path: path.to_path_buf(),
            migration,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted dataset. An absent, empty, or unreadable file
    /// all come back as an empty dataset — a damaged file must never
    /// block future writes.
    pub fn load(&self) -> Dataset {
        if !self.path.exists() {
            return Dataset::default();
        }
        match self.read_csv() {
            Ok(dataset) => dataset,
            Err(e) => {
                eprintln!(
                    "  WARN  store corrupted, starting fresh: {} ({e:#})",
                    self.path.display()
                );
                Dataset::default()
            }
        }
    }

    fn read_csv(&self) -> Result<Dataset> {
        let mut rdr = csv::Reader::from_path(&self.path)
            .with_context(|| format!("opening dataset {}", self.path.display()))?;
        let columns: Vec<String> = rdr
            .headers()
            .context("reading dataset header")?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.context("reading dataset row")?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(Dataset { columns, rows })
    }

    /// Insert-or-replace one record, keyed by `Date`. Applying the same
    /// record twice leaves exactly one row for that date.
    pub fn upsert(&self, dataset: &mut Dataset, record: &MarketSnapshot) {
        let canonical: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();

        if dataset.is_empty() {
            dataset.columns = canonical;
        } else if dataset.columns != canonical {
            eprintln!(
                "  WARN  schema mismatch: stored [{}] vs current [{}]; migrating ({:?})",
                dataset.columns.join(","),
                COLUMNS.join(","),
                self.migration
            );
            match self.migration {
                MigrationPolicy::Rewrite => {
                    dataset.rows.clear();
                }
                MigrationPolicy::Preserve => {
                    let old_columns = std::mem::take(&mut dataset.columns);
                    let indices: Vec<Option<usize>> = COLUMNS
                        .iter()
                        .map(|name| old_columns.iter().position(|c| c == name))
                        .collect();
                    for row in &mut dataset.rows {
                        let old_row = std::mem::take(row);
                        *row = indices
                            .iter()
                            .map(|idx| {
                                idx.and_then(|i| old_row.get(i).cloned())
                                    .unwrap_or_default()
                            })
                            .collect();
                    }
                }
            }
            dataset.columns = canonical;
        }

        let date_idx = dataset.column("Date").unwrap_or(0);
        let date = record.date.format("%Y-%m-%d").to_string();
        dataset.rows.retain(|row| row.get(date_idx) != Some(&date));
        dataset.rows.push(record.to_row());
    }

    /// Write the full dataset to a sibling temp file, then rename it
    /// over the real path. A failed write leaves the prior file intact.
    pub fn persist(&self, dataset: &Dataset) -> Result<()> {
        let tmp = self.path.with_extension("csv.tmp");
        self.write_csv(&tmp, dataset)
            .with_context(|| format!("writing dataset to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path).with_context(|| {
            format!(
                "replacing {} with {}",
                self.path.display(),
                tmp.display()
            )
        })?;
        Ok(())
    }

    fn write_csv(&self, path: &Path, dataset: &Dataset) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("creating CSV file {}", path.display()))?;
        wtr.write_record(&dataset.columns)?;
        for row in &dataset.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
