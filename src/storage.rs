//! SQLite archive of saved reports with cached PDFs

use chrono::Utc;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::error::ReportError;
use crate::report::ReportRecord;

/// Archive listing row, without the full record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: String,
    pub created_at: String,
    pub surname: String,
    pub name: String,
    pub fiscal_code: String,
    pub exam_date: String,
    pub preset_name: String,
    pub pregnant: bool,
    pub has_pdf: bool,
}

impl ReportSummary {
    pub fn patient_label(&self) -> String {
        format!("{} {}", self.surname, self.name).trim().to_string()
    }
}

/// Archive-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveStats {
    pub reports: i64,
    pub patients: i64,
    pub pregnant: i64,
}

/// SQLite database for storing reports
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Create or open a database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened archive {}", path.as_ref().display());
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, ReportError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, ReportError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                surname TEXT NOT NULL,
                name TEXT NOT NULL,
                fiscal_code TEXT NOT NULL,
                exam_date TEXT NOT NULL,
                preset_name TEXT NOT NULL,
                pregnant INTEGER NOT NULL,
                record_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS report_pdfs (
                report_id TEXT PRIMARY KEY,
                pdf BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reports_created
                ON reports(created_at);

            CREATE INDEX IF NOT EXISTS idx_reports_patient
                ON reports(surname, name);",
        )?;

        Ok(Self { conn })
    }

    /// Save a record under a fresh id and timestamp; the stored copy is returned
    pub fn save_report(&self, record: &ReportRecord) -> Result<ReportRecord, ReportError> {
        record.validate()?;
        let mut stored = record.clone();
        stored.id = Uuid::new_v4().to_string();
        stored.created_at = Utc::now().to_rfc3339();
        self.insert(&stored)?;
        info!("Saved report {} for {}", stored.id, stored.patient.full_name());
        Ok(stored)
    }

    /// Insert a record keeping its id, ignoring ids already present
    fn insert(&self, record: &ReportRecord) -> Result<bool, ReportError> {
        let json = serde_json::to_string(record)?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO reports
                (id, created_at, surname, name, fiscal_code, exam_date, preset_name, pregnant, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id,
                record.created_at,
                record.patient.surname,
                record.patient.name,
                record.patient.fiscal_code,
                record.patient.exam_date,
                record.config.preset_name,
                record.config.curve.is_pregnant,
                json,
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn load_report(&self, id: &str) -> Result<ReportRecord, ReportError> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT record_json FROM reports WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;

        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Err(ReportError::ReportNotFound(id.to_string())),
        }
    }

    /// All reports, newest first
    pub fn list_reports(&self) -> Result<Vec<ReportSummary>, ReportError> {
        self.query_summaries("", [])
    }

    /// Case-insensitive match over surname, name, fiscal code, exam date and preset
    pub fn search_reports(&self, query: &str) -> Result<Vec<ReportSummary>, ReportError> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_reports();
        }
        let pattern = format!("%{}%", query.to_lowercase());
        self.query_summaries(
            "WHERE lower(r.surname) LIKE ?1
                OR lower(r.name) LIKE ?1
                OR lower(r.fiscal_code) LIKE ?1
                OR lower(r.exam_date) LIKE ?1
                OR lower(r.preset_name) LIKE ?1",
            [pattern],
        )
    }

    fn query_summaries<P: rusqlite::Params>(&self, filter: &str, params: P) -> Result<Vec<ReportSummary>, ReportError> {
        let sql = format!(
            "SELECT r.id, r.created_at, r.surname, r.name, r.fiscal_code, r.exam_date,
                    r.preset_name, r.pregnant, p.report_id IS NOT NULL
             FROM reports r
             LEFT JOIN report_pdfs p ON p.report_id = r.id
             {}
             ORDER BY r.created_at DESC",
            filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let summaries = stmt
            .query_map(params, Self::row_to_summary)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    /// Delete a report and its cached PDF. Returns false when the id is unknown.
    pub fn delete_report(&self, id: &str) -> Result<bool, ReportError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM report_pdfs WHERE report_id = ?1", [id])?;
        let deleted = tx.execute("DELETE FROM reports WHERE id = ?1", [id])?;
        tx.commit()?;
        if deleted > 0 {
            info!("Deleted report {}", id);
        }
        Ok(deleted > 0)
    }

    pub fn clear(&self) -> Result<usize, ReportError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM report_pdfs", [])?;
        let removed = tx.execute("DELETE FROM reports", [])?;
        tx.commit()?;
        info!("Cleared archive ({} reports)", removed);
        Ok(removed)
    }

    pub fn count(&self) -> Result<i64, ReportError> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?)
    }

    pub fn stats(&self) -> Result<ArchiveStats, ReportError> {
        let stats = self.conn.query_row(
            "SELECT
                COUNT(*),
                COUNT(DISTINCT lower(surname) || '|' || lower(name) || '|' || lower(fiscal_code)),
                COALESCE(SUM(pregnant), 0)
             FROM reports",
            [],
            |row| {
                Ok(ArchiveStats {
                    reports: row.get(0)?,
                    patients: row.get(1)?,
                    pregnant: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Every record, newest first
    pub fn all_records(&self) -> Result<Vec<ReportRecord>, ReportError> {
        let mut stmt = self
            .conn
            .prepare("SELECT record_json FROM reports ORDER BY created_at DESC")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(ReportError::from))
            .collect()
    }

    /// Archive as a pretty JSON array
    pub fn export_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(&self.all_records()?)?)
    }

    /// Import a JSON array of records. Ids already present are skipped;
    /// returns the number of records added.
    pub fn import_json(&self, json: &str) -> Result<usize, ReportError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let items = match value {
            serde_json::Value::Array(items) => items,
            _ => return Err(ReportError::InvalidArchive("expected a JSON array of reports".to_string())),
        };

        // All or nothing: a failed insert rolls back the whole import
        let tx = self.conn.unchecked_transaction()?;
        let mut added = 0;
        for item in items {
            let mut record: ReportRecord = match serde_json::from_value(item) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping malformed report: {}", e);
                    continue;
                }
            };
            if let Err(e) = record.validate() {
                warn!("Skipping report {}: {}", record.id, e);
                continue;
            }
            if record.id.is_empty() {
                record.id = Uuid::new_v4().to_string();
            }
            if record.created_at.is_empty() {
                record.created_at = Utc::now().to_rfc3339();
            }
            if self.insert(&record)? {
                added += 1;
            }
        }
        tx.commit()?;
        info!("Imported {} reports", added);
        Ok(added)
    }

    /// Cache generated PDF bytes for a report, replacing any previous copy
    pub fn store_pdf(&self, report_id: &str, pdf: &[u8]) -> Result<(), ReportError> {
        if !self.contains(report_id)? {
            return Err(ReportError::ReportNotFound(report_id.to_string()));
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO report_pdfs (report_id, pdf) VALUES (?1, ?2)",
            params![report_id, pdf],
        )?;
        Ok(())
    }

    pub fn load_pdf(&self, report_id: &str) -> Result<Option<Vec<u8>>, ReportError> {
        Ok(self
            .conn
            .query_row("SELECT pdf FROM report_pdfs WHERE report_id = ?1", [report_id], |row| row.get(0))
            .optional()?)
    }

    pub fn contains(&self, id: &str) -> Result<bool, ReportError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reports WHERE id = ?1", [id], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<ReportSummary> {
        Ok(ReportSummary {
            id: row.get(0)?,
            created_at: row.get(1)?,
            surname: row.get(2)?,
            name: row.get(3)?,
            fiscal_code: row.get(4)?,
            exam_date: row.get(5)?,
            preset_name: row.get(6)?,
            pregnant: row.get(7)?,
            has_pdf: row.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::units::Analyte;

    fn record(surname: &str, name: &str, preset: &str) -> ReportRecord {
        let mut session = Session::new();
        session.select_preset(preset).unwrap();
        session.patient.surname = surname.to_string();
        session.patient.name = name.to_string();
        session.patient.exam_date = "2026-03-01".to_string();
        session.inputs_mut(Analyte::Glycemia)[0] = "90".to_string();
        session.to_record().unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let storage = Storage::in_memory().unwrap();
        let saved = storage.save_report(&record("Rossi", "Anna", "glyc3")).unwrap();
        assert!(!saved.id.is_empty());
        assert!(!saved.created_at.is_empty());

        let loaded = storage.load_report(&saved.id).unwrap();
        assert_eq!(loaded, saved);
        assert!(matches!(storage.load_report("missing"), Err(ReportError::ReportNotFound(_))));
    }

    #[test]
    fn test_list_newest_first_and_search() {
        let storage = Storage::in_memory().unwrap();
        let mut first = record("Rossi", "Anna", "glyc3");
        first.id = "a".to_string();
        first.created_at = "2026-01-01T00:00:00+00:00".to_string();
        let mut second = record("Verdi", "Luca", "glyc_preg");
        second.id = "b".to_string();
        second.created_at = "2026-02-01T00:00:00+00:00".to_string();
        assert!(storage.insert(&first).unwrap());
        assert!(storage.insert(&second).unwrap());

        let ids: Vec<String> = storage.list_reports().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let hits = storage.search_reports("ROSSI").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].patient_label(), "Rossi Anna");
        assert_eq!(storage.search_reports("pregnancy").unwrap()[0].id, "b");
        assert_eq!(storage.search_reports("  ").unwrap().len(), 2);
    }

    #[test]
    fn test_stats() {
        let storage = Storage::in_memory().unwrap();
        storage.save_report(&record("Rossi", "Anna", "glyc3")).unwrap();
        storage.save_report(&record("ROSSI", "anna", "glyc_preg")).unwrap();
        storage.save_report(&record("Verdi", "Luca", "glyc4")).unwrap();
        let stats = storage.stats().unwrap();
        assert_eq!(stats, ArchiveStats { reports: 3, patients: 2, pregnant: 1 });
    }

    #[test]
    fn test_pdf_cache_and_delete() {
        let storage = Storage::in_memory().unwrap();
        let saved = storage.save_report(&record("Rossi", "Anna", "glyc3")).unwrap();
        assert_eq!(storage.load_pdf(&saved.id).unwrap(), None);

        storage.store_pdf(&saved.id, b"%PDF-1.7").unwrap();
        assert_eq!(storage.load_pdf(&saved.id).unwrap(), Some(b"%PDF-1.7".to_vec()));
        assert!(storage.list_reports().unwrap()[0].has_pdf);
        assert!(storage.store_pdf("missing", b"x").is_err());

        assert!(storage.delete_report(&saved.id).unwrap());
        assert_eq!(storage.load_pdf(&saved.id).unwrap(), None);
        assert!(!storage.delete_report(&saved.id).unwrap());
    }

    #[test]
    fn test_export_import_skips_existing() {
        let source = Storage::in_memory().unwrap();
        source.save_report(&record("Rossi", "Anna", "glyc3")).unwrap();
        source.save_report(&record("Verdi", "Luca", "glyc4")).unwrap();
        let json = source.export_json().unwrap();

        let target = Storage::in_memory().unwrap();
        assert_eq!(target.import_json(&json).unwrap(), 2);
        assert_eq!(target.import_json(&json).unwrap(), 0);
        assert_eq!(target.count().unwrap(), 2);
        assert_eq!(target.all_records().unwrap(), source.all_records().unwrap());
    }

    #[test]
    fn test_import_rejects_non_array_and_skips_bad_items() {
        let storage = Storage::in_memory().unwrap();
        assert!(matches!(storage.import_json("{}"), Err(ReportError::InvalidArchive(_))));
        assert!(storage.import_json("not json").is_err());

        let good = serde_json::to_value(record("Rossi", "Anna", "glyc3")).unwrap();
        let json = serde_json::json!([{"id": "broken"}, good]).to_string();
        assert_eq!(storage.import_json(&json).unwrap(), 1);
    }

    #[test]
    fn test_failed_import_rolls_back() {
        let storage = Storage::in_memory().unwrap();
        storage
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_verdi BEFORE INSERT ON reports
                 WHEN NEW.surname = 'Verdi' BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        let json = serde_json::json!([
            serde_json::to_value(record("Rossi", "Anna", "glyc3")).unwrap(),
            serde_json::to_value(record("Verdi", "Luca", "glyc4")).unwrap(),
        ])
        .to_string();
        assert!(matches!(storage.import_json(&json), Err(ReportError::Storage(_))));
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_failed_delete_keeps_cached_pdf() {
        let storage = Storage::in_memory().unwrap();
        let saved = storage.save_report(&record("Rossi", "Anna", "glyc3")).unwrap();
        storage.store_pdf(&saved.id, b"%PDF-1.7").unwrap();
        storage
            .conn
            .execute_batch(
                "CREATE TRIGGER keep_reports BEFORE DELETE ON reports
                 BEGIN SELECT RAISE(ABORT, 'locked'); END;",
            )
            .unwrap();
        assert!(storage.delete_report(&saved.id).is_err());
        assert_eq!(storage.load_pdf(&saved.id).unwrap(), Some(b"%PDF-1.7".to_vec()));
    }

    #[test]
    fn test_import_skips_inverted_reference_range() {
        let storage = Storage::in_memory().unwrap();
        let mut bad = serde_json::to_value(record("Rossi", "Anna", "glyc3")).unwrap();
        bad["results"]["glyc_ranges"][0]["min"] = serde_json::json!(120.0);
        bad["results"]["glyc_ranges"][0]["max"] = serde_json::json!(80.0);
        let json = serde_json::json!([bad]).to_string();
        assert_eq!(storage.import_json(&json).unwrap(), 0);
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[test]
    fn test_clear() {
        let storage = Storage::in_memory().unwrap();
        storage.save_report(&record("Rossi", "Anna", "glyc3")).unwrap();
        assert_eq!(storage.clear().unwrap(), 1);
        assert_eq!(storage.stats().unwrap(), ArchiveStats::default());
    }
}
