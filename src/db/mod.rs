pub mod schema;

use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::record::ResultRecord;
use schema::{Column, ColumnKind};

/// Summary row for the analytics views.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub response_id: String,
    pub timestamp: String,
    pub probability: f64,
    pub risk_level: String,
}

pub struct Database {
    conn: Connection,
}

/// Thread-safe wrapper around Database. The connection is opened once per
/// process and reused across assessments; each write is a single
/// self-contained insert, so the mutex is the only coordination needed.
#[derive(Clone)]
pub struct SharedDatabase {
    inner: Arc<Mutex<Database>>,
}

impl SharedDatabase {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let db = Database::open(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(db)),
        })
    }

    /// Insert one assessment record.
    pub fn insert_response(&self, record: &ResultRecord) -> Result<(), rusqlite::Error> {
        let db = self.inner.lock().unwrap();
        db.insert_response(record)
    }

    /// Total stored assessments.
    pub fn response_count(&self) -> Result<usize, rusqlite::Error> {
        let db = self.inner.lock().unwrap();
        db.response_count()
    }

    /// Most recent assessments, newest first.
    pub fn recent_responses(&self, limit: usize) -> Result<Vec<StoredResponse>, rusqlite::Error> {
        let db = self.inner.lock().unwrap();
        db.recent_responses(limit)
    }
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Insert a record using the shared column description. Fields the record
    /// does not carry get numeric sentinels (`-1` for enumeration columns,
    /// `0.0` for score columns), never NULL — the fixed column list does not
    /// tolerate missing columns in an insert.
    pub fn insert_response(&self, record: &ResultRecord) -> Result<(), rusqlite::Error> {
        let columns = schema::columns();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO responses ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        );
        let values: Vec<SqlValue> = columns
            .iter()
            .map(|column| column_value(column, record))
            .collect();
        self.conn
            .execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(())
    }

    pub fn response_count(&self) -> Result<usize, rusqlite::Error> {
        self.conn
            .query_row("SELECT COUNT(*) FROM responses", [], |row| {
                row.get::<_, i64>(0).map(|c| c as usize)
            })
    }

    pub fn recent_responses(&self, limit: usize) -> Result<Vec<StoredResponse>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT response_id, timestamp, probability, risk_level
             FROM responses ORDER BY timestamp DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(rusqlite::params![limit as i64], |row| {
            Ok(StoredResponse {
                response_id: row.get(0)?,
                timestamp: row.get(1)?,
                probability: row.get(2)?,
                risk_level: row.get(3)?,
            })
        })?;
        rows.collect()
    }
}

fn column_value(column: &Column, record: &ResultRecord) -> SqlValue {
    match column.name.as_str() {
        "response_id" => SqlValue::Text(record.response_id.clone()),
        "timestamp" => SqlValue::Text(record.timestamp.to_rfc3339()),
        "probability" => SqlValue::Real(record.probability),
        "risk_level" => SqlValue::Text(record.risk_level.as_str().to_string()),
        name => match column.kind {
            ColumnKind::Integer => record
                .responses
                .get(name)
                .and_then(|v| v.as_f64())
                .map(|v| SqlValue::Integer(v as i64))
                .unwrap_or(SqlValue::Integer(-1)),
            ColumnKind::Real => record
                .scores
                .get(name)
                .map(|&v| SqlValue::Real(v))
                .unwrap_or(SqlValue::Real(0.0)),
            ColumnKind::Text => SqlValue::Text(String::new()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ModelOutput, RawResponse, RiskLevel, ScoreMap};
    use crate::record::build_record;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn open_temp_db() -> SharedDatabase {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "phishgauge_test_{}_{}.db",
            std::process::id(),
            id
        ));
        // Remove if leftover from previous run
        let _ = std::fs::remove_file(&path);
        SharedDatabase::open(&path).unwrap()
    }

    fn sample_record() -> ResultRecord {
        let mut responses = RawResponse::new();
        responses.insert("EX01".into(), json!(4));
        responses.insert("EX02".into(), json!(2));
        responses.insert("Demo_Horas".into(), json!(3));
        responses.insert("Demo_Rol_Trabajo".into(), json!(1));
        let mut scores = ScoreMap::new();
        scores.insert("Big5_Extraversion".into(), 3.0);
        scores.insert("Big5_Apertura".into(), 2.5);
        let output = ModelOutput {
            prediction: 1,
            probability: Some(0.42),
        };
        build_record(responses, scores, &output, RiskLevel::High).unwrap()
    }

    #[test]
    fn insert_and_count() {
        let db = open_temp_db();
        db.insert_response(&sample_record()).unwrap();
        db.insert_response(&sample_record()).unwrap();
        assert_eq!(db.response_count().unwrap(), 2);
    }

    #[test]
    fn recent_responses_returns_summary() {
        let db = open_temp_db();
        let record = sample_record();
        db.insert_response(&record).unwrap();
        let recent = db.recent_responses(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].response_id, record.response_id);
        assert_eq!(recent[0].probability, 0.42);
        assert_eq!(recent[0].risk_level, "HIGH");
    }

    #[test]
    fn absent_fields_get_sentinels_not_nulls() {
        let db = open_temp_db();
        db.insert_response(&sample_record()).unwrap();
        let inner = db.inner.lock().unwrap();
        // Demo_Pais was never answered: stored as -1, not NULL
        let pais: i64 = inner
            .conn
            .query_row("SELECT Demo_Pais FROM responses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(pais, -1);
        // Fatiga score missing from the score map: stored as 0.0
        let fatiga: f64 = inner
            .conn
            .query_row("SELECT Fatiga_Global_Score FROM responses", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(fatiga, 0.0);
    }

    #[test]
    fn answered_fields_round_trip() {
        let db = open_temp_db();
        db.insert_response(&sample_record()).unwrap();
        let inner = db.inner.lock().unwrap();
        let (ex01, horas, apertura): (i64, i64, f64) = inner
            .conn
            .query_row(
                "SELECT EX01, Demo_Horas, Big5_Apertura FROM responses",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(ex01, 4);
        assert_eq!(horas, 3);
        assert_eq!(apertura, 2.5);
    }

    #[test]
    fn duplicate_response_id_is_rejected() {
        let db = open_temp_db();
        let record = sample_record();
        db.insert_response(&record).unwrap();
        assert!(db.insert_response(&record).is_err());
    }

    #[test]
    fn count_empty() {
        let db = open_temp_db();
        assert_eq!(db.response_count().unwrap(), 0);
    }
}
