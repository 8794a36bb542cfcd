//! SQLite-backed job store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{Job, JobError, JobFilter, JobState, JobStore};

const SELECT_COLUMNS: &str = "id, artwork_id, state, progress, attempt, error, created_at, updated_at";

/// SQLite-backed job store.
///
/// The state column holds the tagged JSON of `JobState`; queries filter on
/// `json_extract(state, '$.type')`.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Create a new SQLite job store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, JobError> {
        let conn = Connection::open(path).map_err(|e| JobError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite job store (useful for testing).
    pub fn in_memory() -> Result<Self, JobError> {
        let conn = Connection::open_in_memory().map_err(|e| JobError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), JobError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                artwork_id TEXT NOT NULL,
                state TEXT NOT NULL,
                progress INTEGER NOT NULL DEFAULT 0,
                attempt INTEGER NOT NULL DEFAULT 1,
                error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_artwork_id ON jobs(artwork_id);
            CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs(created_at);
            "#,
        )
        .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &JobFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref state_type) = filter.state_type {
            conditions.push("json_extract(state, '$.type') = ?");
            params.push(Box::new(state_type.clone()));
        }

        if let Some(ref artwork_id) = filter.artwork_id {
            conditions.push("artwork_id = ?");
            params.push(Box::new(artwork_id.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
        let id: String = row.get(0)?;
        let artwork_id: String = row.get(1)?;
        let state_json: String = row.get(2)?;
        let progress: u8 = row.get(3)?;
        let attempt: u32 = row.get(4)?;
        let error: Option<String> = row.get(5)?;
        let created_at_str: String = row.get(6)?;
        let updated_at_str: String = row.get(7)?;

        let state: JobState = serde_json::from_str(&state_json)
            .unwrap_or(JobState::Queued);

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Job {
            id,
            artwork_id,
            state,
            progress,
            attempt,
            error,
            created_at,
            updated_at,
        })
    }

    fn get_locked(conn: &Connection, id: &str) -> Result<Job, JobError> {
        let result = conn.query_row(
            &format!("SELECT {} FROM jobs WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_job,
        );

        match result {
            Ok(job) => Ok(job),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(JobError::NotFound(id.to_string())),
            Err(e) => Err(JobError::Database(e.to_string())),
        }
    }

    fn active_locked(conn: &Connection, artwork_id: &str) -> Result<Option<Job>, JobError> {
        conn.query_row(
            &format!(
                "SELECT {} FROM jobs WHERE artwork_id = ? AND json_extract(state, '$.type') IN ('queued', 'running')",
                SELECT_COLUMNS
            ),
            params![artwork_id],
            Self::row_to_job,
        )
        .optional()
        .map_err(|e| JobError::Database(e.to_string()))
    }
}

impl JobStore for SqliteJobStore {
    fn create_for_artwork(&self, artwork_id: &str) -> Result<Job, JobError> {
        // One lock span covers the active-job check and the insert, so two
        // concurrent starts cannot both succeed.
        let conn = self.conn.lock().unwrap();

        if let Some(active) = Self::active_locked(&conn, artwork_id)? {
            return Err(JobError::AlreadyProcessing {
                artwork_id: artwork_id.to_string(),
                job_id: active.id,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let state = JobState::Queued;
        let state_json =
            serde_json::to_string(&state).map_err(|e| JobError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO jobs (id, artwork_id, state, progress, attempt, error, created_at, updated_at) VALUES (?, ?, ?, 0, 1, NULL, ?, ?)",
            params![id, artwork_id, state_json, now.to_rfc3339(), now.to_rfc3339()],
        )
        .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(Job {
            id,
            artwork_id: artwork_id.to_string(),
            state,
            progress: 0,
            attempt: 1,
            error: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Job, JobError> {
        let conn = self.conn.lock().unwrap();
        Self::get_locked(&conn, id)
    }

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM jobs {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| JobError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit.unwrap_or(100)));
        all_params.push(Box::new(filter.offset.unwrap_or(0)));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_job)
            .map_err(|e| JobError::Database(e.to_string()))?;

        let mut jobs = Vec::new();
        for row_result in rows {
            let job = row_result.map_err(|e| JobError::Database(e.to_string()))?;
            jobs.push(job);
        }

        Ok(jobs)
    }

    fn count(&self, filter: &JobFilter) -> Result<u64, JobError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM jobs {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    fn active_for_artwork(&self, artwork_id: &str) -> Result<Option<Job>, JobError> {
        let conn = self.conn.lock().unwrap();
        Self::active_locked(&conn, artwork_id)
    }

    fn update_state(&self, id: &str, state: &JobState) -> Result<Job, JobError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::get_locked(&conn, id)?;

        let state_json =
            serde_json::to_string(state).map_err(|e| JobError::Database(e.to_string()))?;
        // Failures keep their message in a dedicated column as well, so the
        // error survives a later retry overwriting the state blob.
        let error = match state {
            JobState::Failed { error, .. } => Some(error.clone()),
            _ => current.error.clone(),
        };

        let now = Utc::now();
        conn.execute(
            "UPDATE jobs SET state = ?, error = ?, updated_at = ? WHERE id = ?",
            params![state_json, error, now.to_rfc3339(), id],
        )
        .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(Job {
            state: state.clone(),
            error,
            updated_at: now,
            ..current
        })
    }

    fn set_progress(&self, id: &str, progress: u8) -> Result<Job, JobError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::get_locked(&conn, id)?;
        let progress = progress.min(100).max(current.progress);
        if progress == current.progress {
            return Ok(current);
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE jobs SET progress = ?, updated_at = ? WHERE id = ?",
            params![progress, now.to_rfc3339(), id],
        )
        .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(Job {
            progress,
            updated_at: now,
            ..current
        })
    }

    fn set_attempt(&self, id: &str, attempt: u32) -> Result<Job, JobError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::get_locked(&conn, id)?;

        let now = Utc::now();
        conn.execute(
            "UPDATE jobs SET attempt = ?, updated_at = ? WHERE id = ?",
            params![attempt, now.to_rfc3339(), id],
        )
        .map_err(|e| JobError::Database(e.to_string()))?;

        Ok(Job {
            attempt,
            updated_at: now,
            ..current
        })
    }
}
