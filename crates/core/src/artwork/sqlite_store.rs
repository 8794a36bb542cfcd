//! SQLite-backed artwork store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{
    Artwork, ArtworkError, ArtworkFilter, ArtworkStatus, ArtworkStore, CreateArtworkRequest,
    MediumSuggestion, Palette,
};

const SELECT_COLUMNS: &str = "id, owner, original_image, processed_image, status, palettes, medium_suggestion, created_at, updated_at";

/// SQLite-backed artwork store.
pub struct SqliteArtworkStore {
    conn: Mutex<Connection>,
}

impl SqliteArtworkStore {
    /// Create a new SQLite artwork store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, ArtworkError> {
        let conn = Connection::open(path).map_err(|e| ArtworkError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite artwork store (useful for testing).
    pub fn in_memory() -> Result<Self, ArtworkError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ArtworkError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ArtworkError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS artworks (
                id TEXT PRIMARY KEY,
                owner TEXT,
                original_image TEXT NOT NULL,
                processed_image TEXT,
                status TEXT NOT NULL,
                palettes TEXT NOT NULL DEFAULT '[]',
                medium_suggestion TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_artworks_status ON artworks(status);
            CREATE INDEX IF NOT EXISTS idx_artworks_owner ON artworks(owner);
            CREATE INDEX IF NOT EXISTS idx_artworks_created_at ON artworks(created_at);
            "#,
        )
        .map_err(|e| ArtworkError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &ArtworkFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.clone()));
        }

        if let Some(ref owner) = filter.owner {
            conditions.push("owner = ?");
            params.push(Box::new(owner.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn parse_status(status: &str) -> ArtworkStatus {
        match status {
            "processing" => ArtworkStatus::Processing,
            "completed" => ArtworkStatus::Completed,
            "failed" => ArtworkStatus::Failed,
            _ => ArtworkStatus::Pending,
        }
    }

    fn row_to_artwork(row: &rusqlite::Row) -> rusqlite::Result<Artwork> {
        let id: String = row.get(0)?;
        let owner: Option<String> = row.get(1)?;
        let original_image: String = row.get(2)?;
        let processed_image: Option<String> = row.get(3)?;
        let status_str: String = row.get(4)?;
        let palettes_json: String = row.get(5)?;
        let medium_json: Option<String> = row.get(6)?;
        let created_at_str: String = row.get(7)?;
        let updated_at_str: String = row.get(8)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let palettes: Vec<Palette> = serde_json::from_str(&palettes_json).unwrap_or_default();
        let medium_suggestion: Option<MediumSuggestion> =
            medium_json.and_then(|json| serde_json::from_str(&json).ok());

        Ok(Artwork {
            id,
            owner,
            original_image,
            processed_image,
            status: Self::parse_status(&status_str),
            palettes,
            medium_suggestion,
            created_at,
            updated_at,
        })
    }

    fn get_locked(conn: &Connection, id: &str) -> Result<Artwork, ArtworkError> {
        let result = conn.query_row(
            &format!("SELECT {} FROM artworks WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_artwork,
        );

        match result {
            Ok(artwork) => Ok(artwork),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(ArtworkError::NotFound(id.to_string()))
            }
            Err(e) => Err(ArtworkError::Database(e.to_string())),
        }
    }
}

impl ArtworkStore for SqliteArtworkStore {
    fn create(&self, request: CreateArtworkRequest) -> Result<Artwork, ArtworkError> {
        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO artworks (id, owner, original_image, processed_image, status, palettes, medium_suggestion, created_at, updated_at) VALUES (?, ?, ?, NULL, ?, '[]', NULL, ?, ?)",
            params![
                id,
                request.owner,
                request.original_image,
                ArtworkStatus::Pending.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| ArtworkError::Database(e.to_string()))?;

        Ok(Artwork {
            id,
            owner: request.owner,
            original_image: request.original_image,
            processed_image: None,
            status: ArtworkStatus::Pending,
            palettes: Vec::new(),
            medium_suggestion: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Artwork>, ArtworkError> {
        let conn = self.conn.lock().unwrap();

        match Self::get_locked(&conn, id) {
            Ok(artwork) => Ok(Some(artwork)),
            Err(ArtworkError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list(&self, filter: &ArtworkFilter) -> Result<Vec<Artwork>, ArtworkError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM artworks {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ArtworkError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_artwork)
            .map_err(|e| ArtworkError::Database(e.to_string()))?;

        let mut artworks = Vec::new();
        for row_result in rows {
            let artwork = row_result.map_err(|e| ArtworkError::Database(e.to_string()))?;
            artworks.push(artwork);
        }

        Ok(artworks)
    }

    fn count(&self, filter: &ArtworkFilter) -> Result<i64, ArtworkError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM artworks {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| ArtworkError::Database(e.to_string()))?;

        Ok(count)
    }

    fn set_status(&self, id: &str, status: ArtworkStatus) -> Result<Artwork, ArtworkError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::get_locked(&conn, id)?;

        if !current.status.can_transition_to(status) {
            return Err(ArtworkError::InvalidTransition {
                artwork_id: id.to_string(),
                from: current.status.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE artworks SET status = ?, updated_at = ? WHERE id = ?",
            params![status.as_str(), now.to_rfc3339(), id],
        )
        .map_err(|e| ArtworkError::Database(e.to_string()))?;

        Ok(Artwork {
            status,
            updated_at: now,
            ..current
        })
    }

    fn complete(
        &self,
        id: &str,
        processed_image: &str,
        palettes: &[Palette],
        medium_suggestion: Option<&MediumSuggestion>,
    ) -> Result<Artwork, ArtworkError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::get_locked(&conn, id)?;

        if !current.status.can_transition_to(ArtworkStatus::Completed) {
            return Err(ArtworkError::InvalidTransition {
                artwork_id: id.to_string(),
                from: current.status.as_str().to_string(),
                to: ArtworkStatus::Completed.as_str().to_string(),
            });
        }

        let palettes_json =
            serde_json::to_string(palettes).map_err(|e| ArtworkError::Database(e.to_string()))?;
        let medium_json = medium_suggestion
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ArtworkError::Database(e.to_string()))?;

        let now = Utc::now();
        // Single statement: readers never see Completed without its outputs.
        conn.execute(
            "UPDATE artworks SET status = ?, processed_image = ?, palettes = ?, medium_suggestion = ?, updated_at = ? WHERE id = ?",
            params![
                ArtworkStatus::Completed.as_str(),
                processed_image,
                palettes_json,
                medium_json,
                now.to_rfc3339(),
                id,
            ],
        )
        .map_err(|e| ArtworkError::Database(e.to_string()))?;

        Ok(Artwork {
            status: ArtworkStatus::Completed,
            processed_image: Some(processed_image.to_string()),
            palettes: palettes.to_vec(),
            medium_suggestion: medium_suggestion.cloned(),
            updated_at: now,
            ..current
        })
    }
}
