//! SQLite-persisted vector store

use super::{
    bytes_to_embedding, cosine_similarity, embedding_to_bytes, rank, IndexedSection,
    ScoredSection, VectorStore,
};
use crate::error::{Result, SiftError};
use crate::section::SectionRecord;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS sections (
    id INTEGER NOT NULL,
    collection TEXT NOT NULL,
    file TEXT NOT NULL,
    page INTEGER NOT NULL,
    heading TEXT NOT NULL,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_sections_collection ON sections(collection);
"#;

/// Vector store persisted in one SQLite table, scoped to a collection
pub struct SqliteStore {
    conn: Mutex<Connection>,
    collection: String,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::initialize(conn, collection)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory(collection: &str) -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?, collection)
    }

    fn initialize(conn: Connection, collection: &str) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SiftError::Index(format!("Store lock poisoned: {}", e)))
    }
}

impl VectorStore for SqliteStore {
    fn upsert(&self, points: Vec<IndexedSection>) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO sections (id, collection, file, page, heading, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for point in &points {
                stmt.execute(params![
                    point.id as i64,
                    self.collection,
                    point.section.file,
                    point.section.page,
                    point.section.heading,
                    point.section.text,
                    embedding_to_bytes(&point.vector),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!("Upserted {} sections into '{}'", points.len(), self.collection);
        Ok(())
    }

    fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredSection>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT file, page, heading, text, embedding FROM sections
             WHERE collection = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![self.collection], |row| {
            let section = SectionRecord {
                file: row.get(0)?,
                page: row.get(1)?,
                heading: row.get(2)?,
                text: row.get(3)?,
            };
            let blob: Vec<u8> = row.get(4)?;
            Ok((section, blob))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (section, blob) = row?;
            let score = cosine_similarity(query, &bytes_to_embedding(&blob));
            hits.push(ScoredSection { section, score });
        }
        Ok(rank(hits, limit))
    }

    fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sections WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM sections WHERE collection = ?1",
            params![self.collection],
        )?;
        Ok(())
    }
}
