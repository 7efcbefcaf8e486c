//! Catalog store for the subject → chapter → lecture hierarchy.
//!
//! Uniqueness constraints in storage are the authoritative de-duplication
//! mechanism; the `ensure_*` existence checks are only an optimization.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

/// Result type for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Error types for catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("lecture not found: {0}")]
    LectureNotFound(i64),
}

/// A top-level subject grouping
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id: i64,
    pub name: String,
}

/// A chapter within a subject
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chapter {
    pub id: i64,
    pub subject_id: i64,
    pub name: String,
}

/// A lecture row joined with its chapter and subject names, so callers can
/// build the servable path without further lookups
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LectureEntry {
    pub id: i64,
    pub chapter_id: i64,
    pub name: String,
    pub watched: bool,
    pub duration: i64,
    pub chapter_name: String,
    pub subject_name: String,
}

/// Watched and total playback seconds for a chapter or subject
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::FromRow)]
pub struct DurationTotals {
    pub watched_duration: i64,
    pub total_duration: i64,
}

/// Outcome of an insert-if-absent operation
#[derive(Debug, Clone, Copy)]
pub struct EnsureOutcome {
    pub id: i64,
    pub created: bool,
}

/// Handle to the catalog database, opened at startup and closed at shutdown
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    /// Open the catalog and create the schema if it is missing
    pub async fn connect(url: &str, max_connections: u32) -> CatalogResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        let catalog = Self { pool };
        catalog.init_schema().await?;

        info!("💾 Catalog store ready at {}", url);
        Ok(catalog)
    }

    async fn init_schema(&self) -> CatalogResult<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS subjects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS chapters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject_id INTEGER NOT NULL REFERENCES subjects(id),
                name TEXT NOT NULL,
                UNIQUE(subject_id, name)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS lectures (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chapter_id INTEGER NOT NULL REFERENCES chapters(id),
                name TEXT NOT NULL,
                file_path TEXT NOT NULL,
                watched BOOLEAN NOT NULL DEFAULT FALSE,
                duration INTEGER NOT NULL DEFAULT 0,
                UNIQUE(chapter_id, name)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Close the underlying pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// List all subjects
    pub async fn subjects(&self) -> CatalogResult<Vec<Subject>> {
        let subjects = sqlx::query_as("SELECT id, name FROM subjects ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(subjects)
    }

    /// List chapters belonging to a subject
    pub async fn chapters_of(&self, subject_id: i64) -> CatalogResult<Vec<Chapter>> {
        let chapters = sqlx::query_as(
            "SELECT id, subject_id, name FROM chapters WHERE subject_id = ? ORDER BY name",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(chapters)
    }

    /// List lectures of a chapter, joined with chapter and subject names
    pub async fn lectures_of(&self, chapter_id: i64) -> CatalogResult<Vec<LectureEntry>> {
        let lectures = sqlx::query_as(
            r#"SELECT lectures.id, lectures.chapter_id, lectures.name,
                      lectures.watched, lectures.duration,
                      chapters.name AS chapter_name, subjects.name AS subject_name
               FROM lectures
               JOIN chapters ON lectures.chapter_id = chapters.id
               JOIN subjects ON chapters.subject_id = subjects.id
               WHERE lectures.chapter_id = ?
               ORDER BY lectures.name"#,
        )
        .bind(chapter_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lectures)
    }

    /// Flip a lecture's watched flag and return the new value
    pub async fn toggle_watched(&self, lecture_id: i64) -> CatalogResult<bool> {
        let updated: Option<(bool,)> =
            sqlx::query_as("UPDATE lectures SET watched = NOT watched WHERE id = ? RETURNING watched")
                .bind(lecture_id)
                .fetch_optional(&self.pool)
                .await?;

        match updated {
            Some((watched,)) => Ok(watched),
            None => Err(CatalogError::LectureNotFound(lecture_id)),
        }
    }

    /// Watched/total duration sums over one chapter.
    ///
    /// A watched lecture contributes its full duration, an unwatched one
    /// contributes zero: SUM(duration * watched).
    pub async fn chapter_duration(&self, chapter_id: i64) -> CatalogResult<DurationTotals> {
        let totals = sqlx::query_as(
            r#"SELECT COALESCE(SUM(duration * watched), 0) AS watched_duration,
                      COALESCE(SUM(duration), 0) AS total_duration
               FROM lectures WHERE chapter_id = ?"#,
        )
        .bind(chapter_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    /// Watched/total duration sums over all lectures of a subject
    pub async fn subject_duration(&self, subject_id: i64) -> CatalogResult<DurationTotals> {
        let totals = sqlx::query_as(
            r#"SELECT COALESCE(SUM(lectures.duration * lectures.watched), 0) AS watched_duration,
                      COALESCE(SUM(lectures.duration), 0) AS total_duration
               FROM lectures
               JOIN chapters ON lectures.chapter_id = chapters.id
               WHERE chapters.subject_id = ?"#,
        )
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    /// Insert a subject if absent, returning its id either way
    pub async fn ensure_subject(&self, name: &str) -> CatalogResult<EnsureOutcome> {
        if let Some(id) = self.subject_id(name).await? {
            return Ok(EnsureOutcome { id, created: false });
        }

        let inserted: Option<(i64,)> = sqlx::query_as(
            "INSERT INTO subjects (name) VALUES (?) ON CONFLICT DO NOTHING RETURNING id",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some((id,)) => Ok(EnsureOutcome { id, created: true }),
            // Lost the insert race; the unique constraint kept the first row.
            None => {
                let (id,): (i64,) = sqlx::query_as("SELECT id FROM subjects WHERE name = ?")
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(EnsureOutcome { id, created: false })
            }
        }
    }

    /// Insert a chapter if absent, returning its id either way
    pub async fn ensure_chapter(&self, subject_id: i64, name: &str) -> CatalogResult<EnsureOutcome> {
        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM chapters WHERE subject_id = ? AND name = ?")
                .bind(subject_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        if let Some((id,)) = existing {
            return Ok(EnsureOutcome { id, created: false });
        }

        let inserted: Option<(i64,)> = sqlx::query_as(
            "INSERT INTO chapters (subject_id, name) VALUES (?, ?) ON CONFLICT DO NOTHING RETURNING id",
        )
        .bind(subject_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some((id,)) => Ok(EnsureOutcome { id, created: true }),
            None => {
                let (id,): (i64,) =
                    sqlx::query_as("SELECT id FROM chapters WHERE subject_id = ? AND name = ?")
                        .bind(subject_id)
                        .bind(name)
                        .fetch_one(&self.pool)
                        .await?;
                Ok(EnsureOutcome { id, created: false })
            }
        }
    }

    /// Insert a lecture if absent, returning its id either way.
    ///
    /// An existing row is never modified: duration and file_path keep their
    /// original values, and the watched flag only changes through
    /// [`Catalog::toggle_watched`]. A moved or renamed file therefore shows up
    /// as a new row rather than an update to the old one.
    pub async fn ensure_lecture(
        &self,
        chapter_id: i64,
        name: &str,
        file_path: &str,
        duration: u64,
    ) -> CatalogResult<EnsureOutcome> {
        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM lectures WHERE chapter_id = ? AND name = ?")
                .bind(chapter_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        if let Some((id,)) = existing {
            return Ok(EnsureOutcome { id, created: false });
        }

        let inserted: Option<(i64,)> = sqlx::query_as(
            r#"INSERT INTO lectures (chapter_id, name, file_path, watched, duration)
               VALUES (?, ?, ?, FALSE, ?)
               ON CONFLICT DO NOTHING RETURNING id"#,
        )
        .bind(chapter_id)
        .bind(name)
        .bind(file_path)
        .bind(duration as i64)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some((id,)) => Ok(EnsureOutcome { id, created: true }),
            None => {
                let (id,): (i64,) =
                    sqlx::query_as("SELECT id FROM lectures WHERE chapter_id = ? AND name = ?")
                        .bind(chapter_id)
                        .bind(name)
                        .fetch_one(&self.pool)
                        .await?;
                Ok(EnsureOutcome { id, created: false })
            }
        }
    }

    async fn subject_id(&self, name: &str) -> CatalogResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM subjects WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| id))
    }
}
