//! Database models for the Academia backend
//!
//! Re-exports the wire models from the shared crate and adds the row types
//! read from PostgreSQL.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use shared::models::*;

/// Column list matching [`UserRow`]
pub const USER_COLUMNS: &str = "id, username, email, password_hash, join_date, active";

/// Column list matching [`PaperRow`]
pub const PAPER_COLUMNS: &str = "id, title, authors, abstract, uploader_id, file_name, \
     content_type, file_size, file_digest, created_at, updated_at";

/// User info from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub join_date: DateTime<Utc>,
    pub active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: Some(row.email),
            join_date: row.join_date,
            active: row.active,
        }
    }
}

/// Session row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Note joined with its author and collector count
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoteRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author_username: String,
    pub paper_id: Option<i64>,
    pub collector_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NoteRow {
    /// Convert to the wire model, nesting the author when requested
    pub fn into_note(self, nested_author: bool) -> Note {
        let author = nested_author.then(|| UserSummary {
            id: self.author_id,
            username: self.author_username.clone(),
        });
        Note {
            id: self.id,
            title: self.title,
            content: self.content,
            author_id: self.author_id,
            author,
            paper_id: self.paper_id,
            collector_count: self.collector_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Paper row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaperRow {
    pub id: i64,
    pub title: String,
    pub authors: Option<String>,
    #[sqlx(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub uploader_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub file_digest: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PaperRow> for Paper {
    fn from(row: PaperRow) -> Self {
        Paper {
            id: row.id,
            title: row.title,
            authors: row.authors,
            abstract_text: row.abstract_text,
            uploader_id: row.uploader_id,
            file_name: row.file_name,
            content_type: row.content_type,
            file_size: row.file_size,
            file_digest: row.file_digest,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_row() -> NoteRow {
        NoteRow {
            id: 1,
            title: "t".to_string(),
            content: "c".to_string(),
            author_id: 9,
            author_username: "bob".to_string(),
            paper_id: None,
            collector_count: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_note_row_nesting() {
        let nested = note_row().into_note(true);
        assert_eq!(
            nested.author,
            Some(UserSummary {
                id: 9,
                username: "bob".to_string()
            })
        );

        let flat = note_row().into_note(false);
        assert!(flat.author.is_none());
        assert_eq!(flat.author_id, 9);
        assert_eq!(flat.collector_count, 2);
    }
}
