//! Note service

use shared::{CreateNoteInput, NoteFilter, Pagination, UpdateNoteInput};
use sqlx::PgPool;

use crate::error::{ApiError, AppResult};
use crate::models::NoteRow;

/// Note service
#[derive(Clone)]
pub struct NoteService {
    db: PgPool,
}

const NOTE_SELECT: &str = r#"
    SELECT n.id, n.title, n.content, n.author_id, u.username AS author_username,
           n.paper_id,
           (SELECT COUNT(*) FROM note_collectors c WHERE c.note_id = n.id) AS collector_count,
           n.created_at, n.updated_at
    FROM notes n
    JOIN users u ON u.id = n.author_id
"#;

const NOTE_FILTER: &str = r#"
    WHERE ($1::bigint IS NULL OR n.author_id = $1)
      AND ($2::bigint IS NULL OR n.paper_id = $2)
      AND ($3::bigint IS NULL OR EXISTS (
            SELECT 1 FROM note_collectors c WHERE c.note_id = n.id AND c.user_id = $3))
"#;

impl NoteService {
    /// Create a new NoteService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List notes, newest first
    pub async fn list_notes(
        &self,
        filter: &NoteFilter,
        pagination: Pagination,
    ) -> AppResult<(Vec<NoteRow>, u64)> {
        let rows = sqlx::query_as::<_, NoteRow>(&format!(
            "{} {} ORDER BY n.created_at DESC, n.id DESC LIMIT $4 OFFSET $5",
            NOTE_SELECT, NOTE_FILTER
        ))
        .bind(filter.user)
        .bind(filter.paper)
        .bind(filter.collected_by)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM notes n {}",
            NOTE_FILTER
        ))
        .bind(filter.user)
        .bind(filter.paper)
        .bind(filter.collected_by)
        .fetch_one(&self.db)
        .await?;

        Ok((rows, u64::try_from(total).unwrap_or_default()))
    }

    /// Get a note by ID
    pub async fn get_note(&self, note_id: i64) -> AppResult<NoteRow> {
        sqlx::query_as::<_, NoteRow>(&format!("{} WHERE n.id = $1", NOTE_SELECT))
            .bind(note_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("note"))
    }

    /// Author of a note, for permission checks
    pub async fn get_author_id(&self, note_id: i64) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT author_id FROM notes WHERE id = $1")
            .bind(note_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("note"))
    }

    /// Create a note authored by `author_id`
    pub async fn create_note(&self, author_id: i64, input: CreateNoteInput) -> AppResult<NoteRow> {
        if let Some(paper_id) = input.paper_id {
            self.ensure_paper_exists(paper_id).await?;
        }

        let note_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO notes (title, content, author_id, paper_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(author_id)
        .bind(input.paper_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(note_id, author_id, "Note created");
        self.get_note(note_id).await
    }

    /// Apply a partial update
    pub async fn update_note(&self, note_id: i64, input: UpdateNoteInput) -> AppResult<NoteRow> {
        if let Some(Some(paper_id)) = input.paper_id {
            self.ensure_paper_exists(paper_id).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE notes
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                paper_id = CASE WHEN $5 THEN $4 ELSE paper_id END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(note_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.paper_id.flatten())
        .bind(input.paper_id.is_some())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("note"));
        }
        self.get_note(note_id).await
    }

    /// Delete a note
    pub async fn delete_note(&self, note_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(note_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("note"));
        }
        tracing::info!(note_id, "Note deleted");
        Ok(())
    }

    /// Flip whether `user_id` collects the note. Returns the new state.
    pub async fn toggle_collect_status(&self, note_id: i64, user_id: i64) -> AppResult<bool> {
        let mut tx = self.db.begin().await?;

        // Lock the note row so concurrent toggles by the same user serialise
        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM notes WHERE id = $1 FOR UPDATE")
            .bind(note_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ApiError::not_found("note"));
        }

        let removed = sqlx::query("DELETE FROM note_collectors WHERE note_id = $1 AND user_id = $2")
            .bind(note_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let collected = if removed > 0 {
            false
        } else {
            sqlx::query(
                r#"
                INSERT INTO note_collectors (note_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(note_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
            true
        };

        tx.commit().await?;
        tracing::debug!(note_id, user_id, collected, "Toggled note collection");
        Ok(collected)
    }

    async fn ensure_paper_exists(&self, paper_id: i64) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM papers WHERE id = $1)")
            .bind(paper_id)
            .fetch_one(&self.db)
            .await?;
        if exists {
            Ok(())
        } else {
            Err(ApiError::not_found("paper"))
        }
    }
}
