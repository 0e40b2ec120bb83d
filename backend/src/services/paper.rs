//! Paper service: metadata in PostgreSQL, file bytes in the paper store

use std::collections::BTreeMap;

use shared::{Pagination, PaperFields, PaperFilter, PaperUpload};
use sqlx::{PgConnection, PgPool};

use crate::error::{ApiError, AppResult};
use crate::models::{Paper, PaperRow, PAPER_COLUMNS};
use crate::storage::PaperStore;

const MISSING_FIELD: &str = "Missing data for required field";

/// Serialise writers and removers of one stored file. Held until the
/// surrounding transaction ends.
async fn lock_digest(conn: &mut PgConnection, digest: &str) -> sqlx::Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(digest)
        .execute(conn)
        .await?;
    Ok(())
}

/// Paper service
#[derive(Clone)]
pub struct PaperService {
    db: PgPool,
    store: PaperStore,
}

impl PaperService {
    /// Create a new PaperService instance
    pub fn new(db: PgPool, store: PaperStore) -> Self {
        Self { db, store }
    }

    /// List papers, newest first
    pub async fn list_papers(
        &self,
        filter: &PaperFilter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Paper>, u64)> {
        let rows = sqlx::query_as::<_, PaperRow>(&format!(
            r#"
            SELECT {}
            FROM papers
            WHERE ($1::bigint IS NULL OR uploader_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            PAPER_COLUMNS
        ))
        .bind(filter.user)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM papers WHERE ($1::bigint IS NULL OR uploader_id = $1)",
        )
        .bind(filter.user)
        .fetch_one(&self.db)
        .await?;

        Ok((
            rows.into_iter().map(Paper::from).collect(),
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    /// Get a paper by ID
    pub async fn get_paper(&self, paper_id: i64) -> AppResult<Paper> {
        sqlx::query_as::<_, PaperRow>(&format!(
            "SELECT {} FROM papers WHERE id = $1",
            PAPER_COLUMNS
        ))
        .bind(paper_id)
        .fetch_optional(&self.db)
        .await?
        .map(Paper::from)
        .ok_or_else(|| ApiError::not_found("paper"))
    }

    /// Get a paper together with its file bytes
    pub async fn read_paper_file(&self, paper_id: i64) -> AppResult<(Paper, Vec<u8>)> {
        let paper = self.get_paper(paper_id).await?;
        let bytes = self.store.read(&paper.file_digest).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                tracing::error!(paper_id, digest = %paper.file_digest, "Paper file missing from store");
                ApiError::not_found("paper file")
            } else {
                ApiError::Storage(e)
            }
        })?;
        Ok((paper, bytes))
    }

    /// Store an uploaded paper
    pub async fn create_paper(
        &self,
        uploader_id: i64,
        fields: PaperFields,
        upload: Option<PaperUpload>,
    ) -> AppResult<Paper> {
        let (title, upload) = match (fields.title, upload) {
            (Some(title), Some(upload)) => (title, upload),
            (title, upload) => {
                let mut errors = BTreeMap::new();
                if title.is_none() {
                    errors.insert("title".to_string(), vec![MISSING_FIELD.to_string()]);
                }
                if upload.is_none() {
                    errors.insert("file".to_string(), vec![MISSING_FIELD.to_string()]);
                }
                return Err(ApiError::ArgFormat(errors));
            }
        };

        let digest = PaperStore::digest(&upload.bytes);
        let mut tx = self.db.begin().await?;
        lock_digest(&mut tx, &digest).await?;
        self.store.put(&upload.bytes).await?;

        let inserted = sqlx::query_as::<_, PaperRow>(&format!(
            r#"
            INSERT INTO papers (title, authors, abstract, uploader_id, file_name,
                                content_type, file_size, file_digest)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PAPER_COLUMNS
        ))
        .bind(&title)
        .bind(&fields.authors)
        .bind(&fields.abstract_text)
        .bind(uploader_id)
        .bind(&upload.file_name)
        .bind(&upload.content_type)
        .bind(upload.bytes.len() as i64)
        .bind(&digest)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) => {
                tx.rollback().await?;
                self.release_files(std::slice::from_ref(&digest)).await;
                return Err(e.into());
            }
        };
        tx.commit().await?;

        tracing::info!(paper_id = row.id, uploader_id, %digest, "Paper uploaded");
        Ok(row.into())
    }

    /// Apply a partial update; a new file replaces the old one
    pub async fn update_paper(
        &self,
        paper_id: i64,
        fields: PaperFields,
        upload: Option<PaperUpload>,
    ) -> AppResult<Paper> {
        let previous = self.get_paper(paper_id).await?;

        let mut tx = self.db.begin().await?;
        let new_file = match &upload {
            Some(upload) => {
                let digest = PaperStore::digest(&upload.bytes);
                lock_digest(&mut tx, &digest).await?;
                self.store.put(&upload.bytes).await?;
                Some(digest)
            }
            None => None,
        };

        let updated = sqlx::query_as::<_, PaperRow>(&format!(
            r#"
            UPDATE papers
            SET title = COALESCE($2, title),
                authors = COALESCE($3, authors),
                abstract = COALESCE($4, abstract),
                file_name = COALESCE($5, file_name),
                content_type = COALESCE($6, content_type),
                file_size = COALESCE($7, file_size),
                file_digest = COALESCE($8, file_digest),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PAPER_COLUMNS
        ))
        .bind(paper_id)
        .bind(&fields.title)
        .bind(&fields.authors)
        .bind(&fields.abstract_text)
        .bind(upload.as_ref().map(|u| u.file_name.clone()))
        .bind(upload.as_ref().map(|u| u.content_type.clone()))
        .bind(upload.as_ref().map(|u| u.bytes.len() as i64))
        .bind(&new_file)
        .fetch_optional(&mut *tx)
        .await;

        let updated = match updated {
            Ok(Some(row)) => Ok(row),
            Ok(None) => Err(ApiError::not_found("paper")),
            Err(e) => Err(ApiError::from(e)),
        };
        let row = match updated {
            Ok(row) => row,
            Err(e) => {
                tx.rollback().await?;
                if let Some(digest) = &new_file {
                    self.release_files(std::slice::from_ref(digest)).await;
                }
                return Err(e);
            }
        };
        tx.commit().await?;

        if row.file_digest != previous.file_digest {
            self.release_files(&[previous.file_digest]).await;
        }

        Ok(row.into())
    }

    /// Delete a paper and, when unshared, its file
    pub async fn delete_paper(&self, paper_id: i64) -> AppResult<()> {
        let digest = sqlx::query_scalar::<_, String>(
            "DELETE FROM papers WHERE id = $1 RETURNING file_digest",
        )
        .bind(paper_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::not_found("paper"))?;

        tracing::info!(paper_id, "Paper deleted");
        self.release_files(&[digest]).await;
        Ok(())
    }

    /// Remove stored files that no paper references any more. Failures are
    /// logged; a leftover file is harmless.
    pub async fn release_files(&self, digests: &[String]) {
        for digest in digests {
            if let Err(e) = self.release_file(digest).await {
                tracing::warn!(%digest, "Failed to release paper file: {}", e);
            }
        }
    }

    async fn release_file(&self, digest: &str) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        lock_digest(&mut tx, digest).await?;

        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM papers WHERE file_digest = $1)",
        )
        .bind(digest)
        .fetch_one(&mut *tx)
        .await?;

        if !referenced {
            self.store.remove(digest).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
