//! User account service

use sqlx::PgPool;

use crate::config::Config;
use crate::error::{on_unique_violation, ApiError, AppResult};
use crate::models::{CreateUserInput, UpdateUserInput, User, UserRow, USER_COLUMNS};
use crate::services::AuthService;

const DUPLICATE_ACCOUNT: &str = "Username or email already registered";

/// User service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
    auth: AuthService,
}

/// Outcome of deleting an account
#[derive(Debug, Default)]
pub struct DeletedUser {
    /// Digests of files held by the user's papers
    pub paper_digests: Vec<String>,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            auth: AuthService::new(db.clone(), config),
            db,
        }
    }

    /// Register a new user
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        let password_hash = self.auth.hash_password(&input.password).await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&input.username)
        .bind(&input.email)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(on_unique_violation(DUPLICATE_ACCOUNT))?;

        tracing::info!(user_id = row.id, username = %row.username, "User registered");
        Ok(row.into())
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: i64) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .map(User::from)
        .ok_or_else(|| ApiError::not_found("user"))
    }

    /// Apply a partial update. Changing the password closes every other
    /// session of the account.
    pub async fn update_user(
        &self,
        user_id: i64,
        input: UpdateUserInput,
        current_session: Option<uuid::Uuid>,
    ) -> AppResult<User> {
        let password_hash = match &input.password {
            Some(password) => Some(self.auth.hash_password(password).await?),
            None => None,
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(&input.username)
        .bind(&input.email)
        .bind(&password_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(on_unique_violation(DUPLICATE_ACCOUNT))?
        .ok_or_else(|| ApiError::not_found("user"))?;

        if password_hash.is_some() {
            let closed = self
                .auth
                .close_sessions_except(user_id, current_session)
                .await?;
            tracing::info!(user_id, closed, "Password changed, other sessions closed");
        }

        Ok(row.into())
    }

    /// Delete a user and everything they own
    pub async fn delete_user(&self, user_id: i64) -> AppResult<DeletedUser> {
        let mut tx = self.db.begin().await?;

        let paper_digests = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT file_digest FROM papers WHERE uploader_id = $1",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("user"));
        }

        tx.commit().await?;
        tracing::info!(user_id, "User deleted");

        Ok(DeletedUser { paper_digests })
    }
}
