//! Authentication service: password hashing, login sessions and tokens
//!
//! A session token is an HS256 JWT naming a row in `sessions`. The signature
//! and expiry are checked first; the row must still exist for the token to
//! be accepted, so deleting the row (logout) revokes the token.

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ApiError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{SessionRow, UserRow, USER_COLUMNS};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    token_secret: String,
    token_expiry: i64,
    bcrypt_cost: u32,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // User ID
    pub sid: String, // Session ID
    pub exp: i64,
    pub iat: i64,
}

/// Issued session token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            token_secret: config.auth.token_secret.clone(),
            token_expiry: config.auth.token_expiry,
            bcrypt_cost: config.auth.bcrypt_cost,
        }
    }

    /// Hash a password off the async executor
    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash(password, cost))
            .await?
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash off the async executor
    pub async fn verify_password(&self, password: &str, password_hash: &str) -> AppResult<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || verify(password, &password_hash))
            .await?
            .map_err(|e| ApiError::Internal(format!("Password verification failed: {}", e)))
    }

    /// Authenticate user with username and password, opening a new session
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(IssuedToken, UserRow)> {
        // Find user by username
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::AuthFailure)?;

        // Check if user is active
        if !user.active {
            tracing::info!(user_id = user.id, "Login attempt on inactive account");
            return Err(ApiError::AuthFailure);
        }

        // Verify password
        if !self.verify_password(password, &user.password_hash).await? {
            return Err(ApiError::AuthFailure);
        }

        let issued = self.open_session(user.id).await?;
        tracing::info!(user_id = user.id, session_id = %issued.session_id, "User logged in");

        Ok((issued, user))
    }

    /// Create a session row and sign a token for it
    pub async fn open_session(&self, user_id: i64) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let issued = self.issue_token(user_id, Uuid::new_v4(), now)?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(issued.session_id)
        .bind(user_id)
        .bind(now)
        .bind(issued.expires_at)
        .execute(&self.db)
        .await?;

        Ok(issued)
    }

    /// Resolve a token to its live session
    pub async fn authenticate(&self, token: &str) -> AppResult<AuthUser> {
        let claims = self.decode_token(token)?;
        let (user_id, session_id) = Self::parse_claims(&claims)?;

        let session = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT s.id, s.user_id, s.created_at, s.expires_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1
              AND s.user_id = $2
              AND s.expires_at > NOW()
              AND u.active = true
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ApiError::AuthFailure)?;

        Ok(AuthUser {
            user_id: session.user_id,
            session_id: session.id,
            expires_at: session.expires_at,
        })
    }

    /// Close one session
    pub async fn logout(&self, session_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::AuthFailure);
        }
        Ok(())
    }

    /// Close every session of a user, e.g. after a password change
    pub async fn close_sessions_except(&self, user_id: i64, keep: Option<Uuid>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND ($2::uuid IS NULL OR id <> $2)")
            .bind(user_id)
            .bind(keep)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove sessions past their expiry
    pub async fn purge_expired_sessions(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Sign a token for a session
    fn issue_token(
        &self,
        user_id: i64,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<IssuedToken> {
        let expires_at = now + Duration::seconds(self.token_expiry);

        let claims = Claims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.token_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(IssuedToken {
            token,
            session_id,
            // Second precision, matching what the token carries
            expires_at: Utc
                .timestamp_opt(expires_at.timestamp(), 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    /// Validate signature and expiry of a token
    pub fn decode_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.token_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            ApiError::AuthFailure
        })
    }

    fn parse_claims(claims: &Claims) -> AppResult<(i64, Uuid)> {
        let user_id = claims.sub.parse::<i64>().map_err(|_| ApiError::AuthFailure)?;
        let session_id = Uuid::parse_str(&claims.sid).map_err(|_| ApiError::AuthFailure)?;
        Ok((user_id, session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> AuthService {
        let config = Config::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url().unwrap())
            .unwrap();
        AuthService::new(pool, &config)
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let service = service();
        let session_id = Uuid::new_v4();
        let issued = service.issue_token(42, session_id, Utc::now()).unwrap();

        let claims = service.decode_token(&issued.token).unwrap();
        assert_eq!(AuthService::parse_claims(&claims).unwrap(), (42, session_id));
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let service = service();
        let long_ago = Utc::now() - Duration::days(30);
        let issued = service.issue_token(1, Uuid::new_v4(), long_ago).unwrap();
        assert!(matches!(
            service.decode_token(&issued.token),
            Err(ApiError::AuthFailure)
        ));
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_rejected() {
        let service = service();
        let mut other = service.clone();
        other.token_secret = "another-secret".to_string();
        let issued = other.issue_token(1, Uuid::new_v4(), Utc::now()).unwrap();
        assert!(service.decode_token(&issued.token).is_err());
        assert!(service.decode_token("not-a-token").is_err());
    }

    #[tokio::test]
    async fn test_malformed_claims_rejected() {
        let claims = Claims {
            sub: "abc".to_string(),
            sid: Uuid::new_v4().to_string(),
            exp: 0,
            iat: 0,
        };
        assert!(AuthService::parse_claims(&claims).is_err());
    }

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let service = service();
        let hashed = service.hash_password("test_pass").await.unwrap();
        assert_ne!(hashed, "test_pass");
        assert!(service.verify_password("test_pass", &hashed).await.unwrap());
        assert!(!service.verify_password("wrong", &hashed).await.unwrap());
    }
}
