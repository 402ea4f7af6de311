use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::accounts::repo_types::{NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
    #[error("{0} already taken")]
    Conflict(&'static str),
    #[error("user {0} not found")]
    NotFound(Uuid),
}

/// Record access for everything that reads or rewrites accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
    /// Inactive users whose deletion request is at or before `cutoff`.
    async fn find_eligible_for_scrub(&self, cutoff: OffsetDateTime)
        -> Result<Vec<User>, StoreError>;
    /// Whole-record update keyed by `user.id`.
    async fn save(&self, user: &User) -> Result<(), StoreError>;
}

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, is_active, \
    password_hash, mfa_secret, mfa_enabled, mfa_recovery_codes, deletion_requested_at, \
    policy_accepted_at, accepted_policy_version, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("username") => "username",
                    _ => "email",
                };
                Err(StoreError::Conflict(field))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_eligible_for_scrub(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
              FROM users
             WHERE is_active = FALSE
               AND deletion_requested_at IS NOT NULL
               AND deletion_requested_at <= $1
             ORDER BY deletion_requested_at ASC
            "#
        ))
        .bind(cutoff)
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET email = $2,
                   username = $3,
                   first_name = $4,
                   last_name = $5,
                   is_active = $6,
                   password_hash = $7,
                   mfa_secret = $8,
                   mfa_enabled = $9,
                   mfa_recovery_codes = $10,
                   deletion_requested_at = $11,
                   policy_accepted_at = $12,
                   accepted_policy_version = $13
             WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_active)
        .bind(&user.password_hash)
        .bind(&user.mfa_secret)
        .bind(user.mfa_enabled)
        .bind(&user.mfa_recovery_codes)
        .bind(user.deletion_requested_at)
        .bind(user.policy_accepted_at)
        .bind(&user.accepted_policy_version)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(user.id));
        }
        Ok(())
    }
}
