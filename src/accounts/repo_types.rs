use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Current UTC time truncated to the microsecond precision of `TIMESTAMPTZ`, so a value read
/// back from the store equals the one written.
pub fn db_now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now - Duration::nanoseconds(i64::from(now.nanosecond() % 1_000))
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, or an unusable marker after a scrub
    #[serde(skip_serializing)]
    pub mfa_secret: Option<String>,
    pub mfa_enabled: bool,
    #[serde(skip_serializing)]
    pub mfa_recovery_codes: Vec<String>,
    pub deletion_requested_at: Option<OffsetDateTime>,
    pub policy_accepted_at: Option<OffsetDateTime>,
    pub accepted_policy_version: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// The receipt's "Full Name" line: "First Last" when either part is set, otherwise the
    /// username. A scrubbed account therefore reads "Deleted User".
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Deactivate the account and start the retention window.
    pub fn request_deletion(&mut self, at: OffsetDateTime) {
        self.is_active = false;
        self.deletion_requested_at = Some(at);
    }

    pub fn accept_policy(&mut self, version: &str, at: OffsetDateTime) {
        self.policy_accepted_at = Some(at);
        self.accepted_policy_version = Some(version.to_string());
    }

    pub fn requires_policy_acceptance(&self, current_version: &str) -> bool {
        self.policy_accepted_at.is_none()
            || self.accepted_policy_version.as_deref() != Some(current_version)
    }
}

/// Fields needed to insert a fresh account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[cfg(test)]
pub(crate) fn sample_user(email: &str) -> User {
    let username = email.split('@').next().unwrap_or(email).to_string();
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        username,
        first_name: String::new(),
        last_name: String::new(),
        is_active: true,
        password_hash: crate::accounts::password::hash_password("correct-horse").unwrap(),
        mfa_secret: None,
        mfa_enabled: false,
        mfa_recovery_codes: Vec::new(),
        deletion_requested_at: None,
        policy_accepted_at: None,
        accepted_policy_version: None,
        created_at: OffsetDateTime::now_utc(),
    }
}
