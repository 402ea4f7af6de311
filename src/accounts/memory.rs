//! In-memory `UserStore` used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::accounts::repo::{StoreError, UserStore};
use crate::accounts::repo_types::{NewUser, User};
use crate::retention::is_eligible;

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    failing_saves: Mutex<HashSet<Uuid>>,
    unavailable: Mutex<bool>,
}

impl MemoryUserStore {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::default();
        {
            let mut map = store.users.lock().unwrap();
            for user in users {
                map.insert(user.id, user);
            }
        }
        store
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    /// Make every `save` for this id fail.
    pub fn fail_saves_for(&self, id: Uuid) {
        self.failing_saves.lock().unwrap().insert(id);
    }

    /// Make every call fail as if the database were down.
    pub fn set_unavailable(&self) {
        *self.unavailable.lock().unwrap() = true;
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if *self.unavailable.lock().unwrap() {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::Conflict("email"));
        }
        if users.values().any(|u| u.username == new_user.username) {
            return Err(StoreError::Conflict("username"));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            is_active: true,
            password_hash: new_user.password_hash,
            mfa_secret: None,
            mfa_enabled: false,
            mfa_recovery_codes: Vec::new(),
            deletion_requested_at: None,
            policy_accepted_at: None,
            accepted_policy_version: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_eligible_for_scrub(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<Vec<User>, StoreError> {
        self.check_available()?;
        let users = self.users.lock().unwrap();
        let mut eligible: Vec<User> = users
            .values()
            .filter(|u| is_eligible(u, cutoff))
            .cloned()
            .collect();
        eligible.sort_by_key(|u| u.deletion_requested_at);
        Ok(eligible)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        self.check_available()?;
        if self.failing_saves.lock().unwrap().contains(&user.id) {
            return Err(StoreError::Unavailable(sqlx::Error::WorkerCrashed));
        }
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(user.id)),
        }
    }
}
