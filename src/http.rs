//! Small helpers shared by the HTTP handlers.

use axum::http::StatusCode;
use tracing::error;
use uuid::Uuid;

use crate::accounts::{StoreError, User, UserStore};

pub type Rejection = (StatusCode, String);

pub fn internal<E: std::fmt::Display>(e: E) -> Rejection {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
}

pub fn store_rejection(e: StoreError) -> Rejection {
    match e {
        StoreError::Conflict(field) => (StatusCode::CONFLICT, format!("{field} already registered")),
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "User not found".into()),
        StoreError::Unavailable(_) => {
            error!(error = %e, "user store unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable".into())
        }
    }
}

/// The authenticated caller's record; a token for a vanished user is treated as unauthorized.
pub async fn load_user(users: &dyn UserStore, user_id: Uuid) -> Result<User, Rejection> {
    users
        .find_by_id(user_id)
        .await
        .map_err(store_rejection)?
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, "User not found".into()))
}
