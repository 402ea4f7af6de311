//! Account deletion requests and the documents that prove them.

use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::privacy_routes()
}
