use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use super::dto::{DeleteAccountRequest, ReceiptQuery};
use crate::{
    accounts::{db_now, password::verify_password},
    auth::AuthUser,
    documents::DocumentError,
    http::{internal, load_user, store_rejection, Rejection},
    state::AppState,
};

pub fn privacy_routes() -> Router<AppState> {
    Router::new()
        .route("/account/delete", post(request_deletion))
        .route("/account/deletion-certificate", get(deletion_certificate))
        .route("/policy/receipt", get(policy_receipt))
}

fn pdf_attachment(filename: &str, body: Bytes) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

fn document_rejection(e: DocumentError) -> Rejection {
    match e {
        DocumentError::MissingDeletionRequest(_) => {
            (StatusCode::CONFLICT, "No deletion request is pending".into())
        }
        DocumentError::MissingPolicyVersion => {
            (StatusCode::BAD_REQUEST, "Policy version is required".into())
        }
        DocumentError::Rendering(_) => internal(e),
    }
}

/// Deactivates the caller's account and returns the deletion certificate.
/// Repeating the request re-issues the certificate without restarting the grace period.
#[instrument(skip(state, payload))]
pub async fn request_deletion(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<DeleteAccountRequest>,
) -> Result<Response, Rejection> {
    let mut user = load_user(state.users.as_ref(), user_id).await?;

    if !verify_password(&payload.password, &user.password_hash).map_err(internal)? {
        warn!(%user_id, "deletion request with wrong password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    if user.deletion_requested_at.is_none() {
        user.request_deletion(db_now());
        state.users.save(&user).await.map_err(store_rejection)?;
        info!(%user_id, "account deletion requested");
    } else {
        info!(%user_id, "deletion already pending; re-issuing certificate");
    }

    let pdf = state
        .documents
        .deletion_certificate(&user)
        .map_err(document_rejection)?;
    Ok(pdf_attachment("deletion-certificate.pdf", pdf))
}

#[instrument(skip(state))]
pub async fn deletion_certificate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, Rejection> {
    let user = load_user(state.users.as_ref(), user_id).await?;
    let pdf = state
        .documents
        .deletion_certificate(&user)
        .map_err(document_rejection)?;
    Ok(pdf_attachment("deletion-certificate.pdf", pdf))
}

/// Receipt for the version the user accepted. Before any acceptance the receipt shows
/// `?version=` (or the current version) with no timestamp.
#[instrument(skip(state))]
pub async fn policy_receipt(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ReceiptQuery>,
) -> Result<Response, Rejection> {
    let user = load_user(state.users.as_ref(), user_id).await?;
    let accepted = user
        .policy_accepted_at
        .and(user.accepted_policy_version.clone());

    let version = match (query.version, accepted) {
        (Some(requested), Some(accepted))
            if !requested.trim().is_empty() && requested != accepted =>
        {
            warn!(%user_id, %requested, %accepted, "receipt requested for a version never accepted");
            return Err((
                StatusCode::CONFLICT,
                format!("Policy version {requested} was not accepted"),
            ));
        }
        (Some(requested), _) => requested,
        (None, Some(accepted)) => accepted,
        (None, None) => state.config.policy_version.clone(),
    };

    let pdf = state
        .documents
        .policy_receipt(&user, &version)
        .map_err(document_rejection)?;
    Ok(pdf_attachment("policy-receipt.pdf", pdf))
}
