use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    accounts::{
        db_now,
        password::{hash_password, verify_password},
        NewUser,
    },
    auth::{
        dto::{
            AuthResponse, LoginRequest, MeResponse, PolicyAcceptedResponse, PublicUser,
            RefreshRequest, RefreshResponse, RegisterRequest,
        },
        extractors::AuthUser,
        tokens::{JwtKeys, TokenKind},
    },
    documents::consent_id,
    http::{internal, load_user, store_rejection, Rejection},
    retention::SCRUBBED_EMAIL_DOMAIN,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email) && !email.ends_with(&format!("@{SCRUBBED_EMAIL_DOMAIN}"))
}

/// Usernames in the `deleted_` namespace belong to scrubbed accounts.
pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,150}$").unwrap();
    }
    USERNAME_RE.is_match(username) && !username.starts_with("deleted_")
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/accept-policy", post(accept_policy))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_tokens(keys: &JwtKeys, user_id: uuid::Uuid) -> Result<(String, String), Rejection> {
    let access = keys.sign_access(user_id).map_err(internal)?;
    let refresh = keys.sign_refresh(user_id).map_err(internal)?;
    Ok((access, refresh))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), Rejection> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if !is_valid_username(&payload.username) {
        warn!(username = %payload.username, "invalid username");
        return Err((StatusCode::BAD_REQUEST, "Invalid username".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    let password_hash = hash_password(&payload.password).map_err(internal)?;
    let user = state
        .users
        .create(NewUser {
            email: payload.email,
            username: payload.username,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            password_hash,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "create user failed");
            store_rejection(e)
        })?;

    let (access_token, refresh_token) = issue_tokens(&JwtKeys::from_ref(&state), user.id)?;
    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token,
            refresh_token,
            requires_policy_acceptance: user
                .requires_policy_acceptance(&state.config.policy_version),
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, Rejection> {
    payload.email = payload.email.trim().to_lowercase();
    let invalid = || (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string());

    let Some(user) = state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(store_rejection)?
    else {
        warn!(email = %payload.email, "login unknown email");
        return Err(invalid());
    };

    if !verify_password(&payload.password, &user.password_hash).map_err(internal)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }
    if !user.is_active {
        warn!(user_id = %user.id, "login for deactivated account");
        return Err(invalid());
    }

    let (access_token, refresh_token) = issue_tokens(&JwtKeys::from_ref(&state), user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        requires_policy_acceptance: user.requires_policy_acceptance(&state.config.policy_version),
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, Rejection> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            (StatusCode::UNAUTHORIZED, "Invalid refresh token".to_string())
        })?;

    let user = load_user(state.users.as_ref(), claims.sub).await?;
    if !user.is_active {
        return Err((StatusCode::UNAUTHORIZED, "Invalid refresh token".into()));
    }

    let access_token = keys.sign_access(user.id).map_err(internal)?;
    Ok(Json(RefreshResponse { access_token }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MeResponse>, Rejection> {
    let user = load_user(state.users.as_ref(), user_id).await?;
    Ok(Json(MeResponse {
        requires_policy_acceptance: user.requires_policy_acceptance(&state.config.policy_version),
        user: PublicUser::from(&user),
    }))
}

/// Records acceptance of the currently published policy version.
#[instrument(skip(state))]
pub async fn accept_policy(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PolicyAcceptedResponse>, Rejection> {
    let mut user = load_user(state.users.as_ref(), user_id).await?;
    let version = state.config.policy_version.clone();
    let accepted_at = db_now();

    user.accept_policy(&version, accepted_at);
    state.users.save(&user).await.map_err(store_rejection)?;

    let consent_id = consent_id(user.id, Some(accepted_at), &version)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    info!(%user_id, %version, %consent_id, "policy accepted");
    Ok(Json(PolicyAcceptedResponse {
        policy_version: version,
        accepted_at,
        consent_id,
    }))
}
