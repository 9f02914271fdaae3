use std::ops::Deref;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use openidconnect::core::{CoreClient, CoreProviderMetadata, CoreResponseType};
use openidconnect::{
    AuthenticationFlow, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet,
    EndpointNotSet, EndpointSet, IssuerUrl, Nonce, RedirectUrl, Scope, TokenResponse,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::db::queries::users;
use crate::db::User;
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResponse};

const GOOGLE_ISSUER_URL: &str = "https://accounts.google.com";
const SESSION_USER_KEY: &str = "user_id";
const RESET_TOKEN_TTL_HOURS: i64 = 1;

pub type DiscoveredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// The logged-in user, resolved from the session cookie.
pub struct AuthUser(pub User);

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthorized)?;

        let user_id: i64 = session
            .get(SESSION_USER_KEY)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        let user = users::get_user(&state.pool, user_id)
            .await
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(Self(user))
    }
}

/// Same as [`AuthUser`] but requires the admin role.
pub struct AdminUser(pub User);

impl Deref for AdminUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden);
        }
        Ok(Self(user))
    }
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    password: String,
    name: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterBody>,
) -> ApiResponse<User> {
    if body.username.trim().is_empty() || body.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "Username is required and password must be at least 6 characters".to_owned(),
        ));
    }
    if users::get_user_by_username(&state.pool, &body.username)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest("Username already taken".to_owned()));
    }

    let hash = hash_password(&body.password)?;
    let id = users::create_user(
        &state.pool,
        &body.username,
        &hash,
        &body.name,
        body.email.as_deref(),
        "student",
        None,
    )
    .await?;

    session.insert(SESSION_USER_KEY, id).await?;
    Ok(Json(users::get_user(&state.pool, id).await?))
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginBody>,
) -> ApiResponse<User> {
    let user = users::get_user_by_username(&state.pool, &body.username)
        .await?
        .filter(|u| verify_password(&body.password, &u.password))
        .ok_or_else(|| ApiError::BadRequest("Invalid username or password".to_owned()))?;

    session.insert(SESSION_USER_KEY, user.id).await?;
    Ok(Json(user))
}

async fn logout(session: Session) -> ApiResponse<Value> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(Json(json!({ "message": "Logged out" })))
}

async fn me(user: AuthUser) -> ApiResponse<User> {
    Ok(Json(user.0))
}

pub async fn build_oidc_client(
    public_url: &str,
    client_id: String,
    client_secret: String,
) -> anyhow::Result<DiscoveredClient> {
    let issuer_url = IssuerUrl::new(GOOGLE_ISSUER_URL.to_owned())?;

    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
        .await
        .map_err(|e| anyhow::anyhow!("OIDC discovery failed: {e}"))?;

    let client = CoreClient::from_provider_metadata(
        provider_metadata,
        ClientId::new(client_id),
        Some(ClientSecret::new(client_secret)),
    )
    .set_redirect_uri(RedirectUrl::new(format!(
        "{public_url}/api/auth/google/callback"
    ))?);

    Ok(client)
}

#[derive(Deserialize)]
struct AuthCallbackParams {
    code: String,
    state: String,
}

async fn google_login(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, ApiError> {
    let client = state
        .oidc_client
        .as_ref()
        .ok_or(ApiError::NotFound("OAuth login"))?;

    let (auth_url, csrf_token, nonce) = client
        .authorize_url(
            AuthenticationFlow::<CoreResponseType>::AuthorizationCode,
            CsrfToken::new_random,
            Nonce::new_random,
        )
        .add_scope(Scope::new("email".to_owned()))
        .add_scope(Scope::new("profile".to_owned()))
        .url();

    session.insert("csrf_token", csrf_token.secret().clone()).await?;
    session.insert("nonce", nonce.secret().clone()).await?;

    Ok(Redirect::to(auth_url.as_str()))
}

async fn google_callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<AuthCallbackParams>,
) -> Result<Redirect, ApiError> {
    let client = state
        .oidc_client
        .as_ref()
        .ok_or(ApiError::NotFound("OAuth login"))?;

    let stored_csrf: String = session
        .get("csrf_token")
        .await?
        .ok_or_else(|| ApiError::BadRequest("Missing OAuth state".to_owned()))?;
    if stored_csrf != params.state {
        return Err(ApiError::BadRequest("OAuth state mismatch".to_owned()));
    }

    let stored_nonce: String = session
        .get("nonce")
        .await?
        .ok_or_else(|| ApiError::BadRequest("Missing OAuth nonce".to_owned()))?;

    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| ApiError::Internal(e.into()))?;

    let token_response = client
        .exchange_code(AuthorizationCode::new(params.code))
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("token endpoint not configured: {e}")))?
        .request_async(&http_client)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("code exchange failed: {e}")))?;

    let id_token = token_response
        .id_token()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("no id token in response")))?;

    let claims = id_token
        .claims(&client.id_token_verifier(), &Nonce::new(stored_nonce))
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("id token verification failed: {e}")))?;

    let google_sub = claims.subject().to_string();
    let email = claims.email().map(|e| e.as_str().to_owned());
    let name = claims
        .name()
        .and_then(|n| n.get(None))
        .map(|n| n.as_str().to_owned())
        .unwrap_or_else(|| "Estudiante".to_owned());

    let user_id = resolve_oauth_user(&state.pool, &google_sub, email.as_deref(), &name).await?;

    session.insert(SESSION_USER_KEY, user_id).await?;
    Ok(Redirect::to("/"))
}

/// Match an existing account by Google subject, then by email; otherwise
/// create a fresh student account with an unguessable password.
async fn resolve_oauth_user(
    pool: &SqlitePool,
    google_sub: &str,
    email: Option<&str>,
    name: &str,
) -> Result<i64, ApiError> {
    if let Some(user) = users::get_user_by_google_sub(pool, google_sub).await? {
        return Ok(user.id);
    }
    if let Some(email) = email {
        if let Some(user) = users::get_user_by_email(pool, email).await? {
            sqlx::query("UPDATE users SET google_sub = ?1 WHERE id = ?2")
                .bind(google_sub)
                .bind(user.id)
                .execute(pool)
                .await?;
            return Ok(user.id);
        }
    }

    let username = email.unwrap_or(google_sub);
    let password = hash_password(&Uuid::new_v4().to_string())?;
    let id = users::create_user(
        pool,
        username,
        &password,
        name,
        email,
        "student",
        Some(google_sub),
    )
    .await?;
    Ok(id)
}

#[derive(Deserialize)]
struct ForgotPasswordBody {
    email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordBody {
    token: String,
    new_password: String,
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordBody>,
) -> ApiResponse<Value> {
    // The response never reveals whether the address exists.
    if let Some(user) = users::get_user_by_email(&state.pool, &body.email).await? {
        let token = Uuid::new_v4().to_string();
        let expires_at = (Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS)).naive_utc();
        users::create_reset_token(&state.pool, &token, user.id, expires_at).await?;

        let link = format!("{}/reset-password?token={token}", state.public_url);
        match &state.mailer {
            Some(mailer) => mailer.send_password_reset(&body.email, &user.name, &link).await?,
            None => tracing::warn!("mailer not configured, skipping password reset mail"),
        }
    }
    Ok(Json(json!({ "message": "If the address exists, a reset link was sent" })))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordBody>,
) -> ApiResponse<Value> {
    if body.new_password.len() < 6 {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters".to_owned(),
        ));
    }
    let user_id = users::consume_reset_token(&state.pool, &body.token, Utc::now().naive_utc())
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired token".to_owned()))?;

    let hash = hash_password(&body.new_password)?;
    users::set_password(&state.pool, user_id, &hash).await?;
    Ok(Json(json!({ "message": "Password updated" })))
}

pub fn auth_router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/auth/google", get(google_login))
        .route("/api/auth/google/callback", get(google_callback))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .with_state(state)
}
