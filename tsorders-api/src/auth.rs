use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use tsorders_core::schemas::LoginRequest;

use crate::error::AppError;
use crate::extract::ValidJson;
use crate::middleware::SessionUser;
use crate::state::{AppState, AuthConfig};
use crate::tokens::{decode_token, issue, TokenKind, INVALID_TOKEN};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
const ACCESS_PATH: &str = "/";
const REFRESH_PATH: &str = "/auth";

#[derive(Debug, Serialize)]
struct LoginResponse {
    message: &'static str,
    username: String,
    token_type: &'static str,
}

/// Routes reachable without a session.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/check", get(check))
}

/// Routes that sit behind the session middleware.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

fn session_cookie(
    auth: &AuthConfig,
    name: &'static str,
    value: String,
    path: &'static str,
    ttl: chrono::Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(auth.secure_cookies)
        .same_site(SameSite::Lax)
        .path(path)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// Adds a fresh access and refresh token pair to the jar.
fn start_session(auth: &AuthConfig, jar: CookieJar, username: &str) -> Result<CookieJar, AppError> {
    let access = issue(auth, username, TokenKind::Access)?;
    let refresh = issue(auth, username, TokenKind::Refresh)?;

    Ok(jar
        .add(session_cookie(auth, ACCESS_COOKIE, access, ACCESS_PATH, auth.access_ttl))
        .add(session_cookie(auth, REFRESH_COOKIE, refresh, REFRESH_PATH, auth.refresh_ttl)))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(credentials): ValidJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    info!(username = %credentials.username, "Login attempt");

    let auth = &state.auth;
    if credentials.username != auth.username || credentials.password != *auth.password.expose() {
        warn!(username = %credentials.username, "Failed login attempt");
        return Err(AppError::AuthenticationError(
            "Usuario o contraseña incorrectos".to_string(),
        ));
    }

    let jar = start_session(auth, jar, &credentials.username)?;
    info!(username = %credentials.username, "User logged in");

    Ok((
        jar,
        Json(LoginResponse {
            message: "Inicio de sesión exitoso",
            username: credentials.username,
            token_type: "Bearer",
        }),
    ))
}

async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    info!(username = %user.username, "User logging out");

    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        if let Ok(claims) = decode_token(&state.auth, cookie.value(), TokenKind::Refresh) {
            state.ledger.retire(claims.jti, claims.exp).await;
        }
    }

    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path(ACCESS_PATH))
        .remove(Cookie::build(REFRESH_COOKIE).path(REFRESH_PATH));

    (jar, Json(json!({ "message": "Sesión cerrada exitosamente" })))
}

/// Exchanges a refresh token for a new token pair. Each refresh token works once.
async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .ok_or_else(|| {
            warn!("Refresh token not found");
            AppError::AuthenticationError(
                "No hay token de actualización. Por favor inicia sesión nuevamente.".to_string(),
            )
        })?;

    let claims = decode_token(&state.auth, &token, TokenKind::Refresh)?;

    if !state.ledger.retire(claims.jti, claims.exp).await {
        warn!(username = %claims.sub, jti = %claims.jti, "Refresh token reuse detected");
        return Err(AppError::AuthenticationError(INVALID_TOKEN.to_string()));
    }

    let jar = start_session(&state.auth, jar, &claims.sub)?;
    info!(username = %claims.sub, "Session tokens rotated");

    Ok((
        jar,
        Json(json!({
            "message": "Token actualizado exitosamente",
            "username": claims.sub,
        })),
    ))
}

async fn me(Extension(user): Extension<SessionUser>) -> Json<Value> {
    Json(json!({
        "username": user.username,
        "authenticated": true,
    }))
}

async fn check(State(state): State<AppState>, jar: CookieJar) -> Json<Value> {
    let username = jar
        .get(ACCESS_COOKIE)
        .and_then(|cookie| decode_token(&state.auth, cookie.value(), TokenKind::Access).ok())
        .map(|claims| claims.sub);

    Json(json!({
        "authenticated": username.is_some(),
        "username": username,
    }))
}
