use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::auth::ACCESS_COOKIE;
use crate::error::AppError;
use crate::state::AppState;
use crate::tokens::{decode_token, TokenKind};

pub const NOT_AUTHENTICATED: &str = "No autenticado. Por favor inicia sesión.";

/// Operator behind the current request, inserted by [`require_session`].
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub username: String,
}

// ============================================================================
// Session Middleware
// ============================================================================

pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(ACCESS_COOKIE)
        .ok_or_else(|| AppError::AuthenticationError(NOT_AUTHENTICATED.to_string()))?;

    let claims = decode_token(&state.auth, token.value(), TokenKind::Access)?;

    req.extensions_mut().insert(SessionUser { username: claims.sub });

    Ok(next.run(req).await)
}
