use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AuthConfig;

pub const INVALID_OR_EXPIRED: &str = "Token inválido o expirado";
pub const INVALID_TOKEN: &str = "Token inválido";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue(auth: &AuthConfig, username: &str, kind: TokenKind) -> Result<String, AppError> {
    let now = Utc::now();
    let ttl = match kind {
        TokenKind::Access => auth.access_ttl,
        TokenKind::Refresh => auth.refresh_ttl,
    };
    let claims = Claims {
        sub: username.to_owned(),
        kind,
        jti: Uuid::new_v4(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(
        &Header::new(auth.algorithm),
        &claims,
        &EncodingKey::from_secret(auth.secret.expose().as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature and expiry, then that the token is of the `expected` kind.
pub fn decode_token(auth: &AuthConfig, token: &str, expected: TokenKind) -> Result<Claims, AppError> {
    let mut validation = Validation::new(auth.algorithm);
    // retired refresh tokens are forgotten at `exp`, so no grace period
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.expose().as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::AuthenticationError(INVALID_OR_EXPIRED.to_string()))?;

    if data.claims.kind != expected || data.claims.sub.is_empty() {
        return Err(AppError::AuthenticationError(INVALID_TOKEN.to_string()));
    }
    Ok(data.claims)
}
