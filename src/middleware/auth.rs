use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

pub const ADMIN_ROLE: &str = "admin";

/// Admin identity taken from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub admin_id: Uuid,
    pub email: String,
    pub role: String,
}

pub fn ensure_role(admin: &AuthAdmin, role: &str) -> Result<(), AppError> {
    if admin.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;
    Ok(decoded.claims)
}

impl FromRequestParts<AppState> for AuthAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let claims = decode_token(token, &state.config.jwt_secret)?;
        let admin_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid admin id in token".into()))?;

        let admin = AuthAdmin {
            admin_id,
            email: claims.email,
            role: claims.role,
        };
        ensure_role(&admin, ADMIN_ROLE)?;
        Ok(admin)
    }
}
