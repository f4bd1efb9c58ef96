use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use std::sync::LazyLock;

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse},
    entity::admins::{Column, Entity as Admins, Model as AdminModel},
    error::{AppError, AppResult},
    middleware::auth::{ADMIN_ROLE, AuthAdmin},
    models::Admin,
    response::{ApiResponse, Meta},
    session::{AdminAuthenticator, AdminSession, LoginError},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Checked against on unknown emails so both rejection paths pay the argon2 cost.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("storefront-unknown-admin").ok());

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(
    admin: &AdminModel,
    secret: &str,
    ttl_hours: i64,
) -> AppResult<(String, i64)> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: admin.id.to_string(),
        email: admin.email.clone(),
        role: ADMIN_ROLE.to_string(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok((token, expiration.timestamp_millis()))
}

pub async fn login_admin(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("email and password are required".into()));
    }

    let admin = Admins::find()
        .filter(Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let admin = match admin {
        Some(a) => a,
        None => {
            burn_dummy_verify(&password);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    if !verify_password(&password, &admin.password_hash)? {
        tracing::info!(admin_id = %admin.id, "admin login rejected");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let (token, expires_at) = issue_token(
        &admin,
        &state.config.jwt_secret,
        state.config.session_ttl_hours,
    )?;

    audit::record(
        &state.pool,
        admin.id,
        "admin_login",
        "admins",
        serde_json::json!({ "admin_id": admin.id }),
    )
    .await;

    let resp = LoginResponse {
        token: format!("Bearer {token}"),
        expires_at,
        admin: admin_from_entity(admin),
    };

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn current_admin(state: &AppState, auth: &AuthAdmin) -> AppResult<ApiResponse<Admin>> {
    let admin = Admins::find_by_id(auth.admin_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Admin no longer exists".into()))?;
    Ok(ApiResponse::success(
        "Admin",
        admin_from_entity(admin),
        Some(Meta::empty()),
    ))
}

impl AdminAuthenticator for AppState {
    async fn authenticate(&self, email: &str, password: &str) -> Result<AdminSession, LoginError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        match login_admin(self, request).await {
            Ok(resp) => resp
                .data
                .map(LoginResponse::into_session)
                .ok_or_else(|| LoginError::Unavailable("empty login response".into())),
            Err(AppError::Unauthorized(_)) | Err(AppError::BadRequest(_)) => {
                Err(LoginError::InvalidCredentials)
            }
            Err(err) => Err(LoginError::Unavailable(err.to_string())),
        }
    }
}

fn burn_dummy_verify(password: &str) -> bool {
    match DUMMY_HASH.as_deref() {
        Some(hash) => verify_password(password, hash).unwrap_or(false),
        None => false,
    }
}

pub(crate) fn admin_from_entity(model: AdminModel) -> Admin {
    Admin {
        id: model.id,
        email: model.email,
        name: model.name,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
