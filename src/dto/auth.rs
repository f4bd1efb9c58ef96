use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{models::Admin, session::AdminSession};

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    /// Unix milliseconds, the same value the client stores as `expiresAt`.
    pub expires_at: i64,
    pub admin: Admin,
}

impl LoginResponse {
    pub fn into_session(self) -> AdminSession {
        AdminSession {
            id: self.admin.id,
            email: self.admin.email,
            name: self.admin.name,
            expires_at: self.expires_at,
            token: self.token,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}
