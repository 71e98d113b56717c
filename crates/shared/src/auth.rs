//! Authentication types for JWT and login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i32,
    /// User's role (`admin`, `gestor` or `visualizador`).
    pub role: String,
    /// Unique token ID, used to revoke the token on logout.
    pub jti: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user with a fresh token ID.
    #[must_use]
    pub fn new(user_id: i32, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role: role.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> i32 {
        self.sub
    }

    /// Returns the token ID.
    #[must_use]
    pub fn token_id(&self) -> &str {
        &self.jti
    }
}

/// Login request payload.
///
/// Both fields are optional so a missing one yields a 400 with a
/// readable message instead of a deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: Option<String>,
    /// User password.
    pub senha: Option<String>,
}

/// Change password request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password.
    pub old_password: Option<String>,
    /// New password.
    pub new_password: Option<String>,
}

/// User info returned in auth responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// User ID.
    pub id_usuario: i32,
    /// Display name.
    pub nome: String,
    /// Email address.
    pub email: String,
    /// Role.
    pub papel: String,
    /// Creation timestamp.
    pub criado_em: Option<DateTime<Utc>>,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Access token.
    pub access_token: String,
    /// Token expiration in seconds.
    pub expires_in: i64,
    /// Authenticated user info.
    pub usuario: UserInfo,
}
