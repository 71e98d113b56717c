//! Authentication middleware for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{AppState, error::ApiError};
use orcamento_core::auth::Role;
use orcamento_db::Actor;
use orcamento_shared::{Claims, JwtError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Authentication middleware that validates JWT tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Rejects tokens revoked by logout
/// 4. Reloads the user and replaces the token's role with the stored one
/// 5. Stores the claims in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return unauthorized("missing_token", "Token de acesso ausente");
    };

    let mut claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(JwtError::Expired) => return unauthorized("token_expired", "Token expirado"),
        Err(_) => return unauthorized("invalid_token", "Token inválido"),
    };

    match state.sessions.is_revoked(claims.token_id()).await {
        Ok(false) => {}
        Ok(true) => return unauthorized("token_revoked", "Token revogado"),
        Err(e) => return ApiError(e).into_response(),
    }

    match state.sessions.current_role(claims.user_id()).await {
        Ok(Some(role)) => claims.role = role.as_str().to_string(),
        Ok(None) => return unauthorized("user_not_found", "Usuário não encontrado"),
        Err(e) => return ApiError(e).into_response(),
    }

    request.extensions_mut().insert(claims);
    next.run(request).await
}

/// Extractor for authenticated user claims.
///
/// ```ignore
/// async fn handler(user: AuthUser) -> Result<impl IntoResponse, ApiError> {
///     user.require(Role::can_manage_users)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub const fn user_id(&self) -> i32 {
        self.0.user_id()
    }

    /// Returns the user's role, if the token carries a known one.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.0.role)
    }

    /// Returns the role when `allowed` accepts it.
    ///
    /// # Errors
    ///
    /// 403 when the role is unknown or not allowed.
    pub fn require(&self, allowed: fn(Role) -> bool) -> Result<Role, ApiError> {
        self.role()
            .filter(|role| allowed(*role))
            .ok_or_else(ApiError::forbidden)
    }

    /// The user as the actor of a write.
    ///
    /// # Errors
    ///
    /// 403 when the token carries an unknown role.
    pub fn actor(&self) -> Result<Actor, ApiError> {
        let role = self.role().ok_or_else(ApiError::forbidden)?;
        Ok(Actor {
            id: self.user_id(),
            role,
        })
    }

    /// Returns the inner claims.
    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| unauthorized("unauthorized", "Autenticação necessária"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> AuthUser {
        AuthUser(Claims::new(7, role, chrono::Utc::now() + chrono::Duration::hours(1)))
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_require_checks_role() {
        assert_eq!(user("admin").require(Role::can_manage_users).ok(), Some(Role::Admin));
        assert!(user("visualizador").require(Role::can_manage_users).is_err());
        assert!(user("gestor").require(Role::can_approve).is_ok());
    }

    #[test]
    fn test_unknown_role_is_forbidden() {
        let err = user("owner").actor().unwrap_err();
        assert_eq!(err.0.status_code(), 403);
    }

    #[test]
    fn test_actor_carries_id_and_role() {
        let actor = user("gestor").actor().unwrap();
        assert_eq!(actor.id, 7);
        assert_eq!(actor.role, Role::Gestor);
    }
}
