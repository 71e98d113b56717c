//! Authentication routes for login, logout and the current user.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    extract::Json,
    error::{ApiError, db_error},
    middleware::AuthUser,
};
use orcamento_core::auth::{hash_password, verify_password};
use orcamento_db::{AuditRepository, NewLog, TokenBlacklistRepository, UserRepository, tables};
use orcamento_shared::AppError;
use orcamento_shared::auth::{ChangePasswordRequest, LoginRequest, LoginResponse, UserInfo};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Routes for the signed-in user.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route("/change_password", put(change_password))
}

fn invalid_credentials() -> ApiError {
    ApiError(AppError::Unauthorized("Credenciais inválidas".to_string()))
}

/// POST /login - Authenticate and return an access token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(senha)) = (
        payload.email.filter(|e| !e.trim().is_empty()),
        payload.senha.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::validation("Email e senha são obrigatórios"));
    };
    let email = email.trim().to_string();

    let users = UserRepository::new((*state.db).clone());
    let Some(user) = users.find_by_email(&email).await.map_err(db_error)? else {
        info!(email = %email, "Login attempt for non-existent user");
        return Err(invalid_credentials());
    };

    if !verify_password(&senha, &user.senha_hash)? {
        info!(user_id = user.id_usuario, "Failed login attempt - invalid password");
        return Err(invalid_credentials());
    }

    let usuario = UserInfo::from(user);
    let access_token = state
        .jwt_service
        .generate_access_token(usuario.id_usuario, &usuario.papel)
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;

    AuditRepository::new((*state.db).clone())
        .log(NewLog::new(usuario.id_usuario, "Login realizado", tables::SISTEMA))
        .await
        .map_err(db_error)?;

    info!(user_id = usuario.id_usuario, "User logged in successfully");
    Ok(Json(LoginResponse {
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
        usuario,
    }))
}

/// GET /me - The signed-in user.
async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(auth.user_id())
        .await
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Usuário não encontrado"))?;

    Ok(Json(UserInfo::from(user)))
}

/// POST /logout - Revoke the current token.
async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    TokenBlacklistRepository::new((*state.db).clone())
        .revoke(auth.claims().token_id())
        .await
        .map_err(db_error)?;

    AuditRepository::new((*state.db).clone())
        .log(NewLog::new(auth.user_id(), "Logout realizado", tables::SISTEMA))
        .await
        .map_err(db_error)?;

    info!(user_id = auth.user_id(), "User logged out");
    Ok(Json(json!({ "message": "Logout realizado com sucesso" })))
}

/// PUT /change_password - Replace the signed-in user's password.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(old_password), Some(new_password)) = (payload.old_password, payload.new_password)
    else {
        return Err(ApiError::validation("Senha atual e nova senha são obrigatórias"));
    };

    let users = UserRepository::new((*state.db).clone());
    let user = users
        .find_by_id(auth.user_id())
        .await
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Usuário não encontrado"))?;

    if !verify_password(&old_password, &user.senha_hash)? {
        return Err(ApiError(AppError::Unauthorized(
            "Senha atual incorreta".to_string(),
        )));
    }

    let hash = hash_password(&new_password)?;
    users.change_password(user.id_usuario, hash).await?;

    info!(user_id = user.id_usuario, "Password changed");
    Ok(Json(json!({ "message": "Senha alterada com sucesso" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::api_routes_with_state;
    use crate::test_support::{body_json, test_state};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        let state = test_state();
        Router::new()
            .merge(api_routes_with_state(state.clone()))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_login_requires_email_and_password() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email": "admin@empresa.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Email e senha são obrigatórios");
    }

    #[tokio::test]
    async fn test_login_with_malformed_body_is_json_400() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email": 5}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let json = body_json(response).await;
        assert_eq!(json["error"], "validation_error");
        assert!(json["message"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_me_without_token_is_unauthorized() {
        let response = app()
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "missing_token");
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_token");
    }
}
