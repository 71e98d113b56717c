//! User administration routes.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState,
    extract::{Json, Path},
    error::{ApiError, db_error},
    middleware::AuthUser,
};
use orcamento_core::auth::{Role, hash_password};
use orcamento_db::{CreateUserInput, UpdateUserInput, UserRepository};
use orcamento_shared::auth::UserInfo;

/// Creates the user routes (admin only).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/usuarios", get(list_users).post(create_user))
        .route("/usuarios/{id}", put(update_user).delete(delete_user))
}

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Display name.
    pub nome: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Password.
    pub senha: Option<String>,
    /// Role name.
    pub papel: Option<String>,
}

/// Request body for updating a user. Absent fields are kept.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// Display name.
    pub nome: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// New password.
    pub senha: Option<String>,
    /// Role name.
    pub papel: Option<String>,
}

fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    super::non_blank(value).ok_or_else(|| ApiError::validation(format!("Campo {field} é obrigatório")))
}

fn parse_role(papel: &str) -> Result<Role, ApiError> {
    Role::parse(papel).ok_or_else(|| ApiError::validation("Papel inválido"))
}

/// GET /usuarios
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_manage_users)?;

    let users = UserRepository::new((*state.db).clone())
        .list()
        .await
        .map_err(db_error)?;
    let users: Vec<UserInfo> = users.into_iter().map(UserInfo::from).collect();
    Ok(Json(users))
}

/// POST /usuarios
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_manage_users)?;

    let nome = required("nome", payload.nome)?;
    let email = required("email", payload.email)?;
    let senha = required("senha", payload.senha)?;
    let papel = parse_role(&required("papel", payload.papel)?)?;

    let user = UserRepository::new((*state.db).clone())
        .create(
            Some(auth.user_id()),
            CreateUserInput {
                nome,
                email,
                senha_hash: hash_password(&senha)?,
                papel,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserInfo::from(user))))
}

/// PUT /usuarios/{id}
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_manage_users)?;

    let papel = super::non_blank(payload.papel)
        .map(|p| parse_role(&p))
        .transpose()?;
    let senha_hash = super::non_blank(payload.senha)
        .map(|s| hash_password(&s))
        .transpose()?;

    let user = UserRepository::new((*state.db).clone())
        .update(
            auth.user_id(),
            id,
            UpdateUserInput {
                nome: super::non_blank(payload.nome),
                email: super::non_blank(payload.email),
                papel,
                senha_hash,
            },
        )
        .await?;

    Ok(Json(UserInfo::from(user)))
}

/// DELETE /usuarios/{id}
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_manage_users)?;

    UserRepository::new((*state.db).clone())
        .delete(auth.user_id(), id)
        .await?;

    Ok(Json(json!({ "message": "Usuário deletado com sucesso" })))
}
