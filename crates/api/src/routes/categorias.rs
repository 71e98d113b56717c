//! Category routes, including the CSV import.

use axum::{
    Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    extract::{Json, Path, Query, multipart_error},
    error::{ApiError, db_error},
    middleware::AuthUser,
};
use orcamento_core::auth::Role;
use orcamento_core::reports::codec::parse_categories;
use orcamento_db::{CategoryFilter, CategoryInput, CategoryRepository};

/// Creates the category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categorias", get(list_categories).post(create_category))
        .route("/categorias/filtros", get(filter_options))
        .route("/categorias/import", post(import_categories))
        .route(
            "/categorias/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

/// GET /categorias
async fn list_categories(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<CategoryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = CategoryRepository::new((*state.db).clone())
        .list(&filter)
        .await
        .map_err(db_error)?;
    Ok(Json(categories))
}

/// GET /categorias/filtros
async fn filter_options(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let options = CategoryRepository::new((*state.db).clone())
        .filter_options()
        .await
        .map_err(db_error)?;
    Ok(Json(options))
}

/// GET /categorias/{id}
async fn get_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let category = CategoryRepository::new((*state.db).clone())
        .find_by_id(id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Categoria não encontrada"))?;
    Ok(Json(category))
}

/// POST /categorias
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_manage_categories)?;

    let category = CategoryRepository::new((*state.db).clone())
        .create(auth.user_id(), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /categorias/{id}
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_manage_categories)?;

    let category = CategoryRepository::new((*state.db).clone())
        .update(auth.user_id(), id, payload)
        .await?;
    Ok(Json(category))
}

/// DELETE /categorias/{id}
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_manage_categories)?;

    CategoryRepository::new((*state.db).clone())
        .delete(auth.user_id(), id)
        .await?;
    Ok(Json(json!({ "message": "Categoria deletada com sucesso" })))
}

/// POST /categorias/import - multipart upload with a `file` field.
///
/// Answers 207 when some lines were skipped.
async fn import_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_manage_categories)?;
    let mut multipart = multipart.map_err(multipart_error)?;

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?;
            file = Some(bytes);
            break;
        }
    }
    let Some(bytes) = file else {
        return Err(ApiError::validation("Nenhum arquivo enviado"));
    };

    let parsed = parse_categories(&bytes)?;
    let result = CategoryRepository::new((*state.db).clone())
        .import(auth.user_id(), parsed.rows)
        .await?;

    let mut erros = parsed.errors;
    erros.extend(result.erros);
    erros.sort_by_key(|e| line_number(e));

    info!(
        user_id = auth.user_id(),
        criadas = result.criadas,
        erros = erros.len(),
        "Categories imported"
    );

    let status = if erros.is_empty() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((
        status,
        Json(json!({
            "message": format!("{} categorias importadas com sucesso", result.criadas),
            "criadas": result.criadas,
            "erros": erros,
        })),
    ))
}

/// Line number of a `Linha N: ...` message, for ordering.
fn line_number(message: &str) -> usize {
    message
        .strip_prefix("Linha ")
        .and_then(|rest| rest.split(':').next())
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_number() {
        assert_eq!(line_number("Linha 12: categoria 'X' já existe"), 12);
        assert_eq!(line_number("outra coisa"), usize::MAX);
    }
}
