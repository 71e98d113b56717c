//! Budget entry routes: listing, editing and the approval workflow.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{IdsRequest, check_year, non_blank, parse_param, parse_with, parse_year};
use crate::{
    AppState,
    extract::{Json, Path, Query},
    error::{ApiError, db_error},
    middleware::AuthUser,
};
use orcamento_core::auth::Role;
use orcamento_core::budget::{BudgetStatus, Month};
use orcamento_core::workflow::Transition;
use orcamento_db::{BatchTransitionResult, BudgetEntryRepository, EntryFilter, EntryInput};

/// Creates the budget entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orcamentos", get(list_entries).post(upsert_entry))
        .route("/orcamentos/filtros", get(filter_options))
        .route("/orcamentos/categoria/{id}/ano/{ano}", get(year_grid))
        .route("/orcamentos/batch", post(batch_edit))
        .route("/orcamentos/batch_submit", post(batch_submit))
        .route("/orcamentos/batch_approve", post(batch_approve))
        .route("/orcamentos/batch_reprove", post(batch_reprove))
        .route("/orcamentos/submissions", get(submissions))
        .route("/orcamentos/rejections", get(rejections))
        .route("/orcamentos/{id}/aprovar", post(approve_entry))
        .route("/orcamentos/{id}/reprovar", post(reject_entry))
        .route("/orcamentos/{id}", delete(delete_entry))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query string of the entry listing. Values are parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct EntryQuery {
    /// Year.
    pub ano: Option<String>,
    /// Month name or number.
    pub mes: Option<String>,
    /// Status.
    pub status: Option<String>,
    /// Category state.
    pub uf: Option<String>,
    /// Category cost center.
    pub master: Option<String>,
    /// Category ID.
    pub id_categoria: Option<String>,
    /// Category name.
    pub categoria: Option<String>,
}

impl EntryQuery {
    fn into_filter(self) -> Result<EntryFilter, ApiError> {
        Ok(EntryFilter {
            ano: parse_year("ano", self.ano.as_deref())?,
            mes: parse_with("mes", self.mes.as_deref(), Month::parse)?,
            status: parse_with("status", self.status.as_deref(), BudgetStatus::parse)?,
            uf: non_blank(self.uf),
            master: non_blank(self.master),
            id_categoria: parse_param("id_categoria", self.id_categoria.as_deref())?,
            categoria: non_blank(self.categoria),
        })
    }
}

/// Request body for the batch edit.
#[derive(Debug, Deserialize)]
pub struct BatchEditRequest {
    /// Entries to create or update.
    #[serde(default)]
    pub orcamentos: Option<Vec<EntryInput>>,
}

/// Request body for a single rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    /// Reason shown to the admin.
    #[serde(default)]
    pub motivo: Option<String>,
}

fn require_ids(payload: &IdsRequest) -> Result<&[i32], ApiError> {
    match payload.ids.as_deref() {
        Some(ids) if !ids.is_empty() => Ok(ids),
        _ => Err(ApiError::validation("Lista de IDs de orçamentos inválida")),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /orcamentos
async fn list_entries(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<EntryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.into_filter()?;
    let entries = BudgetEntryRepository::new((*state.db).clone())
        .list(&filter)
        .await
        .map_err(db_error)?;
    Ok(Json(entries))
}

/// GET /orcamentos/filtros
async fn filter_options(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let options = BudgetEntryRepository::new((*state.db).clone())
        .filter_options()
        .await
        .map_err(db_error)?;
    Ok(Json(options))
}

/// GET /orcamentos/categoria/{id}/ano/{ano} - twelve months, placeholders for gaps.
async fn year_grid(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((id, ano)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let ano = check_year(ano)?;
    let grid = BudgetEntryRepository::new((*state.db).clone())
        .year_grid(id, ano)
        .await?;
    Ok(Json(grid))
}

/// POST /orcamentos - create or update one entry.
async fn upsert_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<EntryInput>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_create_entries)?;
    check_year(payload.ano)?;

    let upserted = BudgetEntryRepository::new((*state.db).clone())
        .upsert(auth.actor()?, &payload, &state.edit_policy, state.today())
        .await?;

    let status = if upserted.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(upserted.entry)))
}

/// POST /orcamentos/batch - answers 207 when some items were refused.
async fn batch_edit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<BatchEditRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_batch_edit)?;

    let Some(items) = payload.orcamentos.filter(|items| !items.is_empty()) else {
        return Err(ApiError::validation("Lista de orçamentos inválida"));
    };
    for item in &items {
        check_year(item.ano)?;
    }

    let result = BudgetEntryRepository::new((*state.db).clone())
        .batch_edit(auth.actor()?, &items, &state.edit_policy, state.today())
        .await?;

    info!(
        user_id = auth.user_id(),
        created = result.created,
        updated = result.updated,
        errors = result.errors.len(),
        "Batch edit applied"
    );

    let status = if result.errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(result)))
}

async fn transition_batch(
    state: &AppState,
    auth: &AuthUser,
    transition: Transition,
    payload: &IdsRequest,
) -> Result<Json<BatchTransitionResult>, ApiError> {
    let ids = require_ids(payload)?;
    let result = BudgetEntryRepository::new((*state.db).clone())
        .batch_transition(auth.actor()?, transition, ids, payload.motivo.as_deref())
        .await?;

    info!(
        user_id = auth.user_id(),
        ?transition,
        total = ids.len(),
        errors = result.errors.len(),
        "Batch transition applied"
    );
    Ok(Json(result))
}

/// POST /orcamentos/batch_submit
async fn batch_submit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<IdsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    transition_batch(&state, &auth, Transition::Submit, &payload).await
}

/// POST /orcamentos/batch_approve
async fn batch_approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<IdsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    transition_batch(&state, &auth, Transition::Approve, &payload).await
}

/// POST /orcamentos/batch_reprove
async fn batch_reprove(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<IdsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    transition_batch(&state, &auth, Transition::Reject, &payload).await
}

/// POST /orcamentos/{id}/aprovar
async fn approve_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = BudgetEntryRepository::new((*state.db).clone())
        .approve(auth.actor()?, id)
        .await?;
    Ok(Json(entry))
}

/// POST /orcamentos/{id}/reprovar - the body is optional.
async fn reject_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    payload: Option<Json<RejectRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let motivo = payload.and_then(|Json(body)| non_blank(body.motivo));
    let entry = BudgetEntryRepository::new((*state.db).clone())
        .reject(auth.actor()?, id, motivo.as_deref())
        .await?;
    Ok(Json(entry))
}

/// DELETE /orcamentos/{id}
async fn delete_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_delete_entries)?;

    BudgetEntryRepository::new((*state.db).clone())
        .delete(auth.actor()?, id)
        .await?;
    Ok(Json(json!({ "message": "Orçamento deletado com sucesso" })))
}

/// GET /orcamentos/submissions - batches awaiting the gestor.
async fn submissions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_view_submissions)?;

    let batches = BudgetEntryRepository::new((*state.db).clone())
        .submissions()
        .await
        .map_err(db_error)?;
    Ok(Json(batches))
}

/// GET /orcamentos/rejections - rejections for the admin.
async fn rejections(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_view_rejections)?;

    let groups = BudgetEntryRepository::new((*state.db).clone())
        .rejections()
        .await
        .map_err(db_error)?;
    Ok(Json(groups))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::api_routes_with_state;
    use crate::test_support::{MemorySessions, bearer, body_json, state_with};
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use tower::ServiceExt;

    async fn post_as_admin(uri: &str, body: &'static str) -> (StatusCode, serde_json::Value) {
        let state = state_with(MemorySessions::default().user(1, Role::Admin));
        let token = bearer(&state, 1, "admin");
        let app = Router::new()
            .merge(api_routes_with_state(state.clone()))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::AUTHORIZATION, token)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    #[tokio::test]
    async fn test_upsert_rejects_year_out_of_range() {
        let (status, json) = post_as_admin(
            "/orcamentos",
            r#"{"id_categoria": 1, "mes": 12, "ano": 2147483647, "orcado": "10"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Ano inválido: 2147483647");
    }

    #[tokio::test]
    async fn test_batch_rejects_year_out_of_range() {
        let (status, json) = post_as_admin(
            "/orcamentos/batch",
            r#"{"orcamentos": [{"id_categoria": 1, "mes": "Janeiro", "ano": 2024},
                               {"id_categoria": 1, "mes": "Dezembro", "ano": -5}]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Ano inválido: -5");
    }

    #[tokio::test]
    async fn test_upsert_with_unknown_month_is_json_400() {
        let (status, json) = post_as_admin(
            "/orcamentos",
            r#"{"id_categoria": 1, "mes": 13, "ano": 2024}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[test]
    fn test_query_into_filter() {
        let query = EntryQuery {
            ano: Some("2024".to_string()),
            mes: Some("Março".to_string()),
            status: Some("aprovado".to_string()),
            uf: Some("  ".to_string()),
            ..EntryQuery::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.ano, Some(2024));
        assert_eq!(filter.mes, Some(Month::Marco));
        assert_eq!(filter.status, Some(BudgetStatus::Aprovado));
        assert_eq!(filter.uf, None);
    }

    #[test]
    fn test_query_rejects_unknown_status() {
        let query = EntryQuery {
            status: Some("arquivado".to_string()),
            ..EntryQuery::default()
        };
        assert_eq!(query.into_filter().unwrap_err().0.status_code(), 400);
    }

    #[test]
    fn test_require_ids() {
        let empty = IdsRequest {
            ids: Some(vec![]),
            motivo: None,
        };
        assert_eq!(
            require_ids(&empty).unwrap_err().0.message(),
            "Lista de IDs de orçamentos inválida"
        );
        let ids = IdsRequest {
            ids: Some(vec![1, 2]),
            motivo: None,
        };
        assert_eq!(require_ids(&ids).unwrap(), &[1, 2]);
    }
}
