//! Audit log routes (admin only).

use axum::{
    Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::{non_blank, parse_param};
use crate::{
    AppState,
    extract::{Json, Path, Query},
    error::{ApiError, db_error},
    middleware::AuthUser,
};
use orcamento_core::auth::Role;
use orcamento_core::reports::codec::export_logs;
use orcamento_db::{AuditRepository, LogFilter, LogSearch, UserRepository, tables};
use orcamento_shared::auth::UserInfo;
use orcamento_shared::types::{PageMeta, PageRequest};

/// Creates the audit log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_logs))
        .route("/logs/resumo", get(summary))
        .route("/logs/exportar", get(export))
        .route("/logs/search", post(search))
        .route("/logs/usuario/{id}", get(logs_by_user))
        .route("/logs/tabela/{tabela}", get(logs_by_table))
        .route("/logs/{id}", get(get_log))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query string of the log listing and export.
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    /// Page, from 1.
    pub page: Option<String>,
    /// Page size.
    pub per_page: Option<String>,
    /// Acting user.
    pub id_usuario: Option<String>,
    /// Affected table.
    pub tabela_afetada: Option<String>,
    /// Action contains.
    pub acao: Option<String>,
    /// First day, `YYYY-MM-DD`.
    pub data_inicio: Option<String>,
    /// Last day, `YYYY-MM-DD`, inclusive.
    pub data_fim: Option<String>,
    /// Action or table contains.
    pub search: Option<String>,
}

impl LogQuery {
    fn page(&self) -> Result<PageRequest, ApiError> {
        Ok(PageRequest::new(
            parse_param("page", self.page.as_deref())?,
            parse_param("per_page", self.per_page.as_deref())?,
        ))
    }

    fn filter(&self) -> Result<LogFilter, ApiError> {
        Ok(LogFilter {
            id_usuario: parse_param("id_usuario", self.id_usuario.as_deref())?,
            tabela_afetada: non_blank(self.tabela_afetada.clone()),
            acao: non_blank(self.acao.clone()),
            data_inicio: parse_date("data_inicio", self.data_inicio.as_deref())?,
            data_fim: parse_date("data_fim", self.data_fim.as_deref())?,
            search: non_blank(self.search.clone()),
        })
    }
}

/// Body of the advanced search.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogSearchRequest {
    /// Any of these users.
    pub usuarios: Vec<i32>,
    /// Any of these tables.
    pub tabelas: Vec<String>,
    /// Action contains any of these.
    pub acoes: Vec<String>,
    /// First day, `YYYY-MM-DD`.
    pub data_inicio: Option<String>,
    /// Last day, `YYYY-MM-DD`, inclusive.
    pub data_fim: Option<String>,
    /// Action or details contain.
    pub texto: Option<String>,
    /// Page, from 1.
    pub page: Option<u64>,
    /// Page size.
    pub per_page: Option<u64>,
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::validation(format!("Formato de {field} inválido. Use YYYY-MM-DD"))),
    }
}

fn page_response<T: serde::Serialize>(
    logs: &[T],
    page: &PageRequest,
    total: u64,
) -> serde_json::Value {
    json!({
        "logs": logs,
        "pagination": PageMeta::new(page, total),
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /logs
async fn list_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_view_logs)?;

    let page = query.page()?;
    let (logs, total) = AuditRepository::new((*state.db).clone())
        .list(&query.filter()?, &page)
        .await
        .map_err(db_error)?;
    Ok(Json(page_response(&logs, &page, total)))
}

/// GET /logs/{id}
async fn get_log(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_view_logs)?;

    let log = AuditRepository::new((*state.db).clone())
        .find_by_id(id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Log não encontrado"))?;
    Ok(Json(log))
}

/// GET /logs/usuario/{id}
async fn logs_by_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_view_logs)?;

    let user = UserRepository::new((*state.db).clone())
        .find_by_id(id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Usuário não encontrado"))?;

    let page = query.page()?;
    let filter = LogFilter {
        id_usuario: Some(id),
        ..LogFilter::default()
    };
    let (logs, total) = AuditRepository::new((*state.db).clone())
        .list(&filter, &page)
        .await
        .map_err(db_error)?;

    let mut body = page_response(&logs, &page, total);
    body["usuario"] = json!(UserInfo::from(user));
    Ok(Json(body))
}

/// GET /logs/tabela/{tabela}
async fn logs_by_table(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tabela): Path<String>,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_view_logs)?;

    if !tables::is_valid(&tabela) {
        return Err(ApiError::validation("Tabela inválida"));
    }

    let page = query.page()?;
    let filter = LogFilter {
        tabela_afetada: Some(tabela),
        ..LogFilter::default()
    };
    let (logs, total) = AuditRepository::new((*state.db).clone())
        .list(&filter, &page)
        .await
        .map_err(db_error)?;
    Ok(Json(page_response(&logs, &page, total)))
}

/// GET /logs/resumo
async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_view_logs)?;

    let summary = AuditRepository::new((*state.db).clone())
        .summary()
        .await
        .map_err(db_error)?;
    Ok(Json(summary))
}

/// GET /logs/exportar - CSV download with the listing's filters.
async fn export(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_view_logs)?;

    let rows = AuditRepository::new((*state.db).clone())
        .export(&query.filter()?)
        .await
        .map_err(db_error)?;
    let csv = export_logs(&rows)?;

    let filename = format!(
        "logs_auditoria_{}.csv",
        Utc::now().with_timezone(&state.timezone).format("%Y%m%d_%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

/// POST /logs/search
async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<LogSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require(Role::can_view_logs)?;

    let search = LogSearch {
        usuarios: payload.usuarios,
        tabelas: payload.tabelas,
        acoes: payload.acoes,
        data_inicio: parse_date("data_inicio", payload.data_inicio.as_deref())?,
        data_fim: parse_date("data_fim", payload.data_fim.as_deref())?,
        texto: non_blank(payload.texto),
    };
    let page = PageRequest::new(payload.page, payload.per_page);

    let (logs, total) = AuditRepository::new((*state.db).clone())
        .search(&search, &page)
        .await
        .map_err(db_error)?;
    Ok(Json(page_response(&logs, &page, total)))
}
