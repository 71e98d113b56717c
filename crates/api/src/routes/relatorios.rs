//! Report routes.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use super::{dashboard::SummaryQuery, parse_param, parse_with, parse_year};
use crate::{
    AppState,
    extract::{Json, Query},
    error::{ApiError, db_error},
    middleware::AuthUser,
};
use orcamento_core::budget::BudgetStatus;
use orcamento_db::{BudgetEntryRepository, EntryFilter, SummaryFilter, SummaryRepository};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/relatorios", get(summary))
        .route("/relatorios/detalhado", get(detailed))
        .route("/relatorios/comparativo", get(comparison))
}

/// Query string of the detailed report.
#[derive(Debug, Default, Deserialize)]
pub struct DetailedQuery {
    /// Year.
    pub ano: Option<String>,
    /// Category ID.
    pub id_categoria: Option<String>,
    /// Status.
    pub status: Option<String>,
}

/// Query string of the year comparison.
#[derive(Debug, Default, Deserialize)]
pub struct ComparisonQuery {
    /// First year.
    pub ano1: Option<String>,
    /// Second year.
    pub ano2: Option<String>,
}

/// GET /relatorios - rows of the summary view.
async fn summary(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = SummaryRepository::new((*state.db).clone())
        .rows(&query.filter()?)
        .await
        .map_err(db_error)?;
    Ok(Json(rows))
}

/// GET /relatorios/detalhado - entries with their category.
async fn detailed(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<DetailedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = EntryFilter {
        ano: parse_year("ano", query.ano.as_deref())?,
        id_categoria: parse_param("id_categoria", query.id_categoria.as_deref())?,
        status: parse_with("status", query.status.as_deref(), BudgetStatus::parse)?,
        ..EntryFilter::default()
    };

    let entries = BudgetEntryRepository::new((*state.db).clone())
        .list(&filter)
        .await
        .map_err(db_error)?;
    Ok(Json(entries))
}

/// GET /relatorios/comparativo?ano1=&ano2=
async fn comparison(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ComparisonQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(ano1), Some(ano2)) = (
        parse_year("ano1", query.ano1.as_deref())?,
        parse_year("ano2", query.ano2.as_deref())?,
    ) else {
        return Err(ApiError::validation("Anos são obrigatórios"));
    };

    let repo = SummaryRepository::new((*state.db).clone());
    let year = |ano: i32| SummaryFilter {
        ano: Some(ano),
        ..SummaryFilter::default()
    };
    let dados1 = repo.rows(&year(ano1)).await.map_err(db_error)?;
    let dados2 = repo.rows(&year(ano2)).await.map_err(db_error)?;

    Ok(Json(json!({
        "ano1": { "ano": ano1, "dados": dados1 },
        "ano2": { "ano": ano2, "dados": dados2 },
    })))
}
