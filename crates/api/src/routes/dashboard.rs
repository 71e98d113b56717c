//! Dashboard routes over the `resumo_orcamento` view.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::json;

use super::{non_blank, parse_with, parse_year};
use crate::{
    AppState,
    extract::{Json, Query},
    error::{ApiError, db_error},
    middleware::AuthUser,
};
use orcamento_core::budget::Month;
use orcamento_core::dashboard::{DashboardService, DistributionKind};
use orcamento_db::{SummaryFilter, SummaryRepository};

/// Creates the dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/kpis", get(kpis))
        .route("/dashboard/filtros", get(filter_options))
        .route("/dashboard/comparativo", get(comparison))
        .route("/dashboard/distribuicao", get(distribution))
}

/// Summary filters as they arrive in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// Year.
    pub ano: Option<String>,
    /// Month name or number.
    pub mes: Option<String>,
    /// Category name.
    pub categoria: Option<String>,
    /// State.
    pub uf: Option<String>,
    /// Cost center.
    pub master: Option<String>,
    /// Group.
    pub grupo: Option<String>,
    /// Distribution key.
    pub tipo: Option<String>,
}

impl SummaryQuery {
    /// Parses the filters.
    ///
    /// # Errors
    ///
    /// 400 when `ano` or `mes` does not parse, or `ano` is out of range.
    pub fn filter(&self) -> Result<SummaryFilter, ApiError> {
        Ok(SummaryFilter {
            ano: parse_year("ano", self.ano.as_deref())?,
            mes: parse_with("mes", self.mes.as_deref(), Month::parse)?,
            categoria: non_blank(self.categoria.clone()),
            uf: non_blank(self.uf.clone()),
            master: non_blank(self.master.clone()),
            grupo: non_blank(self.grupo.clone()),
        })
    }
}

/// GET /dashboard
async fn dashboard(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = SummaryRepository::new((*state.db).clone())
        .rows(&query.filter()?)
        .await
        .map_err(db_error)?;
    Ok(Json(DashboardService::build(&rows)))
}

/// GET /dashboard/kpis
async fn kpis(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ano = parse_year("ano", query.ano.as_deref())?;
    let repo = SummaryRepository::new((*state.db).clone());

    let total_categorias = repo.category_count().await.map_err(db_error)?;
    let counts = repo.status_counts(ano).await.map_err(db_error)?;
    Ok(Json(DashboardService::kpis(total_categorias, &counts)))
}

/// GET /dashboard/filtros
async fn filter_options(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let options = SummaryRepository::new((*state.db).clone())
        .filter_options()
        .await
        .map_err(db_error)?;
    Ok(Json(options))
}

/// GET /dashboard/comparativo - `ano` (default: this year) against the year before.
async fn comparison(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut filter = query.filter()?;
    let ano = *filter.ano.get_or_insert_with(|| state.today().year());

    let repo = SummaryRepository::new((*state.db).clone());
    let current = repo.rows(&filter).await.map_err(db_error)?;
    let previous = repo
        .rows(&filter.for_year(ano.saturating_sub(1)))
        .await
        .map_err(db_error)?;
    Ok(Json(DashboardService::comparison(ano, &current, &previous)))
}

/// GET /dashboard/distribuicao?tipo=categoria|centro_custo
async fn distribution(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_with("tipo", query.tipo.as_deref(), DistributionKind::parse)?
        .unwrap_or(DistributionKind::Categoria);

    let rows = SummaryRepository::new((*state.db).clone())
        .rows(&query.filter()?)
        .await
        .map_err(db_error)?;
    Ok(Json(json!({
        "tipo": kind,
        "dados": DashboardService::distribution(&rows, kind),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::api_routes_with_state;
    use crate::test_support::{MemorySessions, bearer, body_json, state_with};
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use orcamento_core::auth::Role;
    use tower::ServiceExt;

    #[test]
    fn test_summary_query_filter() {
        let query = SummaryQuery {
            ano: Some("2025".to_string()),
            mes: Some("12".to_string()),
            grupo: Some(" Utilidades ".to_string()),
            ..SummaryQuery::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.ano, Some(2025));
        assert_eq!(filter.mes, Some(Month::Dezembro));
        assert_eq!(filter.grupo.as_deref(), Some("Utilidades"));
        assert_eq!(filter.categoria, None);
    }

    #[test]
    fn test_summary_query_rejects_bad_year() {
        let query = SummaryQuery {
            ano: Some("dois mil".to_string()),
            ..SummaryQuery::default()
        };
        assert!(query.filter().is_err());
    }

    #[tokio::test]
    async fn test_comparison_rejects_out_of_range_year() {
        let state = state_with(MemorySessions::default().user(2, Role::Visualizador));
        let token = bearer(&state, 2, "visualizador");
        let app = Router::new()
            .merge(api_routes_with_state(state.clone()))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard/comparativo?ano=-2147483648")
                    .header(header::AUTHORIZATION, token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Ano inválido: -2147483648");
    }
}
