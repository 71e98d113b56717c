//! API route definitions.

use axum::{Router, middleware};
use serde::Deserialize;
use std::str::FromStr;

use crate::{AppState, error::ApiError, middleware::auth::auth_middleware};
use orcamento_core::budget::is_valid_year;

pub mod auth;
pub mod categorias;
pub mod dashboard;
pub mod health;
pub mod logs;
pub mod orcamentos;
pub mod relatorios;
pub mod usuarios;

/// Creates the `/api` router: login is public, everything else needs a token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(usuarios::routes())
        .merge(categorias::routes())
        .merge(orcamentos::routes())
        .merge(dashboard::routes())
        .merge(relatorios::routes())
        .merge(logs::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(auth::public_routes())
        .merge(protected_routes)
}

/// Request body carrying entry IDs.
#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    /// Entry IDs.
    #[serde(default)]
    pub ids: Option<Vec<i32>>,
    /// Rejection reason.
    #[serde(default)]
    pub motivo: Option<String>,
}

/// Parses an optional query value. Blank means absent.
///
/// # Errors
///
/// 400 naming `field` when the value does not parse.
pub fn parse_param<T: FromStr>(field: &str, value: Option<&str>) -> Result<Option<T>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ApiError::validation(format!("Parâmetro {field} inválido: {v}"))),
    }
}

/// Rejects years outside [`orcamento_core::budget::YEARS`].
///
/// # Errors
///
/// 400 when `ano` is out of range.
pub fn check_year(ano: i32) -> Result<i32, ApiError> {
    if is_valid_year(ano) {
        Ok(ano)
    } else {
        Err(ApiError::validation(format!("Ano inválido: {ano}")))
    }
}

/// Parses an optional year query value. Blank means absent.
///
/// # Errors
///
/// 400 naming `field` when the value does not parse, or when it is out of range.
pub fn parse_year(field: &str, value: Option<&str>) -> Result<Option<i32>, ApiError> {
    parse_param(field, value)?.map(check_year).transpose()
}

/// Parses an optional query value with a custom parser. Blank means absent.
///
/// # Errors
///
/// 400 naming `field` when `parse` returns `None`.
pub fn parse_with<T>(
    field: &str,
    value: Option<&str>,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<Option<T>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse(v)
            .map(Some)
            .ok_or_else(|| ApiError::validation(format!("Parâmetro {field} inválido: {v}"))),
    }
}

/// Blank strings become `None`.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemorySessions, bearer, body_json, state_with, test_state, token_id};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use orcamento_core::auth::Role;
    use orcamento_core::budget::Month;
    use rstest::rstest;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        Router::new()
            .merge(api_routes_with_state(state.clone()))
            .with_state(state)
    }

    fn request(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"ids": [1]}"#))
            .unwrap()
    }

    #[rstest]
    #[case("GET", "/orcamentos")]
    #[case("GET", "/dashboard")]
    #[case("GET", "/logs")]
    #[case("POST", "/orcamentos/batch_submit")]
    #[tokio::test]
    async fn test_protected_routes_require_token(#[case] method: &str, #[case] uri: &str) {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "missing_token");
    }

    #[rstest]
    #[case("GET", "/usuarios")]
    #[case("GET", "/logs")]
    #[case("GET", "/orcamentos/rejections")]
    #[case("DELETE", "/orcamentos/1")]
    #[case("DELETE", "/categorias/1")]
    #[tokio::test]
    async fn test_visualizador_is_forbidden_on_admin_routes(
        #[case] method: &str,
        #[case] uri: &str,
    ) {
        let state = state_with(MemorySessions::default().user(9, Role::Visualizador));
        let token = bearer(&state, 9, "visualizador");

        let response = app(state).oneshot(request(method, uri, &token)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["error"], "forbidden");
        assert_eq!(json["message"], "Acesso negado");
    }

    #[tokio::test]
    async fn test_revoked_token_is_unauthorized() {
        let mut state = test_state();
        let token = bearer(&state, 1, "admin");
        state.sessions = Arc::new(
            MemorySessions::default()
                .user(1, Role::Admin)
                .revoked(token_id(&state, &token)),
        );

        let response = app(state)
            .oneshot(request("GET", "/usuarios", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "token_revoked");
    }

    #[tokio::test]
    async fn test_deleted_user_is_unauthorized() {
        let state = test_state();
        let token = bearer(&state, 4, "admin");

        let response = app(state)
            .oneshot(request("GET", "/usuarios", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "user_not_found");
    }

    #[rstest]
    #[case("POST", "/orcamentos/batch_approve")]
    #[case("POST", "/orcamentos/1/aprovar")]
    #[tokio::test]
    async fn test_demoted_gestor_loses_approval(#[case] method: &str, #[case] uri: &str) {
        let state = state_with(MemorySessions::default().user(5, Role::Visualizador));
        let token = bearer(&state, 5, "gestor");

        let response = app(state).oneshot(request(method, uri, &token)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = crate::create_router(test_state(), &orcamento_shared::config::CorsConfig::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[test]
    fn test_parse_param_blank_is_none() {
        assert_eq!(parse_param::<i32>("ano", Some("  ")).unwrap(), None);
        assert_eq!(parse_param::<i32>("ano", None).unwrap(), None);
        assert_eq!(parse_param::<i32>("ano", Some("2024")).unwrap(), Some(2024));
    }

    #[test]
    fn test_parse_param_invalid_is_400() {
        let err = parse_param::<i32>("ano", Some("abc")).unwrap_err();
        assert_eq!(err.0.status_code(), 400);
        assert_eq!(err.0.message(), "Parâmetro ano inválido: abc");
    }

    #[test]
    fn test_parse_year_checks_range() {
        assert_eq!(parse_year("ano", Some("2024")).unwrap(), Some(2024));
        assert_eq!(parse_year("ano", None).unwrap(), None);
        let err = parse_year("ano", Some("2147483647")).unwrap_err();
        assert_eq!(err.0.status_code(), 400);
        assert_eq!(err.0.message(), "Ano inválido: 2147483647");
        assert!(parse_year("ano", Some("-2147483648")).is_err());
        assert!(check_year(1899).is_err());
    }

    #[test]
    fn test_parse_with_month() {
        assert_eq!(parse_with("mes", Some("3"), Month::parse).unwrap(), Some(Month::Marco));
        assert!(parse_with("mes", Some("13"), Month::parse).is_err());
    }
}
