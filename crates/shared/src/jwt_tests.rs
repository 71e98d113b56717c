//! Unit tests for JWT functionality.

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use rstest::rstest;

use crate::auth::Claims;
use crate::jwt::{JwtConfig, JwtError, JwtService};

fn create_test_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        access_token_expires_secs: 3600,
    })
}

#[test]
fn test_claims_new_sets_correct_fields() {
    let expires_at = Utc::now() + Duration::hours(1);

    let claims = Claims::new(42, "admin", expires_at);

    assert_eq!(claims.sub, 42);
    assert_eq!(claims.role, "admin");
    assert!(claims.iat <= Utc::now().timestamp());
    assert_eq!(claims.exp, expires_at.timestamp());
    assert_eq!(claims.jti.len(), 36);
}

#[test]
fn test_claims_have_unique_token_ids() {
    let expires_at = Utc::now() + Duration::hours(1);

    let a = Claims::new(1, "gestor", expires_at);
    let b = Claims::new(1, "gestor", expires_at);

    assert_ne!(a.token_id(), b.token_id());
}

#[rstest]
#[case("admin")]
#[case("gestor")]
#[case("visualizador")]
fn test_token_roundtrip_preserves_role(#[case] role: &str) {
    let service = create_test_service();

    let token = service.generate_access_token(7, role).unwrap();
    let claims = service.validate_token(&token).unwrap();

    assert_eq!(claims.user_id(), 7);
    assert_eq!(claims.role, role);
}

#[test]
fn test_invalid_token() {
    let service = create_test_service();
    let result = service.validate_token("invalid.token.here");
    assert!(matches!(result, Err(JwtError::DecodingError(_))));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let service = create_test_service();
    let other = JwtService::new(JwtConfig {
        secret: "another-secret".to_string(),
        access_token_expires_secs: 3600,
    });

    let token = other.generate_access_token(1, "admin").unwrap();
    assert!(service.validate_token(&token).is_err());
}

#[test]
fn test_expired_token() {
    let service = create_test_service();
    let claims = Claims::new(1, "admin", Utc::now() - Duration::hours(2));
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret-key-for-testing"),
    )
    .unwrap();

    assert!(matches!(
        service.validate_token(&token),
        Err(JwtError::Expired)
    ));
}

#[test]
fn test_default_expiry_is_eight_hours() {
    assert_eq!(JwtConfig::default().access_token_expires_secs, 28_800);
    let service = JwtService::new(JwtConfig::default());
    assert_eq!(service.access_token_expires_in(), 28_800);
}

#[test]
fn test_debug_hides_keys() {
    let service = create_test_service();
    let debug = format!("{service:?}");
    assert!(debug.contains("[hidden]"));
    assert!(!debug.contains("test-secret-key-for-testing"));
}
