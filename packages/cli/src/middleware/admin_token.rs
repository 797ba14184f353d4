// ABOUTME: Admin token authentication for the /api/admin routes
// ABOUTME: Constant-time comparison against the configured token, bypassed in dev mode

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use porchlight_api::AppError;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Header carrying the admin token
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

#[derive(Clone)]
pub struct AdminAuth {
    /// SHA-256 of the configured token; `None` only in dev mode
    token_hash: Option<Arc<[u8; 32]>>,
    dev_mode: bool,
}

impl AdminAuth {
    pub fn new(token: Option<&str>, dev_mode: bool) -> Self {
        Self {
            token_hash: token.map(|t| Arc::new(hash_token(t))),
            dev_mode,
        }
    }

    /// Digests are compared so token length does not leak through timing
    pub fn verify(&self, candidate: &str) -> bool {
        match &self.token_hash {
            Some(expected) => hash_token(candidate)
                .as_slice()
                .ct_eq(expected.as_slice())
                .into(),
            None => false,
        }
    }
}

fn hash_token(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Random URL-safe token suitable for ADMIN_API_TOKEN
pub fn generate_token() -> String {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

pub async fn admin_token_middleware(
    State(auth): State<AdminAuth>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path();

    if auth.dev_mode {
        debug!(path = %path, "Development mode active, skipping admin token check");
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    let Some(token) = token else {
        warn!(path = %path, "Missing admin token");
        return Err(AppError::Unauthorized);
    };
    if !auth.verify(token) {
        warn!(path = %path, audit = true, "Invalid admin token");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(auth: AdminAuth) -> Router {
        Router::new()
            .route("/api/admin/dashboard", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(auth, admin_token_middleware))
    }

    fn request(token: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/admin/dashboard");
        if let Some(token) = token {
            builder = builder.header(ADMIN_TOKEN_HEADER, token);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_verify() {
        let auth = AdminAuth::new(Some("s3cret"), false);
        assert!(auth.verify("s3cret"));
        assert!(!auth.verify("s3cret "));
        assert!(!auth.verify(""));

        let unset = AdminAuth::new(None, false);
        assert!(!unset.verify(""));
    }

    #[test]
    fn test_generate_token_is_random_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let response = app(AdminAuth::new(Some("s3cret"), false))
            .oneshot(request(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_token_rejected() {
        let response = app(AdminAuth::new(Some("s3cret"), false))
            .oneshot(request(Some("guess")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        let response = app(AdminAuth::new(Some("s3cret"), false))
            .oneshot(request(Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dev_mode_skips_check() {
        let response = app(AdminAuth::new(None, true))
            .oneshot(request(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
