// =============================================================================
// Bearer Token Authentication — Axum extractor
// =============================================================================
//
// Validates `Authorization: Bearer <token>` against the admin token held in
// `AppState` (from `STAYBOARD_ADMIN_TOKEN` at startup). Comparison runs in
// constant time.
//
//   async fn handler(_auth: AuthBearer, ...) { ... }
//
// A missing or wrong token short-circuits with 403 before the handler runs.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::app_state::AppState;

/// Compare two byte slices in constant time with respect to their content.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Proof that the request carried the admin token.
pub struct AuthBearer;

/// Rejection type returned when authentication fails.
pub struct AuthRejection {
    status: StatusCode,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, axum::Json(body)).into_response()
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthBearer {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if state.admin_token.is_empty() {
            warn!("STAYBOARD_ADMIN_TOKEN is not set; rejecting authenticated request");
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Server authentication not configured",
            });
        }

        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let Some(token) = token else {
            warn!("Missing or malformed Authorization header");
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Missing or invalid authorization token",
            });
        };

        if !constant_time_eq(token.as_bytes(), state.admin_token.as_bytes()) {
            warn!("Invalid admin token presented");
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Invalid authorization token",
            });
        }

        Ok(AuthBearer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    use crate::reporting::ReportingClient;
    use crate::settings::Settings;
    use crate::store::MemoryStore;

    fn state_with_token(token: &str) -> Arc<AppState> {
        let client = ReportingClient::new("http://localhost:1", None).unwrap();
        Arc::new(AppState::new(
            Settings::default(),
            Arc::new(MemoryStore::new()),
            client,
            token,
        ))
    }

    async fn authenticate(state: &Arc<AppState>, header: Option<&str>) -> Result<(), StatusCode> {
        let mut req = Request::builder().uri("/api/v1/settings");
        if let Some(value) = header {
            req = req.header(axum::http::header::AUTHORIZATION, value);
        }
        let (mut parts, _) = req.body(()).unwrap().into_parts();
        AuthBearer::from_request_parts(&mut parts, state)
            .await
            .map(|_| ())
            .map_err(|rejection| rejection.status)
    }

    #[tokio::test]
    async fn matching_admin_token_is_accepted() {
        let state = state_with_token("dash-admin");
        assert_eq!(authenticate(&state, Some("Bearer dash-admin")).await, Ok(()));
    }

    #[tokio::test]
    async fn wrong_token_of_any_length_is_forbidden() {
        let state = state_with_token("dash-admin");
        for header in ["Bearer dash-admim", "Bearer dash", "Bearer dash-admin-extra", "Bearer "] {
            assert_eq!(
                authenticate(&state, Some(header)).await,
                Err(StatusCode::FORBIDDEN),
                "{header}"
            );
        }
    }

    #[tokio::test]
    async fn missing_or_non_bearer_header_is_forbidden() {
        let state = state_with_token("dash-admin");
        assert_eq!(authenticate(&state, None).await, Err(StatusCode::FORBIDDEN));
        assert_eq!(
            authenticate(&state, Some("Basic dash-admin")).await,
            Err(StatusCode::FORBIDDEN)
        );
        assert_eq!(
            authenticate(&state, Some("dash-admin")).await,
            Err(StatusCode::FORBIDDEN)
        );
    }

    #[tokio::test]
    async fn empty_admin_token_rejects_even_an_empty_bearer() {
        let state = state_with_token("");
        assert_eq!(authenticate(&state, Some("Bearer ")).await, Err(StatusCode::FORBIDDEN));
        assert_eq!(authenticate(&state, None).await, Err(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn rejection_body_names_the_problem() {
        let state = state_with_token("dash-admin");
        let mut req = Request::builder().uri("/api/v1/settings").body(()).unwrap().into_parts().0;
        let Err(rejection) = AuthBearer::from_request_parts(&mut req, &state).await else {
            panic!("request without a token was accepted");
        };
        let resp = rejection.into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Missing or invalid authorization token");
    }
}
