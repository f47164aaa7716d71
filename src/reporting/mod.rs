pub mod client;

pub use client::ReportingClient;

/// In-process stand-in for the remote reporting API, bound to an ephemeral
/// port. Shared by the client and REST tests.
#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;

    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, put},
        Json, Router,
    };
    use serde_json::{json, Value};

    pub const UPSTREAM_TOKEN: &str = "upstream-token";

    /// Serve the fake API and return its base URL.
    pub async fn spawn_upstream() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router()).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn router() -> Router {
        Router::new()
            .route("/api/properties", get(list_properties).post(create_property))
            .route("/api/properties/:id", put(update_property).delete(delete_entity))
            .route("/api/users", get(list_users).post(create_user))
            .route("/api/users/:id", put(update_user).delete(delete_entity))
            .route("/api/metrics/monthly", get(monthly_metrics))
    }

    fn authorized(headers: &HeaderMap) -> Result<(), Response> {
        let expected = format!("Bearer {UPSTREAM_TOKEN}");
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some(v) if v == expected => Ok(()),
            _ => Err((StatusCode::UNAUTHORIZED, "unauthorized").into_response()),
        }
    }

    async fn list_properties(headers: HeaderMap) -> Response {
        if let Err(r) = authorized(&headers) {
            return r;
        }
        Json(json!([
            { "id": "p-1", "name": "Harbor View", "roomCount": 4 },
            { "id": "p-2", "name": "Old Town Loft", "roomCount": 1, "commissionRate": 12.5 }
        ]))
        .into_response()
    }

    async fn create_property(headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
        if let Err(r) = authorized(&headers) {
            return r;
        }
        body["id"] = json!("p-new");
        (StatusCode::CREATED, Json(body)).into_response()
    }

    async fn update_property(
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(mut body): Json<Value>,
    ) -> Response {
        if let Err(r) = authorized(&headers) {
            return r;
        }
        body["id"] = json!(id);
        Json(body).into_response()
    }

    async fn delete_entity(headers: HeaderMap, Path(id): Path<String>) -> Response {
        if let Err(r) = authorized(&headers) {
            return r;
        }
        if id == "missing" {
            return (StatusCode::NOT_FOUND, "not found").into_response();
        }
        StatusCode::NO_CONTENT.into_response()
    }

    async fn list_users(headers: HeaderMap) -> Response {
        if let Err(r) = authorized(&headers) {
            return r;
        }
        Json(json!([
            { "id": "u-1", "email": "admin@example.com", "name": "Admin", "role": "admin" }
        ]))
        .into_response()
    }

    async fn create_user(headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
        if let Err(r) = authorized(&headers) {
            return r;
        }
        if let Some(obj) = body.as_object_mut() {
            obj.remove("password");
        }
        body["id"] = json!("u-new");
        (StatusCode::CREATED, Json(body)).into_response()
    }

    async fn update_user(
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(mut body): Json<Value>,
    ) -> Response {
        if let Err(r) = authorized(&headers) {
            return r;
        }
        if let Some(obj) = body.as_object_mut() {
            obj.remove("password");
        }
        body["id"] = json!(id);
        Json(body).into_response()
    }

    /// Year 2026 is a strong year (85 % occupancy, 35-day lead time, ADR
    /// 10 000); every other year is 70 % / 20 days / 9 000. Room-level
    /// queries drop December and add a bogus month 13. Property "broken"
    /// fails with 500.
    async fn monthly_metrics(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        if let Err(r) = authorized(&headers) {
            return r;
        }
        if params.get("propertyId").map(String::as_str) == Some("broken") {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }

        let year: i32 = params.get("year").and_then(|y| y.parse().ok()).unwrap_or(0);
        let (occ, lead, adr) = if year == 2026 {
            (85.0, 35.0, 10_000.0)
        } else {
            (70.0, 20.0, 9_000.0)
        };
        let room_level = params.contains_key("roomId");

        let mut months: Vec<Value> = (1..=12u32)
            .filter(|m| !(room_level && *m == 12))
            .map(|m| {
                json!({
                    "month": m,
                    "occupancyRate": occ,
                    "averageDailyRate": adr,
                    "revenuePerAvailableRoom": adr * occ / 100.0,
                    "revenue": adr * 30.0 * occ / 100.0,
                    "bookingCount": 10,
                    "averageLeadTimeDays": lead,
                })
            })
            .collect();
        if room_level {
            months.push(json!({ "month": 13, "occupancyRate": 1.0 }));
        }
        Json(Value::Array(months)).into_response()
    }
}
