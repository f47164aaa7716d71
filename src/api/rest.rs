// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Health is public; everything else
// requires the admin Bearer token via the `AuthBearer` extractor.
//
// Property and user CRUD is proxied to the reporting API. Pricing, commission
// and CSV export fetch monthly metrics upstream and compute locally. Upstream
// failures answer 502 and land in the error log.
//
// CORS is permissive; the dashboard is served from a different origin.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::api::auth::AuthBearer;
use crate::app_state::AppState;
use crate::commission::{self, CommissionSummary};
use crate::export;
use crate::pricing;
use crate::report::PricingReport;
use crate::types::{MonthlyMetric, Property, PropertyInput, User, UserInput};

type ApiError = (StatusCode, Json<serde_json::Value>);

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        // ── Administration (proxied) ────────────────────────────────
        .route("/api/v1/properties", get(list_properties).post(create_property))
        .route("/api/v1/properties/:id", put(update_property).delete(delete_property))
        .route("/api/v1/users", get(list_users).post(create_user))
        .route("/api/v1/users/:id", put(update_user).delete(delete_user))
        // ── Reporting ───────────────────────────────────────────────
        .route("/api/v1/properties/:id/metrics", get(metrics))
        .route("/api/v1/properties/:id/metrics.csv", get(metrics_csv))
        .route("/api/v1/properties/:id/pricing", get(pricing_report))
        .route("/api/v1/properties/:id/commission", get(commission_summary))
        .route("/api/v1/reports", get(recent_reports))
        .route("/api/v1/errors", get(recent_errors))
        // ── Settings ────────────────────────────────────────────────
        .route("/api/v1/settings", get(get_settings).put(update_settings))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error helpers
// =============================================================================

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message.into() })),
    )
}

fn internal_error(state: &AppState, operation: &str, err: anyhow::Error) -> ApiError {
    warn!(operation, error = %format!("{err:#}"), "request failed");
    state.push_error(operation, &err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": format!("{err:#}") })),
    )
}

fn upstream_error(state: &AppState, operation: &str, err: anyhow::Error) -> ApiError {
    warn!(operation, error = %format!("{err:#}"), "reporting API call failed");
    state.push_error(operation, &err);
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({ "error": format!("{err:#}") })),
    )
}

/// Calendar years accepted in metric queries. The prior-year lookup for
/// pricing needs `year - 1` to stay representable.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// Requested year, defaulting to the current one.
fn resolve_year(requested: Option<i32>) -> Result<i32, ApiError> {
    let year = requested.unwrap_or_else(|| chrono::Utc::now().year());
    if !YEAR_RANGE.contains(&year) {
        return Err(bad_request(format!(
            "Invalid year: {year}. Use {}-{}.",
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        )));
    }
    Ok(year)
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Properties (authenticated, proxied)
// =============================================================================

async fn list_properties(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Property>>, ApiError> {
    state
        .reporting
        .list_properties()
        .await
        .map(Json)
        .map_err(|e| upstream_error(&state, "list_properties", e))
}

async fn create_property(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(input): Json<PropertyInput>,
) -> Result<impl IntoResponse, ApiError> {
    if input.name.trim().is_empty() {
        return Err(bad_request("Property name must not be empty"));
    }
    let prop = state
        .reporting
        .create_property(&input)
        .await
        .map_err(|e| upstream_error(&state, "create_property", e))?;
    info!(property_id = %prop.id, "Property created via API");
    Ok((StatusCode::CREATED, Json(prop)))
}

async fn update_property(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<PropertyInput>,
) -> Result<Json<Property>, ApiError> {
    if input.name.trim().is_empty() {
        return Err(bad_request("Property name must not be empty"));
    }
    let prop = state
        .reporting
        .update_property(&id, &input)
        .await
        .map_err(|e| upstream_error(&state, "update_property", e))?;
    info!(property_id = %id, "Property updated via API");
    Ok(Json(prop))
}

async fn delete_property(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .reporting
        .delete_property(&id)
        .await
        .map_err(|e| upstream_error(&state, "delete_property", e))?;
    info!(property_id = %id, "Property deleted via API");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Users (authenticated, proxied)
// =============================================================================

async fn list_users(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    state
        .reporting
        .list_users()
        .await
        .map(Json)
        .map_err(|e| upstream_error(&state, "list_users", e))
}

async fn create_user(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(input): Json<UserInput>,
) -> Result<impl IntoResponse, ApiError> {
    if !input.email.contains('@') {
        return Err(bad_request(format!("Invalid email address: '{}'", input.email)));
    }
    if input.password.as_deref().map_or(true, str::is_empty) {
        return Err(bad_request("A password is required for new users"));
    }
    let user = state
        .reporting
        .create_user(&input)
        .await
        .map_err(|e| upstream_error(&state, "create_user", e))?;
    info!(user_id = %user.id, role = ?user.role, "User created via API");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<UserInput>,
) -> Result<Json<User>, ApiError> {
    if !input.email.contains('@') {
        return Err(bad_request(format!("Invalid email address: '{}'", input.email)));
    }
    let user = state
        .reporting
        .update_user(&id, &input)
        .await
        .map_err(|e| upstream_error(&state, "update_user", e))?;
    info!(user_id = %id, "User updated via API");
    Ok(Json(user))
}

async fn delete_user(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .reporting
        .delete_user(&id)
        .await
        .map_err(|e| upstream_error(&state, "delete_user", e))?;
    info!(user_id = %id, "User deleted via API");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Metrics & export (authenticated)
// =============================================================================

#[derive(Deserialize)]
struct MetricsQuery {
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    room_id: Option<String>,
}

async fn metrics(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<MetricsQuery>,
) -> Result<Json<Vec<MonthlyMetric>>, ApiError> {
    let year = resolve_year(q.year)?;
    let series = state
        .reporting
        .monthly_series(&id, q.room_id.as_deref(), year)
        .await
        .map_err(|e| upstream_error(&state, "metrics", e))?;
    Ok(Json(series.iter().cloned().collect()))
}

async fn metrics_csv(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<MetricsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let year = resolve_year(q.year)?;
    let series = state
        .reporting
        .monthly_series(&id, q.room_id.as_deref(), year)
        .await
        .map_err(|e| upstream_error(&state, "metrics_csv", e))?;
    let body =
        export::metrics_csv(&series).map_err(|e| internal_error(&state, "metrics_csv", e))?;

    let filename: String = format!("{id}-{year}-metrics.csv")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

// =============================================================================
// Pricing recommendations (authenticated)
// =============================================================================

#[derive(Deserialize)]
struct PricingQuery {
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    reference_month: Option<u32>,
    #[serde(default)]
    room_id: Option<String>,
}

async fn pricing_report(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<PricingQuery>,
) -> Result<Json<PricingReport>, ApiError> {
    let year = resolve_year(q.year)?;
    let reference_month = q
        .reference_month
        .unwrap_or_else(|| chrono::Utc::now().month());
    if !(1..=12).contains(&reference_month) {
        return Err(bad_request(format!(
            "Invalid reference_month: {reference_month}. Use 1-12."
        )));
    }

    let room = q.room_id.as_deref();
    let (current, prior) = tokio::join!(
        state.reporting.monthly_series(&id, room, year),
        state.reporting.monthly_series(&id, room, year - 1),
    );
    let current = current.map_err(|e| upstream_error(&state, "pricing", e))?;
    let prior = prior.map_err(|e| upstream_error(&state, "pricing", e))?;
    if current.is_empty() || prior.is_empty() {
        warn!(property_id = %id, year, "no monthly metrics for one of the compared years");
    }

    let recommendations = pricing::recommend(&current, &prior, reference_month);
    let report = PricingReport::new(id, q.room_id, year, reference_month, recommendations);

    info!(
        report_id = %report.id,
        property_id = %report.property_id,
        year,
        reference_month,
        count = report.recommendations.len(),
        skipped = ?report.skipped_months,
        "pricing report generated"
    );

    state.push_report(report.clone());
    Ok(Json(report))
}

async fn recent_reports(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let reports = state.recent_reports.read().clone();
    Json(reports)
}

async fn recent_errors(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let errors = state.recent_errors.read().clone();
    Json(errors)
}

// =============================================================================
// Commission (authenticated)
// =============================================================================

async fn commission_summary(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<MetricsQuery>,
) -> Result<Json<CommissionSummary>, ApiError> {
    let year = resolve_year(q.year)?;
    let series = state
        .reporting
        .monthly_series(&id, q.room_id.as_deref(), year)
        .await
        .map_err(|e| upstream_error(&state, "commission", e))?;

    let settings = state.settings();
    Ok(Json(commission::summarize(&id, &series, &settings)))
}

// =============================================================================
// Settings (authenticated)
// =============================================================================

async fn get_settings(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    Json(state.settings())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsUpdate {
    #[serde(default)]
    commission_rate_pct: Option<f64>,
    #[serde(default)]
    cleaning_fee: Option<f64>,
    /// Replaces the whole override map when present.
    #[serde(default)]
    property_commission_rates: Option<HashMap<String, f64>>,
    #[serde(default)]
    currency: Option<String>,
}

async fn update_settings(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let (next, changes) = state
        .update_settings(|next| {
            let mut changes = Vec::new();

            macro_rules! apply_field {
                ($field:ident, $name:literal) => {
                    if let Some(val) = update.$field {
                        if next.$field != val {
                            changes.push(format!("{}: {:?} -> {:?}", $name, next.$field, val));
                            next.$field = val;
                        }
                    }
                };
            }

            apply_field!(commission_rate_pct, "commissionRatePct");
            apply_field!(cleaning_fee, "cleaningFee");
            apply_field!(property_commission_rates, "propertyCommissionRates");
            apply_field!(currency, "currency");
            changes
        })
        .map_err(|e| bad_request(format!("{e:#}")))?;

    if !changes.is_empty() {
        info!(changes = ?changes, "Settings updated");
    }

    let mut response = serde_json::to_value(&next).unwrap_or_default();
    if let Some(obj) = response.as_object_mut() {
        obj.insert(
            "changes".to_string(),
            serde_json::to_value(&changes).unwrap_or_default(),
        );
    }
    Ok(Json(response))
}

// =============================================================================
// Tests
// =============================================================================
