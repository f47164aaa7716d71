// =============================================================================
// Reporting API Client — typed access to the remote metrics / admin API
// =============================================================================
//
// SECURITY: The API token is never logged or serialised. It is attached as
// `Authorization: Bearer <token>` on every request when configured.
//
// Non-2xx responses become errors carrying the route, status and body so the
// dashboard can surface what the upstream said.
// =============================================================================

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::types::{MonthlyMetric, MonthlySeries, Property, PropertyInput, User, UserInput};

/// Per-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the remote reporting / administration API.
#[derive(Clone)]
pub struct ReportingClient {
    base_url: Url,
    token: Option<String>,
    client: reqwest::Client,
}

impl ReportingClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` — root of the reporting API, e.g. `https://reports.example.com`.
    /// * `token`    — optional bearer token; `None` or empty sends no header.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid reporting API URL '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("reporting API URL '{base_url}' cannot carry a path");
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %base_url, "ReportingClient initialised");

        Ok(Self {
            base_url,
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    /// GET /api/properties
    #[instrument(skip(self), name = "reporting::list_properties")]
    pub async fn list_properties(&self) -> Result<Vec<Property>> {
        let props: Vec<Property> = self
            .send_json(self.request(Method::GET, &["api", "properties"])?, "GET /api/properties")
            .await?;
        debug!(count = props.len(), "properties retrieved");
        Ok(props)
    }

    /// POST /api/properties
    #[instrument(skip(self, input), name = "reporting::create_property")]
    pub async fn create_property(&self, input: &PropertyInput) -> Result<Property> {
        let req = self.request(Method::POST, &["api", "properties"])?.json(input);
        let prop: Property = self.send_json(req, "POST /api/properties").await?;
        debug!(property_id = %prop.id, "property created");
        Ok(prop)
    }

    /// PUT /api/properties/{id}
    #[instrument(skip(self, input), name = "reporting::update_property")]
    pub async fn update_property(&self, id: &str, input: &PropertyInput) -> Result<Property> {
        let req = self.request(Method::PUT, &["api", "properties", id])?.json(input);
        self.send_json(req, "PUT /api/properties/{id}").await
    }

    /// DELETE /api/properties/{id}
    #[instrument(skip(self), name = "reporting::delete_property")]
    pub async fn delete_property(&self, id: &str) -> Result<()> {
        let req = self.request(Method::DELETE, &["api", "properties", id])?;
        self.send_empty(req, "DELETE /api/properties/{id}").await?;
        debug!(property_id = id, "property deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// GET /api/users
    #[instrument(skip(self), name = "reporting::list_users")]
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users: Vec<User> = self
            .send_json(self.request(Method::GET, &["api", "users"])?, "GET /api/users")
            .await?;
        debug!(count = users.len(), "users retrieved");
        Ok(users)
    }

    /// POST /api/users
    #[instrument(skip(self, input), name = "reporting::create_user")]
    pub async fn create_user(&self, input: &UserInput) -> Result<User> {
        let req = self.request(Method::POST, &["api", "users"])?.json(input);
        let user: User = self.send_json(req, "POST /api/users").await?;
        debug!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// PUT /api/users/{id}
    #[instrument(skip(self, input), name = "reporting::update_user")]
    pub async fn update_user(&self, id: &str, input: &UserInput) -> Result<User> {
        let req = self.request(Method::PUT, &["api", "users", id])?.json(input);
        self.send_json(req, "PUT /api/users/{id}").await
    }

    /// DELETE /api/users/{id}
    #[instrument(skip(self), name = "reporting::delete_user")]
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let req = self.request(Method::DELETE, &["api", "users", id])?;
        self.send_empty(req, "DELETE /api/users/{id}").await?;
        debug!(user_id = id, "user deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Metrics
    // -------------------------------------------------------------------------

    /// GET /api/metrics/monthly: one year of pre-computed monthly metrics for
    /// a property, or for a single room when `room_id` is given.
    #[instrument(skip(self), name = "reporting::monthly_metrics")]
    pub async fn monthly_metrics(
        &self,
        property_id: &str,
        room_id: Option<&str>,
        year: i32,
    ) -> Result<Vec<MonthlyMetric>> {
        let mut query: Vec<(&str, String)> = vec![
            ("propertyId", property_id.to_string()),
            ("year", year.to_string()),
        ];
        if let Some(room) = room_id {
            query.push(("roomId", room.to_string()));
        }

        let req = self
            .request(Method::GET, &["api", "metrics", "monthly"])?
            .query(&query);
        let metrics: Vec<MonthlyMetric> = self.send_json(req, "GET /api/metrics/monthly").await?;

        debug!(property_id, year, count = metrics.len(), "monthly metrics fetched");
        Ok(metrics)
    }

    /// Same as [`monthly_metrics`](Self::monthly_metrics), indexed by month.
    pub async fn monthly_series(
        &self,
        property_id: &str,
        room_id: Option<&str>,
        year: i32,
    ) -> Result<MonthlySeries> {
        let metrics = self.monthly_metrics(property_id, room_id, year).await?;
        let mut series = MonthlySeries::default();
        for metric in metrics {
            let month = metric.month;
            if !series.insert(metric) {
                warn!(property_id, year, month, "skipping metric with out-of-range month");
            }
        }
        Ok(series)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Build a request for `segments` under the base URL. Segments are
    /// percent-encoded, so ids may contain any character.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("reporting API URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);

        let mut req = self.client.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Ok(req)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, route: &str) -> Result<T> {
        let resp = req
            .send()
            .await
            .with_context(|| format!("{route} request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("reporting API {route} returned {status}: {body}");
        }

        resp.json()
            .await
            .with_context(|| format!("failed to parse {route} response"))
    }

    async fn send_empty(&self, req: RequestBuilder, route: &str) -> Result<()> {
        let resp = req
            .send()
            .await
            .with_context(|| format!("{route} request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("reporting API {route} returned {status}: {body}");
        }
        Ok(())
    }
}

impl std::fmt::Debug for ReportingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportingClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
