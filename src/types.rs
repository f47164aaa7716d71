// =============================================================================
// Shared types used across the Stayboard reporting backend
// =============================================================================
//
// JSON field names follow the remote reporting API (camelCase). Every type
// here is plain data; ownership stays with whoever fetched or built it.
// =============================================================================

use serde::{Deserialize, Serialize};

// =============================================================================
// Monthly metrics
// =============================================================================

/// Pre-computed performance of one property (or room) for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyMetric {
    /// Calendar month, 1-12.
    pub month: u32,
    /// Occupancy as a percentage. Upstream anomalies can push it above 100.
    #[serde(default)]
    pub occupancy_rate: f64,
    /// ADR.
    #[serde(default)]
    pub average_daily_rate: f64,
    /// RevPAR.
    #[serde(default)]
    pub revenue_per_available_room: f64,
    /// Room revenue for the month.
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub booking_count: u32,
    /// Mean days between booking and check-in.
    #[serde(default)]
    pub average_lead_time_days: f64,
}

/// Twelve month-indexed slots. A month is either fully present or absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySeries {
    slots: [Option<MonthlyMetric>; 12],
}

impl MonthlySeries {
    /// Build a series from upstream records. Records with a month outside
    /// 1-12 are dropped; a later record for the same month wins.
    pub fn from_metrics<I>(metrics: I) -> Self
    where
        I: IntoIterator<Item = MonthlyMetric>,
    {
        let mut series = Self::default();
        for metric in metrics {
            series.insert(metric);
        }
        series
    }

    /// Store `metric` in its month slot. Returns `false` if the month is out
    /// of range.
    pub fn insert(&mut self, metric: MonthlyMetric) -> bool {
        match Self::index(metric.month) {
            Some(idx) => {
                self.slots[idx] = Some(metric);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, month: u32) -> Option<&MonthlyMetric> {
        Self::index(month).and_then(|idx| self.slots[idx].as_ref())
    }

    /// Present months in calendar order.
    pub fn iter(&self) -> impl Iterator<Item = &MonthlyMetric> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index(month: u32) -> Option<usize> {
        (1..=12).contains(&month).then(|| month as usize - 1)
    }
}

// =============================================================================
// Pricing recommendations
// =============================================================================

/// Direction of a price recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Increase,
    Decrease,
    Maintain,
}

/// Which row of the pricing rule table produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    HighOccupancy,
    LowOccupancy,
    DemandRising,
    DemandFalling,
    Stable,
}

/// Price adjustment suggested for one upcoming month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecommendation {
    pub target_month: u32,
    #[serde(rename = "currentADR")]
    pub current_adr: f64,
    #[serde(rename = "recommendedADR")]
    pub recommended_adr: f64,
    pub change_amount: f64,
    /// Signed percentage; negative for decreases.
    pub change_percent: f64,
    pub reason: String,
    pub indicator: Indicator,
    pub trigger: Trigger,
}

// =============================================================================
// Administration entities (owned by the remote API)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub room_count: u32,
    /// Per-property commission override, percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Body for creating or updating a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub room_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Owner,
    #[default]
    Viewer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Body for creating or updating a user account. The password is forwarded
/// upstream only; it is never part of a response.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for UserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserInput")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("active", &self.active)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_true() -> bool {
    true
}
