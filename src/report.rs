// =============================================================================
// Pricing Report — auditable record of one recommendation run
// =============================================================================
//
// Wraps the engine output with where it came from (property, room, year,
// reference month) and which target months had no paired data. The engine
// itself stays pure; the id and timestamp are stamped here.
// =============================================================================

use serde::Serialize;

use crate::pricing::target_months;
use crate::types::PriceRecommendation;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingReport {
    /// Unique identifier for this run (UUID v4).
    pub id: String,

    pub property_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,

    /// Year treated as "current"; the prior series is `year - 1`.
    pub year: i32,

    pub reference_month: u32,

    /// ISO 8601 timestamp of when the report was generated.
    pub generated_at: String,

    pub recommendations: Vec<PriceRecommendation>,

    /// Target months that had no record this year or last year.
    pub skipped_months: Vec<u32>,
}

impl PricingReport {
    pub fn new(
        property_id: impl Into<String>,
        room_id: Option<String>,
        year: i32,
        reference_month: u32,
        recommendations: Vec<PriceRecommendation>,
    ) -> Self {
        let skipped_months = target_months(reference_month)
            .into_iter()
            .filter(|m| !recommendations.iter().any(|r| r.target_month == *m))
            .collect();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            property_id: property_id.into(),
            room_id,
            year,
            reference_month,
            generated_at: chrono::Utc::now().to_rfc3339(),
            recommendations,
            skipped_months,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Indicator, Trigger};

    fn rec(target_month: u32) -> PriceRecommendation {
        PriceRecommendation {
            target_month,
            current_adr: 100.0,
            recommended_adr: 100.0,
            change_amount: 0.0,
            change_percent: 0.0,
            reason: String::new(),
            indicator: Indicator::Maintain,
            trigger: Trigger::Stable,
        }
    }

    #[test]
    fn skipped_months_are_the_missing_targets() {
        let report = PricingReport::new("p-1", None, 2026, 11, vec![rec(1)]);
        assert_eq!(report.skipped_months, vec![12, 2]);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn serialises_camel_case_and_omits_missing_room() {
        let report = PricingReport::new("p-1", None, 2026, 1, vec![rec(2), rec(3), rec(4)]);
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["propertyId"], "p-1");
        assert_eq!(v["referenceMonth"], 1);
        assert!(v.get("roomId").is_none());
        assert_eq!(v["skippedMonths"], serde_json::json!([]));
        assert_eq!(report.id.len(), 36);
    }
}
