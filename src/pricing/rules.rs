// =============================================================================
// Pricing Rules — occupancy / lead-time decision table
// =============================================================================
//
// Rows are evaluated top to bottom, first match wins:
//
//   1. HighOccupancy  — occupancy >= 80 %                       -> increase
//   2. LowOccupancy   — occupancy <  50 %                       -> decrease
//   3. DemandRising   — YoY occupancy > +15 pt or lead time > +5 d  -> increase
//   4. DemandFalling  — YoY occupancy < -15 pt or lead time < -5 d  -> decrease
//   5. Stable         — anything else                           -> maintain
//
// The thresholds are business rules carried over as observed. Changing one
// is a behaviour change, not a fix.
// =============================================================================

use crate::types::{Indicator, MonthlyMetric, Trigger};

/// Occupancy at or above this is "high" (inclusive).
pub const HIGH_OCCUPANCY_PCT: f64 = 80.0;
/// Occupancy strictly below this is "low".
pub const LOW_OCCUPANCY_PCT: f64 = 50.0;
/// Lead time strictly above this is a long booking window.
pub const LONG_LEAD_TIME_DAYS: f64 = 30.0;
/// Lead time strictly below this is last-minute booking.
pub const SHORT_LEAD_TIME_DAYS: f64 = 7.0;
/// YoY occupancy swing (points) that counts as a strong trend.
pub const STRONG_YOY_SWING_PT: f64 = 15.0;
/// YoY occupancy drop that deepens a low-occupancy discount.
pub const LOW_OCCUPANCY_YOY_DROP_PT: f64 = 10.0;
/// YoY lead-time shift (days) that counts as a strong trend.
pub const LEAD_TIME_SWING_DAYS: f64 = 5.0;

/// Verdict of the rule table for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    /// Signed percentage; negative for decreases.
    pub change_percent: f64,
    pub indicator: Indicator,
    pub trigger: Trigger,
    pub reason: String,
}

/// Year-over-year comparison of one month against the same month last year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthComparison {
    pub occupancy: f64,
    pub lead_time: f64,
    /// Occupancy points gained (or lost) versus last year.
    pub yoy_occupancy_change: f64,
    /// Lead-time days gained (or lost) versus last year.
    pub lead_time_delta: f64,
}

impl MonthComparison {
    pub fn new(current: &MonthlyMetric, last_year: &MonthlyMetric) -> Self {
        Self {
            occupancy: current.occupancy_rate,
            lead_time: current.average_lead_time_days,
            yoy_occupancy_change: current.occupancy_rate - last_year.occupancy_rate,
            lead_time_delta: current.average_lead_time_days - last_year.average_lead_time_days,
        }
    }
}

/// Run the decision table for one month.
pub fn evaluate(current: &MonthlyMetric, last_year: &MonthlyMetric) -> RuleOutcome {
    let cmp = MonthComparison::new(current, last_year);
    let yoy = cmp.yoy_occupancy_change;
    let delta = cmp.lead_time_delta;

    // ── 1. High occupancy ────────────────────────────────────────────────
    if cmp.occupancy >= HIGH_OCCUPANCY_PCT {
        let (pct, headline) = if cmp.lead_time > LONG_LEAD_TIME_DAYS {
            (15.0, "High occupancy with bookings arriving early")
        } else if cmp.lead_time < SHORT_LEAD_TIME_DAYS {
            (8.0, "High occupancy driven by last-minute bookings")
        } else {
            (10.0, "High occupancy")
        };
        return outcome(pct, Indicator::Increase, Trigger::HighOccupancy, headline, &cmp);
    }

    // ── 2. Low occupancy ─────────────────────────────────────────────────
    if cmp.occupancy < LOW_OCCUPANCY_PCT {
        let falling = yoy < -LOW_OCCUPANCY_YOY_DROP_PT;
        let base = if falling { 15.0 } else { 10.0 };
        let (adjustment, tail) = if cmp.lead_time < SHORT_LEAD_TIME_DAYS {
            (5.0, " with only last-minute bookings")
        } else if delta < -LEAD_TIME_SWING_DAYS {
            (3.0, " and booking window shrinking")
        } else {
            (0.0, "")
        };
        let headline = format!(
            "Low occupancy{}{}",
            if falling { ", down year over year" } else { "" },
            tail
        );
        return outcome(
            -(base + adjustment),
            Indicator::Decrease,
            Trigger::LowOccupancy,
            &headline,
            &cmp,
        );
    }

    // ── 3. Demand rising ─────────────────────────────────────────────────
    let strong_rise = yoy > STRONG_YOY_SWING_PT;
    let earlier_bookings = delta > LEAD_TIME_SWING_DAYS;
    if strong_rise || earlier_bookings {
        let (pct, headline) = if earlier_bookings && yoy > 0.0 {
            (8.0, "Bookings arriving earlier with occupancy up year over year")
        } else if strong_rise {
            (5.0, "Occupancy well above last year")
        } else {
            (5.0, "Bookings arriving earlier than last year")
        };
        return outcome(pct, Indicator::Increase, Trigger::DemandRising, headline, &cmp);
    }

    // ── 4. Demand falling ────────────────────────────────────────────────
    let strong_drop = yoy < -STRONG_YOY_SWING_PT;
    let later_bookings = delta < -LEAD_TIME_SWING_DAYS;
    if strong_drop || later_bookings {
        let (pct, headline) = match (strong_drop, later_bookings) {
            (true, true) => (12.0, "Occupancy well below last year and booking window shrinking"),
            (false, true) => (10.0, "Booking window shrinking versus last year"),
            _ => (8.0, "Occupancy well below last year"),
        };
        return outcome(-pct, Indicator::Decrease, Trigger::DemandFalling, headline, &cmp);
    }

    // ── 5. Stable ────────────────────────────────────────────────────────
    outcome(
        0.0,
        Indicator::Maintain,
        Trigger::Stable,
        "Demand stable versus last year",
        &cmp,
    )
}

fn outcome(
    change_percent: f64,
    indicator: Indicator,
    trigger: Trigger,
    headline: &str,
    cmp: &MonthComparison,
) -> RuleOutcome {
    RuleOutcome {
        change_percent,
        indicator,
        trigger,
        reason: format_reason(headline, cmp),
    }
}

/// Render the justification string. Only `format!` precision specifiers are
/// used, so the output never depends on locale.
fn format_reason(headline: &str, cmp: &MonthComparison) -> String {
    format!(
        "{headline}: occupancy {:.1}%, lead time {:.0} days, YoY occupancy {:+.1} pts, YoY lead time {:+.0} days",
        cmp.occupancy, cmp.lead_time, cmp.yoy_occupancy_change, cmp.lead_time_delta
    )
}
