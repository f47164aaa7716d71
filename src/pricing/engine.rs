// =============================================================================
// Pricing Engine — three-month ADR recommendations
// =============================================================================
//
// For each of the three calendar months after `reference_month` the engine
// pairs this year's record with last year's record for the same month and
// runs the rule table. A month missing on either side is skipped, so the
// result can hold fewer than three entries.
//
// Pure function: same inputs, same output, byte for byte.
// =============================================================================

use crate::pricing::rules;
use crate::types::{MonthlySeries, PriceRecommendation};

/// Number of upcoming months covered by one invocation.
pub const FORECAST_MONTHS: u32 = 3;

/// The calendar months following `reference_month`, wrapping 12 -> 1.
/// Any `u32` is accepted; it is reduced modulo 12 first.
pub fn target_months(reference_month: u32) -> [u32; FORECAST_MONTHS as usize] {
    let base = reference_month % 12;
    let mut months = [0; FORECAST_MONTHS as usize];
    for (slot, i) in months.iter_mut().zip(1..=FORECAST_MONTHS) {
        *slot = (base + i - 1) % 12 + 1;
    }
    months
}

/// Produce price recommendations for the next three months.
///
/// `reference_month` is the month considered "now" (1-12). Neither series is
/// modified.
pub fn recommend(
    current_year: &MonthlySeries,
    prior_year: &MonthlySeries,
    reference_month: u32,
) -> Vec<PriceRecommendation> {
    target_months(reference_month)
        .into_iter()
        .filter_map(|target_month| {
            let current = current_year.get(target_month)?;
            let last_year = prior_year.get(target_month)?;

            let verdict = rules::evaluate(current, last_year);

            let current_adr = if current.average_daily_rate == 0.0 {
                last_year.average_daily_rate
            } else {
                current.average_daily_rate
            };
            let recommended_adr = current_adr * (1.0 + verdict.change_percent / 100.0);

            Some(PriceRecommendation {
                target_month,
                current_adr,
                recommended_adr,
                change_amount: recommended_adr - current_adr,
                change_percent: verdict.change_percent,
                reason: verdict.reason,
                indicator: verdict.indicator,
                trigger: verdict.trigger,
            })
        })
        .collect()
}
