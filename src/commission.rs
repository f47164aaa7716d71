// =============================================================================
// Commission Estimate — owner payout from monthly revenue and settings
// =============================================================================
//
//   commission   = revenue × rate / 100
//   cleaningFees = cleaningFee × bookingCount
//   ownerPayout  = revenue − commission − cleaningFees
//
// The rate is the property's override if one exists, else the global rate.
// =============================================================================

use serde::Serialize;

use crate::settings::Settings;
use crate::types::MonthlySeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCommission {
    pub month: u32,
    pub revenue: f64,
    pub booking_count: u32,
    pub commission: f64,
    pub cleaning_fees: f64,
    pub owner_payout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSummary {
    pub property_id: String,
    pub commission_rate_pct: f64,
    pub cleaning_fee: f64,
    pub currency: String,
    pub months: Vec<MonthlyCommission>,
    pub total_revenue: f64,
    pub total_commission: f64,
    pub total_cleaning_fees: f64,
    pub total_owner_payout: f64,
}

/// Break down every present month of `series` for `property_id`.
pub fn summarize(property_id: &str, series: &MonthlySeries, settings: &Settings) -> CommissionSummary {
    let rate = settings.commission_rate_for(property_id);

    let months: Vec<MonthlyCommission> = series
        .iter()
        .map(|m| {
            let commission = m.revenue * rate / 100.0;
            let cleaning_fees = settings.cleaning_fee * f64::from(m.booking_count);
            MonthlyCommission {
                month: m.month,
                revenue: m.revenue,
                booking_count: m.booking_count,
                commission,
                cleaning_fees,
                owner_payout: m.revenue - commission - cleaning_fees,
            }
        })
        .collect();

    CommissionSummary {
        property_id: property_id.to_string(),
        commission_rate_pct: rate,
        cleaning_fee: settings.cleaning_fee,
        currency: settings.currency.clone(),
        total_revenue: months.iter().map(|m| m.revenue).sum(),
        total_commission: months.iter().map(|m| m.commission).sum(),
        total_cleaning_fees: months.iter().map(|m| m.cleaning_fees).sum(),
        total_owner_payout: months.iter().map(|m| m.owner_payout).sum(),
        months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MonthlyMetric;

    fn metric(month: u32, revenue: f64, bookings: u32) -> MonthlyMetric {
        MonthlyMetric {
            month,
            occupancy_rate: 0.0,
            average_daily_rate: 0.0,
            revenue_per_available_room: 0.0,
            revenue,
            booking_count: bookings,
            average_lead_time_days: 0.0,
        }
    }

    #[test]
    fn global_rate_and_cleaning_fees() {
        let mut settings = Settings::default();
        settings.cleaning_fee = 5_000.0;
        let series = MonthlySeries::from_metrics(vec![metric(1, 500_000.0, 10), metric(2, 200_000.0, 4)]);

        let s = summarize("p-1", &series, &settings);
        assert_eq!(s.months.len(), 2);
        assert!((s.months[0].commission - 100_000.0).abs() < 1e-9);
        assert!((s.months[0].cleaning_fees - 50_000.0).abs() < 1e-9);
        assert!((s.months[0].owner_payout - 350_000.0).abs() < 1e-9);
        assert!((s.total_revenue - 700_000.0).abs() < 1e-9);
        assert!((s.total_commission - 140_000.0).abs() < 1e-9);
        assert!((s.total_cleaning_fees - 70_000.0).abs() < 1e-9);
        assert!((s.total_owner_payout - 490_000.0).abs() < 1e-9);
    }

    #[test]
    fn property_override_applies() {
        let mut settings = Settings::default();
        settings.property_commission_rates.insert("p-9".into(), 10.0);
        let series = MonthlySeries::from_metrics(vec![metric(6, 100_000.0, 0)]);

        let s = summarize("p-9", &series, &settings);
        assert_eq!(s.commission_rate_pct, 10.0);
        assert!((s.total_commission - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn empty_series_sums_to_zero() {
        let s = summarize("p", &MonthlySeries::default(), &Settings::default());
        assert!(s.months.is_empty());
        assert_eq!(s.total_owner_payout, 0.0);
    }
}
