// =============================================================================
// CSV Export — monthly metrics as a spreadsheet-friendly table
// =============================================================================

use anyhow::{Context, Result};
use csv::Writer;

use crate::types::MonthlySeries;

pub const METRICS_CSV_COLUMNS: [&str; 7] = [
    "month",
    "occupancy_rate",
    "adr",
    "revpar",
    "revenue",
    "booking_count",
    "avg_lead_time_days",
];

/// Render present months in calendar order with fixed decimal precision.
pub fn metrics_csv(series: &MonthlySeries) -> Result<String> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(METRICS_CSV_COLUMNS)
        .context("failed to write CSV header")?;

    for m in series.iter() {
        wtr.write_record([
            m.month.to_string(),
            format!("{:.1}", m.occupancy_rate),
            format!("{:.2}", m.average_daily_rate),
            format!("{:.2}", m.revenue_per_available_room),
            format!("{:.2}", m.revenue),
            m.booking_count.to_string(),
            format!("{:.1}", m.average_lead_time_days),
        ])
        .with_context(|| format!("failed to write CSV row for month {}", m.month))?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}
