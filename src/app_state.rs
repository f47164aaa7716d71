// =============================================================================
// Central Application State — Stayboard backend
// =============================================================================
//
// Ties the settings, the settings store, the reporting client and the
// dashboard audit buffers together. Shared across handlers as
// `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for mutable settings and ring buffers. Guards are
//     never held across an `.await`.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::report::PricingReport;
use crate::reporting::ReportingClient;
use crate::settings::Settings;
use crate::store::KeyValueStore;

/// A recorded upstream failure for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Which dashboard operation failed.
    pub operation: String,
    /// Human-readable error message, including context chain.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;
/// Maximum number of recent pricing reports to retain.
const MAX_RECENT_REPORTS: usize = 100;

pub struct AppState {
    /// Incremented on every settings change or new report.
    pub state_version: AtomicU64,

    pub settings: RwLock<Settings>,
    pub store: Arc<dyn KeyValueStore>,

    pub reporting: ReportingClient,

    /// Bearer token the dashboard must present. Empty disables access.
    pub admin_token: String,

    pub recent_reports: RwLock<Vec<PricingReport>>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        settings: Settings,
        store: Arc<dyn KeyValueStore>,
        reporting: ReportingClient,
        admin_token: impl Into<String>,
    ) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            settings: RwLock::new(settings),
            store,
            reporting,
            admin_token: admin_token.into(),
            recent_reports: RwLock::new(Vec::new()),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Settings ────────────────────────────────────────────────────────

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Apply `edit` to a copy of the current settings, then validate, persist
    /// and install it. `edit` returns a description of each field it changed;
    /// nothing is saved when that list is empty. The write lock is held for
    /// the whole read-modify-write, so concurrent updates cannot drop each
    /// other's changes. On failure the current settings stay in place.
    pub fn update_settings<F>(&self, edit: F) -> Result<(Settings, Vec<String>)>
    where
        F: FnOnce(&mut Settings) -> Vec<String>,
    {
        let mut guard = self.settings.write();
        let mut next = guard.clone();
        let changes = edit(&mut next);
        if changes.is_empty() {
            return Ok((next, changes));
        }

        next.validate()?;
        next.save(self.store.as_ref())?;
        *guard = next.clone();
        drop(guard);

        self.increment_version();
        Ok((next, changes))
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error. The ring buffer is capped at [`MAX_RECENT_ERRORS`];
    /// oldest entries are evicted first.
    pub fn push_error(&self, operation: &str, err: &anyhow::Error) {
        let record = ErrorRecord {
            operation: operation.to_string(),
            message: format!("{err:#}"),
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
    }

    // ── Report Audit ────────────────────────────────────────────────────

    /// Record a pricing report, capped at [`MAX_RECENT_REPORTS`].
    pub fn push_report(&self, report: PricingReport) {
        let mut reports = self.recent_reports.write();
        reports.push(report);
        while reports.len() > MAX_RECENT_REPORTS {
            reports.remove(0);
        }
        drop(reports);

        self.increment_version();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn state() -> AppState {
        let client = ReportingClient::new("http://localhost:1", None).unwrap();
        AppState::new(Settings::default(), Arc::new(MemoryStore::new()), client, "t")
    }

    #[test]
    fn error_buffer_is_capped() {
        let s = state();
        for i in 0..(MAX_RECENT_ERRORS + 5) {
            s.push_error("op", &anyhow::anyhow!("failure {i}"));
        }
        let errors = s.recent_errors.read();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors[0].message, "failure 5");
    }

    #[test]
    fn report_buffer_is_capped_and_bumps_version() {
        let s = state();
        let before = s.current_state_version();
        for _ in 0..(MAX_RECENT_REPORTS + 1) {
            s.push_report(PricingReport::new("p", None, 2026, 1, Vec::new()));
        }
        assert_eq!(s.recent_reports.read().len(), MAX_RECENT_REPORTS);
        assert_eq!(s.current_state_version(), before + MAX_RECENT_REPORTS as u64 + 1);
    }

    #[test]
    fn update_settings_persists_and_rejects_invalid() {
        let s = state();
        let before = s.current_state_version();
        let (next, changes) = s
            .update_settings(|cfg| {
                cfg.cleaning_fee = 3000.0;
                vec!["cleaningFee".into()]
            })
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(next.cleaning_fee, 3000.0);
        assert_eq!(s.settings(), next);
        assert_eq!(Settings::load(s.store.as_ref()).unwrap(), next);
        assert_eq!(s.current_state_version(), before + 1);

        let err = s.update_settings(|cfg| {
            cfg.commission_rate_pct = -1.0;
            vec!["commissionRatePct".into()]
        });
        assert!(err.is_err());
        assert_eq!(s.settings(), next);
        assert_eq!(s.current_state_version(), before + 1);
    }

    #[test]
    fn update_settings_without_changes_is_a_noop() {
        let s = state();
        let before = s.current_state_version();
        let (cfg, changes) = s.update_settings(|_| Vec::new()).unwrap();
        assert!(changes.is_empty());
        assert_eq!(cfg, Settings::default());
        assert_eq!(s.current_state_version(), before);
        assert!(s.store.get(crate::settings::SETTINGS_KEY).unwrap().is_none());
    }

    #[test]
    fn concurrent_updates_keep_every_change() {
        let s = Arc::new(state());
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || {
                    for round in 0..25 {
                        s.update_settings(|cfg| {
                            cfg.property_commission_rates
                                .insert(format!("p-{i}-{round}"), 10.0);
                            vec![format!("p-{i}-{round}")]
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        let current = s.settings();
        assert_eq!(current.property_commission_rates.len(), 8 * 25);
        assert_eq!(Settings::load(s.store.as_ref()).unwrap(), current);
    }
}
