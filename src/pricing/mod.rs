// =============================================================================
// Pricing — forward-looking ADR recommendations
// =============================================================================
//
// `rules` holds the decision table for a single month pair; `engine` walks
// the next three calendar months and turns rule verdicts into priced
// recommendations. Both are pure: no I/O, no shared state.
// =============================================================================

pub mod engine;
pub mod rules;

pub use engine::{recommend, target_months};
