use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Price of one game, deducted from the prize before tax.
    pub ticket_cost: u64,
    /// Taxable amount up to which the low rate applies.
    pub tax_bracket_threshold: u64,
    pub tax_rate_low_pct: u64,
    pub tax_rate_high_pct: u64,
    /// Draws considered "recent" for dormancy and trend views.
    pub recent_window: usize,
    pub top_n: usize,
    pub top_small_n: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            ticket_cost: 1_000,
            tax_bracket_threshold: 300_000_000,
            tax_rate_low_pct: 22,
            tax_rate_high_pct: 33,
            recent_window: 10,
            top_n: 10,
            top_small_n: 5,
        }
    }
}
