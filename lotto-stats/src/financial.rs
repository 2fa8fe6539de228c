use serde::Serialize;

use lotto_db::models::{DrawRecord, PurchaseMethod};

use crate::config::StatsConfig;
use crate::math::{mean, percentage, round_to};

const TOP_DRAWS_BY_METHOD: usize = 5;

/// Total paid across all tiers as a percentage of sales; 0 without sales.
pub fn payout_rate(draw: &DrawRecord) -> f64 {
    if draw.total_sales_amount == 0 {
        return 0.0;
    }
    let paid: u128 = draw.prize_tiers.iter().map(|t| t.paid_out() as u128).sum();
    round_to(paid as f64 / draw.total_sales_amount as f64 * 100.0, 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    pub prize: u64,
    pub taxable: u64,
    pub tax: u64,
    pub net: u64,
}

/// Progressive withholding on a single prize. The tax is truncated to a
/// multiple of 10 before being subtracted.
pub fn tax_breakdown(prize: u64, config: &StatsConfig) -> TaxBreakdown {
    let taxable = prize.saturating_sub(config.ticket_cost);
    let low = taxable.min(config.tax_bracket_threshold) as u128;
    let high = taxable.saturating_sub(config.tax_bracket_threshold) as u128;
    // in hundredths of a currency unit
    let tax_scaled = low * config.tax_rate_low_pct as u128 + high * config.tax_rate_high_pct as u128;
    let tax = ((tax_scaled / 1000) * 10) as u64;
    TaxBreakdown {
        prize,
        taxable,
        tax,
        net: prize.saturating_sub(tax),
    }
}

/// Net amount for one winner; 0 when the prize is 0.
pub fn tax_adjusted_prize(prize: u64, config: &StatsConfig) -> u64 {
    if prize == 0 {
        return 0;
    }
    tax_breakdown(prize, config).net
}

/// Tax-adjusted prize of tier 1, or 0 when the tier is missing.
pub fn top_tier_net_prize(draw: &DrawRecord, config: &StatsConfig) -> u64 {
    draw.tier(1)
        .map_or(0, |t| tax_adjusted_prize(t.prize_per_winner, config))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MethodRate {
    pub auto: f64,
    pub manual: f64,
    pub semi_auto: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MethodTotals {
    pub auto: u64,
    pub manual: u64,
    pub semi_auto: u64,
    pub unknown: u64,
}

impl MethodTotals {
    fn of(draw: &DrawRecord) -> Self {
        let mut totals = Self::default();
        for win in &draw.winning_outlets {
            totals.add(win.method);
        }
        totals
    }

    fn add(&mut self, method: PurchaseMethod) {
        match method {
            PurchaseMethod::Auto => self.auto += 1,
            PurchaseMethod::Manual => self.manual += 1,
            PurchaseMethod::SemiAuto => self.semi_auto += 1,
            PurchaseMethod::Unknown => self.unknown += 1,
        }
    }

    fn merge(&mut self, other: &Self) {
        self.auto += other.auto;
        self.manual += other.manual;
        self.semi_auto += other.semi_auto;
        self.unknown += other.unknown;
    }

    pub fn known(&self) -> u64 {
        self.auto + self.manual + self.semi_auto
    }

    pub fn total(&self) -> u64 {
        self.known() + self.unknown
    }

    fn rate_over(&self, denominator: u64) -> MethodRate {
        MethodRate {
            auto: percentage(self.auto, denominator, 1),
            manual: percentage(self.manual, denominator, 1),
            semi_auto: percentage(self.semi_auto, denominator, 1),
        }
    }
}

/// Share of each purchase method among all of a draw's first-prize winners,
/// unknown methods included in the denominator.
pub fn method_rate(draw: &DrawRecord) -> MethodRate {
    MethodTotals::of(draw).rate_over(draw.winning_outlets.len() as u64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawFinance {
    pub draw_no: u32,
    pub total_sales_amount: u64,
    pub payout_rate: f64,
    pub first_prize_per_winner: u64,
    pub tax_adjusted_prize: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawMethodRatio {
    pub draw_no: u32,
    pub winners: u64,
    pub rate: MethodRate,
}

/// Purchase-method shares over winners whose method is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodReport {
    pub totals: MethodTotals,
    pub overall: MethodRate,
    pub draws_with_method_info: u64,
    pub recent: Vec<DrawMethodRatio>,
    pub top_auto_draws: Vec<DrawMethodRatio>,
    pub top_manual_draws: Vec<DrawMethodRatio>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialReport {
    pub draws: Vec<DrawFinance>,
    pub average_payout_rate: f64,
    pub latest_tax_adjusted_prize: u64,
    pub methods: MethodReport,
}

fn top_by(ratios: &[DrawMethodRatio], key: impl Fn(&MethodRate) -> f64) -> Vec<DrawMethodRatio> {
    let mut sorted = ratios.to_vec();
    sorted.sort_by(|a, b| key(&b.rate).total_cmp(&key(&a.rate)));
    sorted.truncate(TOP_DRAWS_BY_METHOD);
    sorted
}

fn analyze_methods(draws: &[DrawRecord], config: &StatsConfig) -> MethodReport {
    let mut totals = MethodTotals::default();
    let mut ratios = Vec::new();

    for draw in draws {
        let per_draw = MethodTotals::of(draw);
        totals.merge(&per_draw);
        if per_draw.known() > 0 {
            ratios.push(DrawMethodRatio {
                draw_no: draw.draw_no,
                winners: per_draw.known(),
                rate: per_draw.rate_over(per_draw.known()),
            });
        }
    }

    let recent_start = ratios.len().saturating_sub(config.recent_window);

    MethodReport {
        totals,
        overall: totals.rate_over(totals.known()),
        draws_with_method_info: ratios.len() as u64,
        recent: ratios[recent_start..].to_vec(),
        top_auto_draws: top_by(&ratios, |r| r.auto),
        top_manual_draws: top_by(&ratios, |r| r.manual),
    }
}

pub fn analyze_financials(draws: &[DrawRecord], config: &StatsConfig) -> FinancialReport {
    let per_draw: Vec<DrawFinance> = draws
        .iter()
        .map(|draw| {
            let first_prize = draw.tier(1).map_or(0, |t| t.prize_per_winner);
            DrawFinance {
                draw_no: draw.draw_no,
                total_sales_amount: draw.total_sales_amount,
                payout_rate: payout_rate(draw),
                first_prize_per_winner: first_prize,
                tax_adjusted_prize: tax_adjusted_prize(first_prize, config),
            }
        })
        .collect();

    let rates: Vec<f64> = per_draw
        .iter()
        .filter(|d| d.total_sales_amount > 0)
        .map(|d| d.payout_rate)
        .collect();

    FinancialReport {
        average_payout_rate: round_to(mean(&rates), 2),
        latest_tax_adjusted_prize: per_draw.last().map_or(0, |d| d.tax_adjusted_prize),
        methods: analyze_methods(draws, config),
        draws: per_draw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_db::models::{PrizeTier, TierLabel, WinningOutlet};

    fn tier(rank: u8, count: u64, amount: u64, total: Option<u64>) -> PrizeTier {
        PrizeTier {
            tier: TierLabel::Rank(rank),
            winner_count: count,
            prize_per_winner: amount,
            total_prize: total,
        }
    }

    fn with_methods(draw_no: u32, methods: &[PurchaseMethod]) -> DrawRecord {
        let mut draw = DrawRecord::new(draw_no, [1, 2, 3, 4, 5, 6], 7);
        draw.winning_outlets = methods
            .iter()
            .enumerate()
            .map(|(i, &method)| WinningOutlet {
                outlet_id: format!("S{}", i),
                method,
            })
            .collect();
        draw
    }

    #[test]
    fn test_tax_above_bracket() {
        let t = tax_breakdown(2_357_299_875, &StatsConfig::default());
        assert_eq!(t.taxable, 2_357_298_875);
        // 66,000,000 + 678,908,628.75 truncated to tens
        assert_eq!(t.tax, 744_908_620);
        assert_eq!(t.net, 1_612_391_255);
    }

    #[test]
    fn test_tax_within_bracket() {
        let t = tax_breakdown(100_001_000, &StatsConfig::default());
        assert_eq!(t.taxable, 100_000_000);
        assert_eq!(t.tax, 22_000_000);
        assert_eq!(t.net, 78_001_000);

        let t = tax_breakdown(300_001_000, &StatsConfig::default());
        assert_eq!(t.tax, 66_000_000);
    }

    #[test]
    fn test_tax_truncates_to_tens() {
        // 12,345 * 0.22 = 2715.9
        let t = tax_breakdown(13_345, &StatsConfig::default());
        assert_eq!(t.tax, 2_710);
        assert_eq!(t.tax % 10, 0);
    }

    #[test]
    fn test_tax_adjusted_prize_zero_and_small() {
        let config = StatsConfig::default();
        assert_eq!(tax_adjusted_prize(0, &config), 0);
        assert_eq!(tax_adjusted_prize(500, &config), 500);
    }

    #[test]
    fn test_top_tier_net_prize_missing_tier() {
        let draw = DrawRecord::new(1, [1, 2, 3, 4, 5, 6], 7);
        assert_eq!(top_tier_net_prize(&draw, &StatsConfig::default()), 0);
    }

    #[test]
    fn test_payout_rate() {
        let mut draw = DrawRecord::new(1, [1, 2, 3, 4, 5, 6], 7);
        assert_eq!(payout_rate(&draw), 0.0);

        draw.total_sales_amount = 1_000_000;
        draw.prize_tiers = vec![tier(1, 1, 300_000, None), tier(5, 10, 5_000, Some(50_000))];
        assert_eq!(payout_rate(&draw), 35.0);
    }

    #[test]
    fn test_method_rate() {
        use PurchaseMethod::*;
        let draw = with_methods(1, &[Auto, Auto, Manual]);
        let rate = method_rate(&draw);
        assert_eq!(rate.auto, 66.7);
        assert_eq!(rate.manual, 33.3);
        assert_eq!(rate.semi_auto, 0.0);

        let none = method_rate(&with_methods(2, &[]));
        assert_eq!(none, MethodRate::default());
    }

    #[test]
    fn test_method_report() {
        use PurchaseMethod::*;
        let draws = vec![
            with_methods(1, &[Auto, Manual]),
            with_methods(2, &[]),
            with_methods(3, &[Manual, Manual, SemiAuto]),
            with_methods(4, &[Unknown]),
            with_methods(5, &[Auto]),
        ];
        let report = analyze_methods(&draws, &StatsConfig::default());
        assert_eq!(report.totals.auto, 2);
        assert_eq!(report.totals.manual, 3);
        assert_eq!(report.totals.semi_auto, 1);
        assert_eq!(report.totals.unknown, 1);
        assert_eq!(report.draws_with_method_info, 3);
        assert_eq!(report.top_auto_draws[0].draw_no, 5);
        assert_eq!(report.top_manual_draws[0].draw_no, 3);
        assert_eq!(report.recent.len(), 3);
    }

    #[test]
    fn test_method_report_ignores_unknown_winners() {
        use PurchaseMethod::*;
        let draws = vec![
            with_methods(1, &[Auto, Unknown]),
            with_methods(2, &[Manual, Unknown, Unknown]),
        ];
        let report = analyze_methods(&draws, &StatsConfig::default());
        assert_eq!(report.overall.auto, 50.0);
        assert_eq!(report.overall.manual, 50.0);
        assert_eq!(report.recent[0].rate.auto, 100.0);
        assert_eq!(report.recent[0].winners, 1);
        assert_eq!(report.recent[1].rate.manual, 100.0);

        // the per-draw insight still divides by every winner
        assert_eq!(method_rate(&draws[0]).auto, 50.0);
    }

    #[test]
    fn test_financial_report() {
        let mut draw = DrawRecord::new(1, [1, 2, 3, 4, 5, 6], 7);
        draw.total_sales_amount = 1_000_000;
        draw.prize_tiers = vec![tier(1, 1, 500_000, None)];
        let no_sales = DrawRecord::new(2, [1, 2, 3, 4, 5, 6], 7);

        let report = analyze_financials(&[draw, no_sales], &StatsConfig::default());
        assert_eq!(report.draws.len(), 2);
        assert_eq!(report.average_payout_rate, 50.0);
        assert_eq!(report.draws[0].tax_adjusted_prize, 500_000 - 109_780);
        assert_eq!(report.latest_tax_adjusted_prize, 0);
    }
}
