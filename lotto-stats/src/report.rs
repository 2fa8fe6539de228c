use std::borrow::Cow;

use chrono::NaiveDateTime;
use serde::Serialize;

use lotto_db::ingest::normalize_history;
use lotto_db::models::{DrawRecord, OutletRegistry};

use crate::combinatorial::{analyze_combinatorial, CombinatorialReport};
use crate::config::StatsConfig;
use crate::dormancy::{analyze_dormancy, DormancyReport};
use crate::error::StatsError;
use crate::financial::{analyze_financials, FinancialReport};
use crate::frequency::{analyze_frequency, FrequencyReport};
use crate::insight::{analyze_draw, DrawInsight};
use crate::outlet::{analyze_outlets, OutletReport};
use crate::pattern::{analyze_patterns, PatternReport};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LottoReport {
    pub total_draws: usize,
    pub first_draw: u32,
    pub last_draw: u32,
    pub frequency: FrequencyReport,
    pub patterns: PatternReport,
    pub combinatorial: CombinatorialReport,
    pub dormancy: DormancyReport,
    pub outlets: OutletReport,
    pub financial: FinancialReport,
    pub latest_draw: DrawInsight,
    /// Most recent `updated_at` among the source records.
    pub updated_at: Option<NaiveDateTime>,
}

fn ascending(draws: &[DrawRecord]) -> Cow<'_, [DrawRecord]> {
    if draws.windows(2).all(|w| w[0].draw_no < w[1].draw_no) {
        Cow::Borrowed(draws)
    } else {
        log::warn!("draw history not strictly ascending, normalizing {} records", draws.len());
        Cow::Owned(normalize_history(draws.to_vec()))
    }
}

/// Runs every analyzer over the full history and merges the results.
///
/// The analyzers share nothing but the read-only input, so they run on the
/// rayon pool; the result is the same as running them one after another.
pub fn build_report(
    draws: &[DrawRecord],
    registry: &OutletRegistry,
    config: &StatsConfig,
) -> Result<LottoReport, StatsError> {
    if draws.is_empty() {
        return Err(StatsError::EmptyHistory);
    }
    let draws = ascending(draws);
    let draws = draws.as_ref();

    let (first, last) = match (draws.first(), draws.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(StatsError::EmptyHistory),
    };

    let ((frequency, patterns), ((combinatorial, dormancy), (outlets, financial))) = rayon::join(
        || {
            rayon::join(
                || analyze_frequency(draws, config),
                || analyze_patterns(draws, config),
            )
        },
        || {
            rayon::join(
                || {
                    rayon::join(
                        || analyze_combinatorial(draws, config),
                        || analyze_dormancy(draws, config),
                    )
                },
                || {
                    rayon::join(
                        || analyze_outlets(draws, registry, config),
                        || analyze_financials(draws, config),
                    )
                },
            )
        },
    );

    log::info!(
        "report built: {} draws ({}..={}), {} outlet wins",
        draws.len(),
        first.draw_no,
        last.draw_no,
        outlets.total_wins
    );

    Ok(LottoReport {
        total_draws: draws.len(),
        first_draw: first.draw_no,
        last_draw: last.draw_no,
        frequency,
        patterns,
        combinatorial,
        dormancy,
        outlets,
        financial,
        latest_draw: analyze_draw(last, config),
        updated_at: draws.iter().filter_map(|d| d.updated_at).max(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lotto_db::models::{make_test_draws, PurchaseMethod, WinningOutlet};

    #[test]
    fn test_empty_history() {
        let result = build_report(&[], &OutletRegistry::new(), &StatsConfig::default());
        assert_eq!(result, Err(StatsError::EmptyHistory));
    }

    #[test]
    fn test_report_summary_fields() {
        let draws = make_test_draws(20);
        let report = build_report(&draws, &OutletRegistry::new(), &StatsConfig::default()).unwrap();
        assert_eq!(report.total_draws, 20);
        assert_eq!(report.first_draw, 1);
        assert_eq!(report.last_draw, 20);
        assert_eq!(report.latest_draw.draw_no, 20);
        assert_eq!(report.updated_at, None);
        assert_eq!(report.frequency.by_total.len(), 45);
    }

    #[test]
    fn test_report_is_idempotent() {
        let mut draws = make_test_draws(60);
        draws[3].winning_outlets = vec![WinningOutlet {
            outlet_id: "missing".into(),
            method: PurchaseMethod::Auto,
        }];
        let registry = OutletRegistry::new();
        let config = StatsConfig::default();

        let a = serde_json::to_string(&build_report(&draws, &registry, &config).unwrap()).unwrap();
        let b = serde_json::to_string(&build_report(&draws, &registry, &config).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unsorted_input_matches_sorted() {
        let draws = make_test_draws(15);
        let mut shuffled = draws.clone();
        shuffled.reverse();
        let registry = OutletRegistry::new();
        let config = StatsConfig::default();

        let sorted = build_report(&draws, &registry, &config).unwrap();
        let unsorted = build_report(&shuffled, &registry, &config).unwrap();
        assert_eq!(sorted, unsorted);
    }

    #[test]
    fn test_unresolved_outlet_attributed_to_unknown() {
        let mut draws = make_test_draws(3);
        draws[1].winning_outlets = vec![WinningOutlet {
            outlet_id: "999".into(),
            method: PurchaseMethod::Manual,
        }];
        let report = build_report(&draws, &OutletRegistry::new(), &StatsConfig::default()).unwrap();
        assert_eq!(report.outlets.total_wins, 1);
        assert_eq!(report.outlets.region_stats[0].region, "unknown");
        assert_eq!(report.outlets.region_stats[0].percentage, 100.0);
    }

    #[test]
    fn test_updated_at_is_latest() {
        let mut draws = make_test_draws(3);
        let at = |d: u32| {
            NaiveDate::from_ymd_opt(2025, 1, d)
                .and_then(|date| date.and_hms_opt(12, 0, 0))
                .unwrap()
        };
        draws[0].updated_at = Some(at(9));
        draws[2].updated_at = Some(at(5));
        let report = build_report(&draws, &OutletRegistry::new(), &StatsConfig::default()).unwrap();
        assert_eq!(report.updated_at, Some(at(9)));
    }
}
