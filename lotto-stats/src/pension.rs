use std::collections::BTreeMap;

use serde::Serialize;

use lotto_db::models::{PensionDrawRecord, PensionStoreList, TierLabel, PICK_COUNT};

use crate::error::StatsError;
use crate::math::{percentage, round_to};
use crate::outlet::{RegionCount, UNKNOWN_REGION};
use crate::tally::Tally;

const TOP_STORES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount {
    pub group: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigitCount {
    pub number: u8,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionFrequency {
    /// 1-based digit position.
    pub position: usize,
    pub stats: Vec<DigitCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStats {
    pub tier: TierLabel,
    pub average_winners: f64,
    pub max_winners: u64,
    pub min_winners: u64,
    pub total_winners: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreCount {
    pub name: String,
    pub count: u64,
}

/// Wins per region and per shop name, over every tier of every store list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PensionStoreReport {
    pub draws_with_stores: usize,
    pub region_stats: Vec<RegionCount>,
    pub top_stores: Vec<StoreCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PensionReport {
    pub total_draws: usize,
    pub first_draw: u32,
    pub last_draw: u32,
    pub group_frequency: Vec<GroupCount>,
    pub position_frequency: Vec<PositionFrequency>,
    pub bonus_frequency: Vec<PositionFrequency>,
    pub tier_stats: Vec<TierStats>,
    pub stores: PensionStoreReport,
}

fn position_frequency(tallies: &[Tally<u8>], total: u64) -> Vec<PositionFrequency> {
    tallies
        .iter()
        .enumerate()
        .map(|(i, tally)| PositionFrequency {
            position: i + 1,
            stats: tally
                .most_common()
                .into_iter()
                .map(|(number, count)| DigitCount {
                    number,
                    count,
                    percentage: percentage(count, total, 2),
                })
                .collect(),
        })
        .collect()
}

fn tier_stats(draws: &[PensionDrawRecord]) -> Vec<TierStats> {
    let mut by_tier: BTreeMap<&TierLabel, Vec<u64>> = BTreeMap::new();
    for draw in draws {
        for tier in &draw.prize_tiers {
            by_tier.entry(&tier.tier).or_default().push(tier.winner_count);
        }
    }

    by_tier
        .into_iter()
        .map(|(tier, counts)| {
            let total: u64 = counts.iter().sum();
            TierStats {
                tier: tier.clone(),
                average_winners: round_to(total as f64 / counts.len() as f64, 2),
                max_winners: counts.iter().copied().max().unwrap_or(0),
                min_winners: counts.iter().copied().min().unwrap_or(0),
                total_winners: total,
            }
        })
        .collect()
}

pub fn analyze_pension_stores(lists: &[PensionStoreList]) -> PensionStoreReport {
    let mut regions: Tally<&str> = Tally::new();
    let mut names: Tally<&str> = Tally::new();
    for store in lists.iter().flat_map(|l| &l.stores) {
        regions.add(store.region().unwrap_or(UNKNOWN_REGION));
        names.add(store.name.as_str());
    }

    let total = regions.total();
    let region_stats = regions
        .most_common()
        .into_iter()
        .map(|(region, count)| RegionCount {
            region: region.to_string(),
            count,
            percentage: percentage(count, total, 2),
        })
        .collect();

    let mut top_stores: Vec<StoreCount> = names
        .most_common()
        .into_iter()
        .map(|(name, count)| StoreCount {
            name: name.to_string(),
            count,
        })
        .collect();
    top_stores.truncate(TOP_STORES);

    PensionStoreReport {
        draws_with_stores: lists.iter().filter(|l| !l.stores.is_empty()).count(),
        region_stats,
        top_stores,
    }
}

/// Frequency, prize-tier and winning-store statistics for the pension game.
/// Draws are expected ascending by draw number. `stores` may be empty.
pub fn build_pension_report(
    draws: &[PensionDrawRecord],
    stores: &[PensionStoreList],
) -> Result<PensionReport, StatsError> {
    let (first, last) = match (draws.first(), draws.last()) {
        (Some(first), Some(last)) => (first.draw_no, last.draw_no),
        _ => return Err(StatsError::EmptyHistory),
    };

    let total = draws.len() as u64;
    let mut groups: Tally<&str> = Tally::new();
    let mut positions: Vec<Tally<u8>> = vec![Tally::new(); PICK_COUNT];
    let mut bonus_positions: Vec<Tally<u8>> = vec![Tally::new(); PICK_COUNT];

    for draw in draws {
        if !draw.group.is_empty() {
            groups.add(draw.group.as_str());
        }
        for (tally, &digit) in positions.iter_mut().zip(&draw.numbers) {
            tally.add(digit);
        }
        if draw.bonus_numbers.len() == PICK_COUNT {
            for (tally, &digit) in bonus_positions.iter_mut().zip(&draw.bonus_numbers) {
                tally.add(digit);
            }
        } else {
            log::debug!(
                "pension draw {}: {} bonus digits, skipped in bonus frequency",
                draw.draw_no,
                draw.bonus_numbers.len()
            );
        }
    }

    let group_frequency = groups
        .most_common()
        .into_iter()
        .map(|(group, count)| GroupCount {
            group: group.to_string(),
            count,
            percentage: percentage(count, total, 2),
        })
        .collect();

    log::info!("pension report: {} draws ({}..={})", total, first, last);

    Ok(PensionReport {
        total_draws: draws.len(),
        first_draw: first,
        last_draw: last,
        group_frequency,
        position_frequency: position_frequency(&positions, total),
        bonus_frequency: position_frequency(&bonus_positions, total),
        tier_stats: tier_stats(draws),
        stores: analyze_pension_stores(stores),
    })
}
