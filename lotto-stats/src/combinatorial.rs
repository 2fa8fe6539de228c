use std::fmt;

use serde::{Serialize, Serializer};

use lotto_db::models::{DrawRecord, MAX_NUMBER, PICK_COUNT};

use crate::config::StatsConfig;
use crate::math::{mean, percentage, round_to};
use crate::tally::Tally;

pub const PRIMES: [u8; 14] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43];

/// Distinct absolute pairwise differences minus 5, in 0..=10.
/// Six evenly spaced numbers give 0.
pub fn ac_value(numbers: &[u8; PICK_COUNT]) -> u8 {
    let mut seen = [false; MAX_NUMBER as usize];
    let mut distinct = 0u8;
    for (i, &a) in numbers.iter().enumerate() {
        for &b in &numbers[i + 1..] {
            let diff = a.abs_diff(b) as usize;
            if !seen[diff] {
                seen[diff] = true;
                distinct += 1;
            }
        }
    }
    distinct.saturating_sub(PICK_COUNT as u8 - 1)
}

pub fn prime_count(numbers: &[u8]) -> u8 {
    numbers.iter().filter(|n| PRIMES.contains(n)).count() as u8
}

/// The five differences between consecutive sorted numbers.
pub fn gaps(numbers: &[u8; PICK_COUNT]) -> [u8; PICK_COUNT - 1] {
    let mut sorted = *numbers;
    sorted.sort_unstable();
    let mut out = [0u8; PICK_COUNT - 1];
    for (slot, w) in out.iter_mut().zip(sorted.windows(2)) {
        *slot = w[1] - w[0];
    }
    out
}

pub fn number_sum(numbers: &[u8]) -> u32 {
    numbers.iter().map(|&n| n as u32).sum()
}

/// Mean of the six numbers in tenths, rounded half up (`avg = tenths / 10`).
pub fn mean_tenths(sum: u32) -> u32 {
    (sum * 10 + 3) / PICK_COUNT as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SumRange {
    R70To90,
    R91To110,
    R111To130,
    R131To150,
    R151To170,
    R171To190,
    R191To210,
    R211To230,
    Other,
}

impl SumRange {
    pub const ALL: [SumRange; 9] = [
        SumRange::R70To90,
        SumRange::R91To110,
        SumRange::R111To130,
        SumRange::R131To150,
        SumRange::R151To170,
        SumRange::R171To190,
        SumRange::R191To210,
        SumRange::R211To230,
        SumRange::Other,
    ];

    pub fn of(sum: u32) -> Self {
        match sum {
            70..=90 => SumRange::R70To90,
            91..=110 => SumRange::R91To110,
            111..=130 => SumRange::R111To130,
            131..=150 => SumRange::R131To150,
            151..=170 => SumRange::R151To170,
            171..=190 => SumRange::R171To190,
            191..=210 => SumRange::R191To210,
            211..=230 => SumRange::R211To230,
            _ => SumRange::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SumRange::R70To90 => "70-90",
            SumRange::R91To110 => "91-110",
            SumRange::R111To130 => "111-130",
            SumRange::R131To150 => "131-150",
            SumRange::R151To170 => "151-170",
            SumRange::R171To190 => "171-190",
            SumRange::R191To210 => "191-210",
            SumRange::R211To230 => "211-230",
            SumRange::Other => "other",
        }
    }
}

impl fmt::Display for SumRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for SumRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapCount {
    pub gap: u8,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawGap {
    pub draw_no: u32,
    pub avg_gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapReport {
    pub distribution: Vec<GapCount>,
    pub most_common: Vec<GapCount>,
    pub overall_avg_gap: f64,
    pub recent_avg_gaps: Vec<DrawGap>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumBucket {
    pub range: SumRange,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumCount {
    pub sum: u32,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageCount {
    pub avg: f64,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumReport {
    pub distribution: Vec<SumBucket>,
    pub most_common_sums: Vec<SumCount>,
    pub most_common_avgs: Vec<AverageCount>,
    pub overall_avg_sum: f64,
    pub min_sum: u32,
    pub max_sum: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: u8,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityReport {
    pub average_ac: f64,
    pub ac_distribution: Vec<ValueCount>,
    pub prime_distribution: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinatorialReport {
    pub gaps: GapReport,
    pub sums: SumReport,
    pub complexity: ComplexityReport,
}

fn value_distribution(values: &[u8], total: u64) -> Vec<ValueCount> {
    let mut counts = [0u64; 256];
    for &v in values {
        counts[v as usize] += 1;
    }
    counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c > 0)
        .map(|(value, &count)| ValueCount {
            value: value as u8,
            count,
            percentage: percentage(count, total, 2),
        })
        .collect()
}

fn analyze_gaps(draws: &[DrawRecord], config: &StatsConfig) -> GapReport {
    let mut tally: Tally<u8> = Tally::new();
    let mut per_draw = Vec::with_capacity(draws.len());

    for draw in draws {
        let draw_gaps = gaps(&draw.numbers);
        for &g in &draw_gaps {
            tally.add(g);
        }
        let total: u32 = draw_gaps.iter().map(|&g| g as u32).sum();
        per_draw.push(DrawGap {
            draw_no: draw.draw_no,
            avg_gap: round_to(total as f64 / draw_gaps.len() as f64, 2),
        });
    }

    let total_gaps = tally.total();
    let to_count = |(gap, count): (u8, u64)| GapCount {
        gap,
        count,
        percentage: percentage(count, total_gaps, 2),
    };

    let mut distribution: Vec<GapCount> = tally.iter().map(|(&g, c)| to_count((g, c))).collect();
    distribution.sort_by_key(|g| g.gap);

    let averages: Vec<f64> = per_draw.iter().map(|d| d.avg_gap).collect();
    let recent_start = per_draw.len().saturating_sub(config.recent_window);

    GapReport {
        distribution,
        most_common: tally
            .most_common()
            .into_iter()
            .take(config.top_small_n)
            .map(to_count)
            .collect(),
        overall_avg_gap: round_to(mean(&averages), 2),
        recent_avg_gaps: per_draw[recent_start..].to_vec(),
    }
}

fn analyze_sums(draws: &[DrawRecord], config: &StatsConfig) -> SumReport {
    let total = draws.len() as u64;
    let sums: Vec<u32> = draws.iter().map(|d| number_sum(&d.numbers)).collect();
    let sum_tally: Tally<u32> = sums.iter().copied().collect();
    let avg_tally: Tally<u32> = sums.iter().map(|&s| mean_tenths(s)).collect();
    let bucket_tally: Tally<SumRange> = sums.iter().map(|&s| SumRange::of(s)).collect();

    let distribution = SumRange::ALL
        .iter()
        .filter_map(|range| {
            let count = bucket_tally.get(range);
            (count > 0).then(|| SumBucket {
                range: *range,
                count,
                percentage: percentage(count, total, 2),
            })
        })
        .collect();

    let as_f64: Vec<f64> = sums.iter().map(|&s| s as f64).collect();

    SumReport {
        distribution,
        most_common_sums: sum_tally
            .most_common()
            .into_iter()
            .take(config.top_n)
            .map(|(sum, count)| SumCount {
                sum,
                count,
                percentage: percentage(count, total, 2),
            })
            .collect(),
        most_common_avgs: avg_tally
            .most_common()
            .into_iter()
            .take(config.top_n)
            .map(|(tenths, count)| AverageCount {
                avg: tenths as f64 / 10.0,
                count,
                percentage: percentage(count, total, 2),
            })
            .collect(),
        overall_avg_sum: round_to(mean(&as_f64), 2),
        min_sum: sums.iter().copied().min().unwrap_or(0),
        max_sum: sums.iter().copied().max().unwrap_or(0),
    }
}

fn analyze_complexity(draws: &[DrawRecord]) -> ComplexityReport {
    let total = draws.len() as u64;
    let acs: Vec<u8> = draws.iter().map(|d| ac_value(&d.numbers)).collect();
    let primes: Vec<u8> = draws.iter().map(|d| prime_count(&d.numbers)).collect();
    let ac_f64: Vec<f64> = acs.iter().map(|&a| a as f64).collect();

    ComplexityReport {
        average_ac: round_to(mean(&ac_f64), 2),
        ac_distribution: value_distribution(&acs, total),
        prime_distribution: value_distribution(&primes, total),
    }
}

pub fn analyze_combinatorial(draws: &[DrawRecord], config: &StatsConfig) -> CombinatorialReport {
    CombinatorialReport {
        gaps: analyze_gaps(draws, config),
        sums: analyze_sums(draws, config),
        complexity: analyze_complexity(draws),
    }
}
