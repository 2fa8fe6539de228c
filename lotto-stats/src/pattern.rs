use std::fmt;

use serde::{Serialize, Serializer};

use lotto_db::models::{DrawRecord, PICK_COUNT};

use crate::config::StatsConfig;
use crate::math::{mean, percentage};
use crate::tally::Tally;

/// Highest number counted as "low".
pub const LOW_MAX: u8 = 22;

/// Inclusive bounds of the five number sections; the last one is only five wide.
pub const SECTION_BOUNDS: [(u8, u8); 5] = [(1, 10), (11, 20), (21, 30), (31, 40), (41, 45)];

/// A two-way split of the six numbers, shown as "left:right".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Split {
    pub left: u8,
    pub right: u8,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.left, self.right)
    }
}

impl Serialize for Split {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Numbers per section, shown as "a-b-c-d-e".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionCounts(pub [u8; 5]);

impl SectionCounts {
    pub fn missing(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().filter(|(_, c)| **c == 0).map(|(i, _)| i)
    }
}

impl fmt::Display for SectionCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e] = self.0;
        write!(f, "{}-{}-{}-{}-{}", a, b, c, d, e)
    }
}

impl Serialize for SectionCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Two adjacent numbers drawn together, shown as "12-13".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsecutivePair(pub u8, pub u8);

impl fmt::Display for ConsecutivePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

impl Serialize for ConsecutivePair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn odd_even(numbers: &[u8]) -> Split {
    let odd = numbers.iter().filter(|&&n| n % 2 == 1).count() as u8;
    Split {
        left: odd,
        right: numbers.len() as u8 - odd,
    }
}

pub fn low_high(numbers: &[u8]) -> Split {
    let low = numbers.iter().filter(|&&n| n <= LOW_MAX).count() as u8;
    Split {
        left: low,
        right: numbers.len() as u8 - low,
    }
}

pub fn section_counts(numbers: &[u8]) -> SectionCounts {
    let mut counts = [0u8; 5];
    for &n in numbers {
        if let Some(i) = SECTION_BOUNDS
            .iter()
            .position(|&(lo, hi)| (lo..=hi).contains(&n))
        {
            counts[i] += 1;
        }
    }
    SectionCounts(counts)
}

/// Adjacent pairs differing by one, after sorting.
pub fn consecutive_pairs(numbers: &[u8; PICK_COUNT]) -> Vec<ConsecutivePair> {
    let mut sorted = *numbers;
    sorted.sort_unstable();
    sorted
        .windows(2)
        .filter(|w| w[1] == w[0] + 1)
        .map(|w| ConsecutivePair(w[0], w[1]))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawPattern {
    pub draw_no: u32,
    pub odd_even: Split,
    pub low_high: Split,
    pub sections: SectionCounts,
    pub consecutive_count: u8,
}

pub fn classify(draw: &DrawRecord) -> DrawPattern {
    DrawPattern {
        draw_no: draw.draw_no,
        odd_even: odd_even(&draw.numbers),
        low_high: low_high(&draw.numbers),
        sections: section_counts(&draw.numbers),
        consecutive_count: consecutive_pairs(&draw.numbers).len() as u8,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternCount<K> {
    pub pattern: K,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternStats<K> {
    pub total: u64,
    pub stats: Vec<PatternCount<K>>,
}

fn pattern_stats<K: Eq + std::hash::Hash + Clone>(tally: &Tally<K>, total: u64) -> PatternStats<K> {
    PatternStats {
        total,
        stats: tally
            .most_common()
            .into_iter()
            .map(|(pattern, count)| PatternCount {
                pattern,
                count,
                percentage: percentage(count, total, 2),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairCount {
    pub pair: ConsecutivePair,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsecutiveStats {
    pub average: f64,
    pub max: u8,
    pub min: u8,
    pub draws_with_consecutive: u64,
    pub draws_with_consecutive_pct: f64,
    pub draws_with_multiple_consecutive: u64,
    pub draws_with_multiple_consecutive_pct: f64,
    pub top_pairs: Vec<PairCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    pub odd_even: PatternStats<Split>,
    pub low_high: PatternStats<Split>,
    pub sections: PatternStats<SectionCounts>,
    pub consecutive: ConsecutiveStats,
}

/// Aggregated pattern classes. Classes with equal counts keep the order in
/// which they first occur in the history.
pub fn analyze_patterns(draws: &[DrawRecord], config: &StatsConfig) -> PatternReport {
    let total = draws.len() as u64;
    let mut odd_even_tally = Tally::new();
    let mut low_high_tally = Tally::new();
    let mut section_tally = Tally::new();
    let mut pair_tally = Tally::new();
    let mut consecutive_counts = Vec::with_capacity(draws.len());

    for draw in draws {
        let pattern = classify(draw);
        odd_even_tally.add(pattern.odd_even);
        low_high_tally.add(pattern.low_high);
        section_tally.add(pattern.sections);
        for pair in consecutive_pairs(&draw.numbers) {
            pair_tally.add(pair);
        }
        consecutive_counts.push(pattern.consecutive_count);
    }

    let with_consecutive = consecutive_counts.iter().filter(|&&c| c >= 1).count() as u64;
    let with_multiple = consecutive_counts.iter().filter(|&&c| c >= 2).count() as u64;
    let as_f64: Vec<f64> = consecutive_counts.iter().map(|&c| c as f64).collect();

    let consecutive = ConsecutiveStats {
        average: mean(&as_f64),
        max: consecutive_counts.iter().copied().max().unwrap_or(0),
        min: consecutive_counts.iter().copied().min().unwrap_or(0),
        draws_with_consecutive: with_consecutive,
        draws_with_consecutive_pct: percentage(with_consecutive, total, 2),
        draws_with_multiple_consecutive: with_multiple,
        draws_with_multiple_consecutive_pct: percentage(with_multiple, total, 2),
        top_pairs: pair_tally
            .most_common()
            .into_iter()
            .take(config.top_n)
            .map(|(pair, count)| PairCount {
                pair,
                count,
                percentage: percentage(count, total, 2),
            })
            .collect(),
    };

    PatternReport {
        odd_even: pattern_stats(&odd_even_tally, total),
        low_high: pattern_stats(&low_high_tally, total),
        sections: pattern_stats(&section_tally, total),
        consecutive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_db::models::make_test_draws;

    #[test]
    fn test_classify_sample_draw() {
        let draw = DrawRecord::new(1, [1, 2, 4, 16, 20, 32], 45);
        let pattern = classify(&draw);
        assert_eq!(pattern.odd_even.to_string(), "1:5");
        assert_eq!(pattern.low_high.to_string(), "5:1");
        assert_eq!(pattern.sections.to_string(), "3-2-0-1-0");
        assert_eq!(pattern.consecutive_count, 1);
    }

    #[test]
    fn test_section_bounds() {
        assert_eq!(section_counts(&[10, 11, 20, 21, 40, 41]).0, [1, 2, 1, 1, 1]);
        assert_eq!(section_counts(&[30, 31, 45, 44, 43, 1]).0, [1, 0, 1, 1, 3]);
    }

    #[test]
    fn test_splits_always_sum_to_six() {
        for draw in make_test_draws(40) {
            let p = classify(&draw);
            assert_eq!(p.odd_even.left + p.odd_even.right, 6);
            assert_eq!(p.low_high.left + p.low_high.right, 6);
            assert_eq!(p.sections.0.iter().sum::<u8>(), 6);
        }
    }

    #[test]
    fn test_consecutive_pairs_unsorted_input() {
        let pairs = consecutive_pairs(&[13, 40, 12, 41, 42, 7]);
        assert_eq!(
            pairs,
            vec![
                ConsecutivePair(12, 13),
                ConsecutivePair(40, 41),
                ConsecutivePair(41, 42)
            ]
        );
    }

    #[test]
    fn test_aggregate_first_seen_tie_break() {
        let draws = vec![
            DrawRecord::new(1, [2, 4, 6, 8, 10, 12], 1),  // 0:6
            DrawRecord::new(2, [1, 3, 5, 7, 9, 11], 2),   // 6:0
            DrawRecord::new(3, [1, 3, 5, 2, 4, 6], 7),    // 3:3
            DrawRecord::new(4, [13, 15, 17, 14, 16, 18], 7), // 3:3
        ];
        let report = analyze_patterns(&draws, &StatsConfig::default());
        let labels: Vec<String> = report
            .odd_even
            .stats
            .iter()
            .map(|s| s.pattern.to_string())
            .collect();
        assert_eq!(labels, vec!["3:3", "0:6", "6:0"]);
        assert_eq!(report.odd_even.stats[0].percentage, 50.0);
        assert_eq!(report.odd_even.total, 4);
    }

    #[test]
    fn test_consecutive_aggregate() {
        let draws = vec![
            DrawRecord::new(1, [1, 2, 3, 10, 20, 30], 45), // 2 pairs
            DrawRecord::new(2, [5, 15, 25, 35, 40, 44], 1), // 0 pairs
            DrawRecord::new(3, [1, 2, 8, 18, 28, 38], 45), // 1 pair
        ];
        let stats = analyze_patterns(&draws, &StatsConfig::default()).consecutive;
        assert_eq!(stats.max, 2);
        assert_eq!(stats.min, 0);
        assert!((stats.average - 1.0).abs() < 1e-12);
        assert_eq!(stats.draws_with_consecutive, 2);
        assert_eq!(stats.draws_with_multiple_consecutive, 1);
        assert_eq!(stats.draws_with_consecutive_pct, 66.67);
        assert_eq!(stats.top_pairs[0].pair, ConsecutivePair(1, 2));
        assert_eq!(stats.top_pairs[0].count, 2);
    }

    #[test]
    fn test_empty_history() {
        let report = analyze_patterns(&[], &StatsConfig::default());
        assert_eq!(report.consecutive.average, 0.0);
        assert_eq!(report.consecutive.max, 0);
        assert!(report.odd_even.stats.is_empty());
    }

    #[test]
    fn test_keys_serialize_as_display_strings() {
        let draw = DrawRecord::new(1, [1, 2, 4, 16, 20, 32], 45);
        let json = serde_json::to_value(classify(&draw)).unwrap();
        assert_eq!(json["odd_even"], "1:5");
        assert_eq!(json["sections"], "3-2-0-1-0");
    }
}
