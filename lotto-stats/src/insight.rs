//! Per-draw breakdown: the same measures the history-wide analyzers aggregate,
//! computed for a single draw.

use serde::Serialize;

use lotto_db::models::DrawRecord;

use crate::combinatorial::{ac_value, number_sum, prime_count};
use crate::config::StatsConfig;
use crate::financial::{method_rate, payout_rate, top_tier_net_prize, MethodRate};
use crate::pattern::{consecutive_pairs, low_high, odd_even, section_counts, SectionCounts, Split};

/// Labels for sections with no numbers, by lower bound of the section.
const SECTION_LABELS: [&str; 5] = ["1", "10", "20", "30", "40"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberProperties {
    pub sum_total: u32,
    pub odd_even: Split,
    pub low_high: Split,
    pub ac_value: u8,
    pub prime_count: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeAndSequence {
    pub section_counts: SectionCounts,
    pub consecutive_sets: u8,
    pub missing_sections: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastDigitStats {
    pub last_digit_sum: u32,
    pub duplicate_last_digits: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinnerInsight {
    pub total_payout_rate: f64,
    pub winner_method_rate: MethodRate,
    pub tax_adjusted_prize: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawInsight {
    pub draw_no: u32,
    pub number_properties: NumberProperties,
    pub range_and_sequence: RangeAndSequence,
    pub last_digit_stats: LastDigitStats,
    pub winner_insight: WinnerInsight,
}

pub fn last_digit_stats(numbers: &[u8]) -> LastDigitStats {
    let mut counts = [0u8; 10];
    for &n in numbers {
        counts[(n % 10) as usize] += 1;
    }
    LastDigitStats {
        last_digit_sum: numbers.iter().map(|&n| (n % 10) as u32).sum(),
        duplicate_last_digits: (0..10u8).filter(|&d| counts[d as usize] >= 2).collect(),
    }
}

pub fn analyze_draw(draw: &DrawRecord, config: &StatsConfig) -> DrawInsight {
    let sections = section_counts(&draw.numbers);

    DrawInsight {
        draw_no: draw.draw_no,
        number_properties: NumberProperties {
            sum_total: number_sum(&draw.numbers),
            odd_even: odd_even(&draw.numbers),
            low_high: low_high(&draw.numbers),
            ac_value: ac_value(&draw.numbers),
            prime_count: prime_count(&draw.numbers),
        },
        range_and_sequence: RangeAndSequence {
            section_counts: sections,
            consecutive_sets: consecutive_pairs(&draw.numbers).len() as u8,
            missing_sections: sections.missing().map(|i| SECTION_LABELS[i]).collect(),
        },
        last_digit_stats: last_digit_stats(&draw.numbers),
        winner_insight: WinnerInsight {
            total_payout_rate: payout_rate(draw),
            winner_method_rate: method_rate(draw),
            tax_adjusted_prize: top_tier_net_prize(draw, config),
        },
    }
}
