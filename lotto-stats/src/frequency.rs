use serde::Serialize;

use lotto_db::models::{all_numbers, DrawRecord, MAX_NUMBER, PICK_COUNT};

use crate::config::StatsConfig;
use crate::math::percentage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberFrequency {
    pub number: u8,
    pub total_count: u64,
    pub regular_count: u64,
    pub bonus_count: u64,
    pub total_pct: f64,
    pub regular_pct: f64,
    pub bonus_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyReport {
    pub by_total: Vec<NumberFrequency>,
    pub by_regular: Vec<NumberFrequency>,
    pub by_bonus: Vec<NumberFrequency>,
    pub most_frequent: Vec<NumberFrequency>,
    pub least_frequent: Vec<NumberFrequency>,
}

/// One entry per number 1-45, in ascending number order.
pub fn count_numbers(draws: &[DrawRecord]) -> Vec<NumberFrequency> {
    let mut regular = [0u64; MAX_NUMBER as usize + 1];
    let mut bonus = [0u64; MAX_NUMBER as usize + 1];

    for draw in draws {
        for &n in &draw.numbers {
            regular[n as usize] += 1;
        }
        bonus[draw.bonus_number as usize] += 1;
    }

    let n = draws.len() as u64;
    all_numbers()
        .map(|number| {
            let regular_count = regular[number as usize];
            let bonus_count = bonus[number as usize];
            let total_count = regular_count + bonus_count;
            NumberFrequency {
                number,
                total_count,
                regular_count,
                bonus_count,
                total_pct: percentage(total_count, n * (PICK_COUNT as u64 + 1), 2),
                regular_pct: percentage(regular_count, n * PICK_COUNT as u64, 2),
                bonus_pct: percentage(bonus_count, n, 2),
            }
        })
        .collect()
}

/// Descending by `key`, ascending number on ties.
fn ranked(entries: &[NumberFrequency], key: impl Fn(&NumberFrequency) -> u64) -> Vec<NumberFrequency> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| key(b).cmp(&key(a)).then(a.number.cmp(&b.number)));
    sorted
}

pub fn analyze_frequency(draws: &[DrawRecord], config: &StatsConfig) -> FrequencyReport {
    let counts = count_numbers(draws);
    let by_total = ranked(&counts, |f| f.total_count);
    let by_regular = ranked(&counts, |f| f.regular_count);
    let by_bonus = ranked(&counts, |f| f.bonus_count);

    let k = config.top_small_n.min(by_total.len());
    let most_frequent = by_total[..k].to_vec();
    let least_frequent = by_total[by_total.len() - k..].to_vec();

    FrequencyReport {
        by_total,
        by_regular,
        by_bonus,
        most_frequent,
        least_frequent,
    }
}
