use serde::Serialize;

use lotto_db::models::{all_numbers, DrawRecord, MAX_NUMBER};

use crate::config::StatsConfig;
use crate::math::{mean, round_to};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberDormancy {
    pub number: u8,
    pub current_dormant: u32,
    pub avg_dormant: f64,
    pub max_dormant: u32,
    pub appearance_count: u32,
    pub last_seen_draw: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DormancyReport {
    pub latest_draw: u32,
    pub top_current: Vec<NumberDormancy>,
    pub top_average: Vec<NumberDormancy>,
    pub absent_recent: Vec<u8>,
    pub overall: Vec<NumberDormancy>,
}

/// Per-number "last seen" state, fed one draw at a time in ascending order.
#[derive(Debug, Clone)]
struct Tracker {
    last_seen: [u32; MAX_NUMBER as usize + 1],
    periods: Vec<Vec<u32>>,
    latest: u32,
}

impl Tracker {
    fn new() -> Self {
        Self {
            last_seen: [0; MAX_NUMBER as usize + 1],
            periods: vec![Vec::new(); MAX_NUMBER as usize + 1],
            latest: 0,
        }
    }

    fn observe(&mut self, draw: &DrawRecord) {
        for &n in &draw.numbers {
            let i = n as usize;
            let last = self.last_seen[i];
            if last > 0 {
                self.periods[i].push(draw.draw_no.saturating_sub(last + 1));
            }
            self.last_seen[i] = draw.draw_no;
        }
        self.latest = self.latest.max(draw.draw_no);
    }

    fn summary(&self, number: u8) -> NumberDormancy {
        let i = number as usize;
        let last = self.last_seen[i];
        let periods = &self.periods[i];
        let as_f64: Vec<f64> = periods.iter().map(|&p| p as f64).collect();

        NumberDormancy {
            number,
            current_dormant: if last > 0 {
                self.latest - last
            } else {
                self.latest
            },
            avg_dormant: round_to(mean(&as_f64), 2),
            max_dormant: periods.iter().copied().max().unwrap_or(0),
            appearance_count: if last > 0 { periods.len() as u32 + 1 } else { 0 },
            last_seen_draw: last,
        }
    }
}

/// Numbers that appear in none of the last `window` draws, ascending.
pub fn absent_recent(draws: &[DrawRecord], window: usize) -> Vec<u8> {
    let start = draws.len().saturating_sub(window);
    let mut seen = [false; MAX_NUMBER as usize + 1];
    for draw in &draws[start..] {
        for &n in &draw.numbers {
            seen[n as usize] = true;
        }
    }
    all_numbers().filter(|&n| !seen[n as usize]).collect()
}

/// Expects `draws` ascending by draw number.
pub fn analyze_dormancy(draws: &[DrawRecord], config: &StatsConfig) -> DormancyReport {
    let mut tracker = Tracker::new();
    for draw in draws {
        tracker.observe(draw);
    }

    let overall: Vec<NumberDormancy> = all_numbers().map(|n| tracker.summary(n)).collect();

    let mut by_current = overall.clone();
    by_current.sort_by(|a, b| {
        b.current_dormant
            .cmp(&a.current_dormant)
            .then(a.number.cmp(&b.number))
    });
    by_current.truncate(config.top_n);

    let mut by_average = overall.clone();
    by_average.sort_by(|a, b| {
        b.avg_dormant
            .total_cmp(&a.avg_dormant)
            .then(a.number.cmp(&b.number))
    });
    by_average.truncate(config.top_n);

    DormancyReport {
        latest_draw: tracker.latest,
        top_current: by_current,
        top_average: by_average,
        absent_recent: absent_recent(draws, config.recent_window),
        overall,
    }
}
