use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::IngestError;

pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 45;
pub const PICK_COUNT: usize = 6;

/// Numeric rank the pension provider uses for its bonus tier.
/// Inferred from a single sample payload; other seasons may differ.
pub const PENSION_BONUS_RANK: u8 = 8;

/// Anything identified by a draw number, so histories of either game can be ordered the same way.
pub trait Numbered {
    fn draw_no(&self) -> u32;
}

/// Every number that can be drawn, in ascending order.
pub fn all_numbers() -> impl Iterator<Item = u8> {
    MIN_NUMBER..=MAX_NUMBER
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawRecord {
    pub draw_no: u32,
    pub draw_date: Option<NaiveDate>,
    pub numbers: [u8; PICK_COUNT],
    pub bonus_number: u8,
    pub prize_tiers: Vec<PrizeTier>,
    pub total_sales_amount: u64,
    pub winning_outlets: Vec<WinningOutlet>,
    pub updated_at: Option<NaiveDateTime>,
}

impl DrawRecord {
    /// A draw carrying only its numbers; every optional field is empty.
    pub fn new(draw_no: u32, numbers: [u8; PICK_COUNT], bonus_number: u8) -> Self {
        Self {
            draw_no,
            draw_date: None,
            numbers,
            bonus_number,
            prize_tiers: Vec::new(),
            total_sales_amount: 0,
            winning_outlets: Vec::new(),
            updated_at: None,
        }
    }

    pub fn sorted_numbers(&self) -> [u8; PICK_COUNT] {
        let mut sorted = self.numbers;
        sorted.sort_unstable();
        sorted
    }

    pub fn tier(&self, rank: u8) -> Option<&PrizeTier> {
        self.prize_tiers.iter().find(|t| t.tier == TierLabel::Rank(rank))
    }
}

impl Numbered for DrawRecord {
    fn draw_no(&self) -> u32 {
        self.draw_no
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrizeTier {
    pub tier: TierLabel,
    pub winner_count: u64,
    pub prize_per_winner: u64,
    pub total_prize: Option<u64>,
}

impl PrizeTier {
    /// Total paid for the tier: the reported total when present, otherwise count × amount.
    pub fn paid_out(&self) -> u64 {
        self.total_prize
            .unwrap_or_else(|| self.winner_count.saturating_mul(self.prize_per_winner))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TierLabel {
    Rank(u8),
    Bonus,
    Other(String),
}

impl TierLabel {
    /// Accepts "1등", "1", "1st", "보너스", "bonus"; anything else is kept verbatim.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label == "보너스" || label.eq_ignore_ascii_case("bonus") {
            return TierLabel::Bonus;
        }
        let digits = label
            .trim_end_matches('등')
            .trim_end_matches(|c: char| c.is_ascii_alphabetic());
        match digits.parse::<u8>() {
            Ok(rank) => TierLabel::Rank(rank),
            Err(_) => TierLabel::Other(label.to_string()),
        }
    }

    /// Pension payloads report the bonus tier as a plain rank number.
    pub fn for_pension(self) -> Self {
        match self {
            TierLabel::Rank(PENSION_BONUS_RANK) => TierLabel::Bonus,
            other => other,
        }
    }
}

impl std::fmt::Display for TierLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierLabel::Rank(rank) => write!(f, "{}", rank),
            TierLabel::Bonus => write!(f, "bonus"),
            TierLabel::Other(label) => write!(f, "{}", label),
        }
    }
}

impl Serialize for TierLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PurchaseMethod {
    Auto,
    Manual,
    SemiAuto,
    Unknown,
}

impl PurchaseMethod {
    /// Exact match only: "반자동" must not be read as "자동".
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "자동" | "auto" => PurchaseMethod::Auto,
            "수동" | "manual" => PurchaseMethod::Manual,
            "반자동" | "semi-auto" | "semi" => PurchaseMethod::SemiAuto,
            _ => PurchaseMethod::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseMethod::Auto => "auto",
            PurchaseMethod::Manual => "manual",
            PurchaseMethod::SemiAuto => "semi-auto",
            PurchaseMethod::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PurchaseMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinningOutlet {
    pub outlet_id: String,
    pub method: PurchaseMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PensionDrawRecord {
    pub draw_no: u32,
    pub draw_date: Option<NaiveDate>,
    pub group: String,
    pub numbers: [u8; PICK_COUNT],
    pub bonus_group: String,
    pub bonus_numbers: Vec<u8>,
    pub prize_tiers: Vec<PensionTier>,
}

impl Numbered for PensionDrawRecord {
    fn draw_no(&self) -> u32 {
        self.draw_no
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PensionTier {
    pub tier: TierLabel,
    pub winner_count: u64,
}

/// A shop credited with a pension-game win. The pension store lists carry no
/// ids, so the name is the only key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PensionWinningStore {
    pub tier: TierLabel,
    pub name: String,
    pub address: String,
}

impl PensionWinningStore {
    pub fn region(&self) -> Option<&str> {
        address_parts(&self.address).0
    }
}

/// Winning shops of one pension draw, across the first, second and bonus tiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PensionStoreList {
    pub draw_no: u32,
    pub stores: Vec<PensionWinningStore>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WinHistory {
    pub first_prize_draws: Vec<u32>,
    pub second_prize_draws: Vec<u32>,
}

impl WinHistory {
    pub fn first_prize_count(&self) -> usize {
        self.first_prize_draws.len()
    }

    pub fn second_prize_count(&self) -> usize {
        self.second_prize_draws.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletRecord {
    pub outlet_id: String,
    pub name: String,
    pub address: String,
    pub win_history: WinHistory,
}

impl OutletRecord {
    pub fn region(&self) -> Option<&str> {
        address_parts(&self.address).0
    }

    pub fn city(&self) -> Option<&str> {
        address_parts(&self.address).1
    }
}

pub type OutletRegistry = HashMap<String, OutletRecord>;

/// Splits "서울 강서구  까치산로 177" into (province, city), tolerating repeated spaces.
pub fn address_parts(address: &str) -> (Option<&str>, Option<&str>) {
    let mut tokens = address.split_whitespace();
    (tokens.next(), tokens.next())
}

pub fn validate_numbers(draw_no: u32, numbers: &[i64]) -> Result<[u8; PICK_COUNT], IngestError> {
    let invalid = || IngestError::InvalidNumbers {
        draw_no,
        numbers: numbers.to_vec(),
    };
    if numbers.len() != PICK_COUNT {
        return Err(invalid());
    }
    let mut out = [0u8; PICK_COUNT];
    for (slot, &n) in out.iter_mut().zip(numbers) {
        if n < MIN_NUMBER as i64 || n > MAX_NUMBER as i64 {
            return Err(invalid());
        }
        *slot = n as u8;
    }
    for i in 0..out.len() {
        for j in (i + 1)..out.len() {
            if out[i] == out[j] {
                return Err(invalid());
            }
        }
    }
    Ok(out)
}

pub fn validate_bonus(draw_no: u32, bonus: i64) -> Result<u8, IngestError> {
    if bonus < MIN_NUMBER as i64 || bonus > MAX_NUMBER as i64 {
        return Err(IngestError::InvalidBonus { draw_no, bonus });
    }
    Ok(bonus as u8)
}

/// Deterministic history for tests: draw `i` holds `b+1, b+8, ..., b+36` with `b = 3i mod 9`
/// and bonus 45, numbered from 1 upwards.
pub fn make_test_draws(n: usize) -> Vec<DrawRecord> {
    (0..n)
        .map(|i| {
            let b = ((i * 3) % 9) as u8;
            DrawRecord::new(
                (i + 1) as u32,
                [b + 1, b + 8, b + 15, b + 22, b + 29, b + 36],
                MAX_NUMBER,
            )
        })
        .collect()
}
