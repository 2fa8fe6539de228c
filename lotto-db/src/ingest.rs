//! Turns crawler-shaped JSON into typed records.
//!
//! Required fields (draw number, main numbers, bonus) reject the record.
//! Everything else falls back to an empty/zero default with a warning, so the
//! analyzers never have to second-guess their input.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::IngestError;
use crate::models::{
    validate_bonus, validate_numbers, DrawRecord, Numbered, OutletRecord, OutletRegistry,
    PensionDrawRecord, PensionStoreList, PensionTier, PensionWinningStore, PrizeTier,
    PurchaseMethod, TierLabel, WinHistory, WinningOutlet, PICK_COUNT,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDraw {
    pub draw_no: Option<u32>,
    pub draw_date: Option<String>,
    pub numbers: Option<Vec<Value>>,
    pub bonus_number: Option<Value>,
    pub prize_info: Option<Vec<RawPrizeTier>>,
    pub total_sales_amount: Option<Value>,
    pub first_prize_store_info: Option<Vec<RawStoreInfo>>,
    pub first_prize_store_ids: Option<Vec<Value>>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPrizeTier {
    pub rank: Option<Value>,
    pub total_prize: Option<Value>,
    pub winner_count: Option<Value>,
    pub prize_per_winner: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawStoreInfo {
    pub store_id: Option<Value>,
    #[serde(rename = "type")]
    pub method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPensionDraw {
    pub draw_no: Option<u32>,
    pub draw_date: Option<String>,
    pub group: Option<Value>,
    pub numbers: Option<Value>,
    pub bonus_group: Option<Value>,
    pub bonus_numbers: Option<Value>,
    pub prize_info: Option<Vec<RawPensionTier>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPensionTier {
    pub rank: Option<Value>,
    pub winner_count: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPensionStores {
    pub first_prize_store_info: Option<Vec<RawPensionStore>>,
    pub second_prize_store_info: Option<Vec<RawPensionStore>>,
    pub bonus_prize_store_info: Option<Vec<RawPensionStore>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPensionStore {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawOutlet {
    pub store_id: Option<Value>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub first_prize_draws: Option<Vec<u32>>,
    pub second_prize_draws: Option<Vec<u32>>,
}

/// Parses "2,357,299,875", " 1000 " and "" (as 0). Signs and fractions are rejected.
pub fn parse_amount(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Some(0);
    }
    cleaned.parse::<u64>().ok()
}

/// Accepts "2024-01-06", "20240106" and "2024.01.06".
pub fn parse_draw_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%Y%m%d", "%Y.%m.%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Naive ISO timestamps as written by the crawler, or RFC 3339 (converted to UTC).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    raw.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
}

fn amount_from(value: Option<&Value>, field: &str, draw_no: u32) -> u64 {
    let parsed = match value {
        None | Some(Value::Null) => return 0,
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => parse_amount(s),
        Some(_) => None,
    };
    parsed.unwrap_or_else(|| {
        warn!("draw {}: unparseable {} {:?}, using 0", draw_no, field, value);
        0
    })
}

fn optional_amount(value: Option<&Value>, field: &str, draw_no: u32) -> Option<u64> {
    match value {
        None | Some(Value::Null) => None,
        some => Some(amount_from(some, field, draw_no)),
    }
}

fn int_from(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn tier_from(value: &Value) -> Option<TierLabel> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|r| u8::try_from(r).ok())
            .map(TierLabel::Rank),
        Value::String(s) => Some(TierLabel::parse(s)),
        _ => None,
    }
}

/// A digit sequence given either as "123456" or as ["1", "2", ...] / [1, 2, ...].
fn digits_from(value: &Value) -> Option<Vec<u8>> {
    let digit = |c: char| c.to_digit(10).map(|d| d as u8);
    match value {
        Value::String(s) => s.trim().chars().map(digit).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) => n.as_u64().filter(|d| *d <= 9).map(|d| d as u8),
                Value::String(s) => {
                    let mut chars = s.trim().chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => digit(c),
                        _ => None,
                    }
                }
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

fn date_from(raw: Option<&str>, draw_no: u32) -> Option<NaiveDate> {
    match raw {
        None => {
            warn!("draw {}: missing draw_date", draw_no);
            None
        }
        Some(raw) => {
            let parsed = parse_draw_date(raw);
            if parsed.is_none() {
                warn!("draw {}: unparseable draw_date '{}'", draw_no, raw);
            }
            parsed
        }
    }
}

impl RawDraw {
    pub fn into_record(self) -> Result<DrawRecord, IngestError> {
        let draw_no = self
            .draw_no
            .filter(|n| *n > 0)
            .ok_or(IngestError::MissingField("draw_no"))?;
        let raw_numbers = self.numbers.ok_or(IngestError::MissingField("numbers"))?;
        let ints: Vec<i64> = raw_numbers
            .iter()
            .map(|v| int_from(v).unwrap_or(0))
            .collect();
        let numbers = validate_numbers(draw_no, &ints)?;
        let bonus = self
            .bonus_number
            .as_ref()
            .and_then(int_from)
            .ok_or(IngestError::MissingField("bonus_number"))?;
        let bonus_number = validate_bonus(draw_no, bonus)?;

        let prize_tiers = match self.prize_info {
            Some(tiers) => tiers
                .into_iter()
                .filter_map(|t| {
                    let Some(tier) = t.rank.as_ref().and_then(tier_from) else {
                        warn!("draw {}: prize tier without rank skipped", draw_no);
                        return None;
                    };
                    Some(PrizeTier {
                        tier,
                        winner_count: amount_from(t.winner_count.as_ref(), "winner_count", draw_no),
                        prize_per_winner: amount_from(
                            t.prize_per_winner.as_ref(),
                            "prize_per_winner",
                            draw_no,
                        ),
                        total_prize: optional_amount(t.total_prize.as_ref(), "total_prize", draw_no),
                    })
                })
                .collect(),
            None => {
                warn!("draw {}: missing prize_info, no tiers recorded", draw_no);
                Vec::new()
            }
        };

        if self.total_sales_amount.is_none() {
            warn!("draw {}: missing total_sales_amount, using 0", draw_no);
        }
        let total_sales_amount =
            amount_from(self.total_sales_amount.as_ref(), "total_sales_amount", draw_no);

        let winning_outlets = match (self.first_prize_store_info, self.first_prize_store_ids) {
            (Some(info), _) => info
                .into_iter()
                .filter_map(|s| {
                    let outlet_id = s.store_id.as_ref().and_then(text_from)?;
                    let method = s
                        .method
                        .as_deref()
                        .map(PurchaseMethod::from_tag)
                        .unwrap_or(PurchaseMethod::Unknown);
                    Some(WinningOutlet { outlet_id, method })
                })
                .collect(),
            (None, Some(ids)) => ids
                .iter()
                .filter_map(text_from)
                .map(|outlet_id| WinningOutlet {
                    outlet_id,
                    method: PurchaseMethod::Unknown,
                })
                .collect(),
            (None, None) => {
                debug!("draw {}: no winning outlet information", draw_no);
                Vec::new()
            }
        };

        let updated_at = self.updated_at.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!("draw {}: unparseable updated_at '{}'", draw_no, raw);
            }
            parsed
        });

        Ok(DrawRecord {
            draw_no,
            draw_date: date_from(self.draw_date.as_deref(), draw_no),
            numbers,
            bonus_number,
            prize_tiers,
            total_sales_amount,
            winning_outlets,
            updated_at,
        })
    }
}

impl RawPensionDraw {
    pub fn into_record(self) -> Result<PensionDrawRecord, IngestError> {
        let draw_no = self
            .draw_no
            .filter(|n| *n > 0)
            .ok_or(IngestError::MissingField("draw_no"))?;
        let raw_numbers = self.numbers.ok_or(IngestError::MissingField("numbers"))?;
        let numbers: [u8; PICK_COUNT] = digits_from(&raw_numbers)
            .and_then(|d| d.try_into().ok())
            .ok_or_else(|| IngestError::InvalidDigits {
                draw_no,
                raw: raw_numbers.to_string(),
            })?;

        let group = self.group.as_ref().and_then(text_from).unwrap_or_else(|| {
            warn!("draw {}: missing group, using empty", draw_no);
            String::new()
        });
        let bonus_group = self
            .bonus_group
            .as_ref()
            .and_then(text_from)
            .unwrap_or_default();
        let bonus_numbers = match self.bonus_numbers.as_ref().map(digits_from) {
            Some(Some(digits)) if digits.len() == PICK_COUNT => digits,
            Some(_) => {
                warn!("draw {}: malformed bonus_numbers ignored", draw_no);
                Vec::new()
            }
            None => {
                warn!("draw {}: missing bonus_numbers", draw_no);
                Vec::new()
            }
        };

        let prize_tiers = self
            .prize_info
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| {
                let tier = t.rank.as_ref().and_then(tier_from)?.for_pension();
                Some(PensionTier {
                    tier,
                    winner_count: amount_from(t.winner_count.as_ref(), "winner_count", draw_no),
                })
            })
            .collect();

        Ok(PensionDrawRecord {
            draw_no,
            draw_date: date_from(self.draw_date.as_deref(), draw_no),
            group,
            numbers,
            bonus_group,
            bonus_numbers,
            prize_tiers,
        })
    }
}

impl RawPensionStores {
    /// Entries lacking a name or an address are dropped.
    pub fn into_list(self, draw_no: u32) -> PensionStoreList {
        let tiers = [
            (TierLabel::Rank(1), self.first_prize_store_info),
            (TierLabel::Rank(2), self.second_prize_store_info),
            (TierLabel::Bonus, self.bonus_prize_store_info),
        ];
        let mut stores = Vec::new();
        for (tier, entries) in tiers {
            for entry in entries.unwrap_or_default() {
                match (entry.name, entry.address) {
                    (Some(name), Some(address)) => stores.push(PensionWinningStore {
                        tier: tier.clone(),
                        name: name.trim().to_string(),
                        address: address.trim().to_string(),
                    }),
                    _ => debug!(
                        "pension draw {}: tier {} store without name or address",
                        draw_no, tier
                    ),
                }
            }
        }
        PensionStoreList { draw_no, stores }
    }
}

impl RawOutlet {
    /// `key` is the registry key, used when the entry does not repeat its own id.
    pub fn into_record(self, key: &str) -> OutletRecord {
        let outlet_id = self
            .store_id
            .as_ref()
            .and_then(text_from)
            .unwrap_or_else(|| key.to_string());
        let address = self.address.unwrap_or_else(|| {
            warn!("outlet {}: missing address", outlet_id);
            String::new()
        });
        OutletRecord {
            name: self.name.unwrap_or_default(),
            address: address.trim().to_string(),
            win_history: WinHistory {
                first_prize_draws: self.first_prize_draws.unwrap_or_default(),
                second_prize_draws: self.second_prize_draws.unwrap_or_default(),
            },
            outlet_id,
        }
    }
}

pub fn parse_draw(json: &str) -> Result<DrawRecord, IngestError> {
    serde_json::from_str::<RawDraw>(json)?.into_record()
}

pub fn parse_pension_draw(json: &str) -> Result<PensionDrawRecord, IngestError> {
    serde_json::from_str::<RawPensionDraw>(json)?.into_record()
}

/// Parses one per-draw pension store file. The draw number comes from the
/// file name, since the payload does not repeat it.
pub fn parse_pension_stores(draw_no: u32, json: &str) -> Result<PensionStoreList, IngestError> {
    Ok(serde_json::from_str::<RawPensionStores>(json)?.into_list(draw_no))
}

/// Parses the `{ "<id>": { ... }, ... }` registry file.
pub fn parse_registry(json: &str) -> Result<OutletRegistry, IngestError> {
    let raw: HashMap<String, RawOutlet> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|(key, outlet)| {
            let record = outlet.into_record(&key);
            (record.outlet_id.clone(), record)
        })
        .collect())
}

/// Orders a history by ascending draw number and drops repeated draw numbers,
/// keeping the first occurrence.
pub fn normalize_history<T: Numbered>(mut records: Vec<T>) -> Vec<T> {
    records.sort_by_key(|r| r.draw_no());
    let mut out: Vec<T> = Vec::with_capacity(records.len());
    for record in records {
        if out.last().is_some_and(|last| last.draw_no() == record.draw_no()) {
            warn!("duplicate draw {} dropped", record.draw_no());
            continue;
        }
        out.push(record);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_test_draws;

    const SAMPLE_DRAW: &str = r#"{
        "draw_no": 1100,
        "draw_date": "2024-01-06",
        "numbers": [32, 1, 20, 4, 16, 2],
        "bonus_number": 45,
        "prize_info": [
            {"rank": "1등", "total_prize": "23,572,998,750", "winner_count": "10", "prize_per_winner": "2357299875"},
            {"rank": "2등", "winner_count": "70", "prize_per_winner": "56126187"}
        ],
        "total_sales_amount": "117,000,000,000",
        "first_prize_store_info": [
            {"store_id": "11100001", "type": "자동"},
            {"store_id": 11100002, "type": "반자동"},
            {"type": "수동"}
        ],
        "analysis_stats": {"ignored": true},
        "updated_at": "2024-01-06T21:05:13.123456"
    }"#;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("2,357,299,875"), Some(2_357_299_875));
        assert_eq!(parse_amount(" 1000 "), Some(1000));
        assert_eq!(parse_amount(""), Some(0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("-5"), None);
    }

    #[test]
    fn test_parse_draw_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 6);
        assert_eq!(parse_draw_date("2024-01-06"), expected);
        assert_eq!(parse_draw_date("20240106"), expected);
        assert_eq!(parse_draw_date("2024.01.06"), expected);
        assert_eq!(parse_draw_date("06/01/2024"), None);
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-01-06T21:05:13.123456").is_some());
        assert!(parse_timestamp("2024-01-06T21:05:13").is_some());
        assert!(parse_timestamp("2024-01-06T21:05:13+09:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_parse_draw_full() {
        let draw = parse_draw(SAMPLE_DRAW).unwrap();
        assert_eq!(draw.draw_no, 1100);
        assert_eq!(draw.numbers, [32, 1, 20, 4, 16, 2]);
        assert_eq!(draw.bonus_number, 45);
        assert_eq!(draw.total_sales_amount, 117_000_000_000);
        assert_eq!(draw.prize_tiers.len(), 2);

        let first = draw.tier(1).unwrap();
        assert_eq!(first.total_prize, Some(23_572_998_750));
        assert_eq!(first.prize_per_winner, 2_357_299_875);
        assert_eq!(draw.tier(2).unwrap().total_prize, None);

        assert_eq!(draw.winning_outlets.len(), 2);
        assert_eq!(draw.winning_outlets[0].method, PurchaseMethod::Auto);
        assert_eq!(draw.winning_outlets[1].outlet_id, "11100002");
        assert_eq!(draw.winning_outlets[1].method, PurchaseMethod::SemiAuto);
        assert!(draw.updated_at.is_some());
    }

    #[test]
    fn test_parse_draw_missing_optionals() {
        let draw = parse_draw(r#"{"draw_no": 1, "numbers": [10, 23, 29, 33, 37, 40], "bonus_number": 16}"#)
            .unwrap();
        assert!(draw.prize_tiers.is_empty());
        assert_eq!(draw.total_sales_amount, 0);
        assert!(draw.winning_outlets.is_empty());
        assert_eq!(draw.draw_date, None);
        assert_eq!(draw.updated_at, None);
    }

    #[test]
    fn test_parse_draw_store_ids_fallback() {
        let draw = parse_draw(
            r#"{"draw_no": 2, "numbers": [9, 13, 21, 25, 32, 42], "bonus_number": 2,
                "first_prize_store_ids": ["A", "B"]}"#,
        )
        .unwrap();
        assert_eq!(draw.winning_outlets.len(), 2);
        assert!(draw
            .winning_outlets
            .iter()
            .all(|o| o.method == PurchaseMethod::Unknown));
    }

    #[test]
    fn test_parse_draw_unparseable_amounts_become_zero() {
        let draw = parse_draw(
            r#"{"draw_no": 3, "numbers": [1, 2, 3, 4, 5, 6], "bonus_number": 7,
                "total_sales_amount": "n/a",
                "prize_info": [{"rank": "1등", "winner_count": "x", "prize_per_winner": "1,000"}]}"#,
        )
        .unwrap();
        assert_eq!(draw.total_sales_amount, 0);
        assert_eq!(draw.prize_tiers[0].winner_count, 0);
        assert_eq!(draw.prize_tiers[0].prize_per_winner, 1000);
    }

    #[test]
    fn test_parse_draw_rejects_invalid() {
        assert!(matches!(
            parse_draw(r#"{"numbers": [1, 2, 3, 4, 5, 6], "bonus_number": 7}"#),
            Err(IngestError::MissingField("draw_no"))
        ));
        assert!(matches!(
            parse_draw(r#"{"draw_no": 4, "numbers": [], "bonus_number": 7}"#),
            Err(IngestError::InvalidNumbers { .. })
        ));
        assert!(matches!(
            parse_draw(r#"{"draw_no": 4, "numbers": [1, 2, 3, 4, 5, 6], "bonus_number": 0}"#),
            Err(IngestError::InvalidBonus { .. })
        ));
        assert!(matches!(
            parse_draw(r#"{"draw_no": 4, "numbers": [1, 2, 3, 4, 5, 6]}"#),
            Err(IngestError::MissingField("bonus_number"))
        ));
        assert!(matches!(parse_draw("not json"), Err(IngestError::Json(_))));
    }

    #[test]
    fn test_parse_pension_draw() {
        let draw = parse_pension_draw(
            r#"{"draw_no": 295, "draw_date": "2026-01-08", "group": "3",
                "numbers": ["1", "2", "3", "4", "5", "6"],
                "bonus_group": "각", "bonus_numbers": "988431",
                "prize_info": [{"rank": 1, "winner_count": "1"}, {"rank": 8, "winner_count": "10"},
                               {"rank": "2등", "winner_count": "4"}]}"#,
        )
        .unwrap();
        assert_eq!(draw.group, "3");
        assert_eq!(draw.numbers, [1, 2, 3, 4, 5, 6]);
        assert_eq!(draw.bonus_numbers, vec![9, 8, 8, 4, 3, 1]);
        assert_eq!(draw.prize_tiers[0].tier, TierLabel::Rank(1));
        assert_eq!(draw.prize_tiers[1].tier, TierLabel::Bonus);
        assert_eq!(draw.prize_tiers[1].winner_count, 10);
        assert_eq!(draw.prize_tiers[2].tier, TierLabel::Rank(2));
    }

    #[test]
    fn test_parse_pension_draw_bad_digits() {
        assert!(matches!(
            parse_pension_draw(r#"{"draw_no": 1, "numbers": "12a456"}"#),
            Err(IngestError::InvalidDigits { .. })
        ));
        assert!(matches!(
            parse_pension_draw(r#"{"draw_no": 1, "numbers": "12345"}"#),
            Err(IngestError::InvalidDigits { .. })
        ));
    }

    #[test]
    fn test_parse_pension_stores() {
        let list = parse_pension_stores(
            295,
            r#"{"first_prize_store_info": [{"name": "행운복권 ", "address": " 서울 종로구 1"}],
                "second_prize_store_info": [{"name": "대박"}, {"name": "명당", "address": ""}],
                "bonus_prize_store_info": [{"name": "복권방", "address": "부산 중구 2"}]}"#,
        )
        .unwrap();
        assert_eq!(list.draw_no, 295);
        assert_eq!(list.stores.len(), 3);
        assert_eq!(list.stores[0].tier, TierLabel::Rank(1));
        assert_eq!(list.stores[0].name, "행운복권");
        assert_eq!(list.stores[0].region(), Some("서울"));
        assert_eq!(list.stores[1].tier, TierLabel::Rank(2));
        assert_eq!(list.stores[1].region(), None);
        assert_eq!(list.stores[2].tier, TierLabel::Bonus);

        assert!(parse_pension_stores(1, "{}").unwrap().stores.is_empty());
        assert!(matches!(parse_pension_stores(1, "not json"), Err(IngestError::Json(_))));
    }

    #[test]
    fn test_parse_registry() {
        let registry = parse_registry(
            r#"{
                "11100001": {"store_id": "11100001", "name": "복권명당", "address": " 서울 강서구  까치산로 177 ",
                             "first_prize_draws": [1100, 1001]},
                "22": {"name": "행운", "address": ""}
            }"#,
        )
        .unwrap();
        let outlet = &registry["11100001"];
        assert_eq!(outlet.region(), Some("서울"));
        assert_eq!(outlet.city(), Some("강서구"));
        assert_eq!(outlet.win_history.first_prize_count(), 2);
        assert_eq!(outlet.win_history.second_prize_count(), 0);
        assert_eq!(registry["22"].outlet_id, "22");
        assert_eq!(registry["22"].region(), None);
    }

    #[test]
    fn test_normalize_history_sorts_and_dedups() {
        let mut draws = make_test_draws(5);
        draws.reverse();
        let mut duplicate = draws[0].clone();
        duplicate.bonus_number = 1;
        draws.push(duplicate);

        let normalized = normalize_history(draws);
        let numbers: Vec<u32> = normalized.iter().map(|d| d.draw_no).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(normalized[4].bonus_number, 45);
    }
}
