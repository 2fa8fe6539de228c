use serde::Serialize;

use lotto_db::models::{DrawRecord, OutletRecord, OutletRegistry, PurchaseMethod};

use crate::config::StatsConfig;
use crate::math::percentage;
use crate::tally::Tally;

/// First-level regions matched against the address prefix. Order decides
/// overlapping prefixes and is part of the report contract.
pub const FIXED_REGIONS: [&str; 17] = [
    "서울", "경기", "인천", "강원", "충북", "충남", "대전", "세종", "경북", "경남", "대구", "울산",
    "부산", "전북", "전남", "광주", "제주",
];

pub const OTHER_REGION: &str = "기타";
pub const UNKNOWN_REGION: &str = "unknown";

const TOP_OUTLETS_PER_REGION: usize = 5;

/// First entry of `FIXED_REGIONS` the address starts with, else the catch-all.
pub fn fixed_region(address: &str) -> &'static str {
    let address = address.trim_start();
    FIXED_REGIONS
        .iter()
        .find(|region| address.starts_with(*region))
        .copied()
        .unwrap_or(OTHER_REGION)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCount {
    pub region: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletCount {
    pub outlet_id: String,
    pub name: String,
    pub region: String,
    pub count: u64,
    /// Wins recorded in the registry itself, which may predate the loaded history.
    pub registry_first_prize_wins: usize,
    pub registry_second_prize_wins: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodCount {
    pub method: PurchaseMethod,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionOutlets {
    pub region: String,
    pub outlets: Vec<OutletCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutletReport {
    pub total_wins: u64,
    pub resolved_wins: u64,
    pub unresolved_wins: u64,
    pub region_stats: Vec<RegionCount>,
    pub fixed_region_stats: Vec<RegionCount>,
    pub top_regions: Vec<RegionCount>,
    pub top_outlets: Vec<OutletCount>,
    pub top_outlets_by_region: Vec<RegionOutlets>,
    pub method_stats: Vec<MethodCount>,
    pub top_cities: Vec<CityCount>,
}

fn region_counts(tally: &Tally<String>) -> Vec<RegionCount> {
    let total = tally.total();
    tally
        .most_common()
        .into_iter()
        .map(|(region, count)| RegionCount {
            region,
            count,
            percentage: percentage(count, total, 2),
        })
        .collect()
}

fn outlet_count(outlet: &OutletRecord, count: u64) -> OutletCount {
    OutletCount {
        outlet_id: outlet.outlet_id.clone(),
        name: outlet.name.clone(),
        region: fixed_region(&outlet.address).to_string(),
        count,
        registry_first_prize_wins: outlet.win_history.first_prize_count(),
        registry_second_prize_wins: outlet.win_history.second_prize_count(),
    }
}

/// Joins every winning outlet against `registry`. Unknown ids still count
/// toward the region views but never toward outlet rankings. Outlets are
/// ranked by id, so two shops trading under one name stay apart.
pub fn analyze_outlets(
    draws: &[DrawRecord],
    registry: &OutletRegistry,
    config: &StatsConfig,
) -> OutletReport {
    let mut regions: Tally<String> = Tally::new();
    let mut fixed: Tally<&'static str> = Tally::new();
    let mut outlets: Tally<&str> = Tally::new();
    let mut methods: Tally<PurchaseMethod> = Tally::new();
    let mut cities: Tally<String> = Tally::new();
    let mut unresolved = 0u64;

    for draw in draws {
        for win in &draw.winning_outlets {
            methods.add(win.method);
            match registry.get(&win.outlet_id) {
                Some(outlet) => {
                    let region = outlet.region().unwrap_or(UNKNOWN_REGION);
                    regions.add(region.to_string());
                    fixed.add(fixed_region(&outlet.address));
                    outlets.add(outlet.outlet_id.as_str());
                    if let (Some(province), Some(city)) = (outlet.region(), outlet.city()) {
                        cities.add(format!("{} {}", province, city));
                    }
                }
                None => {
                    log::warn!(
                        "draw {}: outlet {} not in registry, counted as {}",
                        draw.draw_no,
                        win.outlet_id,
                        UNKNOWN_REGION
                    );
                    unresolved += 1;
                    regions.add(UNKNOWN_REGION.to_string());
                    fixed.add(OTHER_REGION);
                }
            }
        }
    }

    let region_stats = region_counts(&regions);

    let fixed_total = fixed.total();
    let fixed_region_stats: Vec<RegionCount> = FIXED_REGIONS
        .iter()
        .chain(std::iter::once(&OTHER_REGION))
        .map(|region| {
            let count = fixed.get(region);
            RegionCount {
                region: region.to_string(),
                count,
                percentage: percentage(count, fixed_total, 2),
            }
        })
        .collect();

    let mut top_regions: Vec<RegionCount> = fixed_region_stats
        .iter()
        .filter(|r| r.count > 0)
        .cloned()
        .collect();
    top_regions.sort_by(|a, b| b.count.cmp(&a.count));
    top_regions.truncate(config.top_small_n);

    let ranked_outlets: Vec<OutletCount> = outlets
        .most_common()
        .into_iter()
        .filter_map(|(id, count)| registry.get(id).map(|o| outlet_count(o, count)))
        .collect();

    let top_outlets_by_region = FIXED_REGIONS
        .iter()
        .chain(std::iter::once(&OTHER_REGION))
        .filter_map(|region| {
            let in_region: Vec<OutletCount> = ranked_outlets
                .iter()
                .filter(|o| o.region == *region)
                .take(TOP_OUTLETS_PER_REGION)
                .cloned()
                .collect();
            (!in_region.is_empty()).then(|| RegionOutlets {
                region: region.to_string(),
                outlets: in_region,
            })
        })
        .collect();

    let method_total = methods.total();
    let method_stats = methods
        .most_common()
        .into_iter()
        .map(|(method, count)| MethodCount {
            method,
            count,
            percentage: percentage(count, method_total, 2),
        })
        .collect();

    let total_wins = fixed_total;

    OutletReport {
        total_wins,
        resolved_wins: total_wins - unresolved,
        unresolved_wins: unresolved,
        region_stats,
        fixed_region_stats,
        top_regions,
        top_outlets: ranked_outlets.into_iter().take(config.top_n).collect(),
        top_outlets_by_region,
        method_stats,
        top_cities: cities
            .most_common()
            .into_iter()
            .take(config.top_n)
            .map(|(city, count)| CityCount { city, count })
            .collect(),
    }
}
