use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use lotto_db::ingest::{
    normalize_history, parse_draw, parse_pension_draw, parse_pension_stores, parse_registry,
};
use lotto_db::models::{DrawRecord, Numbered, OutletRegistry, PensionDrawRecord, PensionStoreList};
use lotto_db::IngestError;
use lotto_stats::StatsConfig;

pub const DRAW_PREFIX: &str = "lotto_";
pub const PENSION_PREFIX: &str = "pension_";
pub const PENSION_STORES_PREFIX: &str = "stores_";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub total_files: u32,
    pub loaded: u32,
    pub errors: u32,
}

/// True for `<prefix><digits>.json`, so `lotto_stores.json` never reads as a draw.
fn is_record_file(path: &Path, prefix: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(".json"))
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

fn record_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("cannot read directory {:?}", dir))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.with_context(|| format!("cannot list {:?}", dir))?.path();
        if path.is_file() && is_record_file(&path, prefix) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_records<T: Numbered>(
    dir: &Path,
    prefix: &str,
    parse: fn(&str) -> Result<T, IngestError>,
) -> Result<(Vec<T>, LoadSummary)> {
    let mut summary = LoadSummary::default();
    let mut records = Vec::new();

    for path in record_files(dir, prefix)? {
        summary.total_files += 1;
        let parsed = fs::read_to_string(&path)
            .with_context(|| format!("cannot read {:?}", path))
            .and_then(|text| parse(&text).with_context(|| format!("invalid record in {:?}", path)));
        match parsed {
            Ok(record) => {
                summary.loaded += 1;
                records.push(record);
            }
            Err(e) => {
                log::warn!("{:#}", e);
                summary.errors += 1;
            }
        }
    }

    log::info!(
        "{}: {} of {} {}*.json files loaded",
        dir.display(),
        summary.loaded,
        summary.total_files,
        prefix
    );
    Ok((normalize_history(records), summary))
}

pub fn load_draws(dir: &Path) -> Result<(Vec<DrawRecord>, LoadSummary)> {
    load_records(dir, DRAW_PREFIX, parse_draw)
}

pub fn load_pension_draws(dir: &Path) -> Result<(Vec<PensionDrawRecord>, LoadSummary)> {
    load_records(dir, PENSION_PREFIX, parse_pension_draw)
}

/// Reads `stores_<n>.json` for every loaded pension draw. Draws without a
/// store file are skipped; unreadable files are counted as errors.
pub fn load_pension_stores(
    dir: &Path,
    draws: &[PensionDrawRecord],
) -> Result<(Vec<PensionStoreList>, LoadSummary)> {
    if !dir.is_dir() {
        bail!("pension store directory {:?} not found", dir);
    }
    let mut summary = LoadSummary::default();
    let mut lists = Vec::new();

    for draw in draws {
        let path = dir.join(format!("{}{}.json", PENSION_STORES_PREFIX, draw.draw_no));
        if !path.is_file() {
            continue;
        }
        summary.total_files += 1;
        let parsed = fs::read_to_string(&path)
            .with_context(|| format!("cannot read {:?}", path))
            .and_then(|text| {
                parse_pension_stores(draw.draw_no, &text)
                    .with_context(|| format!("invalid store list in {:?}", path))
            });
        match parsed {
            Ok(list) => {
                summary.loaded += 1;
                lists.push(list);
            }
            Err(e) => {
                log::warn!("{:#}", e);
                summary.errors += 1;
            }
        }
    }

    log::info!(
        "{}: store lists for {} of {} pension draws",
        dir.display(),
        summary.loaded,
        draws.len()
    );
    Ok((lists, summary))
}

/// A missing registry path yields an empty registry: every winning outlet is
/// then attributed to the unknown region.
pub fn load_registry(path: Option<&Path>) -> Result<OutletRegistry> {
    let Some(path) = path else {
        log::warn!("no outlet registry given, outlet attribution will be empty");
        return Ok(OutletRegistry::new());
    };
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {:?}", path))?;
    let registry =
        parse_registry(&text).with_context(|| format!("invalid outlet registry {:?}", path))?;
    log::info!("{} outlets loaded from {}", registry.len(), path.display());
    Ok(registry)
}

pub fn load_config(path: Option<&Path>) -> Result<StatsConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("cannot read {:?}", path))?;
            serde_json::from_str(&text).with_context(|| format!("invalid config {:?}", path))
        }
        None => Ok(StatsConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lotto_cli_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn draw_json(draw_no: u32) -> String {
        format!(
            r#"{{"draw_no": {}, "draw_date": "2025-01-0{}", "numbers": [1, 2, 4, 16, 20, 32], "bonus_number": 45}}"#,
            draw_no,
            draw_no % 9 + 1
        )
    }

    #[test]
    fn test_is_record_file() {
        assert!(is_record_file(Path::new("/d/lotto_1160.json"), DRAW_PREFIX));
        assert!(!is_record_file(Path::new("/d/lotto_stores.json"), DRAW_PREFIX));
        assert!(!is_record_file(Path::new("/d/lotto_.json"), DRAW_PREFIX));
        assert!(!is_record_file(Path::new("/d/pension_12.json"), DRAW_PREFIX));
        assert!(is_record_file(Path::new("/d/pension_12.json"), PENSION_PREFIX));
    }

    #[test]
    fn test_load_draws_counts_and_orders() {
        let dir = scratch_dir("draws");
        fs::write(dir.join("lotto_3.json"), draw_json(3)).unwrap();
        fs::write(dir.join("lotto_10.json"), draw_json(10)).unwrap();
        fs::write(dir.join("lotto_1.json"), draw_json(1)).unwrap();
        fs::write(dir.join("lotto_4.json"), "{not json").unwrap();
        fs::write(dir.join("lotto_5.json"), r#"{"draw_no": 5, "numbers": [1, 1, 2, 3, 4, 5], "bonus_number": 6}"#).unwrap();
        fs::write(dir.join("lotto_stores.json"), "{}").unwrap();

        let (draws, summary) = load_draws(&dir).unwrap();
        assert_eq!(
            summary,
            LoadSummary {
                total_files: 5,
                loaded: 3,
                errors: 2
            }
        );
        let numbers: Vec<u32> = draws.iter().map(|d| d.draw_no).collect();
        assert_eq!(numbers, vec![1, 3, 10]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_draws_missing_dir() {
        let dir = std::env::temp_dir().join("lotto_cli_does_not_exist_42");
        assert!(load_draws(&dir).is_err());
    }

    #[test]
    fn test_load_pension_stores_follows_draws() {
        let dir = scratch_dir("pension_stores");
        fs::write(
            dir.join("stores_1.json"),
            r#"{"first_prize_store_info": [{"name": "행운", "address": "서울 종로구"}]}"#,
        )
        .unwrap();
        fs::write(dir.join("stores_3.json"), "{oops").unwrap();
        fs::write(dir.join("stores_9.json"), "{}").unwrap();

        let draws: Vec<PensionDrawRecord> = [1, 2, 3]
            .into_iter()
            .map(|n| {
                parse_pension_draw(&format!(r#"{{"draw_no": {}, "numbers": "123456"}}"#, n)).unwrap()
            })
            .collect();
        let (lists, summary) = load_pension_stores(&dir, &draws).unwrap();
        assert_eq!(
            summary,
            LoadSummary {
                total_files: 2,
                loaded: 1,
                errors: 1
            }
        );
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].draw_no, 1);
        assert_eq!(lists[0].stores[0].name, "행운");

        assert!(load_pension_stores(&dir.join("missing"), &draws).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_registry_and_config() {
        let dir = scratch_dir("registry");
        let stores = dir.join("lotto_stores.json");
        fs::write(
            &stores,
            r#"{"11100001": {"name": "행운복권", "address": "서울 강서구 까치산로 177"}}"#,
        )
        .unwrap();
        let registry = load_registry(Some(&stores)).unwrap();
        assert_eq!(registry["11100001"].region(), Some("서울"));
        assert!(load_registry(None).unwrap().is_empty());

        let config_path = dir.join("config.json");
        fs::write(&config_path, r#"{"top_n": 3}"#).unwrap();
        let config = load_config(Some(&config_path)).unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.recent_window, 10);
        assert_eq!(load_config(None).unwrap(), StatsConfig::default());

        fs::remove_dir_all(&dir).unwrap();
    }
}
