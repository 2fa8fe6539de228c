use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use lotto_db::models::DrawRecord;
use lotto_stats::dormancy::DormancyReport;
use lotto_stats::frequency::FrequencyReport;
use lotto_stats::insight::DrawInsight;
use lotto_stats::outlet::OutletReport;
use lotto_stats::pattern::{PatternStats, PatternReport};
use lotto_stats::{LottoReport, PensionReport};

use crate::load::LoadSummary;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

/// Thousands separators for currency amounts.
fn won(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn display_load_summary(label: &str, summary: &LoadSummary) {
    println!("{} :", label);
    println!("  files read : {}", summary.total_files);
    println!("  loaded     : {}", summary.loaded);
    if summary.errors > 0 {
        println!("  rejected   : {}", summary.errors);
    }
}

pub fn display_report_summary(report: &LottoReport) {
    println!(
        "\nDraws {}..={} ({} total)",
        report.first_draw, report.last_draw, report.total_draws
    );
    if let Some(at) = report.updated_at {
        println!("Source data updated at {}", at);
    }
    println!(
        "Average payout rate {:.2}%, latest net first prize {} won",
        report.financial.average_payout_rate,
        won(report.financial.latest_tax_adjusted_prize)
    );
}

pub fn display_frequency(report: &FrequencyReport, top: usize) {
    println!("\n── Frequency (top {}) ──", top);
    let mut table = new_table(vec!["Number", "Total", "%", "Regular", "%", "Bonus", "%"]);
    for f in report.by_total.iter().take(top) {
        table.add_row(vec![
            format!("{:2}", f.number),
            f.total_count.to_string(),
            format!("{:.2}", f.total_pct),
            f.regular_count.to_string(),
            format!("{:.2}", f.regular_pct),
            f.bonus_count.to_string(),
            format!("{:.2}", f.bonus_pct),
        ]);
    }
    println!("{table}");

    let least: Vec<u8> = report.least_frequent.iter().map(|f| f.number).collect();
    println!("Least drawn: {}", join_numbers(&least));
}

pub fn display_dormancy(report: &DormancyReport) {
    println!("\n── Dormancy (latest draw {}) ──", report.latest_draw);
    let mut table = new_table(vec!["Number", "Current", "Average", "Max", "Appearances"]);
    for d in &report.top_current {
        table.add_row(vec![
            Cell::new(format!("{:2}", d.number)),
            Cell::new(d.current_dormant).fg(Color::Red),
            Cell::new(format!("{:.2}", d.avg_dormant)),
            Cell::new(d.max_dormant),
            Cell::new(d.appearance_count),
        ]);
    }
    println!("{table}");
    println!("Absent from recent draws: {}", join_numbers(&report.absent_recent));
}

fn pattern_table<K: std::fmt::Display>(title: &str, stats: &PatternStats<K>, top: usize) {
    println!("\n── {} ──", title);
    let mut table = new_table(vec!["Pattern", "Count", "%"]);
    for p in stats.stats.iter().take(top) {
        table.add_row(vec![
            p.pattern.to_string(),
            p.count.to_string(),
            format!("{:.2}", p.percentage),
        ]);
    }
    println!("{table}");
}

pub fn display_patterns(report: &PatternReport, top: usize) {
    pattern_table("Odd:Even", &report.odd_even, top);
    pattern_table("Low:High", &report.low_high, top);
    pattern_table("Sections", &report.sections, top);

    let c = &report.consecutive;
    println!(
        "Consecutive pairs: avg {:.2}, max {}, min {}, {} draws with one or more ({:.2}%)",
        c.average, c.max, c.min, c.draws_with_consecutive, c.draws_with_consecutive_pct
    );
}

pub fn display_outlets(report: &OutletReport) {
    println!(
        "\n── Outlets ({} wins, {} unresolved) ──",
        report.total_wins, report.unresolved_wins
    );
    let mut table = new_table(vec!["Outlet", "Name", "Region", "Wins", "Registry 1st/2nd"]);
    for o in &report.top_outlets {
        table.add_row(vec![
            o.outlet_id.clone(),
            o.name.clone(),
            o.region.clone(),
            o.count.to_string(),
            format!("{}/{}", o.registry_first_prize_wins, o.registry_second_prize_wins),
        ]);
    }
    println!("{table}");
}

pub fn display_draw(draw: &DrawRecord, insight: &DrawInsight) {
    let date = draw
        .draw_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "—".to_string());
    println!(
        "\nDraw {} ({}): {} + {}",
        draw.draw_no,
        date,
        join_numbers(&draw.sorted_numbers()),
        draw.bonus_number
    );

    let props = &insight.number_properties;
    let range = &insight.range_and_sequence;
    let digits = &insight.last_digit_stats;
    let winners = &insight.winner_insight;

    let mut table = new_table(vec!["Measure", "Value"]);
    table.add_row(vec!["Sum".to_string(), props.sum_total.to_string()]);
    table.add_row(vec!["Odd:Even".to_string(), props.odd_even.to_string()]);
    table.add_row(vec!["Low:High".to_string(), props.low_high.to_string()]);
    table.add_row(vec!["AC value".to_string(), props.ac_value.to_string()]);
    table.add_row(vec!["Primes".to_string(), props.prime_count.to_string()]);
    table.add_row(vec!["Sections".to_string(), range.section_counts.to_string()]);
    table.add_row(vec![
        "Missing sections".to_string(),
        range.missing_sections.join(", "),
    ]);
    table.add_row(vec![
        "Consecutive pairs".to_string(),
        range.consecutive_sets.to_string(),
    ]);
    table.add_row(vec![
        "Last digit sum".to_string(),
        digits.last_digit_sum.to_string(),
    ]);
    table.add_row(vec![
        "Repeated last digits".to_string(),
        digits
            .duplicate_last_digits
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    ]);
    table.add_row(vec![
        "Payout rate".to_string(),
        format!("{:.2}%", winners.total_payout_rate),
    ]);
    table.add_row(vec![
        "Auto / manual / semi-auto".to_string(),
        format!(
            "{:.1}% / {:.1}% / {:.1}%",
            winners.winner_method_rate.auto,
            winners.winner_method_rate.manual,
            winners.winner_method_rate.semi_auto
        ),
    ]);
    table.add_row(vec![
        "Net first prize".to_string(),
        format!("{} won", won(winners.tax_adjusted_prize)),
    ]);
    println!("{table}");
}

pub fn display_pension(report: &PensionReport) {
    println!(
        "\nPension draws {}..={} ({} total)",
        report.first_draw, report.last_draw, report.total_draws
    );

    let mut table = new_table(vec!["Group", "Count", "%"]);
    for g in &report.group_frequency {
        table.add_row(vec![
            g.group.clone(),
            g.count.to_string(),
            format!("{:.2}", g.percentage),
        ]);
    }
    println!("{table}");

    let mut table = new_table(vec!["Tier", "Average", "Max", "Min", "Total"]);
    for t in &report.tier_stats {
        table.add_row(vec![
            t.tier.to_string(),
            format!("{:.2}", t.average_winners),
            t.max_winners.to_string(),
            t.min_winners.to_string(),
            t.total_winners.to_string(),
        ]);
    }
    println!("{table}");

    if report.stores.top_stores.is_empty() {
        return;
    }
    let mut table = new_table(vec!["Store", "Wins"]);
    for s in &report.stores.top_stores {
        table.add_row(vec![s.name.clone(), s.count.to_string()]);
    }
    println!("{table}");
}
