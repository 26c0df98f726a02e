use chrono::{DateTime, Utc};
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_BORDERS_ONLY, Attribute, Cell, CellAlignment,
    Color, ContentArrangement, Table,
};

use crate::analysis::ScreenReport;

fn get_visibility_ratio(current_pct: f64, top_pct: f64) -> f64 {
    let mut ratio = 0.4 + 0.6 * (current_pct / top_pct);
    if ratio < 0.4 {
        ratio = 0.4;
    }
    ratio
}

fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.format("%d-%m-%Y %H:%M:%S").to_string(),
        None => "Unknown Time".to_string(),
    }
}

fn header(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn price_cell(value: &Option<String>) -> Cell {
    Cell::new(value.as_deref().unwrap_or("-")).set_alignment(CellAlignment::Right)
}

fn pct_cell(value: Option<f64>) -> Cell {
    match value {
        Some(pct) => {
            let color = if pct >= 0.0 { Color::Green } else { Color::Red };
            Cell::new(format!("{:.2}%", pct))
                .fg(color)
                .set_alignment(CellAlignment::Right)
        }
        None => Cell::new("-").set_alignment(CellAlignment::Right),
    }
}

/// Print the ranked swing-metrics table followed by the trend-support
/// shortlist. Pure presentation: both tables render exactly the records
/// the report carries.
pub fn render(report: &ScreenReport, page_size: usize) {
    if report.metrics.is_empty() {
        println!("No complete metric records to display.");
    } else {
        let time_str = format_timestamp(report.data_as_of);
        let title = format!("(Data taken at {} UTC)", time_str);

        let mut table = Table::new();
        table
            .load_preset(UTF8_BORDERS_ONLY)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                header("Rank"),
                header("Asset"),
                header("Listed"),
                header("Pre Low"),
                header("Pre High"),
                header("Post Low"),
                header("Post High"),
                header("2nd Low"),
                header("Current"),
                header("Pre Run"),
                header("Drawdown"),
                header("Post Run"),
                header("2nd Drop"),
                header("Off 2nd Low"),
            ]);

        let top_pct = report.metrics[0].pct_current_run.unwrap_or(0.0);
        let safe_top_pct = if top_pct == 0.0 { 1.0 } else { top_pct };

        for (i, m) in report.metrics.iter().take(page_size).enumerate() {
            let ratio = get_visibility_ratio(m.pct_current_run.unwrap_or(0.0), safe_top_pct);
            let cyan_val = (255.0 * ratio) as u8;

            let asset_cell = Cell::new(&m.symbol).fg(Color::Rgb {
                r: 0,
                g: cyan_val,
                b: cyan_val,
            });

            table.add_row(vec![
                Cell::new(i + 1).fg(Color::DarkGrey),
                asset_cell,
                Cell::new(m.listing_date.as_deref().unwrap_or("-")),
                price_cell(&m.pre_low),
                price_cell(&m.pre_high),
                price_cell(&m.post_low),
                price_cell(&m.post_high),
                price_cell(&m.post_low2),
                price_cell(&m.current),
                pct_cell(m.pct_pre_run),
                pct_cell(m.pct_post_drop),
                pct_cell(m.pct_post_run),
                pct_cell(m.pct_second_drop),
                pct_cell(m.pct_current_run),
            ]);
        }

        println!("\n{}\n{}", title, table);
    }

    let qualifying: Vec<&str> = report
        .screened
        .iter()
        .filter(|r| r.qualifies)
        .map(|r| r.symbol.as_str())
        .collect();

    if qualifying.is_empty() {
        println!("\nNo symbols passed the trend-support screen.");
        return;
    }

    let mut screen_table = Table::new();
    screen_table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![header("#"), header("Trend-Support Pass")]);

    for (i, symbol) in qualifying.iter().enumerate() {
        screen_table.add_row(vec![
            Cell::new(i + 1).fg(Color::DarkGrey),
            Cell::new(symbol).fg(Color::Green),
        ]);
    }

    println!(
        "\n{}\n{} of {} symbols passed the screen",
        screen_table,
        qualifying.len(),
        report.screened.len()
    );
}
