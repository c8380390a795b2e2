//! Table and chart rendering for the terminal dashboard.

use console::style;
use traffic_log_database_models::{ChartPoint, StopRow};
use traffic_log_insights::{InsightResult, ValueKind};

/// Width of the longest bar in a chart, in characters.
const BAR_WIDTH: usize = 40;

/// Prints stop records as a fixed-width table.
pub fn stops_table(rows: &[StopRow]) {
    if rows.is_empty() {
        println!("No stop records found.");
        return;
    }

    println!(
        "{:<6} {:<20} {:<24} {:<12} {:<12} {:<6}",
        "ID", "DATETIME", "VIOLATION", "COUNTRY", "VEHICLE", "ARREST"
    );
    println!("{}", "-".repeat(86));

    for row in rows {
        let arrest = match row.is_arrested {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };

        println!(
            "{:<6} {:<20} {:<24} {:<12} {:<12} {:<6}",
            row.id,
            row.stop_datetime.as_deref().unwrap_or("-"),
            truncate(row.violation.as_deref().unwrap_or("-"), 24),
            truncate(row.country.as_deref().unwrap_or("-"), 12),
            truncate(row.vehicle_number.as_deref().unwrap_or("-"), 12),
            arrest
        );
    }

    println!("\n{} record(s)", rows.len());
}

/// Prints an insight result: title, table, then chart and summary where
/// the insight carries them. An empty result renders as an explicit
/// "no data" notice.
pub fn insight(result: &InsightResult) {
    println!();
    println!("{}", style(&result.title).bold());

    if result.rows.is_empty() {
        println!("No data for this insight.");
        return;
    }

    println!();
    let has_series = result.columns.len() == 3;

    if has_series {
        println!(
            "{:<24} {:<16} {:>14}",
            result.columns[0], result.columns[1], result.columns[2]
        );
        println!("{}", "-".repeat(56));
    } else {
        println!("{:<24} {:>14}", result.columns[0], result.columns[1]);
        println!("{}", "-".repeat(40));
    }

    for row in &result.rows {
        let value = format_value(result.kind.value_kind(), row.value);
        if has_series {
            println!(
                "{:<24} {:<16} {:>14}",
                truncate(&row.label, 24),
                truncate(row.series.as_deref().unwrap_or("-"), 16),
                value
            );
        } else {
            println!("{:<24} {:>14}", truncate(&row.label, 24), value);
        }
    }

    if let Some(chart) = &result.chart {
        println!();
        bar_chart(chart);
    }

    if let Some(summary) = &result.summary {
        println!();
        println!("{}", style(summary).cyan());
    }
}

fn format_value(kind: ValueKind, value: f64) -> String {
    match kind {
        ValueKind::Count => format!("{value:.0}"),
        ValueKind::Rate => format!("{value:.2}%"),
        ValueKind::Minutes => format!("{value:.1} min"),
    }
}

/// Prints a horizontal bar chart scaled to the largest value.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn bar_chart(points: &[ChartPoint]) {
    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return;
    }

    for point in points {
        let mut len = ((point.value / max) * BAR_WIDTH as f64).round() as usize;
        if len == 0 && point.value > 0.0 {
            len = 1;
        }

        println!(
            "{:<24} {} {}",
            truncate(&point.label, 24),
            style("\u{2588}".repeat(len)).cyan(),
            point.value
        );
    }
}

/// Truncates on character boundaries; labels are free text and may be
/// non-ASCII.
fn truncate(text: &str, max: usize) -> String {
    console::truncate_str(text, max, "...").to_string()
}
