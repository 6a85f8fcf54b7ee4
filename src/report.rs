// =============================================================================
// Cycle Report — plain aligned console table
// =============================================================================

use crate::watcher::{CycleReport, ReportRow};

const HEADERS: [&str; 6] = ["Symbol", "TF", "Bar Time (UTC)", "Last Price", "Signal", "Notification"];

fn cells(row: &ReportRow) -> [String; 6] {
    [
        row.key.symbol.clone(),
        row.key.interval.clone(),
        row.bar_time.format("%Y-%m-%d %H:%M").to_string(),
        format!("${:.2}", row.price),
        format!("Supertrend {} signal!", row.signal),
        row.notify.to_string(),
    ]
}

/// Render evaluated rows as a left-aligned table, one column gap of two
/// spaces, followed by one line per skipped series.
pub fn render(report: &CycleReport) -> String {
    let body: Vec<[String; 6]> = report.rows.iter().map(cells).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(String::from), &widths);
    for row in &body {
        push_line(&mut out, row, &widths);
    }
    for skipped in &report.skipped {
        out.push_str(&format!("skipped {}: {}\n", skipped.key, skipped.reason));
    }
    out
}

fn push_line(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
