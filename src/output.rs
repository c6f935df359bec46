use crate::error::{Result, RiskError};
use crate::pipeline::RiskReport;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub const EXPORT_FILE: &str = "risk_analysis.csv";
pub const HUBS_FILE: &str = "top_hubs.csv";
pub const ZONES_FILE: &str = "top_per_zone.csv";
pub const IMPACT_FILE: &str = "daily_impact.csv";
pub const SUMMARY_FILE: &str = "summary.json";

// The header comes from the `Tabled` column names so an empty table still
// gets one; serde renames on the row types use the same names.
fn write_rows<W, T>(wtr: &mut csv::Writer<W>, rows: &[T]) -> Result<()>
where
    W: io::Write,
    T: Serialize + Tabled,
{
    let headers = T::headers();
    wtr.write_record(headers.iter().map(|h| h.as_bytes()))?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn csv_bytes<T: Serialize + Tabled>(rows: &[T]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    write_rows(&mut wtr, rows)?;
    wtr.into_inner()
        .map_err(|e| RiskError::Io(e.into_error()))
}

pub fn write_csv<T: Serialize + Tabled>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;
    write_rows(&mut wtr, rows)
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

/// Writes every view of `report` into `dir`, creating it if needed.
pub fn write_report(dir: impl AsRef<Path>, report: &RiskReport) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let export = dir.join(EXPORT_FILE);
    fs::write(&export, report.export_csv()?)?;
    let hubs = dir.join(HUBS_FILE);
    write_csv(&hubs, &report.hub_rankings)?;
    let zones = dir.join(ZONES_FILE);
    write_csv(&zones, &report.zone_rankings)?;
    let impact = dir.join(IMPACT_FILE);
    write_csv(&impact, &report.daily_impact)?;
    let summary = dir.join(SUMMARY_FILE);
    write_json(&summary, &report.summary)?;

    let written = vec![export, hubs, zones, impact, summary];
    info!(dir = %dir.display(), files = written.len(), "wrote report files");
    Ok(written)
}

/// Markdown rendering of the first `max_rows` rows, or `(no rows)`.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", render_table(rows, max_rows));
}
