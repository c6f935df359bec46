//! End-to-end run: normalize, resolve continuity, score, aggregate.
//!
//! Every run returns its own [`RiskReport`]; nothing is cached between runs.

use crate::config::PipelineConfig;
use crate::continuity::resolve_previous_odometer;
use crate::error::Result;
use crate::loader::{load_trips, load_trips_from_reader, LoadReport};
use crate::output::csv_bytes;
use crate::reports::{daily_impact, generate_summary, summarize_vehicles, top_hubs, top_per_zone};
use crate::rules::score_records;
use crate::types::{DailyImpact, HubRanking, RunSummary, TripRecord, VehicleRiskSummary, ZoneRanking};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RiskReport {
    /// Annotated trips in (vehicle, date) order.
    pub trips: Vec<TripRecord>,
    pub hub_rankings: Vec<HubRanking>,
    pub zone_rankings: Vec<ZoneRanking>,
    /// All flagged (zone, hub, vehicle) groups; also the exported dataset.
    pub vehicle_summaries: Vec<VehicleRiskSummary>,
    pub daily_impact: Vec<DailyImpact>,
    pub summary: RunSummary,
}

impl RiskReport {
    /// The vehicle summaries as CSV with a
    /// `Zone,Hub,Vehicle Number,Date,Risk Factors,Reasoning,Risk Value` header.
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        csv_bytes(&self.vehicle_summaries)
    }

    pub fn is_empty(&self) -> bool {
        self.vehicle_summaries.is_empty()
    }
}

pub fn run(mut trips: Vec<TripRecord>, config: &PipelineConfig) -> RiskReport {
    resolve_previous_odometer(&mut trips);
    score_records(&mut trips);

    let vehicle_summaries = summarize_vehicles(&trips);
    let daily_impact = daily_impact(&trips, config.impact_policy);
    let hub_rankings = top_hubs(&vehicle_summaries, config.top_n);
    let zone_rankings = top_per_zone(&vehicle_summaries, config.top_n);
    let summary = generate_summary(&trips, &vehicle_summaries);

    if vehicle_summaries.is_empty() {
        warn!(trips = trips.len(), "no trips were flagged");
    }
    info!(
        flagged_vehicles = vehicle_summaries.len(),
        hubs = hub_rankings.len(),
        zone_rows = zone_rankings.len(),
        dates = daily_impact.len(),
        "assembled risk report"
    );

    RiskReport {
        trips,
        hub_rankings,
        zone_rankings,
        vehicle_summaries,
        daily_impact,
        summary,
    }
}

pub fn run_from_reader<R: Read>(reader: R, config: &PipelineConfig) -> Result<(RiskReport, LoadReport)> {
    let (trips, load_report) = load_trips_from_reader(reader)?;
    Ok((run(trips, config), load_report))
}

pub fn run_from_path(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<(RiskReport, LoadReport)> {
    let (trips, load_report) = load_trips(path)?;
    Ok((run(trips, config), load_report))
}
