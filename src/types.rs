use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

pub const COL_ZONE: &str = "Zone";
pub const COL_HUB: &str = "Hub";
pub const COL_VEHICLE_NUMBER: &str = "Vehicle Number";
pub const COL_PARENT_VEHICLE_NUMBER: &str = "Parent Vehicle Number";
pub const COL_ORDER_CREATION_DATE: &str = "Order Creation Date";
pub const COL_MANUAL_START_ODOMETER: &str = "Manual Start Odometer (in meters)";
pub const COL_MANUAL_END_ODOMETER: &str = "Manual End Odometer (in meters)";
pub const COL_GPS_AVAILABLE: &str = "GPS Available";
pub const COL_TRIP_GPS_DISTANCE: &str = "Trip GPS Distance Travelled (in KM)";
pub const COL_MANUAL_DISTANCE: &str = "Manual Distance Travelled (in KM)";

/// Headers the input table must carry, in the order they are reported when missing.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_ZONE,
    COL_HUB,
    COL_VEHICLE_NUMBER,
    COL_PARENT_VEHICLE_NUMBER,
    COL_ORDER_CREATION_DATE,
    COL_MANUAL_START_ODOMETER,
    COL_MANUAL_END_ODOMETER,
    COL_GPS_AVAILABLE,
    COL_TRIP_GPS_DISTANCE,
    COL_MANUAL_DISTANCE,
];

#[derive(Debug, Default, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Zone")]
    pub zone: Option<String>,
    #[serde(rename = "Hub")]
    pub hub: Option<String>,
    #[serde(rename = "Vehicle Number")]
    pub vehicle_number: Option<String>,
    #[serde(rename = "Parent Vehicle Number")]
    pub parent_vehicle_number: Option<String>,
    #[serde(rename = "Order Creation Date")]
    pub order_creation_date: Option<String>,
    #[serde(rename = "Manual Start Odometer (in meters)")]
    pub manual_start_odometer: Option<String>,
    #[serde(rename = "Manual End Odometer (in meters)")]
    pub manual_end_odometer: Option<String>,
    #[serde(rename = "GPS Available")]
    pub gps_available: Option<String>,
    #[serde(rename = "Trip GPS Distance Travelled (in KM)")]
    pub trip_gps_distance_km: Option<String>,
    #[serde(rename = "Manual Distance Travelled (in KM)")]
    pub manual_distance_km: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GpsAvailability {
    Yes,
    No,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskFactor {
    OdometerInconsistency,
    GpsDiscrepancy,
    ExcessiveTravelDistance,
}

impl RiskFactor {
    pub fn label(&self) -> &'static str {
        match self {
            RiskFactor::OdometerInconsistency => "Odometer inconsistency",
            RiskFactor::GpsDiscrepancy => "GPS discrepancy",
            RiskFactor::ExcessiveTravelDistance => "Excessive travel distance",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One vehicle-day row after normalization.
///
/// The last four fields are annotations: `prev_manual_end_odometer` is owned by
/// the continuity resolver, the risk fields by the rule engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripRecord {
    /// Zero-based position in the input table.
    pub row: usize,
    pub zone: String,
    pub hub: String,
    pub vehicle_number: String,
    pub parent_vehicle_number: Option<String>,
    pub order_creation_date: Option<NaiveDateTime>,
    pub manual_start_odometer: Option<f64>,
    pub manual_end_odometer: Option<f64>,
    pub gps_available: GpsAvailability,
    pub trip_gps_distance_km: Option<f64>,
    pub manual_distance_km: Option<f64>,

    pub prev_manual_end_odometer: Option<f64>,
    pub risk_factors: Vec<RiskFactor>,
    pub reasoning: Vec<String>,
    pub risk_value: u32,
}

impl TripRecord {
    /// Sub-trips hang off a parent vehicle and are never scored.
    pub fn is_sub_trip(&self) -> bool {
        self.parent_vehicle_number.is_some()
    }

    pub fn is_flagged(&self) -> bool {
        !self.risk_factors.is_empty()
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct VehicleRiskSummary {
    #[serde(rename = "Zone")]
    #[tabled(rename = "Zone")]
    pub zone: String,
    #[serde(rename = "Hub")]
    #[tabled(rename = "Hub")]
    pub hub: String,
    #[serde(rename = "Vehicle Number")]
    #[tabled(rename = "Vehicle Number")]
    pub vehicle_number: String,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub dates: String,
    #[serde(rename = "Risk Factors")]
    #[tabled(rename = "Risk Factors")]
    pub risk_factors: String,
    #[serde(rename = "Reasoning")]
    #[tabled(rename = "Reasoning")]
    pub reasoning: String,
    #[serde(rename = "Risk Value")]
    #[tabled(rename = "Risk Value")]
    pub risk_value: u32,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct HubRanking {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Zone")]
    #[tabled(rename = "Zone")]
    pub zone: String,
    #[serde(rename = "Hub")]
    #[tabled(rename = "Hub")]
    pub hub: String,
    #[serde(rename = "Vehicle Number")]
    #[tabled(rename = "Vehicle Number")]
    pub vehicle_numbers: String,
    #[serde(rename = "Risk Value")]
    #[tabled(rename = "Risk Value")]
    pub risk_value: u32,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ZoneRanking {
    #[serde(rename = "Zone")]
    #[tabled(rename = "Zone")]
    pub zone: String,
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Hub")]
    #[tabled(rename = "Hub")]
    pub hub: String,
    #[serde(rename = "Vehicle Number")]
    #[tabled(rename = "Vehicle Number")]
    pub vehicle_number: String,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub dates: String,
    #[serde(rename = "Risk Factors")]
    #[tabled(rename = "Risk Factors")]
    pub risk_factors: String,
    #[serde(rename = "Reasoning")]
    #[tabled(rename = "Reasoning")]
    pub reasoning: String,
    #[serde(rename = "Risk Value")]
    #[tabled(rename = "Risk Value")]
    pub risk_value: u32,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DailyImpact {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "Impact Value")]
    #[tabled(rename = "Impact Value", display_with = "display_impact")]
    pub impact_value: Option<f64>,
    #[serde(rename = "Trips")]
    #[tabled(rename = "Trips")]
    pub trips: usize,
}

fn display_impact(value: &Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct RunSummary {
    pub total_trips: usize,
    pub sub_trips: usize,
    pub flagged_trips: usize,
    pub flagged_vehicles: usize,
    pub total_risk_value: u64,
    pub distinct_dates: usize,
    pub rule_counts: BTreeMap<String, usize>,
}
