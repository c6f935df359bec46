//! Per-trip anomaly rules.
//!
//! Each rule is a row in [`RULES`]: a predicate over the trip's fields, the
//! points it adds, and the label/reason it contributes. A predicate returns
//! `false` whenever one of its operands is missing.

use crate::types::{GpsAvailability, RiskFactor, TripRecord};
use tracing::{debug, info};

/// GPS and manual distances may differ by up to this much before flagging.
pub const GPS_TOLERANCE_KM: f64 = 0.1;
/// Manual distance above which a single day counts as excessive.
pub const MAX_DAILY_DISTANCE_KM: f64 = 125.0;

#[derive(Debug, Clone, Copy)]
pub struct RiskRule {
    pub factor: RiskFactor,
    pub points: u32,
    pub reason: &'static str,
    pub applies: fn(&TripRecord) -> bool,
}

pub static RULES: [RiskRule; 3] = [
    RiskRule {
        factor: RiskFactor::OdometerInconsistency,
        points: 20,
        reason: "Odometer reading is less than the previous day's end reading",
        applies: odometer_went_backwards,
    },
    RiskRule {
        factor: RiskFactor::GpsDiscrepancy,
        points: 10,
        reason: "GPS distance and manual distance differ significantly",
        applies: gps_distance_mismatch,
    },
    RiskRule {
        factor: RiskFactor::ExcessiveTravelDistance,
        points: 15,
        reason: "Manual distance travelled exceeds 125 KM in a day",
        applies: excessive_distance,
    },
];

fn odometer_went_backwards(r: &TripRecord) -> bool {
    match (r.prev_manual_end_odometer, r.manual_start_odometer) {
        (Some(prev_end), Some(start)) => start < prev_end,
        _ => false,
    }
}

fn gps_distance_mismatch(r: &TripRecord) -> bool {
    if r.gps_available != GpsAvailability::Yes {
        return false;
    }
    match (r.trip_gps_distance_km, r.manual_distance_km) {
        (Some(gps), Some(manual)) => (gps - manual).abs() > GPS_TOLERANCE_KM,
        _ => false,
    }
}

fn excessive_distance(r: &TripRecord) -> bool {
    matches!(r.manual_distance_km, Some(d) if d > MAX_DAILY_DISTANCE_KM)
}

pub fn rule_for(factor: RiskFactor) -> &'static RiskRule {
    match factor {
        RiskFactor::OdometerInconsistency => &RULES[0],
        RiskFactor::GpsDiscrepancy => &RULES[1],
        RiskFactor::ExcessiveTravelDistance => &RULES[2],
    }
}

/// Scores one record in place. Sub-trips are left with no factors and a value of 0.
pub fn evaluate(record: &mut TripRecord) {
    record.risk_factors.clear();
    record.reasoning.clear();
    record.risk_value = 0;
    if record.is_sub_trip() {
        return;
    }
    for rule in &RULES {
        if (rule.applies)(record) {
            record.risk_factors.push(rule.factor);
            record.reasoning.push(rule.reason.to_string());
            record.risk_value += rule.points;
        }
    }
    if record.is_flagged() {
        debug!(
            vehicle = %record.vehicle_number,
            row = record.row + 1,
            risk_value = record.risk_value,
            "trip flagged"
        );
    }
}

pub fn score_records(records: &mut [TripRecord]) {
    for r in records.iter_mut() {
        evaluate(r);
    }
    let flagged = records.iter().filter(|r| r.is_flagged()).count();
    info!(records = records.len(), flagged, "scored trip records");
}
