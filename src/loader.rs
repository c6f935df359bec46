use crate::error::{Result, RiskError};
use crate::types::{
    RawRow, TripRecord, COL_MANUAL_DISTANCE, COL_MANUAL_END_ODOMETER, COL_MANUAL_START_ODOMETER,
    COL_ORDER_CREATION_DATE, COL_TRIP_GPS_DISTANCE, REQUIRED_COLUMNS,
};
use crate::util::{non_blank, parse_date_safe, parse_f64_safe, parse_gps_flag};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Non-empty date cells that could not be parsed and became `None`.
    pub date_coercions: usize,
    /// Non-empty odometer/distance cells that could not be parsed and became `None`.
    pub numeric_coercions: usize,
}

pub fn load_trips(path: impl AsRef<Path>) -> Result<(Vec<TripRecord>, LoadReport)> {
    let file = File::open(path.as_ref())?;
    load_trips_from_reader(file)
}

/// Normalize a CSV table into trip records.
///
/// Fails only on structural problems (missing headers, malformed CSV). Cells
/// that do not parse are nulled and counted; no row is ever dropped.
pub fn load_trips_from_reader<R: Read>(reader: R) -> Result<(Vec<TripRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    check_required_columns(&headers)?;

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        let raw = result?;
        report.total_rows += 1;
        records.push(normalize_row(idx, raw, &mut report));
    }

    info!(
        rows = report.total_rows,
        date_coercions = report.date_coercions,
        numeric_coercions = report.numeric_coercions,
        "normalized trip records"
    );
    Ok((records, report))
}

fn check_required_columns(headers: &StringRecord) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RiskError::missing_columns(missing))
    }
}

fn normalize_row(idx: usize, raw: RawRow, report: &mut LoadReport) -> TripRecord {
    let order_creation_date = parse_date_safe(raw.order_creation_date.as_deref());
    if order_creation_date.is_none() && non_blank(raw.order_creation_date.as_deref()).is_some() {
        report.date_coercions += 1;
        debug!(
            row = idx + 1,
            column = COL_ORDER_CREATION_DATE,
            value = raw.order_creation_date.as_deref().unwrap_or_default(),
            "unparseable date coerced to null"
        );
    }

    let mut number = |value: Option<&str>, column: &'static str| {
        let parsed = parse_f64_safe(value);
        if parsed.is_none() && non_blank(value).is_some() {
            report.numeric_coercions += 1;
            debug!(
                row = idx + 1,
                column,
                value = value.unwrap_or_default(),
                "unparseable number coerced to null"
            );
        }
        parsed
    };

    let manual_start_odometer = number(
        raw.manual_start_odometer.as_deref(),
        COL_MANUAL_START_ODOMETER,
    );
    let manual_end_odometer = number(raw.manual_end_odometer.as_deref(), COL_MANUAL_END_ODOMETER);
    let trip_gps_distance_km = number(raw.trip_gps_distance_km.as_deref(), COL_TRIP_GPS_DISTANCE);
    let manual_distance_km = number(raw.manual_distance_km.as_deref(), COL_MANUAL_DISTANCE);

    TripRecord {
        row: idx,
        zone: non_blank(raw.zone.as_deref()).unwrap_or_default(),
        hub: non_blank(raw.hub.as_deref()).unwrap_or_default(),
        vehicle_number: non_blank(raw.vehicle_number.as_deref()).unwrap_or_default(),
        parent_vehicle_number: non_blank(raw.parent_vehicle_number.as_deref()),
        order_creation_date,
        manual_start_odometer,
        manual_end_odometer,
        gps_available: parse_gps_flag(raw.gps_available.as_deref()),
        trip_gps_distance_km,
        manual_distance_km,
        ..TripRecord::default()
    }
}
