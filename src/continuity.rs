use crate::types::TripRecord;
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use tracing::info;

/// Missing dates sort after every real date.
pub fn compare_dates(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Reorders `records` by (vehicle number, date) and fills in
/// `prev_manual_end_odometer` from the previous record of the same vehicle.
///
/// The sort is stable, so same-day records keep their input order. The first
/// record of every vehicle gets `None`; a missing end reading on the previous
/// day propagates as `None`.
pub fn resolve_previous_odometer(records: &mut [TripRecord]) {
    records.sort_by(|a, b| {
        a.vehicle_number
            .cmp(&b.vehicle_number)
            .then_with(|| compare_dates(a.order_creation_date, b.order_creation_date))
    });

    let mut vehicles = 0usize;
    let mut prev: Option<(&str, Option<f64>)> = None;
    let mut resolved: Vec<Option<f64>> = Vec::with_capacity(records.len());
    for r in records.iter() {
        let value = match prev {
            Some((vehicle, end)) if vehicle == r.vehicle_number => end,
            _ => {
                vehicles += 1;
                None
            }
        };
        resolved.push(value);
        prev = Some((r.vehicle_number.as_str(), r.manual_end_odometer));
    }
    for (r, value) in records.iter_mut().zip(resolved) {
        r.prev_manual_end_odometer = value;
    }

    info!(
        records = records.len(),
        vehicles, "resolved odometer continuity"
    );
}
