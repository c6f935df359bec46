use crate::config::ImpactNullPolicy;
use crate::types::{
    DailyImpact, HubRanking, RunSummary, TripRecord, VehicleRiskSummary, ZoneRanking,
};
use crate::util::{format_date, mean};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashSet};

pub const JOIN_SEPARATOR: &str = ", ";
pub const LIST_SEPARATOR: &str = "; ";

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// One row per (zone, hub, vehicle) with at least one flagged trip, ordered by that key.
///
/// Dates follow record order (duplicates kept); labels and reasons are
/// deduplicated in first-seen order.
pub fn summarize_vehicles(records: &[TripRecord]) -> Vec<VehicleRiskSummary> {
    #[derive(Default)]
    struct Acc {
        dates: Vec<String>,
        factors: Vec<String>,
        reasons: Vec<String>,
        risk_value: u32,
    }

    let mut map: BTreeMap<(String, String, String), Acc> = BTreeMap::new();
    for r in records.iter().filter(|r| r.is_flagged()) {
        let key = (r.zone.clone(), r.hub.clone(), r.vehicle_number.clone());
        let e = map.entry(key).or_default();
        e.dates.push(format_date(r.order_creation_date));
        for f in &r.risk_factors {
            push_unique(&mut e.factors, f.label());
        }
        for reason in &r.reasoning {
            push_unique(&mut e.reasons, reason);
        }
        e.risk_value += r.risk_value;
    }

    map.into_iter()
        .map(|((zone, hub, vehicle_number), acc)| VehicleRiskSummary {
            zone,
            hub,
            vehicle_number,
            dates: acc.dates.join(JOIN_SEPARATOR),
            risk_factors: acc.factors.join(LIST_SEPARATOR),
            reasoning: acc.reasons.join(LIST_SEPARATOR),
            risk_value: acc.risk_value,
        })
        .collect()
}

/// Mean of (manual − GPS) distance per date over every trip, flagged or not.
///
/// Trips without a date have no key and are left out. How a missing distance
/// is treated depends on `policy`.
pub fn daily_impact(records: &[TripRecord], policy: ImpactNullPolicy) -> Vec<DailyImpact> {
    #[derive(Default)]
    struct Acc {
        diffs: Vec<f64>,
        trips: usize,
        incomplete: usize,
    }

    let mut map: BTreeMap<NaiveDateTime, Acc> = BTreeMap::new();
    for r in records {
        let Some(date) = r.order_creation_date else {
            continue;
        };
        let e = map.entry(date).or_default();
        e.trips += 1;
        match (r.manual_distance_km, r.trip_gps_distance_km) {
            (Some(manual), Some(gps)) => e.diffs.push(manual - gps),
            _ => e.incomplete += 1,
        }
    }

    map.into_iter()
        .map(|(date, acc)| {
            let impact_value = match policy {
                ImpactNullPolicy::Poison if acc.incomplete > 0 => None,
                _ => mean(&acc.diffs),
            };
            DailyImpact {
                date: format_date(Some(date)),
                impact_value,
                trips: acc.trips,
            }
        })
        .collect()
}

/// Hubs ranked by total risk value across their vehicles, best `top_n` overall.
///
/// Equal totals keep (zone, hub) ascending order.
pub fn top_hubs(summaries: &[VehicleRiskSummary], top_n: usize) -> Vec<HubRanking> {
    #[derive(Default)]
    struct Acc {
        vehicles: Vec<String>,
        risk_value: u32,
    }

    let mut map: BTreeMap<(String, String), Acc> = BTreeMap::new();
    for s in summaries {
        let e = map.entry((s.zone.clone(), s.hub.clone())).or_default();
        push_unique(&mut e.vehicles, &s.vehicle_number);
        e.risk_value += s.risk_value;
    }

    let mut rows: Vec<((String, String), Acc)> = map.into_iter().collect();
    rows.sort_by(|a, b| b.1.risk_value.cmp(&a.1.risk_value));
    rows.into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, ((zone, hub), acc))| HubRanking {
            rank: idx + 1,
            zone,
            hub,
            vehicle_numbers: acc.vehicles.join(JOIN_SEPARATOR),
            risk_value: acc.risk_value,
        })
        .collect()
}

/// The `top_n` riskiest vehicle summaries of every zone, zones ascending.
///
/// Within a zone: risk value descending, then vehicle number, then hub.
pub fn top_per_zone(summaries: &[VehicleRiskSummary], top_n: usize) -> Vec<ZoneRanking> {
    let mut by_zone: BTreeMap<&str, Vec<&VehicleRiskSummary>> = BTreeMap::new();
    for s in summaries {
        by_zone.entry(s.zone.as_str()).or_default().push(s);
    }

    let mut rows = Vec::new();
    for (_, mut group) in by_zone {
        group.sort_by(|a, b| {
            b.risk_value
                .cmp(&a.risk_value)
                .then_with(|| a.vehicle_number.cmp(&b.vehicle_number))
                .then_with(|| a.hub.cmp(&b.hub))
        });
        for (idx, s) in group.into_iter().take(top_n).enumerate() {
            rows.push(ZoneRanking {
                zone: s.zone.clone(),
                rank: idx + 1,
                hub: s.hub.clone(),
                vehicle_number: s.vehicle_number.clone(),
                dates: s.dates.clone(),
                risk_factors: s.risk_factors.clone(),
                reasoning: s.reasoning.clone(),
                risk_value: s.risk_value,
            });
        }
    }
    rows
}

pub fn generate_summary(records: &[TripRecord], summaries: &[VehicleRiskSummary]) -> RunSummary {
    let mut rule_counts: BTreeMap<String, usize> = BTreeMap::new();
    for f in records.iter().flat_map(|r| r.risk_factors.iter()) {
        *rule_counts.entry(f.label().to_string()).or_default() += 1;
    }
    let dates: HashSet<NaiveDateTime> = records.iter().filter_map(|r| r.order_creation_date).collect();
    RunSummary {
        total_trips: records.len(),
        sub_trips: records.iter().filter(|r| r.is_sub_trip()).count(),
        flagged_trips: records.iter().filter(|r| r.is_flagged()).count(),
        flagged_vehicles: summaries.len(),
        total_risk_value: records.iter().map(|r| u64::from(r.risk_value)).sum(),
        distinct_dates: dates.len(),
        rule_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskFactor;
    use crate::util::parse_date_safe;

    #[test]
    fn test_summary_groups_flagged_records_only() {
        let records = vec![
            flagged("N", "H1", "V1", "2024-01-01", &[RiskFactor::GpsDiscrepancy], 10),
            clean("N", "H1", "V1", "2024-01-02"),
            flagged("N", "H1", "V1", "2024-01-03", &[RiskFactor::ExcessiveTravelDistance], 15),
            flagged("N", "H2", "V1", "2024-01-03", &[RiskFactor::GpsDiscrepancy], 10),
        ];
        let rows = summarize_vehicles(&records);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].hub, "H1");
        assert_eq!(rows[0].dates, "2024-01-01, 2024-01-03");
        assert_eq!(rows[0].risk_factors, "GPS discrepancy; Excessive travel distance");
        assert_eq!(rows[0].risk_value, 25);
        assert_eq!(rows[1].hub, "H2");
        assert_eq!(rows[1].risk_value, 10);
    }

    #[test]
    fn test_summary_deduplicates_labels_but_keeps_dates() {
        let records = vec![
            flagged("N", "H1", "V1", "2024-01-01", &[RiskFactor::GpsDiscrepancy], 10),
            flagged("N", "H1", "V1", "2024-01-01", &[RiskFactor::GpsDiscrepancy], 10),
        ];
        let rows = summarize_vehicles(&records);

        assert_eq!(rows[0].dates, "2024-01-01, 2024-01-01");
        assert_eq!(rows[0].risk_factors, "GPS discrepancy");
        assert_eq!(rows[0].reasoning, "reason for GPS discrepancy");
        assert_eq!(rows[0].risk_value, 20);
    }

    #[test]
    fn test_summary_preserves_total_risk() {
        let records = vec![
            flagged("S", "H9", "V3", "2024-01-01", &[RiskFactor::OdometerInconsistency], 20),
            flagged("N", "H1", "V1", "2024-01-01", &[RiskFactor::GpsDiscrepancy], 10),
            flagged("N", "H1", "V2", "2024-01-02", &[RiskFactor::ExcessiveTravelDistance], 15),
            clean("N", "H1", "V4", "2024-01-02"),
        ];
        let rows = summarize_vehicles(&records);

        let summary_total: u32 = rows.iter().map(|r| r.risk_value).sum();
        let record_total: u32 = records.iter().map(|r| r.risk_value).sum();
        assert_eq!(summary_total, record_total);
        let keys: Vec<(&str, &str)> = rows.iter().map(|r| (r.zone.as_str(), r.vehicle_number.as_str())).collect();
        assert_eq!(keys, vec![("N", "V1"), ("N", "V2"), ("S", "V3")]);
    }

    #[test]
    fn test_summary_empty_when_nothing_flagged() {
        let records = vec![clean("N", "H1", "V1", "2024-01-01")];
        assert!(summarize_vehicles(&records).is_empty());
        assert!(summarize_vehicles(&[]).is_empty());
    }

    #[test]
    fn test_missing_date_renders_as_nat() {
        let mut r = flagged("N", "H1", "V1", "2024-01-01", &[RiskFactor::GpsDiscrepancy], 10);
        r.order_creation_date = None;
        let rows = summarize_vehicles(&[r]);
        assert_eq!(rows[0].dates, "NaT");
    }

    #[test]
    fn test_daily_impact_exclude_policy() {
        let records = vec![
            distances("2024-01-01", Some(12.0), Some(10.0)),
            distances("2024-01-01", Some(14.0), Some(10.0)),
            distances("2024-01-01", None, Some(10.0)),
            distances("2024-01-02", Some(5.0), None),
        ];
        let rows = daily_impact(&records, ImpactNullPolicy::Exclude);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2024-01-01");
        assert_eq!(rows[0].impact_value, Some(3.0));
        assert_eq!(rows[0].trips, 3);
        assert_eq!(rows[1].impact_value, None);
        assert_eq!(rows[1].trips, 1);
    }

    #[test]
    fn test_daily_impact_poison_policy() {
        let records = vec![
            distances("2024-01-01", Some(12.0), Some(10.0)),
            distances("2024-01-01", None, Some(10.0)),
            distances("2024-01-02", Some(8.0), Some(10.0)),
        ];
        let rows = daily_impact(&records, ImpactNullPolicy::Poison);

        assert_eq!(rows[0].impact_value, None);
        assert_eq!(rows[1].impact_value, Some(-2.0));
    }

    #[test]
    fn test_daily_impact_includes_unflagged_and_skips_missing_dates() {
        let mut undated = distances("2024-01-01", Some(100.0), Some(0.0));
        undated.order_creation_date = None;
        let mut sub_trip = distances("2024-01-01", Some(4.0), Some(2.0));
        sub_trip.parent_vehicle_number = Some("P".to_string());
        let records = vec![undated, sub_trip, distances("2024-01-01", Some(2.0), Some(2.0))];
        let rows = daily_impact(&records, ImpactNullPolicy::Exclude);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trips, 2);
        assert_eq!(rows[0].impact_value, Some(1.0));
    }

    #[test]
    fn test_top_hubs_sums_and_sorts() {
        let summaries = vec![
            summary("N", "H1", "V1", 10),
            summary("N", "H1", "V2", 15),
            summary("N", "H2", "V3", 40),
            summary("S", "H3", "V4", 5),
        ];
        let rows = top_hubs(&summaries, 20);

        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].hub.as_str(), rows[0].risk_value, rows[0].rank), ("H2", 40, 1));
        assert_eq!(rows[1].hub, "H1");
        assert_eq!(rows[1].vehicle_numbers, "V1, V2");
        assert_eq!(rows[1].risk_value, 25);
        assert_eq!(rows[2].hub, "H3");
    }

    #[test]
    fn test_top_hubs_limit_is_global() {
        let summaries: Vec<VehicleRiskSummary> = (0..30)
            .map(|i| summary(if i % 2 == 0 { "N" } else { "S" }, &format!("H{i:02}"), "V", i))
            .collect();
        let rows = top_hubs(&summaries, 20);

        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0].risk_value, 29);
        assert!(rows.windows(2).all(|w| w[0].risk_value >= w[1].risk_value));
        assert_eq!(rows[19].rank, 20);
    }

    #[test]
    fn test_top_hubs_ties_keep_key_order() {
        let summaries = vec![summary("S", "H1", "V1", 10), summary("N", "H9", "V2", 10)];
        let rows = top_hubs(&summaries, 20);
        assert_eq!(rows[0].zone, "N");
        assert_eq!(rows[1].zone, "S");
    }

    #[test]
    fn test_top_per_zone_limit_is_per_zone() {
        let mut summaries = Vec::new();
        for i in 0..25 {
            summaries.push(summary("N", "H1", &format!("N{i:02}"), i));
            summaries.push(summary("S", "H2", &format!("S{i:02}"), i));
        }
        let rows = top_per_zone(&summaries, 20);

        assert_eq!(rows.len(), 40);
        for zone in ["N", "S"] {
            let zone_rows: Vec<&ZoneRanking> = rows.iter().filter(|r| r.zone == zone).collect();
            assert_eq!(zone_rows.len(), 20);
            assert_eq!(zone_rows[0].risk_value, 24);
            assert_eq!(zone_rows[0].rank, 1);
            assert!(zone_rows.windows(2).all(|w| w[0].risk_value >= w[1].risk_value));
        }
        assert_eq!(rows[0].zone, "N");
    }

    #[test]
    fn test_top_per_zone_ties_break_on_vehicle_number() {
        let summaries = vec![
            summary("N", "H1", "V9", 30),
            summary("N", "H2", "V1", 30),
            summary("N", "H1", "V5", 50),
        ];
        let rows = top_per_zone(&summaries, 20);
        let order: Vec<&str> = rows.iter().map(|r| r.vehicle_number.as_str()).collect();
        assert_eq!(order, vec!["V5", "V1", "V9"]);
    }

    #[test]
    fn test_rankings_with_zero_limit_are_empty() {
        let summaries = vec![summary("N", "H1", "V1", 10)];
        assert!(top_hubs(&summaries, 0).is_empty());
        assert!(top_per_zone(&summaries, 0).is_empty());
    }

    #[test]
    fn test_generate_summary_counts() {
        let mut sub = clean("N", "H1", "V2", "2024-01-02");
        sub.parent_vehicle_number = Some("V1".to_string());
        let records = vec![
            flagged("N", "H1", "V1", "2024-01-01", &[RiskFactor::GpsDiscrepancy, RiskFactor::ExcessiveTravelDistance], 25),
            clean("N", "H1", "V1", "2024-01-02"),
            sub,
        ];
        let summaries = summarize_vehicles(&records);
        let s = generate_summary(&records, &summaries);

        assert_eq!(s.total_trips, 3);
        assert_eq!(s.sub_trips, 1);
        assert_eq!(s.flagged_trips, 1);
        assert_eq!(s.flagged_vehicles, 1);
        assert_eq!(s.total_risk_value, 25);
        assert_eq!(s.distinct_dates, 2);
        assert_eq!(s.rule_counts.get("GPS discrepancy"), Some(&1));
        assert_eq!(s.rule_counts.get("Odometer inconsistency"), None);
    }

    // Helper functions for tests
    fn clean(zone: &str, hub: &str, vehicle: &str, date: &str) -> TripRecord {
        TripRecord {
            zone: zone.to_string(),
            hub: hub.to_string(),
            vehicle_number: vehicle.to_string(),
            order_creation_date: parse_date_safe(Some(date)),
            ..TripRecord::default()
        }
    }

    fn flagged(
        zone: &str,
        hub: &str,
        vehicle: &str,
        date: &str,
        factors: &[RiskFactor],
        risk_value: u32,
    ) -> TripRecord {
        TripRecord {
            risk_factors: factors.to_vec(),
            reasoning: factors.iter().map(|f| format!("reason for {}", f)).collect(),
            risk_value,
            ..clean(zone, hub, vehicle, date)
        }
    }

    fn distances(date: &str, manual: Option<f64>, gps: Option<f64>) -> TripRecord {
        TripRecord {
            manual_distance_km: manual,
            trip_gps_distance_km: gps,
            ..clean("N", "H1", "V1", date)
        }
    }

    fn summary(zone: &str, hub: &str, vehicle: &str, risk_value: u32) -> VehicleRiskSummary {
        VehicleRiskSummary {
            zone: zone.to_string(),
            hub: hub.to_string(),
            vehicle_number: vehicle.to_string(),
            dates: "2024-01-01".to_string(),
            risk_factors: "GPS discrepancy".to_string(),
            reasoning: "reason".to_string(),
            risk_value,
        }
    }
}
