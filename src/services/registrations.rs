// src/services/registrations.rs
use chrono::{Datelike, NaiveDateTime};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use super::eventbrite::{EventbriteClient, GatewayError};
use crate::models::{Attendee, Event, EventId};

const SECONDS_PER_DAY: i64 = 86_400;

/// What to do when one event cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole run; no report is written.
    #[default]
    Abort,
    /// Log it and leave the event out of the report.
    Skip,
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to fetch event {event_id}: {source}")]
    Fetch {
        event_id: EventId,
        #[source]
        source: GatewayError,
    },
    #[error("event {event_id} has malformed data: {reason}")]
    Malformed { event_id: EventId, reason: String },
}

impl CollectError {
    pub fn event_id(&self) -> &EventId {
        match self {
            CollectError::Fetch { event_id, .. } | CollectError::Malformed { event_id, .. } => event_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub created: NaiveDateTime,
    pub amount: f64,
}

/// One event's start time and its attendees' registrations, parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRegistrations {
    pub event_id: EventId,
    pub start: NaiveDateTime,
    pub registrations: Vec<Registration>,
}

impl EventRegistrations {
    pub fn from_remote(event_id: &EventId, event: &Event, attendees: &[Attendee]) -> Result<Self, CollectError> {
        let malformed = |reason: String| CollectError::Malformed {
            event_id: event_id.clone(),
            reason,
        };

        let start = event
            .start()
            .map_err(|e| malformed(format!("start_date {:?}: {}", event.start_date, e)))?;

        let registrations = attendees
            .iter()
            .map(|a| {
                a.created_at()
                    .map(|created| Registration {
                        created,
                        amount: a.amount_paid,
                    })
                    .map_err(|e| malformed(format!("created {:?}: {}", a.created, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EventRegistrations {
            event_id: event_id.clone(),
            start,
            registrations,
        })
    }
}

/// Fetches every event in order, one request at a time.
pub async fn collect(
    client: &EventbriteClient,
    event_ids: &[EventId],
    policy: FailurePolicy,
) -> Result<Vec<EventRegistrations>, CollectError> {
    let mut collected = Vec::with_capacity(event_ids.len());

    for event_id in event_ids {
        match collect_one(client, event_id).await {
            Ok(event) => {
                info!(
                    "Event {} starts {} with {} attendees",
                    event_id,
                    event.start,
                    event.registrations.len()
                );
                collected.push(event);
            }
            Err(e) => match policy {
                FailurePolicy::Abort => {
                    error!("Aborting run: {}", e);
                    return Err(e);
                }
                FailurePolicy::Skip => warn!("Skipping event: {}", e),
            },
        }
    }

    Ok(collected)
}

async fn collect_one(client: &EventbriteClient, event_id: &EventId) -> Result<EventRegistrations, CollectError> {
    let fetch_failed = |source: GatewayError| CollectError::Fetch {
        event_id: event_id.clone(),
        source,
    };

    let event = client.event_get(event_id).await.map_err(fetch_failed)?;
    let attendees = client
        .event_list_attendees(event_id, Some("created"))
        .await
        .map_err(fetch_failed)?;

    EventRegistrations::from_remote(event_id, &event, &attendees)
}

/// Whole days between registration and start, floored, then made absolute.
/// A registration after the start lands in the same bucket as one the same
/// number of days before it.
pub fn days_before(start: NaiveDateTime, created: NaiveDateTime) -> i64 {
    (start - created).num_seconds().div_euclid(SECONDS_PER_DAY).abs()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketPoint {
    pub days_before: i64,
    pub amount: f64,
    pub total: f64,
}

/// Buckets ordered from furthest before the start to closest.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSeries {
    pub event_id: EventId,
    pub start_year: i32,
    pub points: Vec<BucketPoint>,
}

pub fn build_series(event: &EventRegistrations) -> EventSeries {
    let mut buckets: BTreeMap<i64, f64> = BTreeMap::new();
    for registration in &event.registrations {
        *buckets
            .entry(days_before(event.start, registration.created))
            .or_insert(0.0) += registration.amount;
    }

    let mut total = 0.0;
    let points = buckets
        .into_iter()
        .rev()
        .map(|(days_before, amount)| {
            total += amount;
            BucketPoint {
                days_before,
                amount,
                total,
            }
        })
        .collect::<Vec<_>>();

    debug!("Event {}: {} buckets, total {}", event.event_id, points.len(), total);

    EventSeries {
        event_id: event.event_id.clone(),
        start_year: event.start.year(),
        points,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub days_before: i64,
    /// One cumulative total per event, in column order.
    pub totals: Vec<f64>,
}

/// All events' running totals aligned on days-before, one column per event.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    pub event_ids: Vec<EventId>,
    pub years: Vec<i32>,
    pub rows: Vec<ComparisonRow>,
}

/// Merges with the standard heuristic, for when every configured event made
/// it into `series`: the earliest bucket rows are dropped, one per event.
pub fn merge_series(series: &[EventSeries]) -> ComparisonTable {
    merge_series_with_drop(series, series.len())
}

/// `drop` is the number of configured events, which can exceed
/// `series.len()` when failed events were skipped.
pub fn merge_series_with_drop(series: &[EventSeries], drop: usize) -> ComparisonTable {
    let columns = series.len();

    let mut combined: BTreeMap<i64, Vec<Option<f64>>> = BTreeMap::new();
    for (column, s) in series.iter().enumerate() {
        for point in &s.points {
            combined
                .entry(point.days_before)
                .or_insert_with(|| vec![None; columns])[column] = Some(point.total);
        }
    }

    if combined.len() < drop {
        warn!(
            "Only {} buckets across {} events, report body will be empty",
            combined.len(),
            columns
        );
    }

    // Values in dropped rows are never seen by the carry-forward.
    let mut last_seen: Vec<Option<f64>> = vec![None; columns];
    let rows = combined
        .into_iter()
        .rev()
        .skip(drop)
        .map(|(days_before, observed)| {
            let totals = observed
                .into_iter()
                .zip(last_seen.iter_mut())
                .map(|(value, last)| {
                    if value.is_some() {
                        *last = value;
                    }
                    last.unwrap_or(0.0)
                })
                .collect();
            ComparisonRow { days_before, totals }
        })
        .collect();

    ComparisonTable {
        event_ids: series.iter().map(|s| s.event_id.clone()).collect(),
        years: series.iter().map(|s| s.start_year).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::API_DATE_FORMAT;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, API_DATE_FORMAT).unwrap()
    }

    fn event(id: &str, start: &str, registrations: &[(&str, f64)]) -> EventRegistrations {
        EventRegistrations {
            event_id: EventId::from(id),
            start: at(start),
            registrations: registrations
                .iter()
                .map(|(created, amount)| Registration {
                    created: at(created),
                    amount: *amount,
                })
                .collect(),
        }
    }

    #[test]
    fn days_before_floors_then_takes_absolute_value() {
        let start = at("2020-01-10 00:00:00");
        assert_eq!(days_before(start, at("2020-01-05 00:00:00")), 5);
        assert_eq!(days_before(start, at("2020-01-05 12:00:00")), 4);
        assert_eq!(days_before(start, at("2020-01-09 23:59:59")), 0);
        // after the start: -0.5 days floors to -1
        assert_eq!(days_before(start, at("2020-01-10 12:00:00")), 1);
        assert_eq!(days_before(start, at("2020-01-12 00:00:00")), 2);
    }

    #[test]
    fn series_sums_buckets_and_accumulates_from_earliest() {
        let e = event(
            "1",
            "2020-01-10 00:00:00",
            &[
                ("2020-01-08 10:00:00", 20.0),
                ("2020-01-05 09:00:00", 10.0),
                ("2020-01-08 18:00:00", 2.5),
                ("2020-01-05 11:00:00", 0.0),
            ],
        );
        let series = build_series(&e);

        assert_eq!(series.start_year, 2020);
        assert_eq!(
            series.points,
            vec![
                BucketPoint { days_before: 4, amount: 10.0, total: 10.0 },
                BucketPoint { days_before: 1, amount: 22.5, total: 32.5 },
            ]
        );
    }

    #[test]
    fn series_buckets_are_ordered_numerically_not_lexically() {
        let e = event(
            "1",
            "2020-03-01 00:00:00",
            &[
                ("2020-02-20 00:00:00", 1.0),
                ("2020-02-28 00:00:00", 1.0),
                ("2019-12-01 00:00:00", 1.0),
            ],
        );
        let days: Vec<i64> = build_series(&e).points.iter().map(|p| p.days_before).collect();
        assert_eq!(days, vec![91, 10, 2]);
    }

    #[test]
    fn running_totals_never_decrease_and_match_amounts() {
        let e = event(
            "1",
            "2021-06-01 09:00:00",
            &[
                ("2021-05-01 09:00:00", 12.0),
                ("2021-05-20 09:00:00", 0.0),
                ("2021-05-31 09:00:00", 7.25),
                ("2021-05-01 15:00:00", 3.0),
                ("2021-06-02 09:00:00", 4.0),
            ],
        );
        let series = build_series(&e);
        assert!(series.points.windows(2).all(|w| w[0].total <= w[1].total));
        assert!(series.points.windows(2).all(|w| w[0].days_before > w[1].days_before));

        let bucket_sum: f64 = series.points.iter().map(|p| p.amount).sum();
        let attendee_sum: f64 = e.registrations.iter().map(|r| r.amount).sum();
        assert!((bucket_sum - attendee_sum).abs() < 1e-9);
        assert_eq!(series.points.last().unwrap().total, attendee_sum);
    }

    #[test]
    fn event_without_attendees_has_empty_series() {
        let series = build_series(&event("1", "2020-01-10 00:00:00", &[]));
        assert!(series.points.is_empty());
    }

    #[test]
    fn two_events_with_two_buckets_leave_header_only() {
        let a = build_series(&event(
            "A",
            "2020-01-10 00:00:00",
            &[("2020-01-05 00:00:00", 10.0), ("2020-01-08 00:00:00", 20.0)],
        ));
        let b = build_series(&event("B", "2020-01-12 00:00:00", &[("2020-01-07 00:00:00", 15.0)]));

        let table = merge_series(&[a, b]);
        assert_eq!(table.years, vec![2020, 2020]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn single_event_drops_its_earliest_bucket() {
        let c = build_series(&event(
            "C",
            "2020-01-11 00:00:00",
            &[
                ("2020-01-01 00:00:00", 5.0),
                ("2020-01-08 00:00:00", 5.0),
                ("2020-01-10 00:00:00", 5.0),
            ],
        ));

        let table = merge_series(&[c]);
        assert_eq!(
            table.rows,
            vec![
                ComparisonRow { days_before: 3, totals: vec![10.0] },
                ComparisonRow { days_before: 1, totals: vec![15.0] },
            ]
        );
    }

    fn series(id: &str, points: &[(i64, f64)]) -> EventSeries {
        EventSeries {
            event_id: EventId::from(id),
            start_year: 2020,
            points: points
                .iter()
                .map(|(days_before, total)| BucketPoint {
                    days_before: *days_before,
                    amount: 0.0,
                    total: *total,
                })
                .collect(),
        }
    }

    #[test]
    fn missing_values_carry_forward_once_seen() {
        let a = series("A", &[(9, 10.0), (4, 30.0), (2, 35.0)]);
        let b = series("B", &[(9, 7.0)]);

        let table = merge_series_with_drop(&[a, b], 0);
        assert_eq!(
            table.rows,
            vec![
                ComparisonRow { days_before: 9, totals: vec![10.0, 7.0] },
                ComparisonRow { days_before: 4, totals: vec![30.0, 7.0] },
                ComparisonRow { days_before: 2, totals: vec![35.0, 7.0] },
            ]
        );
    }

    #[test]
    fn carry_forward_starts_at_zero() {
        let a = series("A", &[(9, 10.0), (4, 30.0), (1, 31.0)]);
        let b = series("B", &[(4, 8.0)]);

        let table = merge_series_with_drop(&[a, b], 0);
        let b_column: Vec<f64> = table.rows.iter().map(|r| r.totals[1]).collect();
        assert_eq!(b_column, vec![0.0, 8.0, 8.0]);
    }

    #[test]
    fn values_in_dropped_rows_are_not_carried() {
        let a = series("A", &[(9, 10.0), (6, 11.0), (4, 30.0), (2, 40.0)]);
        let b = series("B", &[(9, 7.0), (2, 9.0)]);

        // two events, so buckets 9 and 6 go
        let table = merge_series(&[a, b]);
        assert_eq!(
            table.rows,
            vec![
                ComparisonRow { days_before: 4, totals: vec![30.0, 0.0] },
                ComparisonRow { days_before: 2, totals: vec![40.0, 9.0] },
            ]
        );
    }

    #[test]
    fn skipped_events_still_count_towards_the_drop() {
        // two events configured, only one fetched
        let table = merge_series_with_drop(&[series("A", &[(9, 1.0), (5, 2.0), (1, 3.0)])], 2);
        assert_eq!(
            table.rows,
            vec![ComparisonRow { days_before: 1, totals: vec![3.0] }]
        );
        assert_eq!(table.event_ids, vec![EventId::from("A")]);
    }

    #[test]
    fn row_count_is_distinct_buckets_minus_events_clamped() {
        let a = series("A", &[(9, 1.0), (5, 2.0), (3, 3.0)]);
        let b = series("B", &[(5, 1.0), (1, 2.0)]);
        assert_eq!(merge_series(&[a.clone(), b.clone()]).rows.len(), 4 - 2);

        let c = series("C", &[(3, 1.0), (2, 1.0)]);
        let d = series("D", &[]);
        let table = merge_series(&[c, d, a]);
        assert_eq!(table.rows.len(), 1);

        let sparse = merge_series(&[series("E", &[(3, 1.0)]), series("F", &[])]);
        assert!(sparse.rows.is_empty());
    }
}
