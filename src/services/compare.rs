// src/services/compare.rs
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use super::eventbrite::EventbriteClient;
use super::registrations::{
    build_series, collect, merge_series_with_drop, CollectError, ComparisonTable, FailurePolicy,
};
use super::report::save_report;
use crate::models::EventId;

pub const CONNECTION_HINT: &str = "A problem occurred during the connection, make sure your settings \
have the correct values (app_key and user_key).\n\nYou can find these values on the Eventbrite website.";

/// Fetches every event and merges them into one table. Events skipped under
/// [`FailurePolicy::Skip`] have no column but still count towards the drop.
pub async fn compare_events(
    client: &EventbriteClient,
    event_ids: &[EventId],
    policy: FailurePolicy,
) -> std::result::Result<ComparisonTable, CollectError> {
    let events = collect(client, event_ids, policy).await?;
    let series: Vec<_> = events.iter().map(build_series).collect();
    let table = merge_series_with_drop(&series, event_ids.len());

    info!(
        "Merged {} of {} events into {} rows",
        table.event_ids.len(),
        event_ids.len(),
        table.rows.len()
    );
    Ok(table)
}

/// Compares the events and writes `data.tsv` into `dir`. Nothing is written
/// unless every step before it succeeded.
pub async fn write_comparison(
    client: &EventbriteClient,
    event_ids: &[EventId],
    policy: FailurePolicy,
    dir: &Path,
) -> Result<PathBuf> {
    let table = compare_events(client, event_ids, policy)
        .await
        .context(CONNECTION_HINT)?;
    Ok(save_report(&table, dir)?)
}
