// src/bin/show_event.rs
use log::info;
use registration_compare::config::Settings;
use registration_compare::models::EventId;
use registration_compare::services::registrations::{build_series, EventRegistrations};
use std::env;
use std::error::Error;

/// Fetches one event and prints its days-before series.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let settings = Settings::from_env()?;
    let client = settings.client()?;

    // First argument, else the first configured event.
    let event_id = env::args()
        .nth(1)
        .map(EventId)
        .or_else(|| settings.event_ids.first().cloned())
        .ok_or("no event id given")?;

    let event = client.event_get(&event_id).await?;
    info!("Fetched event {} ({})", event.id, event.title);
    let attendees = client.event_list_attendees(&event_id, Some("created")).await?;

    let registrations = EventRegistrations::from_remote(&event_id, &event, &attendees)?;
    let series = build_series(&registrations);

    println!("{}  {}  starts {}", event.id, event.title, event.start_date);
    println!("days_before\tamount\ttotal");
    for point in &series.points {
        println!("{}\t{}\t{}", point.days_before, point.amount, point.total);
    }
    Ok(())
}
