// src/bin/render_widgets.rs
use registration_compare::config::Settings;
use registration_compare::models::EventId;
use registration_compare::services::eventbrite::Params;
use registration_compare::services::widgets;
use std::env;
use std::error::Error;

/// Prints every widget for one event, then the user's event list.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let settings = Settings::from_env()?;
    let client = settings.client()?;

    let event_id = env::args()
        .nth(1)
        .map(EventId)
        .or_else(|| settings.event_ids.first().cloned())
        .ok_or("no event id given")?;
    let event = client.event_get(&event_id).await?;

    println!("{}\n", widgets::ticket_widget(&event));
    println!("{}\n", widgets::registration_widget(&event));
    println!("{}\n", widgets::calendar_widget(&event));
    println!("{}\n", widgets::countdown_widget(&event));
    println!("{}\n", widgets::button_widget(&event));
    println!("{}\n", widgets::link_widget(&event, None, None));

    let events = client.user_list_events(&Params::new()).await?;
    println!("{}", widgets::event_list(&events, widgets::event_list_row)?);
    Ok(())
}
