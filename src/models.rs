// src/models.rs
use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::API_DATE_FORMAT;

/// The remote API hands ids out as numbers but accepts them back as strings,
/// and settings files contain both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        EventId(id.to_string())
    }
}

impl From<u64> for EventId {
    fn from(id: u64) -> Self {
        EventId(id.to_string())
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        string_or_number(deserializer).map(EventId)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

/// `amount_paid` arrives as `"10.00"` on most accounts and as a bare number on some.
fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
        StringOrNumber::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom(format!("amount out of range: {}", n))),
    }
}

/// Response of `event_get`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    pub event: Event,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub start_date: String,
    #[serde(default)]
    pub venue: Option<Venue>,
}

impl Event {
    pub fn start(&self) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(&self.start_date, API_DATE_FORMAT)
    }

    pub fn venue_name(&self) -> Option<&str> {
        self.venue.as_ref().and_then(|v| v.name.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Venue {
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of `event_list_attendees`.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendeeList {
    pub attendees: Vec<AttendeeEnvelope>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendeeEnvelope {
    pub attendee: Attendee,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attendee {
    pub created: String,
    #[serde(deserialize_with = "amount")]
    pub amount_paid: f64,
}

impl Attendee {
    pub fn created_at(&self) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(&self.created, API_DATE_FORMAT)
    }
}

/// Response of the event listing calls (`event_search`, `user_list_events`,
/// `event_list_organizer`). Entries other than `{"event": …}`, such as the
/// search summary, are kept raw and skipped by [`EventList::events`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

impl EventList {
    pub fn events(&self) -> Vec<Event> {
        self.events
            .iter()
            .filter_map(|entry| entry.get("event"))
            .filter_map(|event| match serde_json::from_value::<Event>(event.clone()) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Skipping undecodable event entry: {}", e);
                    None
                }
            })
            .collect()
    }
}
