// src/services/eventbrite.rs
use chrono::NaiveDateTime;
use log::{debug, info};
use reqwest::{header, Client, Request};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{Attendee, AttendeeList, Event, EventEnvelope, EventId, EventList};
use crate::API_DATE_FORMAT;

pub const DEFAULT_API_HOST: &str = "www.eventbrite.com";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote error ({error_type}): {message}")]
    Remote { error_type: String, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("OAuth token exchange failed: {0}")]
    OAuth(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Malformed(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Every operation the JSON API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    DiscountNew,
    DiscountUpdate,
    EventCopy,
    EventGet,
    EventListAttendees,
    EventListDiscounts,
    EventListOrganizer,
    EventNew,
    EventSearch,
    EventUpdate,
    OrganizerNew,
    OrganizerUpdate,
    PaymentUpdate,
    TicketNew,
    TicketUpdate,
    UserGet,
    UserListEvents,
    UserListOrganizers,
    UserListTickets,
    UserListVenues,
    UserNew,
    UserUpdate,
    VenueNew,
    VenueUpdate,
}

impl ApiMethod {
    pub const ALL: [ApiMethod; 24] = [
        ApiMethod::DiscountNew,
        ApiMethod::DiscountUpdate,
        ApiMethod::EventCopy,
        ApiMethod::EventGet,
        ApiMethod::EventListAttendees,
        ApiMethod::EventListDiscounts,
        ApiMethod::EventListOrganizer,
        ApiMethod::EventNew,
        ApiMethod::EventSearch,
        ApiMethod::EventUpdate,
        ApiMethod::OrganizerNew,
        ApiMethod::OrganizerUpdate,
        ApiMethod::PaymentUpdate,
        ApiMethod::TicketNew,
        ApiMethod::TicketUpdate,
        ApiMethod::UserGet,
        ApiMethod::UserListEvents,
        ApiMethod::UserListOrganizers,
        ApiMethod::UserListTickets,
        ApiMethod::UserListVenues,
        ApiMethod::UserNew,
        ApiMethod::UserUpdate,
        ApiMethod::VenueNew,
        ApiMethod::VenueUpdate,
    ];

    /// Path segment under `/json/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMethod::DiscountNew => "discount_new",
            ApiMethod::DiscountUpdate => "discount_update",
            ApiMethod::EventCopy => "event_copy",
            ApiMethod::EventGet => "event_get",
            ApiMethod::EventListAttendees => "event_list_attendees",
            ApiMethod::EventListDiscounts => "event_list_discounts",
            ApiMethod::EventListOrganizer => "event_list_organizer",
            ApiMethod::EventNew => "event_new",
            ApiMethod::EventSearch => "event_search",
            ApiMethod::EventUpdate => "event_update",
            ApiMethod::OrganizerNew => "organizer_new",
            ApiMethod::OrganizerUpdate => "organizer_update",
            ApiMethod::PaymentUpdate => "payment_update",
            ApiMethod::TicketNew => "ticket_new",
            ApiMethod::TicketUpdate => "ticket_update",
            ApiMethod::UserGet => "user_get",
            ApiMethod::UserListEvents => "user_list_events",
            ApiMethod::UserListOrganizers => "user_list_organizers",
            ApiMethod::UserListTickets => "user_list_tickets",
            ApiMethod::UserListVenues => "user_list_venues",
            ApiMethod::UserNew => "user_new",
            ApiMethod::UserUpdate => "user_update",
            ApiMethod::VenueNew => "venue_new",
            ApiMethod::VenueUpdate => "venue_update",
        }
    }

    /// Pre-0.30 client names, still found in older scripts.
    fn from_legacy_alias(name: &str) -> Option<ApiMethod> {
        let method = match name {
            "copy_event" => ApiMethod::EventCopy,
            "get_event" => ApiMethod::EventGet,
            "get_user" => ApiMethod::UserGet,
            "list_event_attendees" => ApiMethod::EventListAttendees,
            "list_event_discounts" => ApiMethod::EventListDiscounts,
            "list_organizer_events" => ApiMethod::EventListOrganizer,
            "list_user_events" => ApiMethod::UserListEvents,
            "list_user_organizers" => ApiMethod::UserListOrganizers,
            "list_user_tickets" => ApiMethod::UserListTickets,
            "list_user_venues" => ApiMethod::UserListVenues,
            "new_discount" => ApiMethod::DiscountNew,
            "new_event" => ApiMethod::EventNew,
            "new_organizer" => ApiMethod::OrganizerNew,
            "new_ticket" => ApiMethod::TicketNew,
            "new_user" => ApiMethod::UserNew,
            "new_venue" => ApiMethod::VenueNew,
            "search_events" => ApiMethod::EventSearch,
            "update_discount" => ApiMethod::DiscountUpdate,
            "update_event" => ApiMethod::EventUpdate,
            "update_organizer" => ApiMethod::OrganizerUpdate,
            "update_payment" => ApiMethod::PaymentUpdate,
            "update_ticket" => ApiMethod::TicketUpdate,
            "update_user" => ApiMethod::UserUpdate,
            "update_venue" => ApiMethod::VenueUpdate,
            _ => return None,
        };
        Some(method)
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown API method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for ApiMethod {
    type Err = UnknownMethod;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        ApiMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == name)
            .or_else(|| ApiMethod::from_legacy_alias(name))
            .ok_or_else(|| UnknownMethod(name.to_string()))
    }
}

/// Ordered request parameters, encoded the way the API expects them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Params::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_list<I, S>(self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.with(key, joined)
    }

    /// `1` / `0` flags, used by most boolean options.
    pub fn with_flag(self, key: &str, on: bool) -> Self {
        self.with(key, if on { "1" } else { "0" })
    }

    /// `true` / `false`, used by the few options that take a literal.
    pub fn with_bool(self, key: &str, on: bool) -> Self {
        self.with(key, if on { "true" } else { "false" })
    }

    pub fn with_datetime(self, key: &str, at: &NaiveDateTime) -> Self {
        self.with(key, at.format(API_DATE_FORMAT))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

#[derive(Clone, PartialEq)]
pub enum Credentials {
    UserKey { app_key: String, user_key: String },
    Password { app_key: String, user: String, password: String },
    AccessToken(String),
}

impl Credentials {
    /// Parameters appended to every request. Bearer tokens travel in a header instead.
    fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        match self {
            Credentials::UserKey { app_key, user_key } => {
                vec![("app_key", app_key.as_str()), ("user_key", user_key.as_str())]
            }
            Credentials::Password { app_key, user, password } => vec![
                ("app_key", app_key.as_str()),
                ("user", user.as_str()),
                ("password", password.as_str()),
            ],
            Credentials::AccessToken(_) => Vec::new(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Credentials::UserKey { .. } => f.write_str("Credentials::UserKey(..)"),
            Credentials::Password { user, .. } => write!(f, "Credentials::Password({}, ..)", user),
            Credentials::AccessToken(_) => f.write_str("Credentials::AccessToken(..)"),
        }
    }
}

/// Client for the JSON API. One `reqwest::Client` per instance, so every
/// call in a run goes through the same connection pool.
pub struct EventbriteClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

/// `https://{host}`, the root every API path hangs off.
pub fn api_base_url(host: &str) -> String {
    format!("https://{}", host)
}

impl EventbriteClient {
    pub fn new(credentials: Credentials) -> Self {
        EventbriteClient {
            client: Client::new(),
            base_url: api_base_url(DEFAULT_API_HOST),
            credentials,
        }
    }

    pub fn with_host(self, host: &str) -> Self {
        self.with_base_url(api_base_url(host))
    }

    /// Replaces scheme and host together, e.g. `http://127.0.0.1:3030`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    pub fn build_request(&self, method: ApiMethod, params: &Params) -> Result<Request> {
        let url = format!("{}/json/{}", self.base_url, method);
        let mut builder = self
            .client
            .get(&url)
            .query(params.pairs())
            .query(&self.credentials.query_pairs());

        if let Credentials::AccessToken(token) = &self.credentials {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        Ok(builder.build()?)
    }

    /// Performs one round trip and returns the decoded body.
    pub async fn call(&self, method: ApiMethod, params: &Params) -> Result<Value> {
        let request = self.build_request(method, params)?;
        info!("Calling {} on {}", method, self.base_url);

        let body = self.client.execute(request).await?.text().await?;
        debug!("Response from {}: {} bytes", method, body.len());

        decode_response(&body)
    }

    pub async fn call_typed<T: DeserializeOwned>(&self, method: ApiMethod, params: &Params) -> Result<T> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| GatewayError::Malformed(format!("{} response: {}", method, e)))
    }

    pub async fn event_get(&self, id: &EventId) -> Result<Event> {
        let params = Params::new().with("id", id);
        let envelope: EventEnvelope = self.call_typed(ApiMethod::EventGet, &params).await?;
        Ok(envelope.event)
    }

    pub async fn event_list_attendees(&self, id: &EventId, sort_by: Option<&str>) -> Result<Vec<Attendee>> {
        let mut params = Params::new().with("id", id);
        if let Some(sort_by) = sort_by {
            params = params.with("sort_by", sort_by);
        }
        let list: AttendeeList = self.call_typed(ApiMethod::EventListAttendees, &params).await?;
        Ok(list.attendees.into_iter().map(|a| a.attendee).collect())
    }

    pub async fn user_list_events(&self, params: &Params) -> Result<EventList> {
        self.call_typed(ApiMethod::UserListEvents, params).await
    }

    pub async fn event_search(&self, params: &Params) -> Result<EventList> {
        self.call_typed(ApiMethod::EventSearch, params).await
    }
}

/// Parses a response body, turning an `error.error_message` envelope into
/// [`GatewayError::Remote`]. Nothing else in the body is validated.
pub fn decode_response(body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body)?;

    if let Some(message) = value
        .get("error")
        .and_then(|e| e.get("error_message"))
        .and_then(Value::as_str)
    {
        let error_type = value["error"]["error_type"].as_str().unwrap_or("Error").to_string();
        return Err(GatewayError::Remote {
            error_type,
            message: message.to_string(),
        });
    }

    Ok(value)
}
