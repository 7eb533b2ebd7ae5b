// src/bin/oauth_token.rs
use registration_compare::services::eventbrite::{api_base_url, EventbriteClient, DEFAULT_API_HOST};
use registration_compare::services::oauth::OAuthGrant;
use std::env;
use std::error::Error;

/// Usage: oauth_token <access_code>
/// Reads EVENTBRITE_APP_KEY and EVENTBRITE_CLIENT_SECRET (and optionally
/// EVENTBRITE_API_HOST) from the environment.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let access_code = env::args().nth(1).ok_or("usage: oauth_token <access_code>")?;
    let grant = OAuthGrant {
        app_key: env::var("EVENTBRITE_APP_KEY")?,
        client_secret: env::var("EVENTBRITE_CLIENT_SECRET")?,
        access_code,
    };

    let host = env::var("EVENTBRITE_API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.to_string());
    let token = EventbriteClient::oauth_handshake(&api_base_url(&host), &grant).await?;

    println!("access_token: {}", token.access_token);
    println!("Set it as EVENTBRITE_ACCESS_TOKEN or access_token in the settings file.");
    Ok(())
}
