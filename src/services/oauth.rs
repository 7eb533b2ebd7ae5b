// src/services/oauth.rs
use log::info;
use reqwest::{Client, Request};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::eventbrite::{Credentials, EventbriteClient, GatewayError, Result};

/// What the user handed back after authorizing the application.
#[derive(Debug, Clone)]
pub struct OAuthGrant {
    pub app_key: String,
    pub client_secret: String,
    pub access_code: String,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl AccessToken {
    pub fn into_credentials(self) -> Credentials {
        Credentials::AccessToken(self.access_token)
    }
}

pub fn build_token_request(client: &Client, base_url: &str, grant: &OAuthGrant) -> Result<Request> {
    let url = format!("{}/oauth/token", base_url.trim_end_matches('/'));
    let body = TokenRequest {
        grant_type: "authorization_code",
        client_id: &grant.app_key,
        client_secret: &grant.client_secret,
        code: &grant.access_code,
    };
    Ok(client.post(&url).form(&body).build()?)
}

impl EventbriteClient {
    /// Exchanges an access code for an OAuth2 bearer token. Needs no
    /// credentials of its own; persist the token and configure it as
    /// `access_token`.
    pub async fn oauth_handshake(base_url: &str, grant: &OAuthGrant) -> Result<AccessToken> {
        let client = Client::new();
        let request = build_token_request(&client, base_url, grant)?;
        info!("Exchanging access code for a token on {}", base_url);

        let body = client.execute(request).await?.text().await?;
        decode_token_response(&body)
    }
}

pub fn decode_token_response(body: &str) -> Result<AccessToken> {
    let value: Value = serde_json::from_str(body)?;

    if value.get("error").is_some() || value.get("access_token").is_none() {
        let reason = value
            .get("error_description")
            .or_else(|| value.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("no access_token in response");
        return Err(GatewayError::OAuth(reason.to_string()));
    }

    Ok(serde_json::from_value(value)?)
}
