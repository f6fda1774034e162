//! API client for the Formula 1 streaming services.
//!
//! Three endpoint families are involved: the account API (api.formula1.com)
//! for password authentication, the account site for API-key discovery, and
//! the F1 TV content API (f1tv.formula1.com) for catalog browsing and
//! playback resolution.

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{ApiResponse, ContainerPage, PlaybackResult, UserLocationResult};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for account endpoints (authentication lives here)
const ACCOUNT_API_BASE: &str = "https://api.formula1.com/v2";

/// Script on the account site the API key is scraped from
const ACCOUNT_SCRIPT_URL: &str = "https://account.formula1.com/scripts/main.min.js";

/// Base URL for the v1 content API (playback and user location)
const TV_API_V1_BASE: &str = "https://f1tv.formula1.com/1.0/R/ENG/BIG_SCREEN_HLS";

/// Base URL for the v2 content API (catalog browsing)
const TV_API_V2_BASE: &str = "https://f1tv.formula1.com/2.0/R/ENG/BIG_SCREEN_HLS";

/// The provider rejects unknown user agents on some endpoints
const USER_AGENT: &str = "RaceControl";

/// Subscription tier segment baked into every catalog path
const SUBSCRIPTION_TIER: &str = "F1_TV_Pro_Monthly";

/// Group id used when the USER/LOCATION lookup yields nothing usable
pub const DEFAULT_GROUP_ID: u32 = 14;

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Pattern locating the API key inside the account site's minified script
const API_KEY_PATTERN: &str = r#"apikey: *"(.*?)""#;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "Login")]
    login: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    data: AuthData,
}

#[derive(Debug, Deserialize)]
struct AuthData {
    #[serde(rename = "subscriptionToken")]
    subscription_token: Option<String>,
}

/// API client for F1 TV.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    group_id: u32,
}

impl ApiClient {
    /// Create a new API client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            group_id: DEFAULT_GROUP_ID,
        })
    }

    /// Set the account's group id for subsequent catalog requests
    pub fn set_group_id(&mut self, group_id: u32) {
        self.group_id = group_id;
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn get_page(&self, url: &str, query: &[(&str, String)]) -> Result<ContainerPage> {
        let response: ApiResponse<ContainerPage> = self.get_json(url, query).await?;
        Ok(response.result_obj)
    }

    // ===== Account endpoints =====

    /// Scrape the subscriber API key from the account site's main script
    pub async fn fetch_api_key(&self) -> Result<String> {
        let script = self
            .client
            .get(ACCOUNT_SCRIPT_URL)
            .send()
            .await
            .context("Failed to download account script")?
            .text()
            .await
            .context("Failed to read account script body")?;

        let pattern = Regex::new(API_KEY_PATTERN).context("Invalid API key pattern")?;
        let api_key = pattern
            .captures(&script)
            .and_then(|captures| captures.get(1))
            .ok_or(ApiError::ApiKeyNotFound)?
            .as_str()
            .to_string();

        debug!("extracted API key from account script");
        Ok(api_key)
    }

    /// Look up the account's group id. Falls back to [`DEFAULT_GROUP_ID`]
    /// when the location payload lacks the expected structure.
    pub async fn fetch_group_id(&self) -> Result<u32> {
        let url = format!("{}/ALL/USER/LOCATION", TV_API_V1_BASE);
        let response: ApiResponse<UserLocationResult> = self.get_json(&url, &[]).await?;

        match response.result_obj.user_location.first() {
            Some(location) => Ok(location.group_id),
            None => {
                warn!("no user location entries, using default group id");
                Ok(DEFAULT_GROUP_ID)
            }
        }
    }

    /// Authenticate with the account API and return the subscription token
    pub async fn authenticate(
        &self,
        api_key: &str,
        username: &str,
        password: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/account/subscriber/authenticate/by-password",
            ACCOUNT_API_BASE
        );
        let body = LoginRequest {
            login: username,
            password,
        };

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header("apiKey", api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send authentication request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Authentication(format!("{}: {}", status, body)).into());
        }

        let auth: AuthResponse = response
            .json()
            .await
            .context("Failed to parse authentication response")?;

        auth.data
            .subscription_token
            .ok_or_else(|| ApiError::Authentication("no subscription token in response".into()).into())
    }

    // ===== Catalog endpoints =====

    /// Fetch a content page by id (front page, archive, shows, documentaries,
    /// or an archive season page)
    pub async fn fetch_page(&self, page_id: &str) -> Result<ContainerPage> {
        let url = format!(
            "{}/ALL/PAGE/{}/{}/{}",
            TV_API_V2_BASE, page_id, SUBSCRIPTION_TIER, self.group_id
        );
        self.get_page(&url, &[]).await
    }

    /// Search meetings (race weekends) of a season
    pub async fn search_meetings(&self, year: u32) -> Result<ContainerPage> {
        let url = format!(
            "{}/ALL/PAGE/SEARCH/VOD/{}/{}",
            TV_API_V2_BASE, SUBSCRIPTION_TIER, self.group_id
        );
        let query = [
            ("filter_objectSubtype", "Meeting".to_string()),
            ("filter_season", year.to_string()),
            ("filter_fetchAll", "Y".to_string()),
            ("filter_orderByFom", "Y".to_string()),
        ];
        self.get_page(&url, &query).await
    }

    /// Run a VOD search with caller-supplied parameters (used when a tray
    /// carries a raw search uri instead of a collection)
    pub async fn search_with_params(&self, params: &[(String, String)]) -> Result<ContainerPage> {
        let url = format!(
            "{}/ALL/PAGE/SEARCH/VOD/{}/{}",
            TV_API_V2_BASE, SUBSCRIPTION_TIER, self.group_id
        );
        let query: Vec<(&str, String)> = params
            .iter()
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();
        self.get_page(&url, &query).await
    }

    /// Fetch an external collection (an archive/shows tray) by id
    pub async fn fetch_collection(&self, collection_id: &str) -> Result<ContainerPage> {
        let url = format!(
            "{}/ALL/PAGE/EXTCOLLECTION/{}/{}/{}",
            TV_API_V2_BASE, collection_id, SUBSCRIPTION_TIER, self.group_id
        );
        self.get_page(&url, &[]).await
    }

    /// Fetch the weekend sessions of a meeting
    pub async fn fetch_meeting_sessions(&self, meeting_key: &str) -> Result<ContainerPage> {
        let url = format!(
            "{}/ALL/PAGE/SANDWICH/{}/{}",
            TV_API_V2_BASE, SUBSCRIPTION_TIER, self.group_id
        );
        let query = [
            ("meetingId", meeting_key.to_string()),
            ("title", "weekend-sessions".to_string()),
        ];
        self.get_page(&url, &query).await
    }

    /// Fetch the details of a single video, including any additional streams
    pub async fn fetch_video_details(&self, content_id: &str) -> Result<ContainerPage> {
        let url = format!(
            "{}/ALL/CONTENT/VIDEO/{}/{}/{}",
            TV_API_V2_BASE, content_id, SUBSCRIPTION_TIER, self.group_id
        );
        self.get_page(&url, &[]).await
    }

    // ===== Playback =====

    /// Resolve the stream URL for a piece of content, optionally for a
    /// specific channel (additional stream)
    pub async fn resolve_playback(
        &self,
        token: &str,
        content_id: &str,
        channel_id: Option<&str>,
    ) -> Result<String> {
        let url = format!("{}/ALL/CONTENT/PLAY", TV_API_V1_BASE);
        let mut query = vec![("contentId", content_id.to_string())];
        if let Some(channel_id) = channel_id {
            query.push(("channelId", channel_id.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .header("ascendontoken", token)
            .send()
            .await
            .context("Failed to send playback request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Playback(format!("{}: {}", status, body)).into());
        }

        let playback: ApiResponse<PlaybackResult> = response
            .json()
            .await
            .context("Failed to parse playback response")?;

        Ok(playback.result_obj.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_pattern() {
        let pattern = Regex::new(API_KEY_PATTERN).unwrap();

        let script = r#"var config={apikey: "fCUCjWrKPu9ylJwRAv8BpGLEgiAuThx7",site:"account"};"#;
        let key = pattern.captures(script).unwrap().get(1).unwrap().as_str();
        assert_eq!(key, "fCUCjWrKPu9ylJwRAv8BpGLEgiAuThx7");

        // tolerate whitespace after the colon
        let script = r#"apikey:   "abc123""#;
        let key = pattern.captures(script).unwrap().get(1).unwrap().as_str();
        assert_eq!(key, "abc123");

        assert!(pattern.captures("no key in here").is_none());
    }

    #[test]
    fn test_parse_auth_response() {
        let json = r#"{"data": {"subscriptionToken": "T", "sessionId": "ignored"}}"#;
        let auth: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(auth.data.subscription_token.as_deref(), Some("T"));

        let json = r#"{"data": {}}"#;
        let auth: AuthResponse = serde_json::from_str(json).unwrap();
        assert!(auth.data.subscription_token.is_none());
    }
}
