//! Jira credentials.
//!
//! Two schemes are supported and modelled as one sum type so that the two
//! places that care (request headers and the refresh check) match on it
//! exhaustively:
//!
//! - **API token**: basic auth with account email and token against the
//!   site host; never expires on its own
//! - **OAuth 2.0 (3LO)**: bearer token against the Atlassian API gateway,
//!   renewed with the refresh token shortly before `expiresAt`
//!
//! Secrets are stored sealed (see [`Secret`]); they are opened only when a
//! request is built.

use super::ApiError;
use crate::libs::secret::Secret;
use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const OAUTH_TOKEN_URL: &str = "https://auth.atlassian.com/oauth/token";
pub const OAUTH_API_URL: &str = "https://api.atlassian.com/ex/jira";

/// Refresh this long before the access token actually expires.
const REFRESH_MARGIN_MS: i64 = 60_000;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Auth {
    ApiToken {
        email: String,
        /// Sealed API token.
        token: String,
    },
    #[serde(rename = "oauth", rename_all = "camelCase")]
    OAuth {
        cloud_id: String,
        client_id: String,
        /// Sealed client secret.
        client_secret: String,
        /// Sealed access token.
        access_token: String,
        /// Sealed refresh token.
        refresh_token: String,
        /// Access token expiry, epoch milliseconds.
        expires_at: i64,
    },
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

impl Auth {
    pub fn needs_refresh(&self, now_ms: i64) -> bool {
        match self {
            Auth::ApiToken { .. } => false,
            Auth::OAuth { expires_at, .. } => now_ms + REFRESH_MARGIN_MS >= *expires_at,
        }
    }

    /// Base URL that REST paths are appended to.
    pub fn base_url(&self, host: &str) -> String {
        match self {
            Auth::ApiToken { .. } => host.trim_end_matches('/').to_string(),
            Auth::OAuth { cloud_id, .. } => format!("{}/{}", OAUTH_API_URL, cloud_id),
        }
    }

    /// Value of the `Authorization` header.
    pub fn header_value(&self, secret: &Secret) -> Result<String, ApiError> {
        let open = |sealed: &str| secret.open(sealed).map_err(|e| ApiError::Unknown(format!("stored credential is unreadable: {}", e)));
        match self {
            Auth::ApiToken { email, token } => {
                let token = open(token)?;
                Ok(format!("Basic {}", BASE64_STANDARD.encode(format!("{}:{}", email, token))))
            }
            Auth::OAuth { access_token, .. } => Ok(format!("Bearer {}", open(access_token)?)),
        }
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// API tokens have nothing to refresh and come back unchanged.
    pub async fn refreshed(&self, client: &Client, secret: &Secret, now_ms: i64) -> Result<Auth, ApiError> {
        let Auth::OAuth {
            cloud_id,
            client_id,
            client_secret,
            refresh_token,
            ..
        } = self
        else {
            return Ok(self.clone());
        };

        let seal_error = |e: anyhow::Error| ApiError::Unknown(e.to_string());
        let plain_secret = secret.open(client_secret).map_err(seal_error)?;
        let plain_refresh = secret.open(refresh_token).map_err(seal_error)?;
        let response = client
            .post(OAUTH_TOKEN_URL)
            .json(&RefreshRequest {
                grant_type: "refresh_token",
                client_id,
                client_secret: &plain_secret,
                refresh_token: &plain_refresh,
            })
            .send()
            .await?;

        match response.status().as_u16() {
            200..=299 => {}
            400 | 401 | 403 => return Err(ApiError::AuthenticationFailed),
            status => return Err(ApiError::Unknown(format!("token refresh returned HTTP {}", status))),
        }

        let tokens = response.json::<RefreshResponse>().await?;
        let refresh_token = match tokens.refresh_token {
            Some(rotated) => secret.seal(&rotated).map_err(seal_error)?,
            None => refresh_token.clone(),
        };
        Ok(Auth::OAuth {
            cloud_id: cloud_id.clone(),
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            access_token: secret.seal(&tokens.access_token).map_err(seal_error)?,
            refresh_token,
            expires_at: now_ms + tokens.expires_in * 1000,
        })
    }
}
