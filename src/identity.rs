// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Provider Client
//!
//! Consumes the external identity provider's session contract: probe for an
//! existing session, run the interactive login flow, fetch the identity, and
//! invalidate the session on logout.
//!
//! ## Login Flow
//!
//! The provider performs authentication on its own authorization surface.
//! `login` requests a challenge (forwarding the configured display geometry),
//! surfaces the authorization URL to the user, then polls until the provider
//! reports completion, denial, or the poll budget runs out.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::config::WindowGeometry;

const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(2);
const LOGIN_POLL_ATTEMPTS: u32 = 60;

/// An authenticated identity as issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    /// Opaque unique identifier for the authenticated identity.
    pub principal: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity provider request failed: {0}")]
    Request(String),

    #[error("identity provider response was invalid: {0}")]
    InvalidResponse(String),

    #[error("login was denied or canceled")]
    Denied,

    #[error("login timed out waiting for authorization")]
    TimedOut,
}

/// The session contract consumed from the identity provider.
///
/// The controller only depends on this trait; the HTTP implementation below
/// is swapped for a mock in controller tests.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Whether the provider holds a live session for this client.
    fn is_authenticated(&self) -> impl Future<Output = Result<bool, IdentityError>> + Send;

    /// Run the interactive login flow to completion.
    fn login(&self) -> impl Future<Output = Result<Identity, IdentityError>> + Send;

    /// Invalidate the remote session.
    fn logout(&self) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Fetch the identity behind the live session.
    fn identity(&self) -> impl Future<Output = Result<Identity, IdentityError>> + Send;
}

// =============================================================================
// HTTP implementation
// =============================================================================

#[derive(Debug, Deserialize)]
struct SessionStatus {
    authenticated: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginChallenge {
    authorization_url: String,
    nonce: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LoginPollStatus {
    Pending,
    Complete,
    Denied,
}

#[derive(Debug, Deserialize)]
struct LoginPoll {
    status: LoginPollStatus,
    principal: Option<String>,
}

/// HTTP client for the identity provider.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    base_url: String,
    window: WindowGeometry,
    http: Client,
}

impl HttpIdentityProvider {
    pub fn new(
        base_url: &Url,
        window: WindowGeometry,
        timeout: Duration,
    ) -> Result<Self, IdentityError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            window,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, IdentityError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|e| IdentityError::Request(format!("GET {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Request(format!(
                "GET {path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(format!("GET {path} invalid JSON: {e}")))
    }
}

impl IdentityProvider for HttpIdentityProvider {
    async fn is_authenticated(&self) -> Result<bool, IdentityError> {
        let status: SessionStatus = self.get_json("/v1/session").await?;
        Ok(status.authenticated)
    }

    async fn login(&self) -> Result<Identity, IdentityError> {
        let payload = json!({
            "window": { "width": self.window.width, "height": self.window.height }
        });

        let response = self
            .http
            .post(self.endpoint("/v1/login"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| IdentityError::Request(format!("POST /v1/login failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Request(format!(
                "POST /v1/login returned {status}: {body}"
            )));
        }

        let challenge: LoginChallenge = response.json().await.map_err(|e| {
            IdentityError::InvalidResponse(format!("POST /v1/login invalid JSON: {e}"))
        })?;

        info!(
            url = %challenge.authorization_url,
            window = %self.window,
            "waiting for interactive authorization"
        );
        println!(
            "Open the authorization page to continue login ({}):\n  {}",
            self.window, challenge.authorization_url
        );

        let poll_path = format!("/v1/login/{}", challenge.nonce);
        for attempt in 0..LOGIN_POLL_ATTEMPTS {
            tokio::time::sleep(LOGIN_POLL_INTERVAL).await;
            let poll: LoginPoll = self.get_json(&poll_path).await?;
            match poll.status {
                LoginPollStatus::Pending => {
                    debug!(attempt, "authorization still pending");
                }
                LoginPollStatus::Denied => return Err(IdentityError::Denied),
                LoginPollStatus::Complete => {
                    let principal = poll.principal.ok_or_else(|| {
                        IdentityError::InvalidResponse(
                            "login completed without a principal".to_string(),
                        )
                    })?;
                    return Ok(Identity { principal });
                }
            }
        }
        Err(IdentityError::TimedOut)
    }

    async fn logout(&self) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(self.endpoint("/v1/logout"))
            .send()
            .await
            .map_err(|e| IdentityError::Request(format!("POST /v1/logout failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(IdentityError::Request(format!(
                "POST /v1/logout returned {status}"
            )));
        }
        Ok(())
    }

    async fn identity(&self) -> Result<Identity, IdentityError> {
        self.get_json("/v1/identity").await
    }
}
