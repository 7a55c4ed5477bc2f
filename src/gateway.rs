// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Certificate Gateway
//!
//! Typed proxy for the four remote certificate operations. Each operation is
//! a single HTTP round trip; the gateway performs no caching and no
//! authorization of its own — UI-level gating is advisory and the backend
//! remains the authority.
//!
//! Backend-reported failures stay inside the wire union
//! ([`RemoteOutcome::Err`]); [`GatewayError`] covers only transport-level
//! failures (network, unexpected status, undecodable body). Both are
//! normalized into one surfaced-failure path by `error::RemoteFailure`.
//!
//! Binary certificate payloads are base64-encoded into the JSON body and
//! discarded after the call resolves; mutating calls carry an
//! `Idempotency-Key` header.

use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::models::{
    Certificate, CertificateId, CertificateMetadata, RemoteOutcome, VerificationResult,
};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("backend request failed: {0}")]
    Request(String),

    #[error("backend response was invalid: {0}")]
    InvalidResponse(String),
}

/// The remote operations consumed from the certificate backend.
pub trait CertificateGateway: Send + Sync + 'static {
    /// Whether the backend considers the current caller an admin.
    fn is_current_user_admin(&self) -> impl Future<Output = Result<bool, GatewayError>> + Send;

    /// Register a certificate payload with its metadata.
    fn register_certificate(
        &self,
        payload: Vec<u8>,
        metadata: CertificateMetadata,
    ) -> impl Future<Output = Result<RemoteOutcome<CertificateId>, GatewayError>> + Send;

    /// Verify a certificate payload. Verification failure is a valid result
    /// (`isValid: false`), not an error.
    fn verify_certificate(
        &self,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<VerificationResult, GatewayError>> + Send;

    /// List every registered certificate.
    fn list_all_certificates(
        &self,
    ) -> impl Future<Output = Result<RemoteOutcome<Vec<Certificate>>, GatewayError>> + Send;

    /// Revoke a certificate by id.
    fn revoke_certificate(
        &self,
        id: CertificateId,
    ) -> impl Future<Output = Result<RemoteOutcome<CertificateId>, GatewayError>> + Send;
}

// =============================================================================
// Wire request bodies
// =============================================================================

#[derive(Debug, Serialize)]
struct RegisterRequest {
    /// Base64-encoded certificate image.
    payload: String,
    metadata: CertificateMetadata,
}

#[derive(Debug, Serialize)]
struct VerifyRequest {
    payload: String,
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// HTTP client for the certificate backend.
#[derive(Debug, Clone)]
pub struct HttpCertificateGateway {
    base_url: String,
    http: Client,
}

impl HttpCertificateGateway {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|e| GatewayError::Request(format!("GET {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Request(format!(
                "GET {path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("GET {path} invalid JSON: {e}")))
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let idempotency_key = Uuid::new_v4().to_string();
        debug!(path, idempotency_key, "backend POST");

        let response = self
            .http
            .post(self.endpoint(path))
            .header("Idempotency-Key", &idempotency_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Request(format!(
                "POST {path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))
    }
}

impl CertificateGateway for HttpCertificateGateway {
    async fn is_current_user_admin(&self) -> Result<bool, GatewayError> {
        self.get_json("/v1/session/is-admin").await
    }

    async fn register_certificate(
        &self,
        payload: Vec<u8>,
        metadata: CertificateMetadata,
    ) -> Result<RemoteOutcome<CertificateId>, GatewayError> {
        let body = RegisterRequest {
            payload: BASE64.encode(payload),
            metadata,
        };
        self.post_json("/v1/certificates", &body).await
    }

    async fn verify_certificate(
        &self,
        payload: Vec<u8>,
    ) -> Result<VerificationResult, GatewayError> {
        let body = VerifyRequest {
            payload: BASE64.encode(payload),
        };
        self.post_json("/v1/certificates/verify", &body).await
    }

    async fn list_all_certificates(
        &self,
    ) -> Result<RemoteOutcome<Vec<Certificate>>, GatewayError> {
        self.get_json("/v1/certificates").await
    }

    async fn revoke_certificate(
        &self,
        id: CertificateId,
    ) -> Result<RemoteOutcome<CertificateId>, GatewayError> {
        let path = format!("/v1/certificates/{id}/revoke");
        self.post_json(&path, &serde_json::json!({})).await
    }
}
