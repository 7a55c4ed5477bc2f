// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wire Data Models
//!
//! This module defines the data structures exchanged with the certificate
//! backend. All types derive `Serialize` and `Deserialize`; field names are
//! camelCase on the wire to match the backend contract.
//!
//! ## Result Convention
//!
//! Every mutating backend call answers with a tagged union, `{"ok": ...}` or
//! `{"err": ...}`, modeled by [`RemoteOutcome`]. Verification is different:
//! an invalid certificate is a *valid result* (`isValid: false`), carried in
//! [`VerificationResult`], never in the error branch.

use serde::{Deserialize, Serialize};

// =============================================================================
// Certificate Id Type
// =============================================================================

/// Opaque backend-assigned certificate identifier.
///
/// Provides type safety for certificate ids throughout the client; the
/// backend is the only party that mints them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CertificateId(pub String);

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CertificateId {
    fn from(value: String) -> Self {
        CertificateId(value)
    }
}

impl From<&str> for CertificateId {
    fn from(value: &str) -> Self {
        CertificateId(value.to_string())
    }
}

impl From<CertificateId> for String {
    fn from(value: CertificateId) -> Self {
        value.0
    }
}

// =============================================================================
// Certificate Models
// =============================================================================

/// Descriptive metadata attached to a certificate at registration time.
///
/// All six fields are required by the backend; the client validates that
/// none is empty before submitting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateMetadata {
    /// Human-readable certificate name.
    pub name: String,
    /// Issuing organization.
    pub issuer: String,
    /// Person or entity the certificate was issued to.
    pub issued_to: String,
    /// Issue date as entered by the registrar.
    pub issue_date: String,
    /// Free-form description.
    pub description: String,
    /// Certificate category (e.g. diploma, award).
    pub certificate_type: String,
}

impl CertificateMetadata {
    /// Whether every required field is populated.
    pub fn is_complete(&self) -> bool {
        self.first_missing_field().is_none()
    }

    /// Name of the first empty field, if any. Used for validation alerts.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("name")
        } else if self.issuer.trim().is_empty() {
            Some("issuer")
        } else if self.issued_to.trim().is_empty() {
            Some("issued-to")
        } else if self.issue_date.trim().is_empty() {
            Some("issue-date")
        } else if self.description.trim().is_empty() {
            Some("description")
        } else if self.certificate_type.trim().is_empty() {
            Some("type")
        } else {
            None
        }
    }
}

/// A registered certificate as reported by the backend.
///
/// The binary payload is intentionally absent: it is only transmitted at
/// submission/verification time and never retained client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Certificate {
    /// Backend-assigned identifier.
    pub id: CertificateId,
    /// Descriptive metadata captured at registration.
    pub metadata: CertificateMetadata,
}

/// Outcome of a verification call.
///
/// `certificate` is present only when `is_valid` is true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Whether the submitted payload matched a registered certificate.
    pub is_valid: bool,
    /// Backend-provided explanation (e.g. "hash mismatch").
    pub message: String,
    /// The matched certificate, when verification succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

// =============================================================================
// Backend Result Union
// =============================================================================

/// Backend-reported failure reasons.
///
/// This is the closed set carried in the `err` branch of [`RemoteOutcome`];
/// transport-level failures are typed separately (see `gateway::GatewayError`)
/// and never appear here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller lacks the rights for the operation.
    NotAuthorized,
    /// No certificate with the given id.
    NotFound,
    /// A certificate with the same payload hash already exists.
    DuplicateId,
    /// The submitted payload was rejected (empty or malformed).
    InvalidPayload,
    /// The certificate was already revoked.
    AlreadyRevoked,
}

impl ErrorKind {
    /// The wire label, also used verbatim in user-facing alerts.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::NotAuthorized => "NotAuthorized",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::DuplicateId => "DuplicateId",
            ErrorKind::InvalidPayload => "InvalidPayload",
            ErrorKind::AlreadyRevoked => "AlreadyRevoked",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The backend's two-branch result union: `{"ok": T}` or `{"err": ErrorKind}`.
///
/// Preserved exactly as serialized by the backend; the gateway never folds
/// the `err` branch into a transport error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RemoteOutcome<T> {
    /// Operation succeeded.
    Ok(T),
    /// Operation was rejected by the backend.
    Err(ErrorKind),
}

impl<T> RemoteOutcome<T> {
    /// Convert into a standard `Result`, keeping the backend error kind.
    pub fn into_result(self) -> Result<T, ErrorKind> {
        match self {
            RemoteOutcome::Ok(value) => Ok(value),
            RemoteOutcome::Err(kind) => Err(kind),
        }
    }
}
