// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Handler-Boundary Errors
//!
//! Every failure is caught at the handler boundary and converted into a
//! single-sentence alert; nothing propagates to a panic and the application
//! stays interactive after any failure. The `Display` impl of [`AppError`]
//! is the alert text; the `source` chain carries the detail for logs.

use crate::gateway::GatewayError;
use crate::identity::IdentityError;
use crate::models::ErrorKind;

/// A failed remote operation, backend-reported or transport-level.
///
/// Both branches surface through the same `Error: {label}` alert path;
/// transport detail goes to the log, not the user.
#[derive(Debug)]
pub enum RemoteFailure {
    /// The backend rejected the operation (the wire `err` branch).
    Backend(ErrorKind),
    /// The call never produced a backend verdict (network/serialization).
    Transport(GatewayError),
}

impl std::fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteFailure::Backend(kind) => f.write_str(kind.label()),
            RemoteFailure::Transport(_) => f.write_str("TransportFailure"),
        }
    }
}

/// Failures surfaced to the user, one alert sentence each.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The identity provider could not be reached during startup.
    #[error("Authentication initialization failed")]
    AuthInit(#[source] IdentityError),

    /// The interactive login flow failed or was canceled.
    #[error("Login canceled or failed")]
    Login(#[source] IdentityError),

    /// The admin determination failed. Non-fatal: the session falls back to
    /// the non-admin view and this is logged, never alerted.
    #[error("Admin check failed; continuing without admin privileges")]
    AdminCheck(#[source] GatewayError),

    /// Required input was missing; caught before any remote call.
    #[error("{0}")]
    Validation(String),

    /// A remote operation failed, backend-reported or transport-level.
    #[error("Error: {0}")]
    Remote(RemoteFailure),

    /// The selected certificate file could not be read.
    #[error("Failed to read certificate file")]
    PayloadRead(#[source] std::io::Error),
}
