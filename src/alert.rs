// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Alert Notifier
//!
//! Transient, auto-expiring user messages. At most one alert is visible at a
//! time; showing a new one supersedes the previous immediately. Each alert
//! self-clears after [`ALERT_TTL`].
//!
//! The notifier itself holds no timer: [`AlertNotifier::show`] hands back a
//! generation number and a fresh [`CancellationToken`], and the controller
//! arms a sleep that reports expiry back through the message loop. Showing a
//! new alert cancels the outstanding token, and a late expiry for a
//! superseded generation is a no-op in [`AlertNotifier::expire`]. Either
//! mechanism alone would suffice; together a stale timer can neither fire
//! nor, if it already fired, clear the wrong alert.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// How long an alert stays visible unless superseded.
pub const ALERT_TTL: Duration = Duration::from_secs(5);

/// Visual category of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Info,
    Success,
    Error,
}

impl AlertKind {
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::Info => "info",
            AlertKind::Success => "success",
            AlertKind::Error => "error",
        }
    }
}

/// A visible alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub text: String,
    pub kind: AlertKind,
    pub expires_at: DateTime<Utc>,
}

/// Single-slot alert state with supersede-on-show semantics.
#[derive(Debug, Default)]
pub struct AlertNotifier {
    current: Option<AlertMessage>,
    generation: u64,
    pending: Option<CancellationToken>,
}

impl AlertNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently visible alert, if any.
    pub fn current(&self) -> Option<&AlertMessage> {
        self.current.as_ref()
    }

    /// Replace the visible alert and cancel the pending expiry of the
    /// previous one. Returns the new generation and the token the caller
    /// should arm a [`ALERT_TTL`] timer against.
    pub fn show(&mut self, text: impl Into<String>, kind: AlertKind) -> (u64, CancellationToken) {
        if let Some(previous) = self.pending.take() {
            previous.cancel();
        }
        self.generation += 1;
        self.current = Some(AlertMessage {
            text: text.into(),
            kind,
            expires_at: Utc::now() + ALERT_TTL,
        });
        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        (self.generation, token)
    }

    /// Clear the alert if `generation` is still the visible one. Returns
    /// whether anything changed (i.e. a re-render is needed).
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation == self.generation && self.current.is_some() {
            self.current = None;
            self.pending = None;
            true
        } else {
            false
        }
    }
}
