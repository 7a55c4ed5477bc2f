// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # View Router
//!
//! Finite-state machine selecting the active screen. Exactly one view is
//! active at a time and transitions are the only way to change it.
//!
//! `Results` and `CertificatesList` can only be entered as the side effect of
//! a completed remote call; their payloads live inside the view variant and
//! are dropped on the next transition, so nothing is cached across
//! navigation.
//!
//! Every transition advances an epoch counter. In-flight remote operations
//! are tagged with the epoch current when they were issued; a completion
//! whose epoch no longer matches is stale and must be discarded.

use crate::models::{Certificate, VerificationResult};
use crate::session::Session;

/// The active screen.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Login,
    Admin,
    Verify,
    Results(VerificationResult),
    CertificatesList(Vec<Certificate>),
}

impl ViewState {
    /// Screen name for logging and rendering.
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Login => "login",
            ViewState::Admin => "admin",
            ViewState::Verify => "verify",
            ViewState::Results(_) => "results",
            ViewState::CertificatesList(_) => "certificates",
        }
    }
}

/// Directly navigable targets. `Results` and `CertificatesList` are not
/// navigation targets; they are entered via completed remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Admin,
    Verify,
}

/// Why a navigation request was rejected. Advisory only: the remote calls
/// remain the authority, this just keeps the UI honest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDenied {
    /// Target requires an authenticated session.
    NotAuthenticated,
    /// Target requires the admin role.
    NotAdmin,
}

impl NavDenied {
    pub fn message(&self) -> &'static str {
        match self {
            NavDenied::NotAuthenticated => "Please log in first",
            NavDenied::NotAdmin => "Only admins can open the admin panel",
        }
    }
}

/// Owns the active view and the transition epoch.
#[derive(Debug)]
pub struct ViewRouter {
    current: ViewState,
    epoch: u64,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRouter {
    pub fn new() -> Self {
        Self {
            current: ViewState::Login,
            epoch: 0,
        }
    }

    pub fn current(&self) -> &ViewState {
        &self.current
    }

    /// Epoch of the current view. Captured when issuing a remote operation.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a completion tagged with `epoch` is still current.
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    fn transition(&mut self, next: ViewState) {
        self.epoch += 1;
        self.current = next;
    }

    /// Explicit navigation. `Admin` requires an authenticated admin session;
    /// `Verify` requires authentication.
    pub fn navigate(&mut self, target: NavTarget, session: &Session) -> Result<(), NavDenied> {
        if !session.is_authenticated() {
            return Err(NavDenied::NotAuthenticated);
        }
        match target {
            NavTarget::Admin => {
                if !session.is_admin() {
                    return Err(NavDenied::NotAdmin);
                }
                self.transition(ViewState::Admin);
            }
            NavTarget::Verify => self.transition(ViewState::Verify),
        }
        Ok(())
    }

    /// Entered on successful authentication: admin panel for admins, the
    /// verify screen for everyone else.
    pub fn enter_home(&mut self, session: &Session) {
        if session.is_admin() {
            self.transition(ViewState::Admin);
        } else {
            self.transition(ViewState::Verify);
        }
    }

    /// Side effect of a completed verification call. Verification failure is
    /// a valid result and still lands here.
    pub fn show_results(&mut self, result: VerificationResult) {
        self.transition(ViewState::Results(result));
    }

    /// Side effect of a completed listing call.
    pub fn show_certificates(&mut self, certificates: Vec<Certificate>) {
        self.transition(ViewState::CertificatesList(certificates));
    }

    /// Back to the login screen. Used on logout from any state.
    pub fn reset_to_login(&mut self) {
        self.transition(ViewState::Login);
    }
}
