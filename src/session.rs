// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session State
//!
//! Process-wide authentication state. Fields are private so the invariant
//! `is_admin == true ⇒ authenticated == true` holds by construction: the only
//! way to gain the admin flag is through [`Session::grant_admin`], which is a
//! no-op on an anonymous session.

/// Authentication state for the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    authenticated: bool,
    principal_id: Option<String>,
    is_admin: bool,
}

impl Session {
    /// An unauthenticated session with no principal and no privileges.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A freshly authenticated session. The admin flag always starts false;
    /// it is refreshed by an explicit remote check afterwards.
    pub fn authenticated(principal_id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            principal_id: Some(principal_id.into()),
            is_admin: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn principal_id(&self) -> Option<&str> {
        self.principal_id.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Record the result of the remote admin determination.
    ///
    /// Ignored for anonymous sessions, preserving the invariant.
    pub fn grant_admin(&mut self, is_admin: bool) {
        if self.authenticated {
            self.is_admin = is_admin;
        }
    }

    /// Clear principal and privileges. Used on logout.
    pub fn reset(&mut self) {
        *self = Self::anonymous();
    }
}
