// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transient Controller State
//!
//! Per-view form drafts and the per-operation in-flight guards. The drafts
//! stand in for the submission forms: success clears them, failure leaves
//! them intact for correction. The guards reject a second submission while
//! the first is still pending.

use std::path::PathBuf;

use crate::models::CertificateMetadata;

/// A metadata field of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Issuer,
    IssuedTo,
    IssueDate,
    Description,
    Type,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Issuer => "issuer",
            FormField::IssuedTo => "issued-to",
            FormField::IssueDate => "issue-date",
            FormField::Description => "description",
            FormField::Type => "type",
        }
    }

    /// Parse a field name as typed in a `set` command.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => Some(FormField::Name),
            "issuer" => Some(FormField::Issuer),
            "issued-to" | "issuedto" => Some(FormField::IssuedTo),
            "issue-date" | "issuedate" | "date" => Some(FormField::IssueDate),
            "description" => Some(FormField::Description),
            "type" => Some(FormField::Type),
            _ => None,
        }
    }
}

/// Draft of the admin registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    /// Path of the certificate image to submit.
    pub file: Option<PathBuf>,
    /// The six required metadata fields.
    pub metadata: CertificateMetadata,
}

impl RegistrationForm {
    pub fn set(&mut self, field: FormField, value: String) {
        match field {
            FormField::Name => self.metadata.name = value,
            FormField::Issuer => self.metadata.issuer = value,
            FormField::IssuedTo => self.metadata.issued_to = value,
            FormField::IssueDate => self.metadata.issue_date = value,
            FormField::Description => self.metadata.description = value,
            FormField::Type => self.metadata.certificate_type = value,
        }
    }

    /// Reset after a successful registration.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Draft of the verification form (just the file selection).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyForm {
    pub file: Option<PathBuf>,
}

/// Remote operations guarded against double submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Register,
    Verify,
    List,
    Revoke,
}

impl Operation {
    /// Label used in the "already in progress" advisory alert.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Login => "Login",
            Operation::Register => "Registration",
            Operation::Verify => "Verification",
            Operation::List => "Listing",
            Operation::Revoke => "Revocation",
        }
    }
}

/// Per-operation in-flight flags.
///
/// `begin` returns false when the operation is already pending; `finish` is
/// called for every completion, stale or not, so a discarded result still
/// releases its guard.
#[derive(Debug, Clone, Copy, Default)]
pub struct InFlight {
    login: bool,
    register: bool,
    verify: bool,
    list: bool,
    revoke: bool,
}

impl InFlight {
    fn slot(&mut self, op: Operation) -> &mut bool {
        match op {
            Operation::Login => &mut self.login,
            Operation::Register => &mut self.register,
            Operation::Verify => &mut self.verify,
            Operation::List => &mut self.list,
            Operation::Revoke => &mut self.revoke,
        }
    }

    pub fn is_pending(&self, op: Operation) -> bool {
        match op {
            Operation::Login => self.login,
            Operation::Register => self.register,
            Operation::Verify => self.verify,
            Operation::List => self.list,
            Operation::Revoke => self.revoke,
        }
    }

    /// Mark `op` as pending. Returns false if it already was.
    pub fn begin(&mut self, op: Operation) -> bool {
        let slot = self.slot(op);
        if *slot {
            false
        } else {
            *slot = true;
            true
        }
    }

    pub fn finish(&mut self, op: Operation) {
        *self.slot(op) = false;
    }
}
