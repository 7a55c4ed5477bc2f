// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Certverify Client - Certificate Verification Controller
//!
//! This crate provides the client-side controller for a certificate
//! verification service: session lifecycle against an identity provider,
//! role-gated view routing, and the four certificate operations (register,
//! verify, list, revoke) against the backend gateway.
//!
//! ## Modules
//!
//! - `app` - The update loop: command dispatch, effects, staleness
//! - `identity` - Identity provider contract and HTTP implementation
//! - `gateway` - Certificate backend contract and HTTP implementation
//! - `render` - Pure view rendering and the control binding table
//! - `router` - View state machine with role-gated transitions

pub mod alert;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod models;
pub mod render;
pub mod router;
pub mod session;
pub mod state;
