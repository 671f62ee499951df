// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Vigia pipeline.
//!
//! Exposes the batch trigger endpoint consumed by the scheduler, webhooks,
//! and manual triggers, plus message ingest and batch inspection, behind
//! bearer-token auth.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{build_router, start_server, GatewayState, ServerConfig};
