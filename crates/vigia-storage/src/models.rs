// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `vigia-core::types` for use across
//! adapter trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use vigia_core::types::{
    AdminContact, Alert, DeliveryItem, Group, GroupAnalytics, GroupContext, Message,
    MessageBatch, Organization, Summary,
};
