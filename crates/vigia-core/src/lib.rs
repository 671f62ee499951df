// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vigia intelligence pipeline.
//!
//! This crate provides the foundational error type, domain types, and
//! adapter traits used throughout the Vigia workspace. The storage and
//! intelligence adapters implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VigiaError;
pub use traits::{IntelligenceAdapter, StorageAdapter};
pub use types::{BatchStatus, DeliveryKind, Severity};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vigia_error_has_all_variants() {
        let _config = VigiaError::Config("test".into());
        let _storage = VigiaError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _intelligence = VigiaError::Intelligence {
            message: "test".into(),
            source: None,
        };
        let _delivery = VigiaError::Delivery {
            message: "test".into(),
            source: None,
        };
        let _not_found = VigiaError::NotFound {
            entity: "batch".into(),
            id: "b-1".into(),
        };
        let _internal = VigiaError::Internal("test".into());
    }

    #[test]
    fn error_messages_render() {
        let err = VigiaError::Intelligence {
            message: "analysis service returned 503".into(),
            source: None,
        };
        assert_eq!(
            err.to_string(),
            "intelligence error: analysis service returned 503"
        );

        let err = VigiaError::NotFound {
            entity: "batch".into(),
            id: "b-404".into(),
        };
        assert_eq!(err.to_string(), "batch not found: b-404");
    }
}
