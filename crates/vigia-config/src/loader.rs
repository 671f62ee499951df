// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./vigia.toml` > `~/.config/vigia/vigia.toml` > `/etc/vigia/vigia.toml`
//! with environment variable overrides via `VIGIA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VigiaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vigia/vigia.toml` (system-wide)
/// 3. `~/.config/vigia/vigia.toml` (user XDG config)
/// 4. `./vigia.toml` (local directory)
/// 5. `VIGIA_*` environment variables
pub fn load_config() -> Result<VigiaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigiaConfig::default()))
        .merge(Toml::file("/etc/vigia/vigia.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("vigia/vigia.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("vigia.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<VigiaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigiaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VigiaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigiaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `VIGIA_INTELLIGENCE_API_KEY`
/// must map to `intelligence.api_key`, not `intelligence.api.key`.
fn env_provider() -> Env {
    Env::prefixed("VIGIA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: VIGIA_GATEWAY_BEARER_TOKEN -> "gateway_bearer_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("intelligence_", "intelligence.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("scheduler_", "scheduler.", 1)
            .replacen("janitor_", "janitor.", 1);
        mapped.into()
    })
}
