// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vigia pipeline service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Vigia configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VigiaConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// External analysis service settings.
    #[serde(default)]
    pub intelligence: IntelligenceConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Scheduled summary sweep settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Stale-batch janitor settings.
    #[serde(default)]
    pub janitor: JanitorConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service instance.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "vigia".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("vigia").join("vigia.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("vigia.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// External analysis service configuration.
///
/// All parameters are fixed at client construction; nothing is re-read
/// per call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntelligenceConfig {
    /// Base URL of the analysis service.
    #[serde(default = "default_intelligence_base_url")]
    pub base_url: String,

    /// Bearer API key for the analysis service. `None` sends no auth header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier forwarded with each analysis request.
    #[serde(default = "default_intelligence_model")]
    pub model: String,

    /// Request timeout in seconds. A timeout is an ordinary failure path
    /// for the batch being processed.
    #[serde(default = "default_intelligence_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IntelligenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_intelligence_base_url(),
            api_key: None,
            model: default_intelligence_model(),
            timeout_secs: default_intelligence_timeout_secs(),
        }
    }
}

fn default_intelligence_base_url() -> String {
    "http://127.0.0.1:8900".to_string()
}

fn default_intelligence_model() -> String {
    "sentinel-v2".to_string()
}

fn default_intelligence_timeout_secs() -> u64 {
    60
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token for API authentication. `None` rejects all requests
    /// to authenticated routes (fail-closed).
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

/// Scheduled summary sweep configuration.
///
/// The scheduler ticks on `interval_secs`, finds organizations due for a
/// summary (schedule hour + delivery day match, not yet run today), and
/// creates and processes one batch per active group.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Enable the scheduler loop.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    /// Tick interval in seconds.
    #[serde(default = "default_scheduler_interval_secs")]
    pub interval_secs: u64,

    /// Minimum unbatched messages required before a group gets a batch.
    #[serde(default = "default_min_messages")]
    pub min_messages: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            interval_secs: default_scheduler_interval_secs(),
            min_messages: default_min_messages(),
        }
    }
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_scheduler_interval_secs() -> u64 {
    300
}

fn default_min_messages() -> i64 {
    1
}

/// Stale-batch janitor configuration.
///
/// A batch stuck in `processing` (crash between claim and finalize) is
/// returned to `pending` once its lock is older than `stale_after_secs`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JanitorConfig {
    /// Enable the janitor loop.
    #[serde(default = "default_janitor_enabled")]
    pub enabled: bool,

    /// Sweep interval in seconds.
    #[serde(default = "default_janitor_interval_secs")]
    pub interval_secs: u64,

    /// Age in seconds after which a `processing` lock is considered stale.
    /// Must comfortably exceed the analysis timeout plus persistence time.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_janitor_enabled(),
            interval_secs: default_janitor_interval_secs(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

fn default_janitor_enabled() -> bool {
    true
}

fn default_janitor_interval_secs() -> u64 {
    60
}

fn default_stale_after_secs() -> u64 {
    900
}
