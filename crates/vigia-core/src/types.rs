// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Vigia pipeline.
//!
//! Timestamps are RFC 3339 strings with millisecond precision and a `Z`
//! suffix, matching SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`.
//! This keeps lexicographic and chronological ordering identical.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

/// Returns the current UTC time as an RFC 3339 millisecond string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Lifecycle state of a [`MessageBatch`].
///
/// `pending -> processing -> {done | error}`. The terminal states are
/// sticky: no transition ever leaves `done` or `error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Processing,
    Done,
    Error,
}

/// Severity of an alert produced by the analysis service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse a severity string, falling back to `Medium` for missing or
    /// unrecognized values.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|s| Severity::from_str(s).ok())
            .unwrap_or(Severity::Medium)
    }

    /// Whether this severity warrants an urgent admin notification.
    pub fn is_urgent(self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

/// Discriminator for delivery queue entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    Email,
    Whatsapp,
}

/// An inbound group message as stored by the message store.
///
/// `batch_id` is set at most once, when the batch lifecycle manager tags
/// the message into a batch; it is never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub group_id: String,
    pub organization_id: String,
    pub author_hash: String,
    pub content_text: String,
    pub message_ts: String,
    pub batch_id: Option<String>,
    pub created_at: String,
}

/// A time-bounded, group-scoped set of messages processed together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBatch {
    pub id: String,
    pub organization_id: String,
    pub group_id: String,
    pub status: BatchStatus,
    pub start_ts: String,
    pub end_ts: String,
    pub message_count: i64,
    pub locked_at: Option<String>,
    pub processed_at: Option<String>,
    pub error: Option<String>,
    pub created_at: String,
}

/// An alert row derived from the analysis output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub organization_id: String,
    pub group_id: String,
    pub batch_id: String,
    pub title: String,
    pub summary: String,
    pub severity: Severity,
    /// Lifecycle status; always "open" at creation. Later transitions are
    /// owned by the surrounding dashboard, not this pipeline.
    pub status: String,
    pub evidence_excerpt: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

/// An executive summary row for one processed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub organization_id: String,
    pub group_id: String,
    pub batch_id: String,
    pub summary_text: String,
    pub period_start: String,
    pub period_end: String,
    pub is_read: bool,
    pub created_at: String,
}

/// Per-period analytics snapshot, keyed by `(group_id, period_start, period_end)`.
///
/// Re-processing the same period updates the existing row rather than
/// inserting a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupAnalytics {
    pub id: String,
    pub organization_id: String,
    pub group_id: String,
    pub period_start: String,
    pub period_end: String,
    pub sentiment_score: f64,
    pub message_count: i64,
    pub alert_count_total: i64,
    pub created_at: String,
}

/// An entry in the persisted delivery queue (outbox).
///
/// Written by the pipeline with status `pending`; drained by an external
/// worker via `dequeue`/`ack`/`fail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryItem {
    pub id: i64,
    pub kind: DeliveryKind,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}

/// An organization that owns monitored groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub plan: String,
    /// "HH:MM" local delivery hour for scheduled summaries.
    pub summary_schedule_time: Option<String>,
    /// JSON array of weekday abbreviations, e.g. `["mon","wed","fri"]`.
    pub summary_delivery_days: Option<String>,
    /// "YYYY-MM-DD" of the last scheduler-triggered summary run.
    pub last_summary_date: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl Organization {
    /// Parsed delivery days; empty when unset or malformed.
    pub fn delivery_days(&self) -> Vec<String> {
        self.summary_delivery_days
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

/// A monitored messaging group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
    pub preset_name: String,
    pub preset_description: String,
    pub is_active: bool,
    pub created_at: String,
}

/// Notification contact details for one organization admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminContact {
    pub organization_id: String,
    pub user_id: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub email_summary_enabled: bool,
    pub whatsapp_summary_enabled: bool,
}

/// A group joined with its owning organization, as needed for one
/// batch-analysis request.
#[derive(Debug, Clone)]
pub struct GroupContext {
    pub group: Group,
    pub organization: Organization,
}

// --- Analysis service wire types ---

/// One message within an [`AnalysisRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMessage {
    pub id: String,
    pub author: String,
    pub text: String,
    pub timestamp: String,
}

/// Agent preset forwarded to the analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPreset {
    pub name: String,
    pub description: String,
}

/// Organization context forwarded to the analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationContext {
    pub name: String,
    pub plan: String,
}

/// Request body for one batch-analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub batch_id: String,
    pub organization_id: String,
    pub group_name: String,
    pub model: String,
    pub agent_preset: AgentPreset,
    pub organization_context: OrganizationContext,
    pub messages: Vec<AnalysisMessage>,
}

/// One alert as reported by the analysis service.
///
/// All fields are optional on the wire; the fan-out persister applies
/// defaults (`Medium` severity, placeholder title).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub evidence: Option<String>,
}

/// Structured output of one batch-analysis call.
///
/// Every field is optional: a quiet batch may legitimately produce none
/// of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisOutput {
    #[serde(default)]
    pub alerts: Option<Vec<AlertPayload>>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_status_round_trips_through_strings() {
        for status in [
            BatchStatus::Pending,
            BatchStatus::Processing,
            BatchStatus::Done,
            BatchStatus::Error,
        ] {
            let s = status.to_string();
            let parsed = BatchStatus::from_str(&s).expect("should parse back");
            assert_eq!(status, parsed);
        }
        assert_eq!(BatchStatus::Pending.to_string(), "pending");
    }

    #[test]
    fn severity_defaults_to_medium() {
        assert_eq!(Severity::parse_or_default(None), Severity::Medium);
        assert_eq!(Severity::parse_or_default(Some("bogus")), Severity::Medium);
        assert_eq!(Severity::parse_or_default(Some("HIGH")), Severity::High);
        assert_eq!(
            Severity::parse_or_default(Some("critical")),
            Severity::Critical
        );
    }

    #[test]
    fn urgent_severities() {
        assert!(Severity::High.is_urgent());
        assert!(Severity::Critical.is_urgent());
        assert!(!Severity::Medium.is_urgent());
        assert!(!Severity::Low.is_urgent());
    }

    #[test]
    fn analysis_output_fields_all_optional() {
        let output: AnalysisOutput = serde_json::from_str("{}").unwrap();
        assert!(output.alerts.is_none());
        assert!(output.summary.is_none());
        assert!(output.sentiment_score.is_none());
    }

    #[test]
    fn analysis_output_zero_sentiment_is_present() {
        let output: AnalysisOutput =
            serde_json::from_str(r#"{"sentiment_score": 0}"#).unwrap();
        assert_eq!(output.sentiment_score, Some(0.0));
    }

    #[test]
    fn delivery_days_parse_from_json() {
        let org = Organization {
            id: "org-1".into(),
            name: "Acme".into(),
            plan: "pro".into(),
            summary_schedule_time: Some("09:00".into()),
            summary_delivery_days: Some(r#"["mon","wed","fri"]"#.into()),
            last_summary_date: None,
            is_active: true,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        assert_eq!(org.delivery_days(), vec!["mon", "wed", "fri"]);
    }

    #[test]
    fn delivery_days_malformed_yields_empty() {
        let org = Organization {
            id: "org-1".into(),
            name: "Acme".into(),
            plan: "pro".into(),
            summary_schedule_time: None,
            summary_delivery_days: Some("not json".into()),
            last_summary_date: None,
            is_active: true,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        assert!(org.delivery_days().is_empty());
    }

    #[test]
    fn now_rfc3339_has_millis_and_z_suffix() {
        let ts = now_rfc3339();
        assert!(ts.ends_with('Z'), "got: {ts}");
        assert_eq!(ts.len(), "2026-01-01T00:00:00.000Z".len(), "got: {ts}");
    }
}
