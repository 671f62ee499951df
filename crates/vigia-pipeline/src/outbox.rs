// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery queue payload contracts.
//!
//! The drain worker switches on the queue entry's `kind` and deserializes
//! the payload into one of these shapes, so field names here are the wire
//! contract and must stay stable.

use serde::{Deserialize, Serialize};

/// WhatsApp template used for urgent alert notifications.
pub const TEMPLATE_ALERT: &str = "risk_alert";

/// WhatsApp template used for summary delivery.
pub const TEMPLATE_SUMMARY: &str = "summary_ready";

/// Language code sent with WhatsApp templates.
pub const TEMPLATE_LANGUAGE: &str = "en_US";

/// Payload for `kind = email` queue entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPayload {
    pub to: String,
    pub subject: String,
    #[serde(rename = "htmlContent")]
    pub html_content: String,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "emailType")]
    pub email_type: String,
}

/// Payload for `kind = whatsapp` queue entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsappPayload {
    pub to: String,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<WhatsappText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<WhatsappTemplate>,
}

/// Body of a plain-text WhatsApp message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsappText {
    pub body: String,
}

/// A WhatsApp template reference with body parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsappTemplate {
    pub name: String,
    pub language: WhatsappLanguage,
    pub components: Vec<WhatsappComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsappLanguage {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsappComponent {
    #[serde(rename = "type")]
    pub component_type: String,
    pub parameters: Vec<WhatsappParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsappParameter {
    #[serde(rename = "type")]
    pub parameter_type: String,
    pub text: String,
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Urgent alert email for one admin.
pub fn alert_email(
    to: &str,
    user_id: &str,
    group_name: &str,
    alert_title: &str,
    alert_summary: &str,
) -> EmailPayload {
    EmailPayload {
        to: to.to_string(),
        subject: format!("ALERT: {alert_title} in {group_name}"),
        html_content: format!("<h2>Vigia Risk Alert</h2><p>{alert_summary}</p>"),
        user_id: Some(user_id.to_string()),
        email_type: "alert_critical".to_string(),
    }
}

/// Summary email for one admin.
pub fn summary_email(
    to: &str,
    user_id: &str,
    group_name: &str,
    summary_text: &str,
) -> EmailPayload {
    EmailPayload {
        to: to.to_string(),
        subject: format!("Intelligence Summary | {group_name}"),
        html_content: format!("<h2>Vigia Executive Summary</h2><p>{summary_text}</p>"),
        user_id: Some(user_id.to_string()),
        email_type: "daily_summary".to_string(),
    }
}

/// WhatsApp template message for one admin's summary delivery.
pub fn summary_template(to: &str, group_name: &str, summary_text: &str) -> WhatsappPayload {
    template_payload(
        to,
        TEMPLATE_SUMMARY,
        vec![group_name.to_string(), truncate(summary_text, 1000)],
    )
}

/// WhatsApp template message for an urgent alert.
pub fn alert_template(
    to: &str,
    group_name: &str,
    alert_title: &str,
    alert_summary: &str,
) -> WhatsappPayload {
    template_payload(
        to,
        TEMPLATE_ALERT,
        vec![
            group_name.to_string(),
            alert_title.to_string(),
            truncate(alert_summary, 100),
        ],
    )
}

fn template_payload(to: &str, template_name: &str, body_params: Vec<String>) -> WhatsappPayload {
    WhatsappPayload {
        to: to.to_string(),
        message_type: "template".to_string(),
        text: None,
        template: Some(WhatsappTemplate {
            name: template_name.to_string(),
            language: WhatsappLanguage {
                code: TEMPLATE_LANGUAGE.to_string(),
            },
            components: vec![WhatsappComponent {
                component_type: "body".to_string(),
                parameters: body_params
                    .into_iter()
                    .map(|text| WhatsappParameter {
                        parameter_type: "text".to_string(),
                        text,
                    })
                    .collect(),
            }],
        }),
    }
}
