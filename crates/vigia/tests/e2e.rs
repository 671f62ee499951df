// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline test: real SQLite storage and the real HTTP analysis
//! client against a wiremock analysis service.

use std::sync::Arc;

use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigia_core::types::{now_rfc3339, Message};
use vigia_core::{BatchStatus, DeliveryKind, StorageAdapter};
use vigia_intelligence::AnalysisClient;
use vigia_pipeline::{BatchProcessor, ProcessOutcome};
use vigia_storage::SqliteStorage;

async fn setup_storage() -> (Arc<SqliteStorage>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("e2e.db");
    let config = vigia_config::model::StorageConfig {
        database_path: db_path.to_str().unwrap().to_string(),
        wal_mode: true,
    };
    let storage = Arc::new(SqliteStorage::open(&config).await.unwrap());

    storage
        .database()
        .connection()
        .call(|conn| -> tokio_rusqlite::Result<()> {
            conn.execute_batch(
                "INSERT INTO organizations (id, name, plan, is_active)
                 VALUES ('org-1', 'Acme', 'pro', 1);
                 INSERT INTO groups
                 (id, organization_id, name, preset_name, preset_description, is_active)
                 VALUES ('grp-1', 'org-1', 'Sales Team', 'Sentinel', 'Standard monitoring', 1);
                 INSERT INTO organization_admins
                 (organization_id, user_id, email, whatsapp,
                  email_summary_enabled, whatsapp_summary_enabled)
                 VALUES
                 ('org-1', 'admin-1', 'one@acme.test', NULL, 1, 0),
                 ('org-1', 'admin-2', 'two@acme.test', NULL, 1, 0);",
            )?;
            Ok(())
        })
        .await
        .unwrap();

    (storage, dir)
}

fn make_client(base_url: &str) -> AnalysisClient {
    let config = vigia_config::model::IntelligenceConfig {
        base_url: base_url.to_string(),
        api_key: Some("e2e-key".into()),
        model: "sentinel-v2".into(),
        timeout_secs: 5,
    };
    AnalysisClient::new(&config).unwrap()
}

async fn seed_messages(storage: &SqliteStorage) {
    for (id, ts, text) in [
        ("m1", "2026-01-01T00:01:40.000Z", "a"),
        ("m2", "2026-01-01T00:03:20.000Z", "b"),
        ("m3", "2026-01-01T00:05:00.000Z", "c"),
    ] {
        storage
            .insert_message(&Message {
                id: id.to_string(),
                group_id: "grp-1".to_string(),
                organization_id: "org-1".to_string(),
                author_hash: format!("author-{id}"),
                content_text: text.to_string(),
                message_ts: ts.to_string(),
                batch_id: None,
                created_at: now_rfc3339(),
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn batch_flows_from_messages_to_done_with_full_fan_out() {
    let (storage, _dir) = setup_storage().await;
    seed_messages(&storage).await;

    // CreateBatch: span covers [min(ts), max(ts)] with all three tagged.
    let batch = storage
        .create_batch_from_unbatched("org-1", "grp-1", "2026-01-02T00:00:00.000Z")
        .await
        .unwrap()
        .expect("batch should be created");
    assert_eq!(batch.start_ts, "2026-01-01T00:01:40.000Z");
    assert_eq!(batch.end_ts, "2026-01-01T00:05:00.000Z");
    assert_eq!(batch.message_count, 3);

    // The analysis service sees the assembled context payload and returns
    // two high-severity alerts plus a summary and sentiment.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/analyze-batch"))
        .and(body_partial_json(serde_json::json!({
            "batch_id": batch.id,
            "organization_id": "org-1",
            "group_name": "Sales Team",
            "agent_preset": {"name": "Sentinel", "description": "Standard monitoring"},
            "organization_context": {"name": "Acme", "plan": "pro"},
            "messages": [
                {"id": "m1", "author": "author-m1", "text": "a", "timestamp": "2026-01-01T00:01:40.000Z"},
                {"id": "m2", "author": "author-m2", "text": "b", "timestamp": "2026-01-01T00:03:20.000Z"},
                {"id": "m3", "author": "author-m3", "text": "c", "timestamp": "2026-01-01T00:05:00.000Z"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "alerts": [
                {"title": "X", "description": "first", "severity": "high"},
                {"title": "Y", "description": "second", "severity": "high"}
            ],
            "summary": "Two incidents were discussed.",
            "sentiment_score": 0.25
        })))
        .expect(1)
        .mount(&server)
        .await;

    let processor = BatchProcessor::new(
        storage.clone(),
        Arc::new(make_client(&server.uri())),
        "sentinel-v2".into(),
    );

    let outcome = processor.process_next().await.unwrap();
    let ProcessOutcome::Completed { report, .. } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(report.alerts_inserted, 2);
    assert_eq!(report.urgent_notifications, 2, "one per admin, first alert only");
    assert!(report.summary_inserted);
    assert!(report.analytics_upserted);

    // Batch is terminal.
    let done = storage.get_batch(&batch.id).await.unwrap().unwrap();
    assert_eq!(done.status, BatchStatus::Done);
    assert!(done.processed_at.is_some());
    assert!(done.error.is_none());

    // Fan-out rows exist and the analytics period matches the batch span.
    let analytics = vigia_storage::queries::analytics::get_for_period(
        storage.database(),
        "grp-1",
        &batch.start_ts,
        &batch.end_ts,
    )
    .await
    .unwrap()
    .expect("analytics row");
    assert_eq!(analytics.sentiment_score, 0.25);
    assert_eq!(analytics.message_count, 3);
    assert_eq!(analytics.alert_count_total, 2);

    // Urgent emails (2 admins) reference the first high alert; summary
    // emails (2 admins opted in) carry the summary text.
    let emails =
        vigia_storage::queries::queue::list_by_kind(storage.database(), DeliveryKind::Email)
            .await
            .unwrap();
    assert_eq!(emails.len(), 4);
    let urgent: Vec<_> = emails
        .iter()
        .filter(|i| i.payload.contains("alert_critical"))
        .collect();
    assert_eq!(urgent.len(), 2);
    for item in urgent {
        assert!(item.payload.contains("ALERT: X"));
        assert!(!item.payload.contains("\"Y\""));
        assert_eq!(item.status, "pending");
    }
    let summaries: Vec<_> = emails
        .iter()
        .filter(|i| i.payload.contains("daily_summary"))
        .collect();
    assert_eq!(summaries.len(), 2);

    // Nothing left to process.
    let idle = processor.process_next().await.unwrap();
    assert_eq!(idle, ProcessOutcome::NoPendingWork);
}

#[tokio::test]
async fn analysis_outage_marks_batch_error_and_next_trigger_is_idle() {
    let (storage, _dir) = setup_storage().await;
    seed_messages(&storage).await;

    let batch = storage
        .create_batch_from_unbatched("org-1", "grp-1", "2026-01-02T00:00:00.000Z")
        .await
        .unwrap()
        .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/analyze-batch"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
        .mount(&server)
        .await;

    let processor = BatchProcessor::new(
        storage.clone(),
        Arc::new(make_client(&server.uri())),
        "sentinel-v2".into(),
    );

    let result = processor.process_next().await;
    assert!(result.is_err());

    let failed = storage.get_batch(&batch.id).await.unwrap().unwrap();
    assert_eq!(failed.status, BatchStatus::Error);
    assert!(failed.error.as_deref().unwrap().contains("500"));

    // The failed batch is terminal; a new trigger finds nothing pending.
    let idle = processor.process_next().await.unwrap();
    assert_eq!(idle, ProcessOutcome::NoPendingWork);
}
