// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the batch processor, fan-out, janitor, and
//! scheduler against real SQLite storage and a scripted analysis mock.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeZone;
use tempfile::tempdir;

use vigia_core::types::{now_rfc3339, AlertPayload, AnalysisOutput, Message};
use vigia_core::{BatchStatus, DeliveryKind, StorageAdapter};
use vigia_pipeline::{BatchProcessor, JanitorRunner, ProcessOutcome, SummaryScheduler};
use vigia_storage::queries::queue::list_by_kind;
use vigia_storage::SqliteStorage;
use vigia_test_utils::{FailingStorage, MockIntelligence};

const ORG_ID: &str = "org-1";
const GROUP_ID: &str = "grp-1";

async fn setup_storage() -> (Arc<SqliteStorage>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("pipeline.db");
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
                 INSERT INTO groups (id, organization_id, name, is_active)
                 VALUES ('grp-1', 'org-1', 'Sales Team', 1);
                 INSERT INTO organization_admins
                 (organization_id, user_id, email, whatsapp,
                  email_summary_enabled, whatsapp_summary_enabled)
                 VALUES
                 ('org-1', 'admin-1', 'one@acme.test', NULL, 1, 0),
                 ('org-1', 'admin-2', 'two@acme.test', '5511999990000', 1, 1);",
            )?;
            Ok(())
        })
        .await
        .unwrap();

    (storage, dir)
}

async fn seed_messages(storage: &SqliteStorage, specs: &[(&str, &str)]) {
    for (id, ts) in specs {
        let message = Message {
            id: id.to_string(),
            group_id: GROUP_ID.to_string(),
            organization_id: ORG_ID.to_string(),
            author_hash: format!("author-{id}"),
            content_text: format!("content {id}"),
            message_ts: ts.to_string(),
            batch_id: None,
            created_at: now_rfc3339(),
        };
        storage.insert_message(&message).await.unwrap();
    }
}

async fn seed_batch(storage: &SqliteStorage) -> String {
    seed_messages(
        storage,
        &[
            ("m1", "2026-01-01T00:01:40.000Z"),
            ("m2", "2026-01-01T00:03:20.000Z"),
            ("m3", "2026-01-01T00:05:00.000Z"),
        ],
    )
    .await;
    storage
        .create_batch_from_unbatched(ORG_ID, GROUP_ID, "2026-01-02T00:00:00.000Z")
        .await
        .unwrap()
        .unwrap()
        .id
}

fn two_high_alerts() -> AnalysisOutput {
    AnalysisOutput {
        alerts: Some(vec![
            AlertPayload {
                title: Some("X".to_string()),
                description: Some("first incident".to_string()),
                severity: Some("high".to_string()),
                evidence: None,
            },
            AlertPayload {
                title: Some("Y".to_string()),
                description: Some("second incident".to_string()),
                severity: Some("high".to_string()),
                evidence: None,
            },
        ]),
        summary: None,
        sentiment_score: None,
    }
}

#[tokio::test]
async fn no_pending_work_is_an_idle_outcome() {
    let (storage, _dir) = setup_storage().await;
    let intelligence = Arc::new(MockIntelligence::new());
    let processor = BatchProcessor::new(storage.clone(), intelligence, "sentinel-v2".into());

    let outcome = processor.process_next().await.unwrap();
    assert_eq!(outcome, ProcessOutcome::NoPendingWork);
}

#[tokio::test]
async fn high_severity_alerts_notify_each_admin_once_for_first_alert() {
    let (storage, _dir) = setup_storage().await;
    let batch_id = seed_batch(&storage).await;

    let intelligence = Arc::new(MockIntelligence::with_output(two_high_alerts()));
    let processor = BatchProcessor::new(
        storage.clone(),
        intelligence.clone(),
        "sentinel-v2".into(),
    );

    let outcome = processor.process_next().await.unwrap();
    let ProcessOutcome::Completed { batch_id: done_id, report } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(done_id, batch_id);
    assert_eq!(report.alerts_inserted, 2);
    assert_eq!(report.urgent_notifications, 2, "one per admin with email");
    assert!(!report.summary_inserted);

    // The throttle references the first high-severity alert only.
    let emails = list_by_kind(storage.database(), DeliveryKind::Email)
        .await
        .unwrap();
    assert_eq!(emails.len(), 2);
    for item in &emails {
        assert!(item.payload.contains("ALERT: X"), "got: {}", item.payload);
        assert!(!item.payload.contains("Y"), "got: {}", item.payload);
        assert_eq!(item.status, "pending");
    }

    // No summary row was inserted.
    let batch = storage.get_batch(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.status, BatchStatus::Done);
    assert!(batch.processed_at.is_some());

    // The analysis request carried the ordered messages and group context.
    let requests = intelligence.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].group_name, "Sales Team");
    assert_eq!(requests[0].messages.len(), 3);
    assert_eq!(requests[0].messages[0].id, "m1");
    assert_eq!(requests[0].messages[2].id, "m3");
}

#[tokio::test]
async fn summary_and_analytics_fan_out() {
    let (storage, _dir) = setup_storage().await;
    let batch_id = seed_batch(&storage).await;

    let output = AnalysisOutput {
        alerts: None,
        summary: Some("The group discussed quarterly targets.".to_string()),
        sentiment_score: Some(0.0), // zero is a valid score
    };
    let intelligence = Arc::new(MockIntelligence::with_output(output));
    let processor = BatchProcessor::new(storage.clone(), intelligence, "sentinel-v2".into());

    let outcome = processor.process(&batch_id).await.unwrap();
    let ProcessOutcome::Completed { report, .. } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert!(report.summary_inserted);
    assert!(report.analytics_upserted);
    // admin-1 and admin-2 by email, admin-2 also by whatsapp.
    assert_eq!(report.summary_notifications, 3);

    let batch = storage.get_batch(&batch_id).await.unwrap().unwrap();
    let analytics = vigia_storage::queries::analytics::get_for_period(
        storage.database(),
        GROUP_ID,
        &batch.start_ts,
        &batch.end_ts,
    )
    .await
    .unwrap()
    .expect("analytics row should exist");
    assert_eq!(analytics.sentiment_score, 0.0);
    assert_eq!(analytics.message_count, 3);
    assert_eq!(analytics.alert_count_total, 0);

    let whatsapp = list_by_kind(storage.database(), DeliveryKind::Whatsapp)
        .await
        .unwrap();
    assert_eq!(whatsapp.len(), 1);
    assert!(whatsapp[0].payload.contains("summary_ready"));
}

#[tokio::test]
async fn analysis_failure_finalizes_batch_as_error() {
    let (storage, _dir) = setup_storage().await;
    let batch_id = seed_batch(&storage).await;

    let intelligence = Arc::new(MockIntelligence::new());
    intelligence.push_failure("analysis workers overloaded").await;
    let processor = BatchProcessor::new(storage.clone(), intelligence, "sentinel-v2".into());

    let result = processor.process(&batch_id).await;
    assert!(result.is_err(), "analysis failure must propagate");

    let batch = storage.get_batch(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.status, BatchStatus::Error);
    assert!(
        batch.error.as_deref().unwrap().contains("overloaded"),
        "got: {:?}",
        batch.error
    );

    // Nothing was persisted: the analysis call precedes all writes.
    let emails = list_by_kind(storage.database(), DeliveryKind::Email)
        .await
        .unwrap();
    assert!(emails.is_empty());
}

#[tokio::test]
async fn alert_insert_failure_does_not_block_summary_or_done() {
    let (storage, _dir) = setup_storage().await;
    let batch_id = seed_batch(&storage).await;

    let failing: Arc<dyn StorageAdapter> = Arc::new(
        FailingStorage::new(storage.clone() as Arc<dyn StorageAdapter>).failing_insert_alerts(),
    );

    let mut output = two_high_alerts();
    output.summary = Some("Summary survives the alert failure.".to_string());
    let intelligence = Arc::new(MockIntelligence::with_output(output));
    let processor = BatchProcessor::new(failing, intelligence, "sentinel-v2".into());

    let outcome = processor.process(&batch_id).await.unwrap();
    let ProcessOutcome::Completed { report, .. } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(report.alerts_inserted, 0);
    assert_eq!(
        report.urgent_notifications, 0,
        "notifications depend on inserted alerts"
    );
    assert!(report.summary_inserted);

    let batch = storage.get_batch(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.status, BatchStatus::Done, "degraded success is done");

    let summaries =
        vigia_storage::queries::summaries::count_for_batch(storage.database(), &batch_id)
            .await
            .unwrap();
    assert_eq!(summaries, 1);
    let alerts = vigia_storage::queries::alerts::count_for_batch(storage.database(), &batch_id)
        .await
        .unwrap();
    assert_eq!(alerts, 0);
}

#[tokio::test]
async fn already_claimed_batch_yields_lost_claim() {
    let (storage, _dir) = setup_storage().await;
    let batch_id = seed_batch(&storage).await;

    assert!(storage.claim_batch(&batch_id).await.unwrap());

    let intelligence = Arc::new(MockIntelligence::new());
    let processor = BatchProcessor::new(storage.clone(), intelligence.clone(), "sentinel-v2".into());

    let outcome = processor.process(&batch_id).await.unwrap();
    assert_eq!(
        outcome,
        ProcessOutcome::LostClaim {
            batch_id: batch_id.clone()
        }
    );
    assert!(
        intelligence.requests().await.is_empty(),
        "no analysis call after a lost claim"
    );
}

#[tokio::test]
async fn quiet_output_completes_without_writes() {
    let (storage, _dir) = setup_storage().await;
    let batch_id = seed_batch(&storage).await;

    let intelligence = Arc::new(MockIntelligence::new());
    let processor = BatchProcessor::new(storage.clone(), intelligence, "sentinel-v2".into());

    let outcome = processor.process(&batch_id).await.unwrap();
    let ProcessOutcome::Completed { report, .. } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(report, vigia_pipeline::FanOutReport::default());

    let batch = storage.get_batch(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.status, BatchStatus::Done);
}

#[tokio::test]
async fn janitor_reclaims_stuck_processing_batch() {
    let (storage, _dir) = setup_storage().await;
    let batch_id = seed_batch(&storage).await;
    assert!(storage.claim_batch(&batch_id).await.unwrap());

    let janitor = JanitorRunner::new(
        storage.clone(),
        Duration::from_secs(60),
        Duration::ZERO,
    );

    // Give the lock timestamp a moment to age past the zero threshold.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let reclaimed = janitor.sweep().await.unwrap();
    assert_eq!(reclaimed, 1);

    let batch = storage.get_batch(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.status, BatchStatus::Pending);
    assert!(storage.claim_batch(&batch_id).await.unwrap());
}

#[tokio::test]
async fn janitor_leaves_fresh_locks_alone() {
    let (storage, _dir) = setup_storage().await;
    let batch_id = seed_batch(&storage).await;
    assert!(storage.claim_batch(&batch_id).await.unwrap());

    let janitor = JanitorRunner::new(
        storage.clone(),
        Duration::from_secs(60),
        Duration::from_secs(900),
    );
    let reclaimed = janitor.sweep().await.unwrap();
    assert_eq!(reclaimed, 0);

    let batch = storage.get_batch(&batch_id).await.unwrap().unwrap();
    assert_eq!(batch.status, BatchStatus::Processing);
}

#[tokio::test]
async fn scheduler_processes_due_org_once_per_day() {
    let (storage, _dir) = setup_storage().await;
    seed_messages(
        &storage,
        &[
            ("m1", "2026-08-05T07:00:00.000Z"),
            ("m2", "2026-08-05T08:00:00.000Z"),
        ],
    )
    .await;

    // 2026-08-05 is a Wednesday.
    storage
        .database()
        .connection()
        .call(|conn| -> tokio_rusqlite::Result<()> {
            conn.execute_batch(
                "UPDATE organizations
                 SET summary_schedule_time = '09:00',
                     summary_delivery_days = '[\"mon\",\"wed\",\"fri\"]'
                 WHERE id = 'org-1';",
            )?;
            Ok(())
        })
        .await
        .unwrap();

    let intelligence = Arc::new(MockIntelligence::with_output(AnalysisOutput {
        summary: Some("Scheduled summary.".to_string()),
        ..Default::default()
    }));
    let processor = Arc::new(BatchProcessor::new(
        storage.clone(),
        intelligence,
        "sentinel-v2".into(),
    ));
    let scheduler = SummaryScheduler::new(
        storage.clone(),
        processor,
        vigia_config::model::SchedulerConfig::default(),
    );

    let now = chrono::Utc.with_ymd_and_hms(2026, 8, 5, 9, 10, 0).unwrap();
    let report = scheduler.sweep_due(now).await.unwrap();
    assert_eq!(report.organizations_due, 1);
    assert_eq!(report.batches_processed, 1);

    // Same hour again: the run is stamped for today.
    let again = scheduler.sweep_due(now).await.unwrap();
    assert_eq!(again.organizations_due, 0);

    let summaries: i64 = storage
        .database()
        .connection()
        .call(|conn| -> tokio_rusqlite::Result<i64> {
            Ok(conn.query_row("SELECT COUNT(*) FROM summaries", [], |row| row.get(0))?)
        })
        .await
        .unwrap();
    assert_eq!(summaries, 1);
}

#[tokio::test]
async fn scheduler_skips_groups_below_min_messages() {
    let (storage, _dir) = setup_storage().await;
    seed_messages(&storage, &[("m1", "2026-08-05T07:00:00.000Z")]).await;

    storage
        .database()
        .connection()
        .call(|conn| -> tokio_rusqlite::Result<()> {
            conn.execute_batch(
                "UPDATE organizations
                 SET summary_schedule_time = '09:00',
                     summary_delivery_days = '[\"wed\"]'
                 WHERE id = 'org-1';",
            )?;
            Ok(())
        })
        .await
        .unwrap();

    let processor = Arc::new(BatchProcessor::new(
        storage.clone(),
        Arc::new(MockIntelligence::new()),
        "sentinel-v2".into(),
    ));
    let config = vigia_config::model::SchedulerConfig {
        min_messages: 5,
        ..Default::default()
    };
    let scheduler = SummaryScheduler::new(storage.clone(), processor, config);

    let now = chrono::Utc.with_ymd_and_hms(2026, 8, 5, 9, 10, 0).unwrap();
    let report = scheduler.sweep_due(now).await.unwrap();
    assert_eq!(report.organizations_due, 1);
    assert_eq!(report.groups_skipped, 1);
    assert_eq!(report.batches_processed, 0);

    let batch = storage.next_pending_batch().await.unwrap();
    assert!(batch.is_none(), "no batch should have been created");
}
