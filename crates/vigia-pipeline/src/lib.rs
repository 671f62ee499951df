// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coordination core of the Vigia intelligence pipeline.
//!
//! Wires the batch lifecycle (select, atomic claim, finalize), the single
//! analysis call per batch, the best-effort fan-out of analysis output, the
//! notification dispatcher with its high-severity throttle, the delivery
//! queue payload contracts, and the two background loops (stale-batch
//! janitor and summary scheduler).

pub mod fanout;
pub mod janitor;
pub mod notify;
pub mod outbox;
pub mod processor;
pub mod scheduler;

pub use fanout::{FanOutPersister, FanOutReport};
pub use janitor::JanitorRunner;
pub use notify::NotificationDispatcher;
pub use processor::{BatchProcessor, ProcessOutcome};
pub use scheduler::{SummaryScheduler, SweepReport};
