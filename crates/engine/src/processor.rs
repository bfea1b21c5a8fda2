//! Single-operation execution
//!
//! Runs one file operation through its lifecycle:
//! 1. `beforeFile<Event>` hook
//! 2. Transfer (add/change) or remote deletion (delete)
//! 3. `afterFile<Event>` hook, only when step 2 actually synced
//!
//! A hook failure or a non-zero rsync exit rejects the operation. Warnings
//! from a successful rsync and failed remote deletions resolve as
//! [`Outcome::Failed`] instead.

use crate::hooks::{HookPipeline, file_context};
use crate::operation::{Operation, Outcome, SkipReason};
use crate::scheduler::OperationHandler;
use crate::status::{Status, StatusReporter, SyncAction};
use crate::transfer::{Transfer, TransferReport};
use async_trait::async_trait;
use remotesync_config::{HookName, HookStage, SyncSettings};
use remotesync_core::{Error, EventType, Result};
use std::sync::Arc;

/// Executes operations handed out by the scheduler
pub struct OperationProcessor {
    hooks: Arc<HookPipeline>,
    transfer: Arc<Transfer>,
    settings: Arc<SyncSettings>,
    reporter: Arc<dyn StatusReporter>,
}

impl OperationProcessor {
    /// Processor reporting through `reporter`
    pub fn new(
        hooks: Arc<HookPipeline>,
        transfer: Arc<Transfer>,
        settings: Arc<SyncSettings>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            hooks,
            transfer,
            settings,
            reporter,
        }
    }

    /// Run one operation and report its status line
    #[tracing::instrument(skip(self, op), fields(key = %op.key, event = %op.event))]
    pub async fn process(&self, op: &Operation) -> Result<Outcome> {
        let result = self.run(op).await;

        match &result {
            Ok(Outcome::Failed(message)) => tracing::debug!("Operation failed: {message}"),
            Err(e) => tracing::error!("Operation rejected: {e}"),
            Ok(_) => {}
        }

        self.reporter.finished(
            &op.key,
            SyncAction::File(op.event),
            &Status::from_result(&result),
        );
        result
    }

    async fn run(&self, op: &Operation) -> Result<Outcome> {
        let base = file_context(&op.key);

        self.hooks
            .invoke(HookName::for_file(HookStage::Before, op.event), base.clone())
            .await?;

        let outcome = match op.event {
            EventType::Delete => self.delete(&op.key).await?,
            EventType::Add | EventType::Change => self.sync(&op.key, op.event).await?,
        };

        if outcome.is_synced() {
            self.hooks
                .invoke(HookName::for_file(HookStage::After, op.event), base)
                .await?;
        }

        Ok(outcome)
    }

    async fn delete(&self, key: &str) -> Result<Outcome> {
        if !self.settings.delete_remote {
            tracing::debug!("Remote deletion disabled, keeping {key}");
            return Ok(Outcome::Skipped(SkipReason::DeletionDisabled));
        }

        self.reporter
            .started(key, SyncAction::File(EventType::Delete));
        Ok(match self.transfer.delete_file(key).await? {
            TransferReport::Done(_) => Outcome::Synced,
            TransferReport::Missing(message)
            | TransferReport::Warning(message)
            | TransferReport::Failed(message) => Outcome::Failed(message),
        })
    }

    async fn sync(&self, key: &str, event: EventType) -> Result<Outcome> {
        let exists = tokio::fs::try_exists(self.settings.root.join(key)).await?;
        if !exists {
            if event == EventType::Add {
                tracing::info!("File {key} no longer exists, skipping");
                return Ok(Outcome::Skipped(SkipReason::Vanished));
            }
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File {key} does not exist"),
            )));
        }

        self.reporter.started(key, SyncAction::File(event));
        let report = match self.transfer.sync_file(key).await {
            Ok(report) => report,
            Err(err) if event == EventType::Add && Transfer::source_vanished(&err) => {
                tracing::info!("File {key} vanished during transfer, skipping");
                return Ok(Outcome::Skipped(SkipReason::Vanished));
            }
            Err(err) => return Err(err),
        };

        Ok(match report {
            TransferReport::Done(_) => Outcome::Synced,
            TransferReport::Missing(_) if event == EventType::Add => {
                tracing::info!("File {key} vanished during transfer, skipping");
                Outcome::Skipped(SkipReason::Vanished)
            }
            TransferReport::Missing(message)
            | TransferReport::Warning(message)
            | TransferReport::Failed(message) => Outcome::Failed(message),
        })
    }
}

#[async_trait]
impl OperationHandler for OperationProcessor {
    async fn handle(&self, op: &Operation) -> Result<Outcome> {
        self.process(op).await
    }
}
