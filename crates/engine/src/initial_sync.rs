//! Initial full-tree sync
//!
//! `beforeSync`, one rsync of the whole root, then `afterSync`. Any stage
//! failing is fatal to startup.

use crate::hooks::{BaseContext, HookPipeline};
use crate::status::{Status, StatusReporter, SyncAction};
use crate::transfer::Transfer;
use remotesync_config::HookName;
use remotesync_core::{CommandOutput, Result};
use std::sync::Arc;

/// Path shown in the status line for the whole tree
const TREE_PATH: &str = ".";

/// Startup sync of the whole root
pub struct InitialSync {
    hooks: Arc<HookPipeline>,
    transfer: Arc<Transfer>,
    reporter: Arc<dyn StatusReporter>,
}

impl InitialSync {
    /// Sync using the given hooks, transfer and reporter
    pub fn new(
        hooks: Arc<HookPipeline>,
        transfer: Arc<Transfer>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            hooks,
            transfer,
            reporter,
        }
    }

    /// Run all three stages
    ///
    /// # Errors
    ///
    /// Returns the first hook or rsync failure
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<CommandOutput> {
        tracing::info!("Starting initial file synchronization...");

        self.hooks
            .invoke(HookName::BeforeSync, BaseContext::new())
            .await?;

        self.reporter.started(TREE_PATH, SyncAction::Tree);
        let output = match self.transfer.sync_tree().await {
            Ok(output) => output,
            Err(e) => {
                self.reporter.finished(
                    TREE_PATH,
                    SyncAction::Tree,
                    &Status::Failed(e.to_string()),
                );
                return Err(e);
            }
        };

        if output.stderr.trim().is_empty() {
            if let Some(summary) = output.last_stdout_line() {
                tracing::info!("{summary}");
            }
        } else {
            tracing::warn!("rsync reported warnings: {}", output.stderr.trim());
        }
        tracing::info!("Initial synchronization completed");
        self.reporter
            .finished(TREE_PATH, SyncAction::Tree, &Status::Done);

        self.hooks
            .invoke(HookName::AfterSync, BaseContext::new())
            .await?;

        Ok(output)
    }
}
