//! Run orchestration: load state, list, diff, transfer, persist, notify.
//!
//! Fatal errors (corrupt state, listing failure) abort the run before any
//! state mutation. Recoverable per-file errors only reduce what gets
//! persisted. Notifications are emitted after the state file has been
//! written, and a notification failure never affects bookkeeping.
//!
//! One engine instance processes one run sequentially. Running two syncs
//! concurrently for the same run name is unsupported: the state file is not
//! locked across processes, so that must be prevented operationally.

use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::diff::DiffEngine;
use crate::error::Result;
use crate::notify::NotificationSink;
use crate::remote::RemoteEndpoint;
use crate::state::StateStore;
use crate::transfer::{TransferBatch, TransferStrategy};

/// Summary of one sync run
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Files the diff selected for transfer
    pub found: usize,
    /// Files recorded as transferred this run
    pub transferred: usize,
    /// Files that failed and will be retried next run
    pub failed: usize,
    /// The diffed filenames, for dry-run display
    pub pending: Vec<String>,
    pub dry_run: bool,
}

/// Orchestrates one run against a connected source and destination
pub struct SyncEngine {
    config: SyncConfig,
    state: StateStore,
    dry_run: bool,
}

impl SyncEngine {
    /// Engine with the state file derived from the configured run name,
    /// stored in the working directory
    pub fn new(config: SyncConfig, dry_run: bool) -> Self {
        let state = StateStore::for_run(&config.name);
        Self {
            config,
            state,
            dry_run,
        }
    }

    /// Engine with an explicit state store location
    pub fn with_state_store(config: SyncConfig, state: StateStore, dry_run: bool) -> Self {
        Self {
            config,
            state,
            dry_run,
        }
    }

    /// Execute one run.
    ///
    /// In dry-run mode the engine stops after diffing: nothing is
    /// transferred, persisted, or notified.
    pub async fn run(
        &self,
        source: &dyn RemoteEndpoint,
        dest: &dyn RemoteEndpoint,
        sink: Option<&dyn NotificationSink>,
    ) -> Result<SyncReport> {
        let transferred = self.state.load()?;
        let listing = source.list().await?;

        let diff_engine = DiffEngine::new(self.config.skip_empty);
        let pending = diff_engine.diff(&listing, &transferred);
        info!("Found {} files to transfer", pending.len());

        if self.dry_run {
            for name in &pending {
                info!("Would transfer {name}");
            }
            return Ok(SyncReport {
                found: pending.len(),
                transferred: 0,
                failed: 0,
                pending,
                dry_run: true,
            });
        }

        if pending.is_empty() {
            return Ok(SyncReport {
                found: 0,
                transferred: 0,
                failed: 0,
                pending,
                dry_run: false,
            });
        }

        let batch = TransferBatch::new(pending.clone(), &listing);
        let strategy = TransferStrategy::new(&self.config);
        let outcome = strategy.execute(source, dest, &batch).await?;

        let mut updated = transferred;
        updated.extend(outcome.transferred.iter().cloned());
        self.state.save(&updated)?;

        if let Some(sink) = sink {
            for message in &outcome.messages {
                if let Err(e) = sink.notify(message).await {
                    warn!("notification failed (transfer already recorded): {e}");
                }
            }
        }

        info!(
            "Run complete: {} of {} files transferred",
            outcome.transferred.len(),
            batch.len()
        );

        Ok(SyncReport {
            found: batch.len(),
            transferred: outcome.transferred.len(),
            failed: outcome.failed.len(),
            pending,
            dry_run: false,
        })
    }

    /// The run's configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The state store backing this run
    pub fn state_store(&self) -> &StateStore {
        &self.state
    }
}
