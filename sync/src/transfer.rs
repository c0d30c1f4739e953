//! Transfer strategies: direct streaming, disk-staged, and batched zip.
//!
//! A strategy executes one run's batch against the source and destination
//! endpoints and reports which filenames completed the put-to-destination
//! step. Only those names may be recorded as transferred. Per-file failures
//! are recoverable (the file is retried next run); in batched mode a single
//! failure aborts the whole batch so no partial batch state is ever recorded.
//!
//! Strategies queue notification messages but never send them; the
//! orchestrator emits them after state has been persisted.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::{SyncConfig, TransferPolicy};
use crate::error::{Result, SyncError};
use crate::notify::{batch_message, single_file_message};
use crate::remote::{RemoteEndpoint, RemoteFile};

/// The working set for one run: the diffed filenames plus the listing
/// metadata needed to report byte counts later
#[derive(Debug, Clone)]
pub struct TransferBatch {
    pending: Vec<String>,
    sizes: HashMap<String, u64>,
}

impl TransferBatch {
    pub fn new(pending: Vec<String>, listing: &[RemoteFile]) -> Self {
        let sizes = listing
            .iter()
            .map(|file| (file.name.clone(), file.size))
            .collect();
        Self { pending, sizes }
    }

    /// Filenames to move, in stable (sorted) order
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    fn size_of(&self, name: &str) -> u64 {
        self.sizes.get(name).copied().unwrap_or(0)
    }
}

/// What a strategy accomplished for one run
#[derive(Debug, Default)]
pub struct TransferOutcome {
    /// Names that completed the put step; safe to record as transferred
    pub transferred: Vec<String>,
    /// Names that failed and will be retried next run
    pub failed: Vec<String>,
    /// Notification messages queued for after persistence
    pub messages: Vec<String>,
}

/// Executes the configured [`TransferPolicy`] over a batch
pub struct TransferStrategy {
    policy: TransferPolicy,
    source_archive: Option<String>,
    run_name: String,
}

impl TransferStrategy {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            policy: config.policy.clone(),
            source_archive: config.source_archive.clone(),
            run_name: config.name.clone(),
        }
    }

    /// Run the batch. Returns `Err` only for environment failures (e.g. the
    /// staging directory cannot be created); per-file and per-batch transfer
    /// failures are reported through the outcome instead.
    pub async fn execute(
        &self,
        source: &dyn RemoteEndpoint,
        dest: &dyn RemoteEndpoint,
        batch: &TransferBatch,
    ) -> Result<TransferOutcome> {
        match &self.policy {
            TransferPolicy::Direct => self.run_per_file(source, dest, batch, None).await,
            TransferPolicy::DiskStaged { staging_dir } => {
                std::fs::create_dir_all(staging_dir)?;
                self.run_per_file(source, dest, batch, Some(staging_dir)).await
            }
            TransferPolicy::Batched { staging_dir } => {
                self.run_batched(source, dest, batch, staging_dir.as_deref())
                    .await
            }
        }
    }

    /// Direct and disk-staged modes: one file at a time, failures skipped
    async fn run_per_file(
        &self,
        source: &dyn RemoteEndpoint,
        dest: &dyn RemoteEndpoint,
        batch: &TransferBatch,
        staging_dir: Option<&Path>,
    ) -> Result<TransferOutcome> {
        let mut outcome = TransferOutcome::default();

        for name in batch.pending() {
            let result = match staging_dir {
                None => transfer_direct(source, dest, name).await,
                Some(dir) => transfer_staged(source, dest, name, dir).await,
            };

            match result {
                Ok(()) => {
                    debug!(file = %name, "transfer complete");
                    outcome.transferred.push(name.clone());
                    outcome
                        .messages
                        .push(single_file_message(name, batch.size_of(name)));
                    // Source-side archival is a post-success step for staged
                    // transfers only; a failure here never unmarks the file
                    if staging_dir.is_some() {
                        self.archive_source(source, name).await;
                    }
                }
                Err(e) => {
                    warn!(file = %name, "transfer failed, will retry next run: {e}");
                    outcome.failed.push(name.clone());
                }
            }
        }

        Ok(outcome)
    }

    /// Batched zip mode: stage everything, bundle once, push once.
    /// All-or-nothing for the persisted state.
    async fn run_batched(
        &self,
        source: &dyn RemoteEndpoint,
        dest: &dyn RemoteEndpoint,
        batch: &TransferBatch,
        staging_dir: Option<&Path>,
    ) -> Result<TransferOutcome> {
        let mut outcome = TransferOutcome::default();
        if batch.is_empty() {
            return Ok(outcome);
        }

        let _temp_guard;
        let dir: &Path = match staging_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir
            }
            None => {
                _temp_guard = tempfile::tempdir()?;
                _temp_guard.path()
            }
        };

        match self.deliver_batch(source, dest, batch, dir).await {
            Ok((zip_name, members)) => {
                outcome.transferred = batch.pending().to_vec();
                outcome.messages.push(batch_message(&zip_name, &members));
                for name in batch.pending() {
                    self.archive_source(source, name).await;
                }
            }
            Err(e) => {
                warn!("batched transfer aborted, nothing marked transferred: {e}");
                outcome.failed = batch.pending().to_vec();
            }
        }

        Ok(outcome)
    }

    async fn deliver_batch(
        &self,
        source: &dyn RemoteEndpoint,
        dest: &dyn RemoteEndpoint,
        batch: &TransferBatch,
        dir: &Path,
    ) -> Result<(String, Vec<(String, u64)>)> {
        let mut staged = Vec::with_capacity(batch.len());
        let mut members = Vec::with_capacity(batch.len());

        for name in batch.pending() {
            let local = dir.join(name);
            source.fetch_to(name, &local).await?;
            staged.push((entry_name(name), local));
            members.push((name.clone(), batch.size_of(name)));
        }

        let zip_name = bundle_name(&self.run_name, chrono::Local::now().date_naive());
        let zip_path = dir.join(&zip_name);

        let build_path = zip_path.clone();
        tokio::task::spawn_blocking(move || build_zip(&build_path, &staged))
            .await
            .map_err(|e| SyncError::Io(std::io::Error::other(e)))??;

        dest.put_from(&zip_path, &zip_name).await?;
        Ok((zip_name, members))
    }

    /// Move a successfully transferred file into the source-side archive
    /// subdirectory. Best-effort: failures are logged, never propagated.
    async fn archive_source(&self, source: &dyn RemoteEndpoint, name: &str) {
        let Some(archive) = &self.source_archive else {
            return;
        };
        let result = async {
            source
                .mkdir(archive)
                .await
                .map_err(|e| SyncError::archival(name, e))?;
            source
                .rename(name, &format!("{archive}/{name}"))
                .await
                .map_err(|e| SyncError::archival(name, e))
        }
        .await;

        if let Err(e) = result {
            warn!("source-side archival failed (transfer already recorded): {e}");
        }
    }
}

async fn transfer_direct(
    source: &dyn RemoteEndpoint,
    dest: &dyn RemoteEndpoint,
    name: &str,
) -> Result<()> {
    let data = source.fetch(name).await?;
    dest.put(name, &data).await
}

async fn transfer_staged(
    source: &dyn RemoteEndpoint,
    dest: &dyn RemoteEndpoint,
    name: &str,
    staging_dir: &Path,
) -> Result<()> {
    let local = staging_dir.join(name);
    source.fetch_to(name, &local).await?;
    dest.put_from(&local, name).await
}

/// Deterministic bundle name: `<run name>-<YYYY-MM-DD>.zip`
fn bundle_name(run_name: &str, date: NaiveDate) -> String {
    format!("{}-{}.zip", run_name, date.format("%Y-%m-%d"))
}

/// Zip entries use the base name, flattening any path structure
fn entry_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
        .to_owned()
}

fn build_zip(zip_path: &Path, members: &[(String, PathBuf)]) -> Result<()> {
    let file = File::create(zip_path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (entry, local) in members {
        writer
            .start_file(entry.as_str(), options)
            .map_err(|e| SyncError::zip(zip_path, e))?;
        let mut staged = File::open(local)?;
        std::io::copy(&mut staged, &mut writer)?;
    }

    writer.finish().map_err(|e| SyncError::zip(zip_path, e))?;
    Ok(())
}
