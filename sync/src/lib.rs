//! SFTP Sync Engine Library
//!
//! Synchronizes files from a remote SFTP source to a remote SFTP destination,
//! persisting which filenames have already moved so repeated runs only
//! transfer new arrivals. Provides:
//! - Persistent transfer-state tracking keyed by run name
//! - Diffing a remote listing against recorded state
//! - Direct, disk-staged, and batched-zip transfer strategies
//! - Optional source-side archival after successful transfer
//! - Webhook notifications and dry-run previews

pub mod config;
pub mod diff;
pub mod error;
pub mod notify;
pub mod remote;
pub mod state;
pub mod sync_engine;
pub mod transfer;

// Re-export main types and functions
pub use config::{EndpointConfig, SyncConfig, TransferPolicy, DEFAULT_PORT};
pub use diff::DiffEngine;
pub use error::{Result, SyncError};
pub use notify::{NotificationSink, SlackWebhook};
pub use remote::{RemoteEndpoint, RemoteFile, SftpEndpoint};
pub use state::StateStore;
pub use sync_engine::{SyncEngine, SyncReport};
pub use transfer::{TransferBatch, TransferOutcome, TransferStrategy};

#[cfg(test)]
mod property_tests;
