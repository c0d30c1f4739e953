//! Remote endpoint boundary: listing, fetching, storing and renaming files
//! by name on a connected SFTP host.
//!
//! The engine only sees the [`RemoteEndpoint`] trait; [`SftpEndpoint`] is the
//! production implementation over blocking `ssh2` calls, bridged onto the
//! async runtime with `spawn_blocking`.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ssh2::Session;

use crate::config::EndpointConfig;
use crate::error::{Result, SyncError};

/// One entry from a remote directory listing. Ephemeral; rebuilt on every
/// listing call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub size: u64,
}

/// File operations the sync engine needs from a connected remote endpoint
#[async_trait]
pub trait RemoteEndpoint: Send + Sync {
    /// Enumerate regular files in the working directory
    async fn list(&self) -> Result<Vec<RemoteFile>>;

    /// Read a remote file fully into memory
    async fn fetch(&self, name: &str) -> Result<Vec<u8>>;

    /// Download a remote file to a local path, returning the byte count
    async fn fetch_to(&self, name: &str, local: &Path) -> Result<u64>;

    /// Write bytes to a remote file
    async fn put(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Upload a local file to a remote name
    async fn put_from(&self, local: &Path, name: &str) -> Result<()>;

    /// Rename a remote file, replacing any existing target
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Create a remote directory; succeeds if it already exists
    async fn mkdir(&self, dir: &str) -> Result<()>;
}

struct SftpConn {
    // Held so the transport outlives the sftp channel
    _session: Session,
    sftp: ssh2::Sftp,
    /// Working-directory prefix from the endpoint's `DIR` setting
    prefix: Option<PathBuf>,
}

impl SftpConn {
    fn resolve(&self, name: &str) -> PathBuf {
        match &self.prefix {
            Some(prefix) => prefix.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// SFTP implementation of [`RemoteEndpoint`] using password authentication
pub struct SftpEndpoint {
    conn: Arc<Mutex<SftpConn>>,
    label: String,
}

impl SftpEndpoint {
    /// Open a session against the configured endpoint.
    ///
    /// Fails with [`SyncError::Connection`] if the TCP connection, SSH
    /// handshake, authentication, or SFTP channel setup fails.
    pub async fn connect(config: &EndpointConfig, timeout: Duration) -> Result<Self> {
        let config = config.clone();
        tokio::task::spawn_blocking(move || Self::connect_blocking(&config, timeout))
            .await
            .map_err(join_error)?
    }

    fn connect_blocking(config: &EndpointConfig, timeout: Duration) -> Result<Self> {
        let address = config.address();
        let connect_err = |e: &dyn std::fmt::Display| SyncError::connection(&address, e);

        let tcp = TcpStream::connect(&address).map_err(|e| connect_err(&e))?;
        let mut session = Session::new().map_err(|e| connect_err(&e))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(timeout.as_millis() as u32);
        session.handshake().map_err(|e| connect_err(&e))?;
        session
            .userauth_password(&config.user, &config.pass)
            .map_err(|e| connect_err(&e))?;
        if !session.authenticated() {
            return Err(SyncError::connection(&address, "authentication failed"));
        }

        let sftp = session.sftp().map_err(|e| connect_err(&e))?;
        // ssh2 has no chdir; emulate DIR by prefixing every remote path
        let prefix = config.dir.as_ref().map(PathBuf::from);

        Ok(Self {
            conn: Arc::new(Mutex::new(SftpConn {
                _session: session,
                sftp,
                prefix,
            })),
            label: address,
        })
    }

    /// Address this endpoint was connected to
    pub fn label(&self) -> &str {
        &self.label
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&SftpConn) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| {
                SyncError::Io(std::io::Error::other("sftp session lock poisoned"))
            })?;
            op(&guard)
        })
        .await
        .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> SyncError {
    SyncError::Io(std::io::Error::other(e))
}

#[async_trait]
impl RemoteEndpoint for SftpEndpoint {
    async fn list(&self) -> Result<Vec<RemoteFile>> {
        self.with_conn(|conn| {
            let dir = conn
                .prefix
                .clone()
                .unwrap_or_else(|| PathBuf::from("."));
            let entries = conn
                .sftp
                .readdir(&dir)
                .map_err(|e| SyncError::transfer(dir.display().to_string(), e))?;

            let mut files = Vec::with_capacity(entries.len());
            for (path, stat) in entries {
                if !stat.is_file() {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                files.push(RemoteFile {
                    name: name.to_owned(),
                    size: stat.size.unwrap_or(0),
                });
            }
            Ok(files)
        })
        .await
    }

    async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let name = name.to_owned();
        self.with_conn(move |conn| {
            let path = conn.resolve(&name);
            let mut remote = conn
                .sftp
                .open(&path)
                .map_err(|e| SyncError::transfer(&name, e))?;
            let mut buffer = Vec::new();
            remote
                .read_to_end(&mut buffer)
                .map_err(|e| SyncError::transfer(&name, e))?;
            Ok(buffer)
        })
        .await
    }

    async fn fetch_to(&self, name: &str, local: &Path) -> Result<u64> {
        let name = name.to_owned();
        let local = local.to_path_buf();
        self.with_conn(move |conn| {
            let path = conn.resolve(&name);
            let mut remote = conn
                .sftp
                .open(&path)
                .map_err(|e| SyncError::transfer(&name, e))?;
            let mut file = std::fs::File::create(&local)?;
            let bytes = std::io::copy(&mut remote, &mut file)
                .map_err(|e| SyncError::transfer(&name, e))?;
            Ok(bytes)
        })
        .await
    }

    async fn put(&self, name: &str, data: &[u8]) -> Result<()> {
        let name = name.to_owned();
        let data = data.to_vec();
        self.with_conn(move |conn| {
            let path = conn.resolve(&name);
            let mut remote = conn
                .sftp
                .create(&path)
                .map_err(|e| SyncError::transfer(&name, e))?;
            remote
                .write_all(&data)
                .map_err(|e| SyncError::transfer(&name, e))?;
            Ok(())
        })
        .await
    }

    async fn put_from(&self, local: &Path, name: &str) -> Result<()> {
        let name = name.to_owned();
        let local = local.to_path_buf();
        self.with_conn(move |conn| {
            let path = conn.resolve(&name);
            let mut file = std::fs::File::open(&local)?;
            let mut remote = conn
                .sftp
                .create(&path)
                .map_err(|e| SyncError::transfer(&name, e))?;
            std::io::copy(&mut file, &mut remote)
                .map_err(|e| SyncError::transfer(&name, e))?;
            Ok(())
        })
        .await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = from.to_owned();
        let to = to.to_owned();
        self.with_conn(move |conn| {
            conn.sftp
                .rename(&conn.resolve(&from), &conn.resolve(&to), None)
                .map_err(|e| SyncError::transfer(&from, e))?;
            Ok(())
        })
        .await
    }

    async fn mkdir(&self, dir: &str) -> Result<()> {
        let dir = dir.to_owned();
        self.with_conn(move |conn| {
            let path = conn.resolve(&dir);
            match conn.sftp.mkdir(&path, 0o755) {
                Ok(()) => Ok(()),
                // Already present is fine
                Err(_) if conn.sftp.stat(&path).is_ok() => Ok(()),
                Err(e) => Err(SyncError::transfer(&dir, e)),
            }
        })
        .await
    }
}
