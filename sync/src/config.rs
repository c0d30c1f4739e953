//! Run configuration: INI file loading and validation into an immutable
//! [`SyncConfig`].
//!
//! The raw file is never handed to the rest of the engine. A validating parse
//! step resolves defaults (port, timeout) and collapses the `zip` /
//! `archive_dir` flags into a single [`TransferPolicy`] variant, so transfer
//! mode is decided exactly once.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use crate::error::{Result, SyncError};

/// Default SFTP port when the config omits `PORT`
pub const DEFAULT_PORT: u16 = 22;

/// Default per-call network timeout when the config omits `timeout_secs`
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const REQUIRED_SECTIONS: [&str; 3] = ["source", "dest", "main"];

/// Connection parameters for one SFTP endpoint
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub port: u16,
    /// Remote working directory entered after connecting
    pub dir: Option<String>,
}

impl EndpointConfig {
    /// Host:port address string used for the TCP connection
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Transfer mode for a run, resolved once at configuration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferPolicy {
    /// Stream each file source-to-destination through memory
    Direct,
    /// Fetch each file to local disk, then push the staged copy
    DiskStaged { staging_dir: PathBuf },
    /// Stage every file, bundle the batch into one zip, push it once.
    /// Without a staging dir the batch stages into a temporary directory.
    Batched { staging_dir: Option<PathBuf> },
}

/// Resolved, immutable parameters for one sync run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Run name; derives the state file and zip bundle names
    pub name: String,
    pub source: EndpointConfig,
    pub dest: EndpointConfig,
    pub policy: TransferPolicy,
    /// Remote subdirectory on the source that successfully transferred
    /// files are moved into
    pub source_archive: Option<String>,
    /// Exclude zero-byte listing entries from the diff
    pub skip_empty: bool,
    /// Webhook URL for notifications; `None` disables them entirely
    pub webhook_url: Option<String>,
    /// Per-call network timeout
    pub timeout: Duration,
}

impl SyncConfig {
    /// Load and validate a config file.
    ///
    /// Fails with [`SyncError::Config`] naming the missing or invalid
    /// element, before any connection is attempted.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|e| {
            SyncError::config(format!("cannot read config file '{}': {}", path.display(), e))
        })?;
        Self::from_ini(&ini)
    }

    /// Validate an already-parsed INI document
    pub fn from_ini(ini: &Ini) -> Result<Self> {
        for section in REQUIRED_SECTIONS {
            if ini.section(Some(section)).is_none() {
                return Err(SyncError::config(format!(
                    "section `[{section}]` must be defined in the config file"
                )));
            }
        }

        let source = parse_endpoint(ini, "source")?;
        let dest = parse_endpoint(ini, "dest")?;

        let main = section(ini, "main")?;
        let name = main
            .get("name")
            .map(str::to_owned)
            .ok_or_else(|| SyncError::config("`name` must be defined in [main]"))?;

        let archive_dir = main.get("archive_dir").map(PathBuf::from);
        let zip = main.get("zip").map(is_truthy).unwrap_or(false);

        let policy = if zip {
            TransferPolicy::Batched {
                staging_dir: archive_dir,
            }
        } else if let Some(staging_dir) = archive_dir {
            TransferPolicy::DiskStaged { staging_dir }
        } else {
            TransferPolicy::Direct
        };

        let timeout_secs = match main.get("timeout_secs") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| SyncError::config("`timeout_secs` in [main] must be a number"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            name,
            source,
            dest,
            policy,
            source_archive: main.get("source_archive").map(str::to_owned),
            skip_empty: main.get("skip_empty").map(is_truthy).unwrap_or(false),
            webhook_url: main.get("slack").map(str::to_owned),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn section<'a>(ini: &'a Ini, name: &str) -> Result<&'a ini::Properties> {
    ini.section(Some(name)).ok_or_else(|| {
        SyncError::config(format!("section `[{name}]` must be defined in the config file"))
    })
}

fn parse_endpoint(ini: &Ini, name: &str) -> Result<EndpointConfig> {
    let props = section(ini, name)?;

    let required = |key: &str| -> Result<String> {
        props
            .get(key)
            .map(str::to_owned)
            .ok_or_else(|| SyncError::config(format!("missing key `{key}` in [{name}]")))
    };

    let port = match props.get("PORT") {
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| SyncError::config(format!("`PORT` in [{name}] must be a number")))?,
        None => DEFAULT_PORT,
    };

    Ok(EndpointConfig {
        host: required("HOST")?,
        user: required("USER")?,
        pass: required("PASS")?,
        port,
        dir: props.get("DIR").map(str::to_owned),
    })
}

/// Truthiness for boolean-ish config values: any non-empty value counts as
/// true except the usual negatives.
fn is_truthy(raw: &str) -> bool {
    !raw.is_empty() && !matches!(raw.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_ini() -> String {
        "[source]\n\
         HOST = src.example.com\n\
         USER = alice\n\
         PASS = secret\n\
         [dest]\n\
         HOST = dst.example.com\n\
         USER = bob\n\
         PASS = hunter2\n\
         PORT = 2222\n\
         DIR = /incoming\n\
         [main]\n\
         name = myrun\n"
            .to_owned()
    }

    fn parse(text: &str) -> Result<SyncConfig> {
        let ini = Ini::load_from_str(text).unwrap();
        SyncConfig::from_ini(&ini)
    }

    #[test]
    fn parses_minimal_config() {
        let config = parse(&base_ini()).unwrap();
        assert_eq!(config.name, "myrun");
        assert_eq!(config.source.port, DEFAULT_PORT);
        assert_eq!(config.dest.port, 2222);
        assert_eq!(config.dest.dir.as_deref(), Some("/incoming"));
        assert_eq!(config.policy, TransferPolicy::Direct);
        assert!(config.webhook_url.is_none());
        assert!(!config.skip_empty);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn missing_section_is_config_error() {
        let text = "[source]\nHOST = h\nUSER = u\nPASS = p\n[main]\nname = x\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert!(err.to_string().contains("[dest]"));
    }

    #[test]
    fn missing_endpoint_key_is_config_error() {
        let text = base_ini().replace("USER = alice\n", "");
        let err = parse(&text).unwrap_err();
        assert!(err.to_string().contains("USER"));
        assert!(err.to_string().contains("[source]"));
    }

    #[test]
    fn missing_name_is_config_error() {
        let text = base_ini().replace("name = myrun\n", "");
        let err = parse(&text).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn non_numeric_port_is_config_error() {
        let text = base_ini().replace("PORT = 2222", "PORT = twenty-two");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn archive_dir_selects_disk_staged() {
        let text = base_ini() + "archive_dir = /tmp/stage\n";
        let config = parse(&text).unwrap();
        assert_eq!(
            config.policy,
            TransferPolicy::DiskStaged {
                staging_dir: PathBuf::from("/tmp/stage")
            }
        );
    }

    #[test]
    fn zip_selects_batched_and_wins_over_archive_dir() {
        let text = base_ini() + "archive_dir = /tmp/stage\nzip = yes\n";
        let config = parse(&text).unwrap();
        assert_eq!(
            config.policy,
            TransferPolicy::Batched {
                staging_dir: Some(PathBuf::from("/tmp/stage"))
            }
        );

        let text = base_ini() + "zip = 1\n";
        let config = parse(&text).unwrap();
        assert_eq!(config.policy, TransferPolicy::Batched { staging_dir: None });
    }

    #[test]
    fn falsy_zip_values_stay_direct() {
        for value in ["0", "false", "no", "off"] {
            let text = base_ini() + &format!("zip = {value}\n");
            let config = parse(&text).unwrap();
            assert_eq!(config.policy, TransferPolicy::Direct, "zip = {value}");
        }
    }

    #[test]
    fn optional_policies_parse() {
        let text = base_ini()
            + "skip_empty = 1\n\
               source_archive = done\n\
               slack = https://hooks.example.com/T000/B000\n\
               timeout_secs = 5\n";
        let config = parse(&text).unwrap();
        assert!(config.skip_empty);
        assert_eq!(config.source_archive.as_deref(), Some("done"));
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://hooks.example.com/T000/B000")
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
