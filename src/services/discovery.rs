//! Endpoint and account discovery.
//!
//! The storage service location is not configured anywhere; it has to be
//! scraped from the output of the external `swift` client. The scraping
//! sits behind the narrow `Discovery` trait so the text-parsing strategy
//! can be swapped for a structured API call without touching the sync
//! logic.

use crate::errors::{SyncError, SyncResult};
use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use url::Url;

/// Resolves where the object store lives and which account to address.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Base URL of the storage service.
    async fn resolve_endpoint(&self) -> SyncResult<Url>;

    /// Account identifier owning the containers.
    async fn resolve_account(&self) -> SyncResult<String>;
}

/// Discovery backed by the `swift` command-line client.
#[derive(Debug, Clone)]
pub struct SwiftCli {
    binary: String,
}

impl SwiftCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for SwiftCli {
    fn default() -> Self {
        Self::new("swift")
    }
}

#[async_trait]
impl Discovery for SwiftCli {
    async fn resolve_endpoint(&self) -> SyncResult<Url> {
        // The client can exit non-zero and still print the service URL, so
        // only the combined output matters here, not the exit status.
        let output = Command::new(&self.binary)
            .arg("capabilities")
            .output()
            .await
            .map_err(|err| SyncError::EndpointDiscovery {
                reason: format!("running `{} capabilities`: {}", self.binary, err),
            })?;
        parse_endpoint(
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }

    async fn resolve_account(&self) -> SyncResult<String> {
        let output = Command::new(&self.binary)
            .arg("stat")
            .output()
            .await
            .map_err(|err| SyncError::AccountDiscovery {
                reason: format!("running `{} stat`: {}", self.binary, err),
            })?;
        if !output.status.success() {
            return Err(SyncError::AccountDiscovery {
                reason: format!(
                    "`{} stat` exited with {}: {}",
                    self.binary,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        parse_account(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Scan capability output for the first URL-shaped token, stdout before
/// stderr, and keep everything up to its last path separator as the
/// service base URL.
fn parse_endpoint(stdout: &str, stderr: &str) -> SyncResult<Url> {
    let pattern = Regex::new(r"(https://\S+)/").unwrap();
    for line in stdout.lines().chain(stderr.lines()) {
        if let Some(captures) = pattern.captures(line) {
            let raw = &captures[1];
            return Url::parse(raw).map_err(|err| SyncError::EndpointDiscovery {
                reason: format!("`{}` is not a valid URL: {}", raw, err),
            });
        }
    }
    Err(SyncError::EndpointDiscovery {
        reason: "no URL found in capability output".into(),
    })
}

/// Pull the `Account:` field out of `swift stat` output. The value after
/// the first colon wins; repeated fields keep the last occurrence.
fn parse_account(output: &str) -> SyncResult<String> {
    let mut account = None;
    for line in output.lines() {
        if line.contains("Account:") {
            if let Some((_, value)) = line.split_once(':') {
                account = Some(value.trim().to_string());
            }
        }
    }
    account.ok_or_else(|| SyncError::AccountDiscovery {
        reason: "no Account field in stat output".into(),
    })
}
