//! Remote container access: the JSON listing endpoint plus uploads
//! delegated to the external `swift` client.

use crate::{
    errors::{SyncError, SyncResult},
    models::object::{RemoteIndex, RemoteObject},
    services::discovery::Discovery,
};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

/// The two remote operations the sync pass needs.
///
/// Injected into the decision logic so it can run against a recording fake
/// without any real network or process execution.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the complete listing of `container` as a name-keyed snapshot.
    /// Read-only against the remote system.
    async fn list_objects(&self, container: &str) -> SyncResult<RemoteIndex>;

    /// Upload `file_name` beneath `<container>/<prefix>`.
    async fn upload(
        &self,
        container: &str,
        prefix: &str,
        file_name: &str,
    ) -> SyncResult<UploadOutcome>;
}

/// Acknowledgement captured from the store after an upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Raw output of the upload invocation, kept for the run log.
    pub output: String,
}

/// `ObjectStore` backed by a Swift cluster: listings through its HTTP API,
/// uploads through the `swift` command-line client.
///
/// Endpoint and account are resolved through the injected `Discovery`
/// capability when the listing is fetched, once per run.
pub struct SwiftStore<D> {
    discovery: D,
    http: reqwest::Client,
    binary: String,
}

impl<D: Discovery> SwiftStore<D> {
    pub fn new(discovery: D) -> Self {
        Self {
            discovery,
            http: reqwest::Client::new(),
            binary: "swift".to_string(),
        }
    }
}

#[async_trait]
impl<D: Discovery> ObjectStore for SwiftStore<D> {
    async fn list_objects(&self, container: &str) -> SyncResult<RemoteIndex> {
        let endpoint = self.discovery.resolve_endpoint().await?;
        let account = self.discovery.resolve_account().await?;
        let url = listing_url(&endpoint, &account, container);
        info!("listing {}", url);

        let response =
            self.http
                .get(url.as_str())
                .send()
                .await
                .map_err(|err| SyncError::RemoteListing {
                    container: container.to_string(),
                    reason: err.to_string(),
                })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::RemoteListing {
                container: container.to_string(),
                reason: format!("unexpected status {}", status),
            });
        }
        let objects: Vec<RemoteObject> =
            response
                .json()
                .await
                .map_err(|err| SyncError::RemoteListing {
                    container: container.to_string(),
                    reason: format!("malformed listing body: {}", err),
                })?;
        let total: i64 = objects.iter().map(|object| object.bytes).sum();
        debug!(
            "container {} holds {} objects ({} bytes)",
            container,
            objects.len(),
            total
        );
        Ok(build_index(objects))
    }

    async fn upload(
        &self,
        container: &str,
        prefix: &str,
        file_name: &str,
    ) -> SyncResult<UploadOutcome> {
        let target = format!("{}/{}", container, prefix);
        info!("{} upload {} {}", self.binary, target, file_name);
        let output = Command::new(&self.binary)
            .arg("upload")
            .arg(&target)
            .arg(file_name)
            .output()
            .await
            .map_err(|err| SyncError::Upload {
                file: file_name.to_string(),
                reason: format!("running `{} upload`: {}", self.binary, err),
            })?;
        if !output.status.success() {
            return Err(SyncError::Upload {
                file: file_name.to_string(),
                reason: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(UploadOutcome {
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Compose the listing URL without doubling the separator when the
/// endpoint carries a trailing slash.
fn listing_url(endpoint: &Url, account: &str, container: &str) -> String {
    format!(
        "{}/v1/{}/{}?format=json",
        endpoint.as_str().trim_end_matches('/'),
        account,
        container
    )
}

/// Key the listing by object name. Duplicate names should not occur; when
/// they do, the last entry wins.
fn build_index(objects: Vec<RemoteObject>) -> RemoteIndex {
    let mut index = RemoteIndex::with_capacity(objects.len());
    for object in objects {
        index.insert(object.name.clone(), object);
    }
    index
}
