//! Represents objects currently stored in the remote container.

use serde::Deserialize;
use std::collections::HashMap;

/// One object from the container listing.
///
/// Only `name` and `hash` drive sync decisions; `bytes` is informational.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteObject {
    /// Full object key, unique within its container.
    pub name: String,

    /// Content digest as reported by the store (hex MD5).
    pub hash: String,

    /// Object size in bytes.
    #[serde(default)]
    pub bytes: i64,
}

/// Snapshot of a container listing keyed by object name.
///
/// Built once per run and read-only during the sync pass. Never refreshed
/// mid-run, even when an upload changes remote state.
pub type RemoteIndex = HashMap<String, RemoteObject>;
