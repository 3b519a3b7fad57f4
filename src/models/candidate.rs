//! Represents local files under consideration for upload.

/// One local file being considered in a sync run.
#[derive(Debug, Clone)]
pub struct SyncCandidate {
    /// File name exactly as given by the caller.
    pub file_name: String,

    /// Expected object name in the container: `<path>/<file_name>`.
    ///
    /// Object names are opaque strings and are never normalized, so this
    /// must match the remote naming convention exactly for the lookup to
    /// hit.
    pub destination_path: String,
}

impl SyncCandidate {
    pub fn new(path: &str, file_name: &str) -> Self {
        Self {
            destination_path: format!("{}/{}", path, file_name),
            file_name: file_name.to_string(),
        }
    }
}

/// Classification of a candidate against the remote index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    /// No object exists under the candidate's destination path.
    New,

    /// Local and remote digests match; nothing to do.
    Unchanged,

    /// Digests differ; the local file supersedes the remote object.
    Changed {
        local_hash: String,
        remote_hash: String,
    },
}
