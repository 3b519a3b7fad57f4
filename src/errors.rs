//! Error taxonomy for a sync run.
//!
//! Every variant is fatal: the first error aborts the run and surfaces as a
//! non-zero exit with the message below. Nothing is retried, and uploads
//! already made in the same run are not rolled back.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{var} must be sourced into the environment")]
    MissingEnvironment { var: &'static str },

    #[error("could not discover the storage endpoint: {reason}")]
    EndpointDiscovery { reason: String },

    #[error("could not discover the storage account: {reason}")]
    AccountDiscovery { reason: String },

    #[error("listing container `{container}` failed: {reason}")]
    RemoteListing { container: String, reason: String },

    #[error("could not read local file `{path}`")]
    LocalFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("uploading `{file}` failed: {reason}")]
    Upload { file: String, reason: String },
}

pub type SyncResult<T> = Result<T, SyncError>;
