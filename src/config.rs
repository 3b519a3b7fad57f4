use crate::errors::{SyncError, SyncResult};
use clap::Parser;
use std::env;

/// Command-line surface.
#[derive(Parser, Debug)]
#[command(author, version, about = "Sync changed and new files into a Swift container.")]
pub struct Args {
    /// The container name.
    #[arg(long, default_value = "juju-dist")]
    pub container: String,

    /// The destination path in the container.
    pub path: String,

    /// The files to send to the container.
    pub files: Vec<String>,
}

/// Centralized application configuration.
/// Combines CLI arguments with the one environment value the run depends on.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub container: String,
    pub path: String,
    pub files: Vec<String>,

    /// Value of `OS_AUTH_URL`, captured once at startup. The external swift
    /// client reads it on its own; here it only gates the run.
    pub auth_url: Option<String>,
}

impl AppConfig {
    /// Parse CLI args and capture the environment into an AppConfig.
    ///
    /// This is the only place the process environment is read.
    pub fn from_env_and_args() -> Self {
        let args = Args::parse();
        Self::new(args, env::var("OS_AUTH_URL").ok())
    }

    pub fn new(args: Args, auth_url: Option<String>) -> Self {
        Self {
            container: args.container,
            path: args.path,
            files: args.files,
            auth_url,
        }
    }

    /// The auth endpoint must be sourced before any remote activity starts.
    /// A present-but-blank value counts as missing.
    pub fn ensure_auth_sourced(&self) -> SyncResult<()> {
        match self.auth_url.as_deref() {
            Some(value) if !value.trim().is_empty() => Ok(()),
            _ => Err(SyncError::MissingEnvironment { var: "OS_AUTH_URL" }),
        }
    }
}
