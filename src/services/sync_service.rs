//! The sync decision pass: classify each candidate against the remote
//! listing snapshot and upload the ones the container is missing or holds
//! stale copies of.

use crate::{
    config::AppConfig,
    errors::{SyncError, SyncResult},
    models::{
        candidate::{SyncCandidate, SyncDecision},
        object::RemoteIndex,
    },
    services::store::ObjectStore,
};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// Per-classification outcome of one run. Destination paths are recorded
/// in input order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub new: Vec<String>,
    pub changed: Vec<String>,
    pub unchanged: Vec<String>,
}

impl SyncReport {
    /// Number of uploads performed (new plus changed candidates).
    pub fn uploads(&self) -> usize {
        self.new.len() + self.changed.len()
    }
}

/// Drives one sync pass over an injected `ObjectStore`.
///
/// Candidates are processed strictly in the given order, each one fully
/// handled before the next begins. The listing snapshot is fetched once
/// and never revalidated mid-run.
pub struct SyncService<S> {
    store: S,

    /// Directory candidate file names are resolved against.
    local_root: PathBuf,
}

impl<S: ObjectStore> SyncService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            local_root: PathBuf::from("."),
        }
    }

    /// Run the full pass described by `cfg`. The first error aborts the
    /// run; uploads already made are not rolled back.
    pub async fn run(&self, cfg: &AppConfig) -> SyncResult<SyncReport> {
        cfg.ensure_auth_sourced()?;

        let index = self.store.list_objects(&cfg.container).await?;
        let prefix = format!("{}/", cfg.path);

        let mut report = SyncReport::default();
        for file_name in &cfg.files {
            let candidate = SyncCandidate::new(&cfg.path, file_name);
            match self.classify(&candidate, &index).await? {
                SyncDecision::New => {
                    info!("file is new: {}", candidate.destination_path);
                    report.new.push(candidate.destination_path.clone());
                }
                SyncDecision::Unchanged => {
                    info!("file is unchanged: {}", candidate.destination_path);
                    report.unchanged.push(candidate.destination_path.clone());
                    continue;
                }
                SyncDecision::Changed {
                    local_hash,
                    remote_hash,
                } => {
                    info!("file is changed: {}", candidate.destination_path);
                    debug!("local {} != remote {}", local_hash, remote_hash);
                    report.changed.push(candidate.destination_path.clone());
                }
            }

            info!("uploading {}/{}", cfg.container, candidate.destination_path);
            let outcome = self.store.upload(&cfg.container, &prefix, file_name).await?;
            let acked = outcome.output.trim();
            if !acked.is_empty() {
                debug!("store acknowledged: {}", acked);
            }
        }

        Ok(report)
    }

    /// Decide what to do with one candidate. The local file is only read
    /// (and digested) when the container already holds an object under the
    /// candidate's destination path.
    async fn classify(
        &self,
        candidate: &SyncCandidate,
        index: &RemoteIndex,
    ) -> SyncResult<SyncDecision> {
        let Some(remote) = index.get(&candidate.destination_path) else {
            return Ok(SyncDecision::New);
        };

        let local_path = self.local_root.join(&candidate.file_name);
        let bytes = fs::read(&local_path)
            .await
            .map_err(|err| SyncError::LocalFile {
                path: local_path.display().to_string(),
                source: err,
            })?;
        let local_hash = format!("{:x}", md5::compute(&bytes));
        let remote_hash = remote.hash.to_ascii_lowercase();
        if local_hash == remote_hash {
            Ok(SyncDecision::Unchanged)
        } else {
            Ok(SyncDecision::Changed {
                local_hash,
                remote_hash,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::object::RemoteObject;
    use crate::services::store::UploadOutcome;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";
    const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

    /// Recording store: serves a canned listing and applies uploads back
    /// onto it the way a real container would, so a second pass sees the
    /// state the first one left behind.
    #[derive(Clone)]
    struct RecordingStore {
        index: Arc<Mutex<RemoteIndex>>,
        uploads: Arc<Mutex<Vec<(String, String, String)>>>,
        list_calls: Arc<Mutex<usize>>,
        local_root: PathBuf,
        fail_uploads: bool,
    }

    impl RecordingStore {
        fn new(local_root: &Path, objects: Vec<RemoteObject>) -> Self {
            let mut index = RemoteIndex::new();
            for object in objects {
                index.insert(object.name.clone(), object);
            }
            Self {
                index: Arc::new(Mutex::new(index)),
                uploads: Arc::new(Mutex::new(Vec::new())),
                list_calls: Arc::new(Mutex::new(0)),
                local_root: local_root.to_path_buf(),
                fail_uploads: false,
            }
        }

        fn failing(local_root: &Path) -> Self {
            let mut store = Self::new(local_root, Vec::new());
            store.fail_uploads = true;
            store
        }

        fn uploads(&self) -> Vec<(String, String, String)> {
            self.uploads.lock().unwrap().clone()
        }

        fn list_calls(&self) -> usize {
            *self.list_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn list_objects(&self, _container: &str) -> SyncResult<RemoteIndex> {
            *self.list_calls.lock().unwrap() += 1;
            Ok(self.index.lock().unwrap().clone())
        }

        async fn upload(
            &self,
            container: &str,
            prefix: &str,
            file_name: &str,
        ) -> SyncResult<UploadOutcome> {
            self.uploads.lock().unwrap().push((
                container.to_string(),
                prefix.to_string(),
                file_name.to_string(),
            ));
            if self.fail_uploads {
                return Err(SyncError::Upload {
                    file: file_name.to_string(),
                    reason: "exited with 1".to_string(),
                });
            }
            let bytes = std::fs::read(self.local_root.join(file_name)).unwrap();
            let name = format!("{}{}", prefix, file_name);
            self.index.lock().unwrap().insert(
                name.clone(),
                RemoteObject {
                    name,
                    hash: format!("{:x}", md5::compute(&bytes)),
                    bytes: bytes.len() as i64,
                },
            );
            Ok(UploadOutcome {
                output: format!("{}\n", file_name),
            })
        }
    }

    fn object(name: &str, hash: &str) -> RemoteObject {
        RemoteObject {
            name: name.to_string(),
            hash: hash.to_string(),
            bytes: 0,
        }
    }

    fn config(path: &str, files: &[&str]) -> AppConfig {
        AppConfig {
            container: "juju-dist".to_string(),
            path: path.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            auth_url: Some("https://keystone.example.com/v2.0".to_string()),
        }
    }

    fn service(store: &RecordingStore, dir: &TempDir) -> SyncService<RecordingStore> {
        SyncService {
            store: store.clone(),
            local_root: dir.path().to_path_buf(),
        }
    }

    #[tokio::test]
    async fn absent_candidate_is_new_and_uploaded_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("c.txt"), b"payload").unwrap();
        let store = RecordingStore::new(dir.path(), vec![object("a/b.txt", EMPTY_MD5)]);

        let report = service(&store, &dir)
            .run(&config("a", &["c.txt"]))
            .await
            .unwrap();

        assert_eq!(report.new, vec!["a/c.txt"]);
        assert_eq!(report.uploads(), 1);
        assert_eq!(
            store.uploads(),
            vec![(
                "juju-dist".to_string(),
                "a/".to_string(),
                "c.txt".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn matching_digest_is_unchanged_and_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"").unwrap();
        let store = RecordingStore::new(dir.path(), vec![object("a/b.txt", EMPTY_MD5)]);

        let report = service(&store, &dir)
            .run(&config("a", &["b.txt"]))
            .await
            .unwrap();

        assert_eq!(report.unchanged, vec!["a/b.txt"]);
        assert_eq!(report.uploads(), 0);
        assert!(store.uploads().is_empty());
    }

    #[tokio::test]
    async fn differing_digest_is_changed_and_uploaded_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"hello").unwrap();
        let store = RecordingStore::new(
            dir.path(),
            vec![object("a/b.txt", "00000000000000000000000000000000")],
        );

        let report = service(&store, &dir)
            .run(&config("a", &["b.txt"]))
            .await
            .unwrap();

        assert_eq!(report.changed, vec!["a/b.txt"]);
        assert_eq!(store.uploads().len(), 1);
    }

    #[tokio::test]
    async fn mixed_case_stored_digest_is_not_a_change() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"hello").unwrap();
        let store = RecordingStore::new(
            dir.path(),
            vec![object("a/b.txt", &HELLO_MD5.to_uppercase())],
        );

        let report = service(&store, &dir)
            .run(&config("a", &["b.txt"]))
            .await
            .unwrap();

        assert_eq!(report.unchanged, vec!["a/b.txt"]);
        assert!(store.uploads().is_empty());
    }

    #[tokio::test]
    async fn second_run_with_no_local_changes_uploads_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("c.txt"), b"fresh").unwrap();
        let store = RecordingStore::new(
            dir.path(),
            vec![object("a/b.txt", "00000000000000000000000000000000")],
        );
        let service = service(&store, &dir);
        let cfg = config("a", &["b.txt", "c.txt"]);

        let first = service.run(&cfg).await.unwrap();
        assert_eq!(first.uploads(), 2);

        let second = service.run(&cfg).await.unwrap();
        assert_eq!(second.uploads(), 0);
        assert_eq!(second.unchanged, vec!["a/b.txt", "a/c.txt"]);
        assert_eq!(store.uploads().len(), 2);
    }

    #[tokio::test]
    async fn unreadable_local_file_aborts_the_run() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path(), vec![object("a/b.txt", EMPTY_MD5)]);

        let err = service(&store, &dir)
            .run(&config("a", &["b.txt"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::LocalFile { .. }));
        assert!(store.uploads().is_empty());
    }

    #[tokio::test]
    async fn upload_failure_is_fatal_after_one_attempt() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("c.txt"), b"one").unwrap();
        std::fs::write(dir.path().join("d.txt"), b"two").unwrap();
        let store = RecordingStore::failing(dir.path());

        let err = service(&store, &dir)
            .run(&config("a", &["c.txt", "d.txt"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Upload { .. }));
        assert_eq!(store.uploads().len(), 1);
    }

    #[tokio::test]
    async fn missing_auth_url_stops_before_any_remote_call() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path(), Vec::new());
        let mut cfg = config("a", &["c.txt"]);
        cfg.auth_url = None;

        let err = service(&store, &dir).run(&cfg).await.unwrap_err();

        assert!(matches!(err, SyncError::MissingEnvironment { .. }));
        assert_eq!(store.list_calls(), 0);
        assert!(store.uploads().is_empty());
    }

    #[tokio::test]
    async fn zero_candidates_is_a_successful_noop() {
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path(), vec![object("a/b.txt", EMPTY_MD5)]);

        let report = service(&store, &dir).run(&config("a", &[])).await.unwrap();

        assert_eq!(report.uploads(), 0);
        assert!(report.unchanged.is_empty());
        assert_eq!(store.list_calls(), 1);
    }
}
