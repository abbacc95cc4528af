//! Directory-backed store
//!
//! Each view lives in `<dir>/<view>.json` as `{"links": {...}}`. Writes go to
//! a uniquely named temporary sibling first and are renamed into place.
//!
//! A store and its clones serialize writes, so the revision check and the
//! rename happen as one step. Separate `FileStore` values over the same
//! directory do not share that lock.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use viewlinks_tree::{ConfigTree, Patch};

use super::{prepare_write, Revision, Snapshot, Validator, ViewStore, Write};
use crate::error::StoreError;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    validator: Option<Validator>,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Store rooted at `dir` (must exist)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            validator: None,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store rooted at `dir`, creating it if needed
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the directory cannot be created
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self::new(dir))
    }

    /// Check every write with `validator`
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `view`
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidViewName`] for names that are empty,
    /// hidden, or contain path separators
    pub fn view_path(&self, view: &str) -> Result<PathBuf, StoreError> {
        let invalid = view.is_empty()
            || view.starts_with('.')
            || view.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
        if invalid {
            return Err(StoreError::InvalidViewName(view.to_string()));
        }
        Ok(self.dir.join(format!("{view}.json")))
    }

    /// Write `tree` as a new view, replacing any existing one
    ///
    /// # Errors
    /// Returns [`StoreError`] on invalid names or I/O failure
    pub async fn create_view(&self, view: &str, tree: &ConfigTree) -> Result<Revision, StoreError> {
        let path = self.view_path(view)?;
        let snapshot = Snapshot::of(tree.clone())?;
        let _guard = self.write_lock.lock().await;
        self.persist(&path, &snapshot.tree).await?;
        info!(view, revision = %snapshot.revision.short(), "view created");
        Ok(snapshot.revision)
    }

    async fn read(&self, view: &str) -> Result<(PathBuf, ConfigTree), StoreError> {
        let path = self.view_path(view)?;
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::ViewNotFound(view.to_string()));
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        let tree = ConfigTree::from_json(&text)?;
        Ok((path, tree))
    }

    async fn persist(&self, path: &Path, tree: &ConfigTree) -> Result<(), StoreError> {
        let json = tree.to_json()?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(format!(
            ".{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let tmp = PathBuf::from(tmp);

        let written = match tokio::fs::write(&tmp, json).await {
            Ok(()) => tokio::fs::rename(&tmp, path)
                .await
                .map_err(|e| StoreError::io(path, e)),
            Err(e) => Err(StoreError::io(&tmp, e)),
        };
        if written.is_err() {
            if let Err(e) = tokio::fs::remove_file(&tmp).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %e, "failed to remove temp file");
                }
            }
        }
        written
    }

    async fn write(
        &self,
        view: &str,
        expected: &Revision,
        write: Write<'_>,
    ) -> Result<Revision, StoreError> {
        let _guard = self.write_lock.lock().await;
        let (path, current) = self.read(view).await?;
        let next = prepare_write(&current, expected, write, self.validator.as_ref())?;
        let snapshot = Snapshot::of(next)?;
        self.persist(&path, &snapshot.tree).await?;
        debug!(
            view,
            path = %path.display(),
            revision = %snapshot.revision.short(),
            "file store write"
        );
        Ok(snapshot.revision)
    }
}

#[async_trait::async_trait]
impl ViewStore for FileStore {
    async fn load(&self, view: &str) -> Result<Snapshot, StoreError> {
        let (_, tree) = self.read(view).await?;
        Snapshot::of(tree)
    }

    async fn replace_links(
        &self,
        view: &str,
        tree: &ConfigTree,
        expected: &Revision,
    ) -> Result<Revision, StoreError> {
        self.write(view, expected, Write::Replace(tree)).await
    }

    async fn patch_links(
        &self,
        view: &str,
        patch: &Patch,
        expected: &Revision,
    ) -> Result<Revision, StoreError> {
        self.write(view, expected, Write::Patch(patch)).await
    }
}
