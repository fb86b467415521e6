use crate::error::{Result, StoreError};
use fs2::FileExt;
use std::path::{Path, PathBuf};

/// Exclusive advisory lock on a data directory, held for the store's lifetime.
pub(crate) struct StoreLock {
    file: std::fs::File,
    path: PathBuf,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            log::warn!("Failed to release {}: {err}", self.path.display());
        }
    }
}

/// Takes the lock without waiting; a held lock means another process owns the
/// directory.
pub(crate) async fn acquire_store_lock(path: &Path) -> Result<StoreLock> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<StoreLock> {
        use std::fs::OpenOptions;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| StoreError::Other(format!("open store lock {}: {err}", path.display())))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                log::debug!("Acquired store lock {}", path.display());
                Ok(StoreLock { file, path })
            }
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                Err(StoreError::Locked {
                    path: path.display().to_string(),
                })
            }
            Err(err) => Err(StoreError::Other(format!(
                "acquire store lock {}: {err}",
                path.display()
            ))),
        }
    })
    .await
    .map_err(|err| StoreError::Other(format!("join store lock task: {err}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn second_holder_is_refused_until_release() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.lock");

        let first = acquire_store_lock(&path).await.unwrap();
        let err = acquire_store_lock(&path).await.err();
        assert!(matches!(err, Some(StoreError::Locked { .. })));

        drop(first);
        assert!(acquire_store_lock(&path).await.is_ok());
    }
}
