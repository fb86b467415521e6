use crate::error::Result;
use crate::index::{decode_index, VectorIndex};
use crate::paths::tmp_path_for;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Replaces `path` with `bytes` so that readers see either the old or the new
/// contents, never a prefix. Returns once the data is on disk.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = tmp_path_for(path);
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }

    // Persist the rename itself.
    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        if let Ok(dir) = tokio::fs::File::open(parent).await {
            let _ = dir.sync_all().await;
        }
    }
    Ok(())
}

pub async fn write_index(path: &Path, index: &dyn VectorIndex) -> Result<()> {
    let bytes = index.to_bytes();
    log::debug!(
        "Writing index ({} vectors, {} bytes) to {}",
        index.len(),
        bytes.len(),
        path.display()
    );
    write_atomic(path, &bytes).await
}

pub async fn read_index(path: &Path) -> Result<Box<dyn VectorIndex>> {
    let bytes = tokio::fs::read(path).await?;
    decode_index(&bytes)
}
