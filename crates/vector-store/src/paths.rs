use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR_NAME: &str = "data";
pub const INDEX_FILE_NAME: &str = "index.bin";
pub const METADATA_FILE_NAME: &str = "metadata.json";
pub const LOCK_FILE_NAME: &str = "store.lock";

/// Locations of the co-located artifacts that make up one persisted store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub data_dir: PathBuf,
    pub index: PathBuf,
    pub metadata: PathBuf,
    pub lock: PathBuf,
}

impl StorePaths {
    #[must_use]
    pub fn new(data_dir: &Path, index_file_name: &str, metadata_file_name: &str) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            index: data_dir.join(index_file_name),
            metadata: data_dir.join(metadata_file_name),
            lock: data_dir.join(LOCK_FILE_NAME),
        }
    }

    #[must_use]
    pub fn with_defaults(data_dir: &Path) -> Self {
        Self::new(data_dir, INDEX_FILE_NAME, METADATA_FILE_NAME)
    }
}

/// Sibling path used while an artifact is being rewritten.
#[must_use]
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn artifacts_are_co_located() {
        let paths = StorePaths::with_defaults(Path::new("/srv/docqa"));
        assert_eq!(paths.index, PathBuf::from("/srv/docqa/index.bin"));
        assert_eq!(paths.metadata, PathBuf::from("/srv/docqa/metadata.json"));
        assert_eq!(paths.lock, PathBuf::from("/srv/docqa/store.lock"));
        assert_eq!(
            tmp_path_for(&paths.metadata),
            PathBuf::from("/srv/docqa/metadata.json.tmp")
        );
    }
}
