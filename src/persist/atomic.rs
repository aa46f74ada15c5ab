//! Atomic file replacement.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::PersistenceError;
use crate::constants::TEMP_SUFFIX;

/// `<file>.tmp` next to the target.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

/// Write `contents` to a temp file and rename it over `path`.
///
/// Readers see either the old or the new file, never a partial one. The
/// temp file is removed if anything fails.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistenceError> {
    let temp = temp_path(path);
    let result = fs::write(&temp, contents).and_then(|()| fs::rename(&temp, path));

    if let Err(e) = result {
        if temp.exists() {
            if let Err(cleanup) = fs::remove_file(&temp) {
                log::warn!("Failed to remove temp file {:?}: {}", temp, cleanup);
            }
        }
        return Err(e.into());
    }

    log::debug!("Wrote {} bytes to {:?}", contents.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_appends_suffix() {
        assert_eq!(
            temp_path(Path::new("/data/img_001.json")),
            PathBuf::from("/data/img_001.json.tmp")
        );
    }
}
