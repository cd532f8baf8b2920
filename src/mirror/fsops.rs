use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};

/// Creates a directory and any missing parents. Losing a creation race to a
/// concurrent worker counts as success.
pub(crate) fn ensure_dir(dir: &Path) -> io::Result<()> {
    match fs::create_dir_all(dir) {
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        other => other,
    }
}

/// Recursively copies `src` into `dst`, merging with whatever the
/// destination already holds. Files are overwritten, never deleted.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    ensure_dir(dst).with_context(|| format!("Failed to create directory {}", dst.display()))?;
    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read directory {}", src.display()))?
    {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn copy_tree_merges_into_existing_content() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        fs::create_dir_all(src.path().join("films")).unwrap();
        fs::write(src.path().join("films/movie.strm"), "http://example/d/m.mp4").unwrap();
        fs::write(src.path().join("top.nfo"), "meta").unwrap();

        // pre-existing destination content must survive the merge
        fs::create_dir_all(dst.path().join("films")).unwrap();
        fs::write(dst.path().join("films/older.jpg"), "bytes").unwrap();

        copy_tree(src.path(), dst.path()).unwrap();

        assert_eq!(
            fs::read_to_string(dst.path().join("films/movie.strm")).unwrap(),
            "http://example/d/m.mp4"
        );
        assert_eq!(fs::read_to_string(dst.path().join("top.nfo")).unwrap(), "meta");
        assert_eq!(
            fs::read_to_string(dst.path().join("films/older.jpg")).unwrap(),
            "bytes"
        );
    }
}
