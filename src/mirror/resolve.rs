use std::path::{Path, PathBuf};

use crate::mirror::classify::FileKind;

/// Extension given to stream descriptor files.
pub(crate) const STRM_EXT: &str = "strm";

/// Computes the local destination for a remote file. Video names trade their
/// extension for [STRM_EXT]; every other name is kept verbatim.
pub(crate) fn resolve_target(local_dir: &Path, name: &str, kind: FileKind) -> PathBuf {
    match kind {
        FileKind::Video => {
            let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
            local_dir.join(format!("{stem}.{STRM_EXT}"))
        }
        _ => local_dir.join(name),
    }
}
