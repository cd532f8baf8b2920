/// How a remote file is handled when the walk reaches it.
///
/// Video files become stream descriptors, the other relevant kinds are
/// downloaded in full, and everything else is left on the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileKind {
    Video,
    Image,
    Subtitle,
    Metadata,
    Irrelevant,
}

impl FileKind {
    /// Whether the walk materializes this kind at all.
    pub(crate) fn is_relevant(self) -> bool {
        !matches!(self, FileKind::Irrelevant)
    }
}

const VIDEO_EXTS: &[&str] = &[
    "mp4", "mkv", "avi", "rmvb", "rm", "flv", "mov", "wmv", "asf", "ts", "webm", "mpeg", "mpg",
    "m4v",
];

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff"];

const METADATA_EXTS: &[&str] = &["nfo"];

const SUBTITLE_EXTS: &[&str] = &["srt", "ass", "ssa", "sub", "vtt"];

/// Classifies a file name by case-sensitive suffix match against the fixed
/// extension tables. Total: every name maps to exactly one kind.
pub(crate) fn classify(name: &str) -> FileKind {
    if has_suffix(name, VIDEO_EXTS) {
        FileKind::Video
    } else if has_suffix(name, IMAGE_EXTS) {
        FileKind::Image
    } else if has_suffix(name, METADATA_EXTS) {
        FileKind::Metadata
    } else if has_suffix(name, SUBTITLE_EXTS) {
        FileKind::Subtitle
    } else {
        FileKind::Irrelevant
    }
}

// Matches `.{ext}` at the end of the name, nothing fancier: the remote is
// trusted to name its files conventionally.
fn has_suffix(name: &str, exts: &[&str]) -> bool {
    exts.iter()
        .any(|ext| matches!(name.strip_suffix(ext), Some(rest) if rest.ends_with('.')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_each_kind() {
        assert_eq!(classify("Movie.mp4"), FileKind::Video);
        assert_eq!(classify("Movie.mkv"), FileKind::Video);
        assert_eq!(classify("poster.jpg"), FileKind::Image);
        assert_eq!(classify("fanart.webp"), FileKind::Image);
        assert_eq!(classify("Movie.nfo"), FileKind::Metadata);
        assert_eq!(classify("Movie.zh.srt"), FileKind::Subtitle);
        assert_eq!(classify("Movie.ass"), FileKind::Subtitle);
    }

    #[test]
    fn suffix_match_is_case_sensitive() {
        assert_eq!(classify("Movie.MP4"), FileKind::Irrelevant);
        assert_eq!(classify("POSTER.JPG"), FileKind::Irrelevant);
    }

    #[test]
    fn unrecognized_names_are_irrelevant() {
        assert_eq!(classify("notes.txt"), FileKind::Irrelevant);
        assert_eq!(classify("archive"), FileKind::Irrelevant);
        assert_eq!(classify(""), FileKind::Irrelevant);
        // the extension has to follow a dot, not merely end the name
        assert_eq!(classify("notmp4"), FileKind::Irrelevant);
    }

    #[test]
    fn relevance_follows_kind() {
        assert!(classify("a.mp4").is_relevant());
        assert!(classify("a.srt").is_relevant());
        assert!(!classify("a.exe").is_relevant());
    }
}
