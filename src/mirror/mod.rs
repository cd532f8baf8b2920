use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::mirror::classify::{classify, FileKind};
use crate::mirror::resolve::resolve_target;
use crate::mirror::scheduler::{DownloadTask, FailedDownload, Scheduler};
use crate::mirror::sender::entries::RemoteEntry;
use crate::mirror::sender::RequestSender;

pub(crate) mod classify;
pub(crate) mod fsops;
pub(crate) mod resolve;
pub(crate) mod scheduler;
pub(crate) mod sender;

/// Reserved suffix some NAS platforms append to thumbnail-cache folders.
/// Directories carrying it are never descended into.
const NAS_THUMBNAIL_SUFFIX: &str = "@eaDir";

/// Per-run switches, fixed once the run starts.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MirrorOptions {
    /// Rewrite existing stream descriptors instead of skipping them.
    /// Downloaded binaries are never rewritten.
    pub(crate) overwrite_strm: bool,
    /// Fall back to a per-file `/api/fs/get` round trip when the listing
    /// carried no signature.
    pub(crate) fetch_sign: bool,
}

/// Everything one mirroring run needs, constructed once and passed around
/// explicitly: the remote sender, the download pool, the session token and
/// the option switches.
pub(crate) struct Mirror {
    sender: RequestSender,
    scheduler: Scheduler,
    token: String,
    options: MirrorOptions,
}

impl Mirror {
    pub(crate) fn new(
        sender: RequestSender,
        token: String,
        worker_count: usize,
        options: MirrorOptions,
    ) -> Self {
        let scheduler = Scheduler::new(sender.client(), worker_count);
        Mirror {
            sender,
            scheduler,
            token,
            options,
        }
    }

    /// Mirrors the remote tree under `remote_root` into `local_root`, waits
    /// for the download pool to empty and returns the failed downloads.
    pub(crate) async fn run(self, remote_root: &str, local_root: &Path) -> Vec<FailedDownload> {
        self.walk(
            remote_root.trim_end_matches('/').to_string(),
            local_root.to_path_buf(),
        )
        .await;
        self.scheduler.drain().await
    }

    /// Depth-first descent through one remote directory: list, partition,
    /// materialize files, then recurse into subdirectories behind the
    /// scheduler's backpressure gate. Any listing or directory-creation
    /// failure skips this subtree and nothing else.
    fn walk(&self, remote: String, local: PathBuf) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let entries = match self.sender.list(&self.token, &remote).await {
                Ok(entries) => entries,
                Err(err) => {
                    error!("{err}; skipping subtree");
                    return;
                }
            };
            if entries.is_empty() {
                info!("{remote} is empty, nothing to mirror");
                return;
            }

            let (dirs, files) = partition_entries(entries);

            if let Err(err) = fsops::ensure_dir(&local) {
                error!(
                    "could not create {}: {err}; skipping subtree",
                    local.display()
                );
                return;
            }

            let total = files.len();
            for (index, file) in files.iter().enumerate() {
                info!("{remote}: {} ({}/{total})", file.name, index + 1);
                self.materialize(file, &remote, &local).await;
            }

            for dir in &dirs {
                // Cap how far the walk can outrun the download workers.
                self.scheduler.wait_below_limit().await;
                self.walk(format!("{remote}/{}", dir.name), local.join(&dir.name))
                    .await;
            }
        })
    }

    /// Materializes one remote file: a stream descriptor written in place
    /// for videos, a queued download for every other relevant kind. Never
    /// propagates a failure into the walk.
    async fn materialize(&self, file: &RemoteEntry, remote: &str, local: &Path) {
        let kind = classify(&file.name);
        let dest = resolve_target(local, &file.name, kind);
        let is_video = kind == FileKind::Video;

        if dest.exists() {
            if is_video && self.options.overwrite_strm {
                if let Err(err) = fs::remove_file(&dest) {
                    error!(
                        "could not remove stale descriptor {}: {err}",
                        dest.display()
                    );
                    return;
                }
            } else {
                info!("{} already exists, skipping", dest.display());
                return;
            }
        }

        let sign = if file.sign.is_empty() && self.options.fetch_sign {
            let remote_file = format!("{remote}/{}", file.name);
            match self.sender.file_info(&self.token, &remote_file).await {
                Ok(info) => info.sign,
                Err(err) => {
                    warn!("{err}; building an unsigned URL");
                    String::new()
                }
            }
        } else {
            file.sign.clone()
        };
        let url = self.sender.download_url(remote, &file.name, &sign);

        if is_video {
            // Descriptors are a handful of bytes; written inline rather
            // than through the download pool.
            match fs::write(&dest, &url) {
                Ok(()) => info!("wrote stream descriptor {}", dest.display()),
                Err(err) => error!("could not write {}: {err}", dest.display()),
            }
        } else {
            self.scheduler.submit(DownloadTask { url, dest }).await;
        }
    }
}

/// Splits a listing into directories to descend into and files to
/// materialize, both sorted by name. Thumbnail-cache directories and
/// irrelevant files are dropped here.
fn partition_entries(entries: Vec<RemoteEntry>) -> (Vec<RemoteEntry>, Vec<RemoteEntry>) {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in entries {
        if entry.is_dir {
            if entry.name.ends_with(NAS_THUMBNAIL_SUFFIX) {
                debug!("ignoring thumbnail cache {}", entry.name);
                continue;
            }
            dirs.push(entry);
        } else if classify(&entry.name).is_relevant() {
            files.push(entry);
        }
    }
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));
    (dirs, files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, is_dir: bool, sign: &str) -> RemoteEntry {
        RemoteEntry {
            name: name.to_string(),
            is_dir,
            sign: sign.to_string(),
        }
    }

    // Points at the discard port so queued downloads fail fast instead of
    // touching the network.
    fn mirror(options: MirrorOptions) -> Mirror {
        let sender = RequestSender::new("http://127.0.0.1:9").unwrap();
        Mirror::new(sender, String::from("test-token"), 1, options)
    }

    #[test]
    fn partition_sorts_and_filters() {
        let (dirs, files) = partition_entries(vec![
            entry("zeta", true, ""),
            entry("movie.mp4", false, "abc"),
            entry("Thumbs@eaDir", true, ""),
            entry("alpha", true, ""),
            entry("notes.txt", false, ""),
            entry("poster.jpg", false, ""),
        ]);

        let dir_names: Vec<_> = dirs.iter().map(|e| e.name.as_str()).collect();
        let file_names: Vec<_> = files.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(dir_names, ["alpha", "zeta"]);
        assert_eq!(file_names, ["movie.mp4", "poster.jpg"]);
    }

    #[tokio::test]
    async fn video_becomes_descriptor_with_signed_url() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = mirror(MirrorOptions::default());

        mirror
            .materialize(&entry("movie.mp4", false, "abc"), "/lib", dir.path())
            .await;

        let content = fs::read_to_string(dir.path().join("movie.strm")).unwrap();
        assert_eq!(content, "http://127.0.0.1:9/d/lib/movie.mp4?sign=abc");
        assert!(mirror.scheduler.drain().await.is_empty());
    }

    #[tokio::test]
    async fn existing_descriptor_is_skipped_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("movie.strm");
        fs::write(&existing, "old").unwrap();
        let mirror = mirror(MirrorOptions::default());

        mirror
            .materialize(&entry("movie.mp4", false, "abc"), "/lib", dir.path())
            .await;

        assert_eq!(fs::read_to_string(&existing).unwrap(), "old");
        assert!(mirror.scheduler.drain().await.is_empty());
    }

    #[tokio::test]
    async fn overwrite_refreshes_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("movie.strm");
        fs::write(&existing, "stale").unwrap();
        let mirror = mirror(MirrorOptions {
            overwrite_strm: true,
            ..MirrorOptions::default()
        });

        mirror
            .materialize(&entry("movie.mp4", false, "new"), "/lib", dir.path())
            .await;

        assert_eq!(
            fs::read_to_string(&existing).unwrap(),
            "http://127.0.0.1:9/d/lib/movie.mp4?sign=new"
        );
        assert!(mirror.scheduler.drain().await.is_empty());
    }

    #[tokio::test]
    async fn overwrite_never_touches_downloaded_binaries() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("poster.jpg");
        fs::write(&existing, "bytes").unwrap();
        let mirror = mirror(MirrorOptions {
            overwrite_strm: true,
            ..MirrorOptions::default()
        });

        mirror
            .materialize(&entry("poster.jpg", false, ""), "/lib", dir.path())
            .await;

        assert_eq!(mirror.scheduler.pending_count(), 0);
        assert_eq!(fs::read_to_string(&existing).unwrap(), "bytes");
        assert!(mirror.scheduler.drain().await.is_empty());
    }

    #[tokio::test]
    async fn non_video_files_are_queued_for_download() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = mirror(MirrorOptions::default());

        mirror
            .materialize(&entry("poster.jpg", false, ""), "/lib", dir.path())
            .await;

        let failures = mirror.scheduler.drain().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].url, "http://127.0.0.1:9/d/lib/poster.jpg");
        assert_eq!(failures[0].dest, dir.path().join("poster.jpg"));
    }
}
