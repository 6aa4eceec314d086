// ABOUTME: Packs a source directory into an in-memory gzip tar archive.
// ABOUTME: Runs on the blocking pool; excluded paths are pruned during the walk.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use thiserror::Error;
use tokio::task::spawn_blocking;
use tracing::debug;

use super::ExcludePattern;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("source is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("nothing to archive in {0}")]
    Empty(PathBuf),

    #[error("failed to archive {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive worker failed: {0}")]
    Worker(String),
}

/// A compressed source archive ready for upload.
#[derive(Debug, Clone)]
pub struct Archive {
    pub bytes: Bytes,
    /// Number of regular files written.
    pub files: usize,
}

/// Archive every regular file under `dir` not matched by `excludes`.
///
/// Entry names are relative to `dir`. Entry order follows the directory
/// listing and is not guaranteed to be stable.
pub async fn archive_directory(dir: &Path, excludes: &[String]) -> Result<Archive, ArchiveError> {
    let dir = dir.to_owned();
    let patterns: Vec<ExcludePattern> = excludes.iter().map(|p| ExcludePattern::new(p)).collect();
    spawn_blocking(move || archive_directory_sync(&dir, &patterns))
        .await
        .map_err(|e| ArchiveError::Worker(e.to_string()))?
}

fn archive_directory_sync(dir: &Path, excludes: &[ExcludePattern]) -> Result<Archive, ArchiveError> {
    if !dir.is_dir() {
        return Err(ArchiveError::NotADirectory(dir.to_path_buf()));
    }

    let encoder = GzEncoder::new(Vec::new(), Compression::best());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(true);

    let mut files = 0;
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current).map_err(|e| io_error(&current, e))? {
            let path = entry.map_err(|e| io_error(&current, e))?.path();
            let relative = path.strip_prefix(dir).unwrap_or(&path).to_path_buf();

            if excludes.iter().any(|p| p.matches(&relative)) {
                debug!(path = %relative.display(), "excluded from archive");
                continue;
            }

            let metadata = std::fs::metadata(&path).map_err(|e| io_error(&path, e))?;
            if metadata.is_dir() {
                pending.push(path);
            } else if metadata.is_file() {
                builder
                    .append_path_with_name(&path, &relative)
                    .map_err(|e| io_error(&path, e))?;
                files += 1;
            }
        }
    }

    if files == 0 {
        return Err(ArchiveError::Empty(dir.to_path_buf()));
    }

    let compressed = builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .map_err(|e| io_error(dir, e))?;

    debug!(files, compressed_size = compressed.len(), "created source archive");

    Ok(Archive {
        bytes: Bytes::from(compressed),
        files,
    })
}

fn io_error(path: &Path, source: std::io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}
