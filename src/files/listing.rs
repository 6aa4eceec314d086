// ABOUTME: Recursive directory listing used to find site files to upload.
// ABOUTME: Returns regular files only; symlinks are followed.

use std::path::{Path, PathBuf};

use tokio::fs;

/// Every regular file under `dir`, at any depth.
///
/// Order is unspecified. Any unreadable entry fails the whole listing.
pub async fn list_folder(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = fs::metadata(&path).await?;
            if metadata.is_dir() {
                pending.push(path);
            } else if metadata.is_file() {
                files.push(path);
            }
        }
    }

    Ok(files)
}
