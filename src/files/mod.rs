// ABOUTME: Local file handling for deployments.
// ABOUTME: Source archiving, directory listing and bulk object upload/delete.

mod archive;
mod bulk;
mod exclude;
mod listing;

pub use archive::{Archive, ArchiveError, archive_directory};
pub use bulk::{BulkError, BulkFailure, content_type, delete_files, deploy_files, object_key};
pub use exclude::{ExcludePattern, retain_included};
pub use listing::list_folder;
