//! Uploader: push one staged file into a resolved remote folder.

use std::path::Path;

use tracing::{error, info};

use crate::contract::{DriveError, DriveStore, FolderId, RemoteFile};

/// Upload `local_path` under `parent` (the store root when `None`).
///
/// The remote name is the local basename. Failures are returned untouched; the caller
/// decides what happens to the local copy.
pub async fn upload_file<D>(
    store: &D,
    local_path: &Path,
    parent: Option<FolderId>,
) -> Result<RemoteFile, DriveError>
where
    D: DriveStore + ?Sized,
{
    if !local_path.is_file() {
        error!(path = %local_path.display(), "Refusing to upload a path that is not a file");
        return Err(format!("not a file: {}", local_path.display()).into());
    }

    let remote = store.create_file(local_path, parent).await?;
    info!(
        path = %local_path.display(),
        remote_id = %remote.id,
        remote_name = %remote.name,
        "Uploaded file"
    );
    Ok(remote)
}
