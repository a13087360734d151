//! Find-or-create resolution of nested folders in the cloud store.
//!
//! Each level is an independent list-then-create, so two overlapping runs could create
//! duplicate siblings. Runs are kept single-instance by [`crate::lock::RunLock`].

use tracing::{debug, info};

use crate::contract::{DriveError, DriveStore, FolderId};

/// Return the id of the non-trashed folder `name` under `parent`, creating it if absent.
///
/// When several folders match, the first one listed wins.
pub async fn resolve_folder<D>(
    store: &D,
    name: &str,
    parent: Option<FolderId>,
) -> Result<FolderId, DriveError>
where
    D: DriveStore + ?Sized,
{
    let existing = store.find_folders(name, parent.clone()).await?;
    if let Some(folder) = existing.into_iter().next() {
        debug!(name, id = %folder.id, "Resolved existing folder");
        return Ok(folder.id);
    }

    let created = store.create_folder(name, parent.clone()).await?;
    info!(
        name,
        id = %created.id,
        parent = parent.as_ref().map(FolderId::as_str).unwrap_or("<root>"),
        "Created folder"
    );
    Ok(created.id)
}

/// Resolve `names` as a chain of nested folders, outermost first, and return the innermost id.
pub async fn resolve_folder_path<D, S>(store: &D, names: &[S]) -> Result<FolderId, DriveError>
where
    D: DriveStore + ?Sized,
    S: AsRef<str>,
{
    let mut parent: Option<FolderId> = None;
    for name in names {
        parent = Some(resolve_folder(store, name.as_ref(), parent).await?);
    }
    parent.ok_or_else(|| "cannot resolve an empty folder path".into())
}
