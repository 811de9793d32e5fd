//! Media grouping.
//!
//! Attachments of an album share one `album_<grouped_id>` folder; any other
//! attachment gets its own `msg_<message_id>` folder. Folders sit beside the
//! scope's dump file.

use std::path::{Path, PathBuf};

use crate::domain::{AppError, AuditLogSource, FolderType, LocalMediaFile, OriginalMessage, Result};

/// Storage folder chosen for a message's attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFolder {
    pub folder_type: FolderType,
    pub folder_id: i64,
}

impl MediaFolder {
    /// Picks the album folder when the message belongs to one.
    #[must_use]
    pub fn for_message(message: &OriginalMessage) -> Self {
        message.group_id.map_or(
            Self {
                folder_type: FolderType::Message,
                folder_id: message.message_id,
            },
            |group_id| Self {
                folder_type: FolderType::Album,
                folder_id: group_id,
            },
        )
    }

    /// Folder name inside the scope folder.
    #[must_use]
    pub fn name(&self) -> String {
        match self.folder_type {
            FolderType::Album => format!("album_{}", self.folder_id),
            FolderType::Message => format!("msg_{}", self.folder_id),
        }
    }

    /// Full folder path under `scope_dir`.
    #[must_use]
    pub fn path_in(&self, scope_dir: &Path) -> PathBuf {
        scope_dir.join(self.name())
    }
}

/// Downloads the attachment of `message` into its folder under `scope_dir`.
///
/// Returns `None` if the message has no attachment or the download failed;
/// failures are logged and the record is kept without a media descriptor.
pub async fn resolve_media<S>(
    source: &S,
    message: &OriginalMessage,
    scope_dir: &Path,
) -> Option<LocalMediaFile>
where
    S: AuditLogSource + ?Sized,
{
    message.media.as_ref()?;

    match download(source, message, scope_dir).await {
        Ok(file) => Some(file),
        Err(e) => {
            tracing::warn!(id = message.message_id, error = %e, "Media download failed");
            None
        }
    }
}

async fn download<S>(source: &S, message: &OriginalMessage, scope_dir: &Path) -> Result<LocalMediaFile>
where
    S: AuditLogSource + ?Sized,
{
    let media = message
        .media
        .as_ref()
        .ok_or_else(|| AppError::download("Message has no attachment"))?;

    let folder = MediaFolder::for_message(message);
    let folder_path = folder.path_in(scope_dir);
    tokio::fs::create_dir_all(&folder_path).await.map_err(|e| {
        AppError::download(format!("Failed to create {}: {e}", folder_path.display()))
    })?;

    let saved = source.fetch_media(media, &folder_path).await?;

    let filename = saved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| AppError::download("Downloaded media has no file name"))?;

    let absolute = tokio::fs::canonicalize(&saved).await.unwrap_or_else(|_| saved.clone());

    Ok(LocalMediaFile {
        local_path: format!("{}/{filename}", folder.name()),
        absolute_path: absolute.to_string_lossy().to_string(),
        filename,
        folder_type: folder.folder_type,
        folder_id: folder.folder_id,
    })
}
