use crate::api::error::UploadError;
use crate::config::UploadConfig;
use crate::utils::filename::generate_filename;
use bytes::Bytes;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Flat on-disk directory of uploaded images
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    dir_mode: u32,
    file_mode: u32,
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, dir_mode: u32, file_mode: u32) -> Self {
        Self {
            root: root.into(),
            dir_mode,
            file_mode,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.upload_dir.clone(), config.dir_mode, config.file_mode)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the upload directory (and parents) if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        if tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Ok(());
        }

        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(self.dir_mode);

        builder
            .create(&self.root)
            .await
            .map_err(UploadError::StorageUnavailable)?;

        tracing::info!("📁 Created upload directory {}", self.root.display());
        Ok(())
    }

    /// Writes `data` under a freshly generated name. The file only becomes
    /// visible under that name once it is complete.
    pub async fn store(&self, data: Bytes, extension: &str) -> Result<StoredImage, UploadError> {
        let filename = generate_filename(extension);
        let root = self.root.clone();
        let file_mode = self.file_mode;

        tokio::task::spawn_blocking(move || write_exclusive(&root, filename, &data, file_mode))
            .await
            .map_err(|e| UploadError::WriteFailed(io::Error::other(e)))?
    }
}

/// Stages the bytes in a temp file inside `root`, then links it to `filename`
/// only if nothing already exists there.
pub(crate) fn write_exclusive(
    root: &Path,
    filename: String,
    data: &[u8],
    file_mode: u32,
) -> Result<StoredImage, UploadError> {
    let target = root.join(&filename);

    let mut staged = tempfile::Builder::new()
        .prefix(".upload-")
        .tempfile_in(root)
        .map_err(UploadError::WriteFailed)?;

    staged.write_all(data).map_err(UploadError::WriteFailed)?;
    staged.as_file().sync_all().map_err(UploadError::WriteFailed)?;

    let written = staged
        .as_file()
        .metadata()
        .map_err(UploadError::WriteFailed)?
        .len();
    if written != data.len() as u64 {
        return Err(UploadError::WriteFailed(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("wrote {} of {} bytes", written, data.len()),
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(file_mode))
            .map_err(UploadError::WriteFailed)?;
    }
    #[cfg(not(unix))]
    let _ = file_mode;

    staged.persist_noclobber(&target).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            UploadError::GenerationConflict
        } else {
            UploadError::WriteFailed(e.error)
        }
    })?;

    Ok(StoredImage {
        filename,
        path: target,
        size: data.len(),
    })
}
