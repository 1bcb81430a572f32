use std::path::{Path, PathBuf};

use async_trait::async_trait;
use time::OffsetDateTime;

use application::storage::{FileStorage, StorageError};

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// 本地磁盘文件存储。文件名为 image-<毫秒时间戳>.<扩展名>。
pub struct LocalFileStorage {
    directory: PathBuf,
}

impl LocalFileStorage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or_else(|| StorageError::UnsupportedType(original_name.to_owned()))?;
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(StorageError::UnsupportedType(original_name.to_owned()));
        }

        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let file_name = format!("image-{millis}.{extension}");

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|err| StorageError::Io(err.to_string()))?;
        tokio::fs::write(self.directory.join(&file_name), bytes)
            .await
            .map_err(|err| StorageError::Io(err.to_string()))?;

        Ok(format!("/uploads/{file_name}"))
    }
}
