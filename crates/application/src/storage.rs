use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("io error: {0}")]
    Io(String),
}

/// 上传文件存储端口。返回可供客户端引用的相对路径。
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, StorageError>;
}
