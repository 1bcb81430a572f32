use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::password::PasswordHasherError;
use crate::storage::StorageError;

/// 应用层错误。领域错误原样向上传递，Web 层负责映射状态码。
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid email or password")]
    Authentication,
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
