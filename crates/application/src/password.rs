use async_trait::async_trait;
use thiserror::Error;

use domain::PasswordHash;

#[derive(Debug, Error)]
pub enum PasswordHasherError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("failed to verify password: {0}")]
    Verify(String),
}

/// 密码哈希端口。基础设施层用 bcrypt 实现。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plain: &str) -> Result<PasswordHash, PasswordHasherError>;
    async fn verify(&self, plain: &str, hash: &PasswordHash) -> Result<bool, PasswordHasherError>;
}
