use thiserror::Error;

use crate::item::ItemStatus;

/// 领域错误。Web 层按变体映射到 HTTP 状态码。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },
    #[error("user not found")]
    UserNotFound,
    #[error("item not found")]
    ItemNotFound,
    #[error("message not found")]
    MessageNotFound,
    #[error("email already registered")]
    EmailTaken,
    #[error("sender does not match authenticated user")]
    SenderMismatch,
    #[error("operation is limited to the account owner")]
    NotAccountOwner,
    #[error("only the seller may change item status")]
    NotItemSeller,
    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: ItemStatus, to: ItemStatus },
    #[error("already liked")]
    AlreadyLiked,
    #[error("not liked yet")]
    NotLiked,
    #[error("item already rated by this user")]
    DuplicateRating,
    #[error("message is missing item or participant references")]
    MalformedMessage,
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 仓储层错误。Conflict 同时承担乐观并发冲突与唯一性冲突。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("requested record not found")]
    NotFound,
    #[error("record conflicts with stored state")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
