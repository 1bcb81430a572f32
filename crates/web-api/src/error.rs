use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;
        use application::StorageError;
        use domain::DomainError;

        match error {
            AppErr::Domain(DomainError::InvalidArgument { field, reason }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
                format!("{}: {}", field, reason),
            ),
            AppErr::Domain(DomainError::UserNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "USER_NOT_FOUND", "user not found")
            }
            AppErr::Domain(DomainError::ItemNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "ITEM_NOT_FOUND", "item not found")
            }
            AppErr::Domain(DomainError::MessageNotFound) => ApiError::new(
                StatusCode::NOT_FOUND,
                "MESSAGE_NOT_FOUND",
                "message not found",
            ),
            AppErr::Domain(DomainError::EmailTaken) => ApiError::new(
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "email already registered",
            ),
            AppErr::Domain(DomainError::SenderMismatch) => ApiError::new(
                StatusCode::FORBIDDEN,
                "SENDER_MISMATCH",
                "sender does not match authenticated user",
            ),
            AppErr::Domain(DomainError::NotAccountOwner) => ApiError::new(
                StatusCode::FORBIDDEN,
                "NOT_ACCOUNT_OWNER",
                "operation is limited to the account owner",
            ),
            AppErr::Domain(DomainError::NotItemSeller) => ApiError::new(
                StatusCode::FORBIDDEN,
                "NOT_ITEM_SELLER",
                "only the seller may change item status",
            ),
            AppErr::Domain(DomainError::InvalidTransition { from, to }) => ApiError::new(
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
                format!("invalid status transition: {:?} -> {:?}", from, to),
            ),
            AppErr::Domain(DomainError::AlreadyLiked) => {
                ApiError::new(StatusCode::CONFLICT, "ALREADY_LIKED", "already liked")
            }
            AppErr::Domain(DomainError::NotLiked) => {
                ApiError::new(StatusCode::CONFLICT, "NOT_LIKED", "not liked yet")
            }
            AppErr::Domain(DomainError::DuplicateRating) => ApiError::new(
                StatusCode::CONFLICT,
                "DUPLICATE_RATING",
                "item already rated by this user",
            ),
            AppErr::Domain(DomainError::MalformedMessage) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATA_INTEGRITY",
                "message is missing item or participant references",
            ),
            AppErr::Repository(repo_err) => match repo_err {
                domain::RepositoryError::NotFound => ApiError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                domain::RepositoryError::Conflict => ApiError::new(
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    "record conflicts with stored state",
                ),
                domain::RepositoryError::Storage { message, .. } => ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    format!("database error: {}", message),
                ),
            },
            AppErr::Password(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "PASSWORD_ERROR",
                format!("password error: {}", err),
            ),
            AppErr::Storage(StorageError::UnsupportedType(name)) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_FILE_TYPE",
                format!("unsupported file type: {}", name),
            ),
            AppErr::Storage(StorageError::Io(message)) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                format!("storage error: {}", message),
            ),
            AppErr::Authentication => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_FAILED",
                "invalid email or password",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
