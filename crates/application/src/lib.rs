//! 应用层：用例服务、仓储端口与跨层抽象。

pub mod clock;
pub mod dto;
pub mod error;
pub mod memory;
pub mod password;
pub mod repository;
pub mod services;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use dto::{ItemDto, RatingView, UserDto};
pub use error::{ApplicationError, ApplicationResult};
pub use password::{PasswordHasher, PasswordHasherError};
pub use repository::{ItemFilter, ItemRepository, MessageRepository, UserRepository};
pub use services::{
    AuthenticateUserRequest, ChangePasswordRequest, CreateItemRequest, EngagementService,
    EngagementServiceDependencies, ListingService, ListingServiceDependencies, MessagingService,
    MessagingServiceDependencies, RegisterUserRequest, SendMessageRequest, SetStatusRequest,
    UpdateProfileRequest, UserService, UserServiceDependencies,
};
pub use storage::{FileStorage, StorageError};
