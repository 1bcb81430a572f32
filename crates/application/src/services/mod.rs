mod engagement_service;
mod listing_service;
mod messaging_service;
mod user_service;

pub use engagement_service::{EngagementService, EngagementServiceDependencies};
pub use listing_service::{
    CreateItemRequest, ListingService, ListingServiceDependencies, SetStatusRequest,
};
pub use messaging_service::{MessagingService, MessagingServiceDependencies, SendMessageRequest};
pub use user_service::{
    AuthenticateUserRequest, ChangePasswordRequest, RegisterUserRequest, UpdateProfileRequest,
    UserService, UserServiceDependencies,
};

/// 乐观并发冲突时的重试上限。
pub(crate) const MAX_WRITE_ATTEMPTS: usize = 3;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod listing_service_tests;
#[cfg(test)]
mod messaging_service_tests;
