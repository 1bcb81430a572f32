use std::sync::Arc;

use uuid::Uuid;

use domain::{DisplayName, DomainError, RepositoryError, User, UserEmail, UserId};

use crate::clock::Clock;
use crate::dto::UserDto;
use crate::error::{ApplicationError, ApplicationResult};
use crate::password::PasswordHasher;
use crate::repository::UserRepository;

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthenticateUserRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

/// 账户用例：注册、登录校验、资料维护。
pub struct UserService {
    deps: UserServiceDependencies,
    allowed_email_domain: String,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies, allowed_email_domain: impl Into<String>) -> Self {
        Self {
            deps,
            allowed_email_domain: allowed_email_domain.into(),
        }
    }

    pub async fn register(&self, request: RegisterUserRequest) -> ApplicationResult<UserDto> {
        let email = UserEmail::parse(request.email)?;
        if !email.domain().eq_ignore_ascii_case(&self.allowed_email_domain) {
            return Err(DomainError::invalid_argument(
                "email",
                format!("must be a {} address", self.allowed_email_domain),
            )
            .into());
        }
        if request.password.trim().is_empty() {
            return Err(DomainError::invalid_argument("password", "cannot be empty").into());
        }
        let name = DisplayName::parse(request.name)?;

        if self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .is_some()
        {
            return Err(DomainError::EmailTaken.into());
        }

        let password = self.deps.password_hasher.hash(&request.password).await?;
        let now = self.deps.clock.now();
        let user = User::register(
            UserId::new(Uuid::new_v4()),
            email,
            password,
            name,
            request.phone,
            now,
        );

        // 唯一索引兜底并发注册
        let created = self
            .deps
            .user_repository
            .create(user)
            .await
            .map_err(|error| match error {
                RepositoryError::Conflict => ApplicationError::Domain(DomainError::EmailTaken),
                other => other.into(),
            })?;
        tracing::info!(user_id = %created.id, "user registered");
        Ok(UserDto::from(&created))
    }

    pub async fn authenticate(&self, request: AuthenticateUserRequest) -> ApplicationResult<UserDto> {
        let email = UserEmail::parse(request.email)?;
        let user = self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(ApplicationError::Authentication)?;
        let valid = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !valid {
            return Err(ApplicationError::Authentication);
        }
        Ok(UserDto::from(&user))
    }

    pub async fn get_user(&self, user_id: Uuid) -> ApplicationResult<UserDto> {
        let user = self
            .deps
            .user_repository
            .find_by_id(UserId::new(user_id))
            .await?
            .ok_or(DomainError::UserNotFound)?;
        Ok(UserDto::from(&user))
    }

    pub async fn list_users(&self) -> ApplicationResult<Vec<UserDto>> {
        let users = self.deps.user_repository.list().await?;
        Ok(users.iter().map(UserDto::from).collect())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> ApplicationResult<UserDto> {
        let mut user = self
            .deps
            .user_repository
            .find_by_id(UserId::new(user_id))
            .await?
            .ok_or(DomainError::UserNotFound)?;
        let name = request.name.map(DisplayName::parse).transpose()?;
        user.update_profile(name, request.profile_image, self.deps.clock.now());
        let updated = self.deps.user_repository.update(user).await?;
        Ok(UserDto::from(&updated))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> ApplicationResult<()> {
        if request.new_password.trim().is_empty() {
            return Err(DomainError::invalid_argument("new_password", "cannot be empty").into());
        }
        let mut user = self
            .deps
            .user_repository
            .find_by_id(UserId::new(user_id))
            .await?
            .ok_or(DomainError::UserNotFound)?;
        let valid = self
            .deps
            .password_hasher
            .verify(&request.current_password, &user.password)
            .await?;
        if !valid {
            return Err(
                DomainError::invalid_argument("current_password", "incorrect").into(),
            );
        }
        let password = self.deps.password_hasher.hash(&request.new_password).await?;
        user.set_password(password, self.deps.clock.now());
        self.deps.user_repository.update(user).await?;
        Ok(())
    }
}
