use crate::value_objects::{DisplayName, PasswordHash, Timestamp, UserEmail, UserId};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: UserEmail,
    #[serde(skip_serializing)] // 密码字段不暴露给客户端
    pub password: PasswordHash,
    pub name: DisplayName,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn register(
        id: UserId,
        email: UserEmail,
        password: PasswordHash,
        name: DisplayName,
        phone: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            email,
            password,
            name,
            phone,
            profile_image: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_profile(
        &mut self,
        name: Option<DisplayName>,
        profile_image: Option<String>,
        now: Timestamp,
    ) {
        if let Some(new_name) = name {
            self.name = new_name;
        }
        if let Some(new_image) = profile_image {
            self.profile_image = Some(new_image);
        }
        self.updated_at = now;
    }

    pub fn set_password(&mut self, password: PasswordHash, now: Timestamp) {
        self.password = password;
        self.updated_at = now;
    }
}
