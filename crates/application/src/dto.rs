//! 面向 Web 层的读取模型。

use serde::Serialize;

use domain::{
    Category, Condition, Item, ItemId, ItemStatus, Rating, Timestamp, User, UserId, UserSummary,
};

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: Timestamp,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            name: user.name.as_str().to_owned(),
            phone: user.phone.clone(),
            profile_image: user.profile_image.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingDto {
    pub rater: UserId,
    pub score: u8,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: Timestamp,
}

impl From<&Rating> for RatingDto {
    fn from(rating: &Rating) -> Self {
        Self {
            rater: rating.rater,
            score: rating.score.value(),
            comment: rating.comment.clone(),
            created_at: rating.created_at,
        }
    }
}

/// 评价的展开视图，评价人展开为公开投影（可能已注销）。
#[derive(Debug, Clone, Serialize)]
pub struct RatingView {
    pub rater: Option<UserSummary>,
    pub score: u8,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDto {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub condition: Condition,
    pub images: Vec<String>,
    /// 卖家的公开投影，卖家记录缺失时为 None。
    pub seller: Option<UserSummary>,
    pub buyer_id: Option<UserId>,
    pub status: ItemStatus,
    pub location: String,
    pub likes: u32,
    pub liked_by: Vec<UserId>,
    pub ratings: Vec<RatingDto>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: Timestamp,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: Timestamp,
}

impl ItemDto {
    pub fn from_item(item: &Item, seller: Option<UserSummary>) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            description: item.description.clone(),
            price: item.price.value(),
            category: item.category,
            condition: item.condition,
            images: item.images.clone(),
            seller,
            buyer_id: item.buyer_id,
            status: item.status,
            location: item.location.clone(),
            likes: item.likes,
            liked_by: item.liked_by.clone(),
            ratings: item.ratings.iter().map(RatingDto::from).collect(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}
