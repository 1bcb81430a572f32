use crate::errors::DomainError;
use crate::value_objects::{ItemId, Price, RatingScore, Timestamp, UserId};

/// 商品生命周期状态。允许的迁移边：
/// Available -> Pending, Pending -> Sold, Pending -> Available。
/// Sold 为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_status")]
pub enum ItemStatus {
    Available,
    Pending,
    Sold,
}

impl ItemStatus {
    pub fn can_transition_to(self, to: ItemStatus) -> bool {
        matches!(
            (self, to),
            (ItemStatus::Available, ItemStatus::Pending)
                | (ItemStatus::Pending, ItemStatus::Sold)
                | (ItemStatus::Pending, ItemStatus::Available)
        )
    }
}

/// 商品分类。服务端枚举为准，客户端词汇映射到这里。
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Textbooks,
    Electronics,
    Furniture,
    Other,
}

/// 商品成色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_condition", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    New,
    #[sqlx(rename = "like new")]
    #[serde(rename = "like new")]
    LikeNew,
    Good,
    Fair,
    Poor,
}

/// 单条评价。每个用户对同一商品至多一条，无修改/删除路径。
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rating {
    pub rater: UserId,
    pub score: RatingScore,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: Category,
    pub condition: Condition,
    pub images: Vec<String>,
    pub seller_id: UserId,
    pub buyer_id: Option<UserId>,
    pub status: ItemStatus,
    pub location: String,
    pub likes: u32,
    pub liked_by: Vec<UserId>,
    pub ratings: Vec<Rating>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// 乐观并发标记，每次持久化写入递增。
    #[serde(skip)]
    pub version: i64,
}

impl Item {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ItemId,
        title: impl Into<String>,
        description: impl Into<String>,
        price: Price,
        category: Category,
        condition: Condition,
        images: Vec<String>,
        seller_id: UserId,
        location: impl Into<String>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(DomainError::invalid_argument("title", "cannot be empty"));
        }
        let description = description.into().trim().to_owned();
        if description.is_empty() {
            return Err(DomainError::invalid_argument(
                "description",
                "cannot be empty",
            ));
        }
        let location = location.into().trim().to_owned();
        if location.is_empty() {
            return Err(DomainError::invalid_argument("location", "cannot be empty"));
        }

        Ok(Self {
            id,
            title,
            description,
            price,
            category,
            condition,
            images,
            seller_id,
            buyer_id: None,
            status: ItemStatus::Available,
            location,
            likes: 0,
            liked_by: Vec::new(),
            ratings: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// 沿状态机迁移。迁移到 Sold 且给出买家时记录买家，
    /// 这是唯一写入 `buyer_id` 的路径。成功迁移总是刷新 `updated_at`。
    pub fn transition(
        &mut self,
        to: ItemStatus,
        buyer: Option<UserId>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        if to == ItemStatus::Sold {
            if let Some(buyer_id) = buyer {
                self.buyer_id = Some(buyer_id);
            }
        }
        self.updated_at = now;
        Ok(())
    }

    /// 点赞。计数与集合同时变更，维持 `likes == liked_by.len()`。
    pub fn like(&mut self, user_id: UserId) -> Result<u32, DomainError> {
        if self.liked_by.contains(&user_id) {
            return Err(DomainError::AlreadyLiked);
        }
        self.liked_by.push(user_id);
        self.likes += 1;
        Ok(self.likes)
    }

    /// 取消点赞。计数下限为 0，不变量保证该下限不会触发。
    pub fn unlike(&mut self, user_id: UserId) -> Result<u32, DomainError> {
        if !self.liked_by.contains(&user_id) {
            return Err(DomainError::NotLiked);
        }
        self.liked_by.retain(|id| *id != user_id);
        self.likes = self.likes.saturating_sub(1);
        Ok(self.likes)
    }

    /// 追加评价。同一用户对同一商品只能评价一次。
    pub fn add_rating(
        &mut self,
        rater: UserId,
        score: RatingScore,
        comment: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let comment = comment.into().trim().to_owned();
        if comment.is_empty() {
            return Err(DomainError::invalid_argument("comment", "cannot be empty"));
        }
        if self.ratings.iter().any(|rating| rating.rater == rater) {
            return Err(DomainError::DuplicateRating);
        }
        self.ratings.push(Rating {
            rater,
            score,
            comment,
            created_at: now,
        });
        Ok(())
    }
}
