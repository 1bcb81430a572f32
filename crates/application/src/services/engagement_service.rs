use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use domain::{
    DomainError, Item, ItemId, RatingScore, RepositoryError, UserId, UserSummary,
};

use crate::clock::Clock;
use crate::dto::{ItemDto, RatingView};
use crate::error::ApplicationResult;
use crate::repository::{ItemRepository, UserRepository};
use crate::services::MAX_WRITE_ATTEMPTS;

pub struct EngagementServiceDependencies {
    pub item_repository: Arc<dyn ItemRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 互动用例：点赞、取消点赞、评价。
/// 所有写入都走乐观并发循环，保证计数与集合同步变更。
pub struct EngagementService {
    deps: EngagementServiceDependencies,
}

impl EngagementService {
    pub fn new(deps: EngagementServiceDependencies) -> Self {
        Self { deps }
    }

    /// 点赞，返回最新计数。
    pub async fn like(&self, user_id: Uuid, item_id: Uuid) -> ApplicationResult<u32> {
        let user_id = UserId::new(user_id);
        let item_id = ItemId::new(item_id);
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut item = self.load(item_id).await?;
            let likes = item.like(user_id)?;
            match self.deps.item_repository.update(item).await {
                Ok(_) => return Ok(likes),
                Err(RepositoryError::Conflict) => continue,
                Err(error) => return Err(error.into()),
            }
        }
        Err(RepositoryError::Conflict.into())
    }

    /// 取消点赞，返回最新计数。
    pub async fn unlike(&self, user_id: Uuid, item_id: Uuid) -> ApplicationResult<u32> {
        let user_id = UserId::new(user_id);
        let item_id = ItemId::new(item_id);
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut item = self.load(item_id).await?;
            let likes = item.unlike(user_id)?;
            match self.deps.item_repository.update(item).await {
                Ok(_) => return Ok(likes),
                Err(RepositoryError::Conflict) => continue,
                Err(error) => return Err(error.into()),
            }
        }
        Err(RepositoryError::Conflict.into())
    }

    pub async fn rate(
        &self,
        rater_id: Uuid,
        item_id: Uuid,
        score: u8,
        comment: String,
    ) -> ApplicationResult<ItemDto> {
        let score = RatingScore::new(score)?;
        let rater_id = UserId::new(rater_id);
        let item_id = ItemId::new(item_id);
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut item = self.load(item_id).await?;
            item.add_rating(rater_id, score, comment.clone(), self.deps.clock.now())?;
            match self.deps.item_repository.update(item).await {
                Ok(updated) => {
                    let seller = self
                        .deps
                        .user_repository
                        .find_by_id(updated.seller_id)
                        .await?;
                    return Ok(ItemDto::from_item(
                        &updated,
                        seller.as_ref().map(UserSummary::from),
                    ));
                }
                Err(RepositoryError::Conflict) => continue,
                Err(error) => return Err(error.into()),
            }
        }
        Err(RepositoryError::Conflict.into())
    }

    /// 商品的评价列表，评价人展开为公开投影。
    pub async fn list_ratings(&self, item_id: Uuid) -> ApplicationResult<Vec<RatingView>> {
        let item = self.load(ItemId::new(item_id)).await?;

        let mut rater_ids: Vec<UserId> = Vec::new();
        for rating in &item.ratings {
            if !rater_ids.contains(&rating.rater) {
                rater_ids.push(rating.rater);
            }
        }
        let raters: HashMap<UserId, UserSummary> = self
            .deps
            .user_repository
            .find_by_ids(&rater_ids)
            .await?
            .iter()
            .map(|user| (user.id, UserSummary::from(user)))
            .collect();

        Ok(item
            .ratings
            .iter()
            .map(|rating| RatingView {
                rater: raters.get(&rating.rater).cloned(),
                score: rating.score.value(),
                comment: rating.comment.clone(),
                created_at: rating.created_at,
            })
            .collect())
    }

    async fn load(&self, item_id: ItemId) -> ApplicationResult<Item> {
        Ok(self
            .deps
            .item_repository
            .find_by_id(item_id)
            .await?
            .ok_or(DomainError::ItemNotFound)?)
    }
}
