use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use domain::{
    Category, Condition, DomainError, Item, ItemId, ItemStatus, Price, RepositoryError, UserId,
    UserSummary,
};

use crate::clock::Clock;
use crate::dto::ItemDto;
use crate::error::ApplicationResult;
use crate::repository::{ItemFilter, ItemRepository, UserRepository};
use crate::services::MAX_WRITE_ATTEMPTS;

#[derive(Debug, Clone)]
pub struct CreateItemRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub condition: Condition,
    pub images: Vec<String>,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct SetStatusRequest {
    pub status: ItemStatus,
    pub buyer_id: Option<Uuid>,
}

pub struct ListingServiceDependencies {
    pub item_repository: Arc<dyn ItemRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 商品用例：发布、浏览、生命周期流转。
pub struct ListingService {
    deps: ListingServiceDependencies,
}

impl ListingService {
    pub fn new(deps: ListingServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_item(
        &self,
        seller_id: Uuid,
        request: CreateItemRequest,
    ) -> ApplicationResult<ItemDto> {
        let price = Price::new(request.price)?;
        let item = Item::new(
            ItemId::new(Uuid::new_v4()),
            request.title,
            request.description,
            price,
            request.category,
            request.condition,
            request.images,
            UserId::new(seller_id),
            request.location,
            self.deps.clock.now(),
        )?;
        let created = self.deps.item_repository.create(item).await?;
        tracing::info!(item_id = %created.id, seller_id = %created.seller_id, "item listed");
        self.expand_item(&created).await
    }

    pub async fn get_item(&self, item_id: Uuid) -> ApplicationResult<ItemDto> {
        let item = self
            .deps
            .item_repository
            .find_by_id(ItemId::new(item_id))
            .await?
            .ok_or(DomainError::ItemNotFound)?;
        self.expand_item(&item).await
    }

    pub async fn list_items(&self, filter: ItemFilter) -> ApplicationResult<Vec<ItemDto>> {
        let items = self.deps.item_repository.list(&filter).await?;

        let mut seller_ids: Vec<UserId> = Vec::new();
        for item in &items {
            if !seller_ids.contains(&item.seller_id) {
                seller_ids.push(item.seller_id);
            }
        }
        let sellers: HashMap<UserId, UserSummary> = self
            .deps
            .user_repository
            .find_by_ids(&seller_ids)
            .await?
            .iter()
            .map(|user| (user.id, UserSummary::from(user)))
            .collect();

        Ok(items
            .iter()
            .map(|item| ItemDto::from_item(item, sellers.get(&item.seller_id).cloned()))
            .collect())
    }

    /// 卖家沿状态机流转商品状态。并发冲突时重读重试。
    pub async fn set_status(
        &self,
        acting_user: Uuid,
        item_id: Uuid,
        request: SetStatusRequest,
    ) -> ApplicationResult<ItemDto> {
        let item_id = ItemId::new(item_id);
        let acting_user = UserId::new(acting_user);
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut item = self
                .deps
                .item_repository
                .find_by_id(item_id)
                .await?
                .ok_or(DomainError::ItemNotFound)?;
            if item.seller_id != acting_user {
                return Err(DomainError::NotItemSeller.into());
            }
            item.transition(
                request.status,
                request.buyer_id.map(UserId::new),
                self.deps.clock.now(),
            )?;
            match self.deps.item_repository.update(item).await {
                Ok(updated) => {
                    tracing::info!(item_id = %updated.id, status = ?updated.status, "item status changed");
                    return self.expand_item(&updated).await;
                }
                Err(RepositoryError::Conflict) => continue,
                Err(error) => return Err(error.into()),
            }
        }
        Err(RepositoryError::Conflict.into())
    }

    async fn expand_item(&self, item: &Item) -> ApplicationResult<ItemDto> {
        let seller = self
            .deps
            .user_repository
            .find_by_id(item.seller_id)
            .await?;
        Ok(ItemDto::from_item(
            item,
            seller.as_ref().map(UserSummary::from),
        ))
    }
}
