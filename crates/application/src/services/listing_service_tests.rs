use std::sync::Arc;

use uuid::Uuid;

use domain::{Category, Condition, DomainError, ItemStatus};

use crate::error::ApplicationError;
use crate::memory::{InMemoryItemRepository, InMemoryUserRepository};
use crate::repository::{ItemFilter, UserRepository};
use crate::services::listing_service::{
    CreateItemRequest, ListingService, ListingServiceDependencies, SetStatusRequest,
};
use crate::services::test_support::{test_user, StepClock};

struct Env {
    service: ListingService,
    users: Arc<InMemoryUserRepository>,
}

fn env() -> Env {
    let users = Arc::new(InMemoryUserRepository::default());
    let service = ListingService::new(ListingServiceDependencies {
        item_repository: Arc::new(InMemoryItemRepository::default()),
        user_repository: users.clone(),
        clock: Arc::new(StepClock::default()),
    });
    Env { service, users }
}

async fn seed_user(env: &Env, name: &str) -> Uuid {
    let user = test_user(name);
    env.users.create(user.clone()).await.unwrap();
    user.id.into()
}

fn create_request(title: &str, price: f64) -> CreateItemRequest {
    CreateItemRequest {
        title: title.to_owned(),
        description: "good shape".to_owned(),
        price,
        category: Category::Textbooks,
        condition: Condition::Good,
        images: vec![],
        location: "Burwood campus".to_owned(),
    }
}

#[tokio::test]
async fn create_item_starts_available_with_seller_expanded() {
    let env = env();
    let seller = seed_user(&env, "alice").await;

    let item = env
        .service
        .create_item(seller, create_request("Calculus textbook", 40.0))
        .await
        .unwrap();
    assert_eq!(item.status, ItemStatus::Available);
    assert_eq!(item.seller.unwrap().name, "alice");
    assert_eq!(item.likes, 0);
}

#[tokio::test]
async fn create_item_rejects_negative_price() {
    let env = env();
    let seller = seed_user(&env, "alice").await;

    let result = env
        .service
        .create_item(seller, create_request("Lamp", -1.0))
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}

#[tokio::test]
async fn seller_walks_item_through_lifecycle() {
    let env = env();
    let seller = seed_user(&env, "alice").await;
    let buyer = seed_user(&env, "bob").await;
    let item = env
        .service
        .create_item(seller, create_request("Desk", 60.0))
        .await
        .unwrap();

    let pending = env
        .service
        .set_status(
            seller,
            item.id.into(),
            SetStatusRequest {
                status: ItemStatus::Pending,
                buyer_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(pending.status, ItemStatus::Pending);
    assert!(pending.buyer_id.is_none());

    let sold = env
        .service
        .set_status(
            seller,
            item.id.into(),
            SetStatusRequest {
                status: ItemStatus::Sold,
                buyer_id: Some(buyer),
            },
        )
        .await
        .unwrap();
    assert_eq!(sold.status, ItemStatus::Sold);
    assert_eq!(sold.buyer_id.map(Uuid::from), Some(buyer));
}

#[tokio::test]
async fn only_the_seller_may_change_status() {
    let env = env();
    let seller = seed_user(&env, "alice").await;
    let other = seed_user(&env, "bob").await;
    let item = env
        .service
        .create_item(seller, create_request("Desk", 60.0))
        .await
        .unwrap();

    let result = env
        .service
        .set_status(
            other,
            item.id.into(),
            SetStatusRequest {
                status: ItemStatus::Pending,
                buyer_id: None,
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::NotItemSeller))
    ));
}

#[tokio::test]
async fn available_cannot_jump_straight_to_sold() {
    let env = env();
    let seller = seed_user(&env, "alice").await;
    let item = env
        .service
        .create_item(seller, create_request("Desk", 60.0))
        .await
        .unwrap();

    let result = env
        .service
        .set_status(
            seller,
            item.id.into(),
            SetStatusRequest {
                status: ItemStatus::Sold,
                buyer_id: None,
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidTransition {
            from: ItemStatus::Available,
            to: ItemStatus::Sold,
        }))
    ));
}

#[tokio::test]
async fn list_items_applies_filters() {
    let env = env();
    let alice = seed_user(&env, "alice").await;
    let bob = seed_user(&env, "bob").await;
    let cheap = env
        .service
        .create_item(alice, create_request("Cheap lamp", 10.0))
        .await
        .unwrap();
    let pricey = env
        .service
        .create_item(bob, create_request("Pricey desk", 90.0))
        .await
        .unwrap();
    env.service
        .set_status(
            bob,
            pricey.id.into(),
            SetStatusRequest {
                status: ItemStatus::Pending,
                buyer_id: None,
            },
        )
        .await
        .unwrap();

    let available = env
        .service
        .list_items(ItemFilter {
            status: Some(ItemStatus::Available),
            ..ItemFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].id, cheap.id);

    let by_seller = env
        .service
        .list_items(ItemFilter {
            seller: Some(bob.into()),
            ..ItemFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(by_seller.len(), 1);
    assert_eq!(by_seller[0].id, pricey.id);

    let mid_range = env
        .service
        .list_items(ItemFilter {
            min_price: Some(50.0),
            max_price: Some(100.0),
            ..ItemFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(mid_range.len(), 1);
    assert_eq!(mid_range[0].id, pricey.id);
}

#[tokio::test]
async fn get_item_not_found() {
    let env = env();
    let result = env.service.get_item(Uuid::new_v4()).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::ItemNotFound))
    ));
}
