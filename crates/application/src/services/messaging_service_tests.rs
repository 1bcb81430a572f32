use std::sync::Arc;

use uuid::Uuid;

use domain::{DerivePolicy, DomainError};

use crate::error::ApplicationError;
use crate::memory::{InMemoryItemRepository, InMemoryMessageRepository, InMemoryUserRepository};
use crate::repository::{ItemRepository, UserRepository};
use crate::services::messaging_service::{
    MessagingService, MessagingServiceDependencies, SendMessageRequest,
};
use crate::services::test_support::{test_item, test_user, StepClock};

struct Env {
    service: MessagingService,
    items: Arc<InMemoryItemRepository>,
    users: Arc<InMemoryUserRepository>,
}

fn env_with_policy(policy: DerivePolicy) -> Env {
    let items = Arc::new(InMemoryItemRepository::default());
    let users = Arc::new(InMemoryUserRepository::default());
    let deps = MessagingServiceDependencies {
        message_repository: Arc::new(InMemoryMessageRepository::default()),
        item_repository: items.clone(),
        user_repository: users.clone(),
        clock: Arc::new(StepClock::default()),
    };
    Env {
        service: MessagingService::with_policy(deps, policy),
        items,
        users,
    }
}

fn env() -> Env {
    env_with_policy(DerivePolicy::Lenient)
}

/// 卖家、买家与一件商品。
async fn seed(env: &Env) -> (Uuid, Uuid, Uuid) {
    let seller = test_user("alice");
    let buyer = test_user("bob");
    env.users.create(seller.clone()).await.unwrap();
    env.users.create(buyer.clone()).await.unwrap();
    let item = test_item(seller.id, "Calculus textbook");
    env.items.create(item.clone()).await.unwrap();
    (item.id.into(), seller.id.into(), buyer.id.into())
}

fn send(item: Uuid, from: Uuid, to: Uuid, content: &str) -> SendMessageRequest {
    SendMessageRequest {
        item_id: item,
        sender_id: from,
        receiver_id: to,
        content: content.to_owned(),
    }
}

#[tokio::test]
async fn send_expands_item_and_participants() {
    let env = env();
    let (item, seller, buyer) = seed(&env).await;

    let view = env
        .service
        .send_message(buyer, send(item, buyer, seller, "still available?"))
        .await
        .unwrap();
    assert_eq!(view.item.unwrap().title, "Calculus textbook");
    assert_eq!(view.sender.unwrap().name, "bob");
    assert_eq!(view.receiver.unwrap().name, "alice");
    assert!(!view.read);
}

#[tokio::test]
async fn sender_mismatch_persists_nothing() {
    let env = env();
    let (item, seller, buyer) = seed(&env).await;

    let result = env
        .service
        .send_message(buyer, send(item, seller, buyer, "spoofed"))
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::SenderMismatch))
    ));

    assert!(env.service.messages_for_user(seller).await.unwrap().is_empty());
    assert!(env.service.messages_for_user(buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_content_is_rejected() {
    let env = env();
    let (item, seller, buyer) = seed(&env).await;

    let result = env
        .service
        .send_message(buyer, send(item, buyer, seller, "   "))
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}

#[tokio::test]
async fn inbox_is_newest_first_and_thread_oldest_first() {
    let env = env();
    let (item, seller, buyer) = seed(&env).await;

    env.service
        .send_message(buyer, send(item, buyer, seller, "first"))
        .await
        .unwrap();
    env.service
        .send_message(seller, send(item, seller, buyer, "second"))
        .await
        .unwrap();

    let inbox = env.service.messages_for_user(seller).await.unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].content, "second");
    assert_eq!(inbox[1].content, "first");

    let thread = env
        .service
        .conversation_thread(item, seller, buyer)
        .await
        .unwrap();
    assert_eq!(thread[0].content, "first");
    assert_eq!(thread[1].content, "second");
}

#[tokio::test]
async fn conversations_group_by_item_and_counterparty() {
    let env = env();
    let (item, seller, buyer) = seed(&env).await;

    env.service
        .send_message(buyer, send(item, buyer, seller, "still available?"))
        .await
        .unwrap();
    env.service
        .send_message(seller, send(item, seller, buyer, "yes, it is"))
        .await
        .unwrap();

    let conversations = env.service.conversations_for_user(seller).await.unwrap();
    assert_eq!(conversations.len(), 1);
    let conversation = &conversations[0];
    assert_eq!(conversation.other_user.name, "bob");
    assert_eq!(conversation.last_message.content, "yes, it is");
    // 最新一条由卖家自己发出，不算未读
    assert!(!conversation.unread);

    let conversations = env.service.conversations_for_user(buyer).await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert!(conversations[0].unread);
}

#[tokio::test]
async fn mark_read_is_idempotent() {
    let env = env();
    let (item, seller, buyer) = seed(&env).await;

    env.service
        .send_message(buyer, send(item, buyer, seller, "one"))
        .await
        .unwrap();
    env.service
        .send_message(buyer, send(item, buyer, seller, "two"))
        .await
        .unwrap();

    assert_eq!(env.service.mark_read(seller, seller).await.unwrap(), 2);
    assert_eq!(env.service.mark_read(seller, seller).await.unwrap(), 0);

    let inbox = env.service.messages_for_user(seller).await.unwrap();
    assert!(inbox.iter().all(|message| message.read));
}

#[tokio::test]
async fn mark_read_is_limited_to_the_account_owner() {
    let env = env();
    let (_, seller, buyer) = seed(&env).await;

    let result = env.service.mark_read(buyer, seller).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::NotAccountOwner))
    ));
}

#[tokio::test]
async fn lenient_policy_skips_messages_with_missing_item() {
    let env = env();
    let (_, seller, buyer) = seed(&env).await;

    // 引用一个不存在的商品
    env.service
        .send_message(buyer, send(Uuid::new_v4(), buyer, seller, "orphaned"))
        .await
        .unwrap();

    let conversations = env.service.conversations_for_user(seller).await.unwrap();
    assert!(conversations.is_empty());
}

#[tokio::test]
async fn strict_policy_fails_on_missing_references() {
    let env = env_with_policy(DerivePolicy::Strict);
    let (_, seller, buyer) = seed(&env).await;

    env.service
        .send_message(buyer, send(Uuid::new_v4(), buyer, seller, "orphaned"))
        .await
        .unwrap();

    let result = env.service.conversations_for_user(seller).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MalformedMessage))
    ));
}
