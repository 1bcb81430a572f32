//! 会话视图推导。
//!
//! 会话不是持久化实体：它是对某个用户的消息序列按
//! (商品, 对方) 分组得到的派生视图，每次查询重新计算。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::item::Item;
use crate::user::User;
use crate::value_objects::{ItemId, MessageId, Timestamp, UserId};

/// 用户的公开投影（展开自消息的 sender/receiver 引用）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub profile_image: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.as_str().to_owned(),
            profile_image: user.profile_image.clone(),
        }
    }
}

/// 商品的公开投影（展开自消息的 item 引用）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub title: String,
    pub images: Vec<String>,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            images: item.images.clone(),
        }
    }
}

/// 展开后的消息读取模型。引用的实体可能已经缺失，
/// 因此三个展开字段都是 Option。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: MessageId,
    pub item: Option<ItemSummary>,
    pub sender: Option<UserSummary>,
    pub receiver: Option<UserSummary>,
    pub content: String,
    pub read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: Timestamp,
}

/// 推导出的会话视图。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub item: ItemSummary,
    pub other_user: UserSummary,
    pub last_message: MessageView,
    pub unread: bool,
}

/// 引用缺失消息的处理策略。Lenient 跳过并计数，Strict 直接失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivePolicy {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedConversations {
    pub conversations: Vec<Conversation>,
    /// Lenient 策略下被跳过的不完整消息数，由调用方记录日志。
    pub skipped: usize,
}

/// 从最新在前的消息序列推导会话列表。
///
/// 纯函数：输出只取决于 `viewer` 与输入序列。每个 (商品, 对方) 组合
/// 取第一条出现的消息作为 `last_message`，输出顺序即各会话首次出现
/// 的顺序。`unread` 当且仅当最新一条未读且 viewer 是其接收者。
pub fn derive_conversations(
    viewer: UserId,
    messages: &[MessageView],
    policy: DerivePolicy,
) -> Result<DerivedConversations, DomainError> {
    let mut seen: HashSet<(ItemId, UserId)> = HashSet::new();
    let mut conversations = Vec::new();
    let mut skipped = 0;

    for message in messages {
        let (item, sender, receiver) = match (&message.item, &message.sender, &message.receiver) {
            (Some(item), Some(sender), Some(receiver)) => (item, sender, receiver),
            _ => {
                if policy == DerivePolicy::Strict {
                    return Err(DomainError::MalformedMessage);
                }
                skipped += 1;
                continue;
            }
        };

        let other = if sender.id == viewer { receiver } else { sender };
        if !seen.insert((item.id, other.id)) {
            continue;
        }

        let unread = !message.read && receiver.id == viewer;
        conversations.push(Conversation {
            item: item.clone(),
            other_user: other.clone(),
            last_message: message.clone(),
            unread,
        });
    }

    Ok(DerivedConversations {
        conversations,
        skipped,
    })
}
