use crate::value_objects::{ItemId, MessageContent, MessageId, Timestamp, UserId};

/// 商品相关的私信。item/sender/receiver 在创建后不可变，
/// 唯一的状态变化是已读标记。
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub item_id: ItemId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: MessageContent,
    pub read: bool,
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(
        id: MessageId,
        item_id: ItemId,
        sender_id: UserId,
        receiver_id: UserId,
        content: MessageContent,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            item_id,
            sender_id,
            receiver_id,
            content,
            read: false,
            created_at,
        }
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}
