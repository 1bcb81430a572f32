//! 服务层测试共用的假实现。

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use time::macros::datetime;
use uuid::Uuid;

use domain::{
    DisplayName, Item, ItemId, PasswordHash, Price, Timestamp, User, UserEmail, UserId,
};

use crate::clock::Clock;
use crate::password::{PasswordHasher, PasswordHasherError};

/// 每次读取前进一秒的时钟，保证事件时间全序。
pub struct StepClock {
    base: Timestamp,
    ticks: AtomicI64,
}

impl Default for StepClock {
    fn default() -> Self {
        Self {
            base: datetime!(2025-01-01 00:00:00 UTC),
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> Timestamp {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.base + time::Duration::seconds(tick)
    }
}

/// 可逆的明文“哈希”，仅用于测试。
pub struct FakePasswordHasher;

#[async_trait]
impl PasswordHasher for FakePasswordHasher {
    async fn hash(&self, plain: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("hashed:{plain}"))
            .map_err(|error| PasswordHasherError::Hash(error.to_string()))
    }

    async fn verify(
        &self,
        plain: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hash.as_str() == format!("hashed:{plain}"))
    }
}

pub fn test_user(name: &str) -> User {
    User::register(
        UserId::new(Uuid::new_v4()),
        UserEmail::parse(format!("{name}@deakin.edu.au")).unwrap(),
        PasswordHash::new("hashed:secret").unwrap(),
        DisplayName::parse(name).unwrap(),
        None,
        datetime!(2024-12-01 00:00:00 UTC),
    )
}

pub fn test_item(seller: UserId, title: &str) -> Item {
    Item::new(
        ItemId::new(Uuid::new_v4()),
        title,
        "well kept",
        Price::new(25.0).unwrap(),
        domain::Category::Textbooks,
        domain::Condition::Good,
        vec![],
        seller,
        "Burwood campus",
        datetime!(2024-12-01 00:00:00 UTC),
    )
    .unwrap()
}
