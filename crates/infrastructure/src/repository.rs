//! Postgres 仓储实现。
//!
//! 商品整行承载点赞集合与评价（uuid[] 与 JSONB），一次 UPDATE
//! 即一次原子写入，版本列用于乐观并发。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use application::repository::{ItemFilter, ItemRepository, MessageRepository, UserRepository};
use domain::{
    Category, Condition, DisplayName, Item, ItemId, ItemStatus, Message, MessageContent,
    MessageId, PasswordHash, Price, Rating, RatingScore, RepositoryError, RepositoryResult, User,
    UserEmail, UserId,
};

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    phone: Option<String>,
    profile_image: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let email =
            UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let password = PasswordHash::new(value.password_hash)
            .map_err(|err| invalid_data(err.to_string()))?;
        let name =
            DisplayName::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            email,
            password,
            name,
            phone: value.phone,
            profile_image: value.profile_image,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// JSONB 中的单条评价。
#[derive(Debug, Serialize, Deserialize)]
struct RatingRecord {
    rater: Uuid,
    score: u8,
    comment: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl From<&Rating> for RatingRecord {
    fn from(rating: &Rating) -> Self {
        Self {
            rater: rating.rater.into(),
            score: rating.score.value(),
            comment: rating.comment.clone(),
            created_at: rating.created_at,
        }
    }
}

impl TryFrom<RatingRecord> for Rating {
    type Error = RepositoryError;

    fn try_from(value: RatingRecord) -> Result<Self, Self::Error> {
        Ok(Rating {
            rater: UserId::from(value.rater),
            score: RatingScore::new(value.score).map_err(|err| invalid_data(err.to_string()))?,
            comment: value.comment,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRecord {
    id: Uuid,
    title: String,
    description: String,
    price: f64,
    category: Category,
    condition: Condition,
    images: Vec<String>,
    seller_id: Uuid,
    buyer_id: Option<Uuid>,
    status: ItemStatus,
    location: String,
    likes: i32,
    liked_by: Vec<Uuid>,
    ratings: Json<Vec<RatingRecord>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    version: i64,
}

impl TryFrom<ItemRecord> for Item {
    type Error = RepositoryError;

    fn try_from(value: ItemRecord) -> Result<Self, Self::Error> {
        let price = Price::new(value.price).map_err(|err| invalid_data(err.to_string()))?;
        let likes =
            u32::try_from(value.likes).map_err(|_| invalid_data("negative likes counter"))?;
        let ratings = value
            .ratings
            .0
            .into_iter()
            .map(Rating::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Item {
            id: ItemId::from(value.id),
            title: value.title,
            description: value.description,
            price,
            category: value.category,
            condition: value.condition,
            images: value.images,
            seller_id: UserId::from(value.seller_id),
            buyer_id: value.buyer_id.map(UserId::from),
            status: value.status,
            location: value.location,
            likes,
            liked_by: value.liked_by.into_iter().map(UserId::from).collect(),
            ratings,
            created_at: value.created_at,
            updated_at: value.updated_at,
            version: value.version,
        })
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    item_id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: String,
    read: bool,
    created_at: OffsetDateTime,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let content =
            MessageContent::new(value.content).map_err(|err| invalid_data(err.to_string()))?;
        let mut message = Message::new(
            MessageId::from(value.id),
            ItemId::from(value.item_id),
            UserId::from(value.sender_id),
            UserId::from(value.receiver_id),
            content,
            value.created_at,
        );
        if value.read {
            message.mark_read();
        }
        Ok(message)
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, name, phone, profile_image, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, title, description, price, category, condition, images, \
     seller_id, buyer_id, status, location, likes, liked_by, ratings, created_at, updated_at, \
     version";

const MESSAGE_COLUMNS: &str =
    "id, item_id, sender_id, receiver_id, content, read, created_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, email, password_hash, name, phone, profile_image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, email, password_hash, name, phone, profile_image, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .bind(user.name.as_str())
        .bind(&user.phone)
        .bind(&user.profile_image)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, name = $4, phone = $5, profile_image = $6, updated_at = $7
            WHERE id = $1
            RETURNING id, email, password_hash, name, phone, profile_image, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .bind(user.name.as_str())
        .bind(&user.phone)
        .bind(&user.profile_image)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &UserEmail) -> RepositoryResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>> {
        let ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }

    async fn list(&self) -> RepositoryResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn create(&self, item: Item) -> RepositoryResult<Item> {
        let ratings: Vec<RatingRecord> = item.ratings.iter().map(RatingRecord::from).collect();
        let liked_by: Vec<Uuid> = item.liked_by.iter().copied().map(Uuid::from).collect();
        let record = sqlx::query_as::<_, ItemRecord>(
            r#"
            INSERT INTO items (id, title, description, price, category, condition, images,
                               seller_id, buyer_id, status, location, likes, liked_by, ratings,
                               created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id, title, description, price, category, condition, images, seller_id,
                      buyer_id, status, location, likes, liked_by, ratings, created_at,
                      updated_at, version
            "#,
        )
        .bind(Uuid::from(item.id))
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.price.value())
        .bind(item.category)
        .bind(item.condition)
        .bind(&item.images)
        .bind(Uuid::from(item.seller_id))
        .bind(item.buyer_id.map(Uuid::from))
        .bind(item.status)
        .bind(&item.location)
        .bind(item.likes as i32)
        .bind(&liked_by)
        .bind(Json(&ratings))
        .bind(item.created_at)
        .bind(item.updated_at)
        .bind(item.version)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Item::try_from(record)
    }

    async fn update(&self, item: Item) -> RepositoryResult<Item> {
        let ratings: Vec<RatingRecord> = item.ratings.iter().map(RatingRecord::from).collect();
        let liked_by: Vec<Uuid> = item.liked_by.iter().copied().map(Uuid::from).collect();
        let record = sqlx::query_as::<_, ItemRecord>(
            r#"
            UPDATE items
            SET title = $2, description = $3, price = $4, category = $5, condition = $6,
                images = $7, buyer_id = $8, status = $9, location = $10, likes = $11,
                liked_by = $12, ratings = $13, updated_at = $14, version = version + 1
            WHERE id = $1 AND version = $15
            RETURNING id, title, description, price, category, condition, images, seller_id,
                      buyer_id, status, location, likes, liked_by, ratings, created_at,
                      updated_at, version
            "#,
        )
        .bind(Uuid::from(item.id))
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.price.value())
        .bind(item.category)
        .bind(item.condition)
        .bind(&item.images)
        .bind(item.buyer_id.map(Uuid::from))
        .bind(item.status)
        .bind(&item.location)
        .bind(item.likes as i32)
        .bind(&liked_by)
        .bind(Json(&ratings))
        .bind(item.updated_at)
        .bind(item.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        // 版本不匹配时没有任何行被更新，调用方重读后重试
        let record = record.ok_or(RepositoryError::Conflict)?;
        Item::try_from(record)
    }

    async fn find_by_id(&self, id: ItemId) -> RepositoryResult<Option<Item>> {
        let record = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Item::try_from).transpose()
    }

    async fn find_by_ids(&self, ids: &[ItemId]) -> RepositoryResult<Vec<Item>> {
        let ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        let records = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Item::try_from).collect()
    }

    async fn list(&self, filter: &ItemFilter) -> RepositoryResult<Vec<Item>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM items WHERE TRUE"));
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(seller) = filter.seller {
            builder.push(" AND seller_id = ").push_bind(Uuid::from(seller));
        }
        if let Some(user) = filter.liked_by {
            builder
                .push(" AND liked_by @> ")
                .push_bind(vec![Uuid::from(user)]);
        }
        if let Some(category) = filter.category {
            builder.push(" AND category = ").push_bind(category);
        }
        if let Some(condition) = filter.condition {
            builder.push(" AND condition = ").push_bind(condition);
        }
        if let Some(min_price) = filter.min_price {
            builder.push(" AND price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            builder.push(" AND price <= ").push_bind(max_price);
        }
        builder.push(" ORDER BY created_at DESC");

        let records: Vec<ItemRecord> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        records.into_iter().map(Item::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: Message) -> RepositoryResult<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, item_id, sender_id, receiver_id, content, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, item_id, sender_id, receiver_id, content, read, created_at
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.item_id))
        .bind(Uuid::from(message.sender_id))
        .bind(Uuid::from(message.receiver_id))
        .bind(message.content.as_str())
        .bind(message.read)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Message::try_from(record)
    }

    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE sender_id = $1 OR receiver_id = $1 ORDER BY created_at DESC"
        ))
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }

    async fn list_thread(
        &self,
        item_id: ItemId,
        user_a: UserId,
        user_b: UserId,
    ) -> RepositoryResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE item_id = $1 \
               AND ((sender_id = $2 AND receiver_id = $3) \
                 OR (sender_id = $3 AND receiver_id = $2)) \
             ORDER BY created_at"
        ))
        .bind(Uuid::from(item_id))
        .bind(Uuid::from(user_a))
        .bind(Uuid::from(user_b))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }

    async fn mark_read_for_receiver(&self, receiver_id: UserId) -> RepositoryResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET read = TRUE WHERE receiver_id = $1 AND read = FALSE",
        )
        .bind(Uuid::from(receiver_id))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }
}
