//! 基础设施层：Postgres 仓储、bcrypt 密码哈希与本地文件存储。

pub mod db;
pub mod password;
pub mod repository;
pub mod storage;

pub use db::create_pg_pool;
pub use password::BcryptPasswordHasher;
pub use repository::{PgItemRepository, PgMessageRepository, PgUserRepository};
pub use storage::LocalFileStorage;
