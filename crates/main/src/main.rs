//! 主应用程序入口
//!
//! 启动校园二手市场 Axum Web API 服务。

use std::sync::Arc;

use application::services::{
    EngagementService, EngagementServiceDependencies, ListingService, ListingServiceDependencies,
    MessagingService, MessagingServiceDependencies, UserService, UserServiceDependencies,
};
use application::{Clock, PasswordHasher, SystemClock};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, BcryptPasswordHasher, LocalFileStorage, PgItemRepository, PgMessageRepository,
    PgUserRepository,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 加载并校验配置。开发默认值过不了生产校验，只告警不中断
    let config = AppConfig::from_env_with_defaults();
    if let Err(error) = config.validate() {
        tracing::warn!(%error, "configuration failed production validation");
    }

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );
    let pg_pool = create_pg_pool(&config.database).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // 创建仓储
    let user_repository = Arc::new(PgUserRepository::new(pg_pool.clone()));
    let item_repository = Arc::new(PgItemRepository::new(pg_pool.clone()));
    let message_repository = Arc::new(PgMessageRepository::new(pg_pool));

    let password_hasher: Arc<dyn PasswordHasher> =
        Arc::new(BcryptPasswordHasher::new(config.server.bcrypt_cost));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 创建应用层服务
    let user_service = UserService::new(
        UserServiceDependencies {
            user_repository: user_repository.clone(),
            password_hasher: password_hasher.clone(),
            clock: clock.clone(),
        },
        config.market.allowed_email_domain.clone(),
    );

    let listing_service = ListingService::new(ListingServiceDependencies {
        item_repository: item_repository.clone(),
        user_repository: user_repository.clone(),
        clock: clock.clone(),
    });

    let engagement_service = EngagementService::new(EngagementServiceDependencies {
        item_repository: item_repository.clone(),
        user_repository: user_repository.clone(),
        clock: clock.clone(),
    });

    let messaging_service = MessagingService::new(MessagingServiceDependencies {
        message_repository,
        item_repository,
        user_repository,
        clock,
    });

    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
    let file_storage = Arc::new(LocalFileStorage::new(config.uploads.directory.clone()));

    let state = AppState {
        user_service: Arc::new(user_service),
        listing_service: Arc::new(listing_service),
        engagement_service: Arc::new(engagement_service),
        messaging_service: Arc::new(messaging_service),
        file_storage,
        jwt_service,
        uploads_dir: config.uploads.directory.clone(),
    };

    // 启动 Web 服务器
    let app = router(state);
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!("校园市场服务器启动在 http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
