use std::sync::Arc;

use application::{
    EngagementService, FileStorage, ListingService, MessagingService, UserService,
};

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub listing_service: Arc<ListingService>,
    pub engagement_service: Arc<EngagementService>,
    pub messaging_service: Arc<MessagingService>,
    pub file_storage: Arc<dyn FileStorage>,
    pub jwt_service: Arc<JwtService>,
    /// 本地上传目录，由静态文件路由挂载
    pub uploads_dir: String,
}
