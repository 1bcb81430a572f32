use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use uuid::Uuid;

use application::services::{
    AuthenticateUserRequest, ChangePasswordRequest, CreateItemRequest, RegisterUserRequest,
    SendMessageRequest, SetStatusRequest, UpdateProfileRequest,
};
use application::{ApplicationError, ItemDto, ItemFilter, RatingView, UserDto};
use domain::{Category, Condition, Conversation, ItemStatus, MessageView};

use crate::{auth::LoginResponse, error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    email: String,
    password: String,
    name: String,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct UpdateProfilePayload {
    name: Option<String>,
    profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChangePasswordPayload {
    current_password: String,
    new_password: String,
}

#[derive(Debug, Deserialize)]
struct CreateItemPayload {
    title: String,
    description: String,
    price: f64,
    category: Category,
    condition: Condition,
    #[serde(default)]
    images: Vec<String>,
    location: String,
}

#[derive(Debug, Deserialize)]
struct SetStatusPayload {
    status: ItemStatus,
    buyer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct RatePayload {
    score: u8,
    comment: String,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    item_id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: String,
}

/// 状态筛选参数。字面量 `all` 表示不过滤。
#[derive(Debug, Clone, Copy, Deserialize)]
enum StatusQuery {
    #[serde(rename = "all")]
    All,
    Available,
    Pending,
    Sold,
}

impl StatusQuery {
    fn into_filter(self) -> Option<ItemStatus> {
        match self {
            StatusQuery::All => None,
            StatusQuery::Available => Some(ItemStatus::Available),
            StatusQuery::Pending => Some(ItemStatus::Pending),
            StatusQuery::Sold => Some(ItemStatus::Sold),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListItemsQuery {
    status: Option<StatusQuery>,
    seller: Option<Uuid>,
    liked_by: Option<Uuid>,
    category: Option<Category>,
    condition: Option<Condition>,
    min_price: Option<f64>,
    max_price: Option<f64>,
}

impl From<ListItemsQuery> for ItemFilter {
    fn from(query: ListItemsQuery) -> Self {
        ItemFilter {
            status: query.status.and_then(StatusQuery::into_filter),
            seller: query.seller.map(Into::into),
            liked_by: query.liked_by.map(Into::into),
            category: query.category,
            condition: query.condition,
            min_price: query.min_price,
            max_price: query.max_price,
        }
    }
}

#[derive(Debug, Serialize)]
struct LikesResponse {
    likes: u32,
}

#[derive(Debug, Serialize)]
struct MarkReadResponse {
    updated: u64,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    path: String,
}

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.uploads_dir);
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register_user))
        .route("/auth/login", post(login_user))
        .route("/users", get(list_users))
        .route("/users/profile", put(update_profile))
        .route("/users/change-password", post(change_password))
        .route("/users/{user_id}", get(get_user))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{item_id}", get(get_item))
        .route("/items/{item_id}/status", patch(set_item_status))
        .route("/items/{item_id}/like", patch(like_item))
        .route("/items/{item_id}/unlike", patch(unlike_item))
        .route("/items/{item_id}/rate", post(rate_item))
        .route("/items/{item_id}/ratings", get(list_ratings))
        .route("/messages", post(send_message))
        .route("/messages/user/{user_id}", get(list_user_messages))
        .route(
            "/messages/user/{user_id}/conversations",
            get(list_conversations),
        )
        .route(
            "/messages/conversation/{item_id}/{user_a}/{user_b}",
            get(get_conversation_thread),
        )
        .route("/messages/read/{user_id}", patch(mark_messages_read))
        .route("/uploads", post(upload_image))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let dto = state
        .user_service
        .register(RegisterUserRequest {
            email: payload.email,
            password: payload.password,
            name: payload.name,
            phone: payload.phone,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .user_service
        .authenticate(AuthenticateUserRequest {
            email: payload.email,
            password: payload.password,
        })
        .await?;
    let token = state.jwt_service.generate_token(user.id.into())?;

    Ok(Json(LoginResponse { user, token }))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.user_service.get_user(user_id).await?;
    Ok(Json(user))
}

async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<UserDto>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let user = state
        .user_service
        .update_profile(
            user_id,
            UpdateProfileRequest {
                name: payload.name,
                profile_image: payload.profile_image,
            },
        )
        .await?;
    Ok(Json(user))
}

async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<StatusCode, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    state
        .user_service
        .change_password(
            user_id,
            ChangePasswordRequest {
                current_password: payload.current_password,
                new_password: payload.new_password,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<Vec<ItemDto>>, ApiError> {
    let items = state.listing_service.list_items(query.into()).await?;
    Ok(Json(items))
}

async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateItemPayload>,
) -> Result<(StatusCode, Json<ItemDto>), ApiError> {
    let seller_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let item = state
        .listing_service
        .create_item(
            seller_id,
            CreateItemRequest {
                title: payload.title,
                description: payload.description,
                price: payload.price,
                category: payload.category,
                condition: payload.condition,
                images: payload.images,
                location: payload.location,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ItemDto>, ApiError> {
    let item = state.listing_service.get_item(item_id).await?;
    Ok(Json(item))
}

async fn set_item_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<SetStatusPayload>,
) -> Result<Json<ItemDto>, ApiError> {
    let acting_user = state.jwt_service.extract_user_from_headers(&headers)?;
    let item = state
        .listing_service
        .set_status(
            acting_user,
            item_id,
            SetStatusRequest {
                status: payload.status,
                buyer_id: payload.buyer_id,
            },
        )
        .await?;
    Ok(Json(item))
}

async fn like_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(item_id): Path<Uuid>,
) -> Result<Json<LikesResponse>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let likes = state.engagement_service.like(user_id, item_id).await?;
    Ok(Json(LikesResponse { likes }))
}

async fn unlike_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(item_id): Path<Uuid>,
) -> Result<Json<LikesResponse>, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let likes = state.engagement_service.unlike(user_id, item_id).await?;
    Ok(Json(LikesResponse { likes }))
}

async fn rate_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<RatePayload>,
) -> Result<(StatusCode, Json<ItemDto>), ApiError> {
    // 评价人取自认证身份，请求体无法冒名
    let rater_id = state.jwt_service.extract_user_from_headers(&headers)?;
    let item = state
        .engagement_service
        .rate(rater_id, item_id, payload.score, payload.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_ratings(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Vec<RatingView>>, ApiError> {
    let ratings = state.engagement_service.list_ratings(item_id).await?;
    Ok(Json(ratings))
}

async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SendMessagePayload>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    let authenticated_user = state.jwt_service.extract_user_from_headers(&headers)?;
    let view = state
        .messaging_service
        .send_message(
            authenticated_user,
            SendMessageRequest {
                item_id: payload.item_id,
                sender_id: payload.sender_id,
                receiver_id: payload.receiver_id,
                content: payload.content,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn list_user_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;
    let messages = state.messaging_service.messages_for_user(user_id).await?;
    Ok(Json(messages))
}

async fn list_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;
    let conversations = state
        .messaging_service
        .conversations_for_user(user_id)
        .await?;
    Ok(Json(conversations))
}

async fn get_conversation_thread(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((item_id, user_a, user_b)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;
    let messages = state
        .messaging_service
        .conversation_thread(item_id, user_a, user_b)
        .await?;
    Ok(Json(messages))
}

async fn mark_messages_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let authenticated_user = state.jwt_service.extract_user_from_headers(&headers)?;
    let updated = state
        .messaging_service
        .mark_read(authenticated_user, user_id)
        .await?;
    Ok(Json(MarkReadResponse { updated }))
}

async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    state.jwt_service.extract_user_from_headers(&headers)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(err.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(|name| name.to_owned())
            .ok_or_else(|| ApiError::bad_request("missing file name"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(err.to_string()))?;
        let path = state
            .file_storage
            .store(&file_name, &bytes)
            .await
            .map_err(|err| ApiError::from(ApplicationError::Storage(err)))?;
        return Ok((StatusCode::CREATED, Json(UploadResponse { path })));
    }

    Err(ApiError::bad_request("missing image field"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    fn parse_filter(query: &str) -> ItemFilter {
        let uri: Uri = format!("/items?{query}").parse().unwrap();
        let Query(query) = Query::<ListItemsQuery>::try_from_uri(&uri).unwrap();
        ItemFilter::from(query)
    }

    #[test]
    fn status_all_disables_the_status_filter() {
        let filter = parse_filter("status=all");
        assert_eq!(filter.status, None);
    }

    #[test]
    fn named_status_filters_items() {
        let filter = parse_filter("status=Pending");
        assert_eq!(filter.status, Some(ItemStatus::Pending));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let uri: Uri = "/items?status=archived".parse().unwrap();
        assert!(Query::<ListItemsQuery>::try_from_uri(&uri).is_err());
    }

    #[test]
    fn price_range_and_category_are_forwarded() {
        let filter = parse_filter("category=textbooks&min_price=5&max_price=50");
        assert_eq!(filter.category, Some(Category::Textbooks));
        assert_eq!(filter.min_price, Some(5.0));
        assert_eq!(filter.max_price, Some(50.0));
        assert_eq!(filter.status, None);
    }
}
