use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::IdentityClaims,
    error::{ApiError, ApiResponse, CodeMessage},
    extract::{Params, Payload, RecordId},
    models::{
        AuthPayload, BatchDeleteRequest, LoginRequest, NOTIFICATION_SORTABLE, NotificationInput,
        NotificationPage, USER_SORTABLE, User, UserChanges, UserInput, UserPage, ValidatePayload,
        ValidateRequest,
    },
    pagination::{ListQuery, PageRequest},
    password,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn issue_for(state: &AppState, user: User) -> ApiResult<AuthPayload> {
    let claims = IdentityClaims::new(user.id, user.authority.clone());
    let token = state.tokens.issue(&claims)?;
    Ok(ApiResponse::ok(AuthPayload { token, user }))
}

async fn hash_if_present(plain: Option<String>) -> Result<Option<String>, ApiError> {
    match plain.filter(|p| !p.is_empty()) {
        Some(plain) => password::hash_password_async(plain).await.map(Some),
        None => Ok(None),
    }
}

// --- Public ---

/// register
///
/// [Public Route] Creates a participant account and returns a token for it. The role
/// is always the default one; only admins can create other admins.
pub async fn register(
    State(state): State<AppState>,
    Payload(mut input): Payload<UserInput>,
) -> ApiResult<AuthPayload> {
    let Some(plain) = input.password.take().filter(|p| !p.is_empty()) else {
        return Err(ApiError::MissingLoginFields);
    };
    input.authority = None;

    let hash = password::hash_password_async(plain).await?;
    let user = state
        .repo
        .create_user(UserChanges::from_input(input, Some(hash)))
        .await?;
    tracing::info!(user_id = user.id, "registered user");

    issue_for(&state, user)
}

/// login
///
/// [Public Route] `username` may be either the username or the email address.
pub async fn login(
    State(state): State<AppState>,
    Payload(request): Payload<LoginRequest>,
) -> ApiResult<AuthPayload> {
    let (Some(login), Some(plain)) = (
        request.username.filter(|u| !u.is_empty()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::MissingLoginFields);
    };

    let user = state
        .repo
        .find_user_by_login(&login)
        .await?
        .ok_or(ApiError::UnknownLogin)?;

    if !password::verify_password_async(plain, user.password.clone()).await {
        tracing::info!(user_id = user.id, "login with wrong password");
        return Err(ApiError::WrongPassword);
    }

    issue_for(&state, user)
}

/// validate
///
/// [Public Route] Reports whether the body's `token` is currently valid. A missing
/// or unreadable body counts as a missing token.
pub async fn validate(
    State(state): State<AppState>,
    request: Result<Payload<ValidateRequest>, ApiError>,
) -> Response {
    let request = request.map(|Payload(request)| request).unwrap_or_default();
    let token = request.token.unwrap_or_default();
    match state.tokens.verify(&token) {
        Ok(_) => ApiResponse::ok(ValidatePayload { isvalid: true }).into_response(),
        Err(reason) => {
            tracing::debug!(reason = reason.label(), "token failed validation");
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse {
                    status: CodeMessage::INVALID_TOKEN,
                    data: ValidatePayload { isvalid: false },
                }),
            )
                .into_response()
        }
    }
}

// --- Private ---

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

// --- Users (private) ---

/// list_users
///
/// [Admin Route] Paged user listing, `?pageSize=&currentPage=&sort=id.asc,name.desc`.
pub async fn list_users(
    State(state): State<AppState>,
    Params(query): Params<ListQuery>,
) -> ApiResult<UserPage> {
    let page = PageRequest::from_query(&query, USER_SORTABLE);
    let count = state.repo.count_users().await?;
    let users = state.repo.list_users(&page).await?;

    Ok(ApiResponse::ok(UserPage {
        page: page.info(count),
        users,
    }))
}

pub async fn get_user(State(state): State<AppState>, RecordId(id): RecordId) -> ApiResult<Value> {
    let user = state.repo.get_user(id).await?.ok_or(ApiError::UserNotFound)?;
    Ok(ApiResponse::ok(json!({ "user": user })))
}

/// create_user
///
/// [Admin Route] Unlike `register`, the caller may set `authority`.
pub async fn create_user(
    claims: IdentityClaims,
    State(state): State<AppState>,
    Payload(mut input): Payload<UserInput>,
) -> ApiResult<Value> {
    let Some(plain) = input.password.take().filter(|p| !p.is_empty()) else {
        return Err(ApiError::MissingLoginFields);
    };

    let hash = password::hash_password_async(plain).await?;
    let user = state
        .repo
        .create_user(UserChanges::from_input(input, Some(hash)))
        .await?;
    tracing::info!(actor = claims.subject_id, user_id = user.id, "created user");

    Ok(ApiResponse::ok(json!({ "user": user })))
}

/// update_user
///
/// [Private Route] Only admins may change `authority`; for anyone else the field is
/// dropped and the rest of the update applies.
pub async fn update_user(
    claims: IdentityClaims,
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Payload(mut input): Payload<UserInput>,
) -> ApiResult<Value> {
    if !claims.is_admin() && input.authority.take().is_some() {
        tracing::warn!(actor = claims.subject_id, user_id = id, "ignored authority change");
    }
    let hash = hash_if_present(input.password.take()).await?;
    let updated = state
        .repo
        .update_user(id, UserChanges::from_input(input, hash))
        .await?
        .ok_or(ApiError::UserNotFound)?;
    tracing::info!(actor = claims.subject_id, user_id = id, "updated user");

    Ok(ApiResponse::ok(json!({ "updatedUser": updated })))
}

pub async fn delete_user(
    claims: IdentityClaims,
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Value> {
    let user = state
        .repo
        .delete_user(id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    tracing::info!(actor = claims.subject_id, user_id = id, "deleted user");

    Ok(ApiResponse::ok(json!({ "user": user })))
}

/// batch_delete_users
///
/// [Admin Route] Deletes every listed id; ids that do not exist are skipped.
pub async fn batch_delete_users(
    claims: IdentityClaims,
    State(state): State<AppState>,
    Payload(request): Payload<BatchDeleteRequest>,
) -> ApiResult<Value> {
    let deleted = state.repo.delete_users(&request.id).await?;
    tracing::info!(
        actor = claims.subject_id,
        requested = request.id.len(),
        deleted,
        "batch deleted users"
    );

    Ok(ApiResponse::ok(json!({ "id": request.id })))
}

// --- Notifications (private) ---

pub async fn list_notifications(
    State(state): State<AppState>,
    Params(query): Params<ListQuery>,
) -> ApiResult<NotificationPage> {
    let page = PageRequest::from_query(&query, NOTIFICATION_SORTABLE);
    let count = state.repo.count_notifications().await?;
    let notifications = state.repo.list_notifications(&page).await?;

    Ok(ApiResponse::ok(NotificationPage {
        page: page.info(count),
        notifications,
    }))
}

pub async fn get_notification(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Value> {
    let notification = state
        .repo
        .get_notification(id)
        .await?
        .ok_or(ApiError::NotificationNotFound)?;
    Ok(ApiResponse::ok(json!({ "notification": notification })))
}

pub async fn create_notification(
    claims: IdentityClaims,
    State(state): State<AppState>,
    Payload(input): Payload<NotificationInput>,
) -> ApiResult<Value> {
    let notification = state.repo.create_notification(input).await?;
    tracing::info!(
        actor = claims.subject_id,
        notification_id = notification.id,
        "created notification"
    );

    Ok(ApiResponse::ok(json!({ "notification": notification })))
}

pub async fn update_notification(
    claims: IdentityClaims,
    State(state): State<AppState>,
    RecordId(id): RecordId,
    Payload(input): Payload<NotificationInput>,
) -> ApiResult<Value> {
    let updated = state
        .repo
        .update_notification(id, input)
        .await?
        .ok_or(ApiError::NotificationNotFound)?;
    tracing::info!(actor = claims.subject_id, notification_id = id, "updated notification");

    Ok(ApiResponse::ok(json!({ "updatedNotification": updated })))
}

pub async fn delete_notification(
    claims: IdentityClaims,
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> ApiResult<Value> {
    let notification = state
        .repo
        .delete_notification(id)
        .await?
        .ok_or(ApiError::NotificationNotFound)?;
    tracing::info!(actor = claims.subject_id, notification_id = id, "deleted notification");

    Ok(ApiResponse::ok(json!({ "notification": notification })))
}

pub async fn batch_delete_notifications(
    claims: IdentityClaims,
    State(state): State<AppState>,
    Payload(request): Payload<BatchDeleteRequest>,
) -> ApiResult<Value> {
    let deleted = state.repo.delete_notifications(&request.id).await?;
    tracing::info!(
        actor = claims.subject_id,
        requested = request.id.len(),
        deleted,
        "batch deleted notifications"
    );

    Ok(ApiResponse::ok(json!({ "id": request.id })))
}
