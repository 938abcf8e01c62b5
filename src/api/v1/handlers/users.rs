/*
 * Responsibility
 * - /users 系の参照 handler (書き込みは持たない)
 * - Query/Path を extractor で受け、DTO validation → repo 呼び出し
 * - repo の Ok(None) は 404 に変換する
 * - Path/Query の rejection も AppError (JSON) に揃える
 */
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};

use crate::{
    api::v1::{
        dto::users::{ListUsersQuery, LookupKey, LookupUserQuery, UserResponse},
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    state::AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let Query(query) = query?;
    let (limit, offset) = query
        .validate()
        .map_err(|msg| AppError::bad_request("INVALID_PAGINATION", msg))?;

    let rows = state.users.list(limit, offset).await?;

    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

/// The stored user behind the verified Appwrite account.
pub async fn current_user(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
) -> Result<Json<UserResponse>, AppError> {
    let row = state
        .users
        .find_by_appwrite_id(&auth.user_id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn get_user(
    State(state): State<AppState>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let Path(user_id) = user_id?;
    let row = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn lookup_user(
    State(state): State<AppState>,
    query: Result<Query<LookupUserQuery>, QueryRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let Query(query) = query?;
    let key = query
        .key()
        .map_err(|msg| AppError::bad_request("INVALID_LOOKUP", msg))?;

    let row = match key {
        LookupKey::AppwriteId(v) => state.users.find_by_appwrite_id(v).await?,
        LookupKey::Email(v) => state.users.find_by_email(v).await?,
        LookupKey::Phone(v) => state.users.find_by_phone(v).await?,
        LookupKey::Username(v) => state.users.find_by_username(v).await?,
    }
    .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}
