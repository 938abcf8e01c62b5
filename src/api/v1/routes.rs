/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - v1 配下はすべて Appwrite トークンゲートの内側 (未定義パスも含む)
 */
use axum::{Router, routing::get};

use crate::error::AppError;
use crate::middleware::auth::access;
use crate::state::AppState;

use crate::api::v1::handlers::{
    locations::locations_ws,
    users::{current_user, get_user, list_users, lookup_user},
};

pub fn routes(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(current_user))
        .route("/users/lookup", get(lookup_user))
        .route("/users/{user_id}", get(get_user))
        .route("/ws/locations", get(locations_ws))
        // Own fallback so unmatched v1 paths stay inside the gate after `nest`.
        .fallback(route_not_found);

    access::apply(router, state)
}

async fn route_not_found() -> AppError {
    AppError::not_found("route")
}
