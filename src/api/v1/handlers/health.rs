/*
 * Responsibility
 * - GET /health (疎通用)
 * - 認証ゲートの外側にマウントする
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
