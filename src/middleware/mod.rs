/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: Appwrite トークンゲート / cors: ブラウザ向け CORS / http: 横断的な HTTP 層
 */
pub mod auth;
pub mod cors;
pub mod http;
