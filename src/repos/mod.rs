/*
 * Responsibility
 * - DB アクセス層の公開インターフェース
 */
pub mod error;
pub mod user_repo;

pub use user_repo::{PgUserRepo, UserRepo, UserRow};
