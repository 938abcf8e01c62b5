/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - "見つからない" はエラーではなく Option::None で表す
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
}
