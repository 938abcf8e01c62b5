/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - トークンの検証は Appwrite (外部 IdP) の責務。ここは結果を運ぶだけ
 */

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は Appwrite のアカウント ID (`$id`)。users."appwriteId" と突き合わせる
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub user_id: String,
}

impl AuthCtx {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
