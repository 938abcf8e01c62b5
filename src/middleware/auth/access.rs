//! Appwrite token gate → AuthCtx を extensions に入れる
//!
//! - `Authorization` ヘッダをそのまま TokenVerifier に渡し、user id を解決する
//! - ヘッダあり かつ user id が解決できた場合のみ次へ進む
//! - それ以外 (ヘッダなし / 無効トークン / IdP 障害) は同じ 401 を返す (理由は返さない)

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::TokenVerifier;
use crate::state::AppState;

/// Why a request was turned away. Logged only, never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingHeader,
    InvalidToken,
    VerificationUnavailable,
}

#[derive(Debug, PartialEq, Eq)]
pub enum GateDecision {
    Proceed(AuthCtx),
    Reject(RejectReason),
}

/// `/api/v1/*` に認証を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

/// Decide whether a request with this `Authorization` value may proceed.
///
/// The verifier is not consulted when the header is absent.
pub async fn evaluate(verifier: &dyn TokenVerifier, auth_header: Option<&str>) -> GateDecision {
    let Some(auth_header) = auth_header else {
        return GateDecision::Reject(RejectReason::MissingHeader);
    };

    match verifier.verify_token_and_get_user_id(auth_header).await {
        Ok(Some(user_id)) => GateDecision::Proceed(AuthCtx::new(user_id)),
        Ok(None) => GateDecision::Reject(RejectReason::InvalidToken),
        Err(err) => {
            tracing::error!(error = %err, "token verification unavailable");
            GateDecision::Reject(RejectReason::VerificationUnavailable)
        }
    }
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Non-ASCII header values are treated as absent.
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match evaluate(state.verifier.as_ref(), auth_header.as_deref()).await {
        GateDecision::Proceed(auth_ctx) => {
            tracing::debug!(user_id = %auth_ctx.user_id, "request authenticated");

            // middleware → extractor への受け渡し
            req.extensions_mut().insert(auth_ctx);

            Ok(next.run(req).await)
        }
        GateDecision::Reject(reason) => {
            tracing::warn!(
                ?reason,
                method = %req.method(),
                path = %req.uri().path(),
                "request rejected"
            );
            Err(AppError::Unauthorized)
        }
    }
}
