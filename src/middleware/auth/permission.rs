//! permission gate → VerifiedClaims を extensions に入れる
//!
//! route ごとに必要な permission が異なるので、Router 全体ではなく
//! MethodRouter に `route_layer` で掛ける。
//! 検証本体は `AuthGate::guard` で包んだ処理として実行し、
//! 成功したときだけ次の handler に進む。

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::error::AppError;
use crate::services::auth::{AuthGate, VerifiedClaims};
use crate::state::AppState;

#[derive(Clone)]
struct RequiredPermission {
    gate: AuthGate,
    permission: &'static str,
}

/// `permission` を要求する gate を route に掛ける。
///
/// 例：
/// ```ignore
/// let route = middleware::auth::permission::apply(post(create_drink), &state, "post:drinks");
/// router.route("/drinks", route)
/// ```
pub fn apply(
    route: MethodRouter<AppState>,
    state: &AppState,
    permission: &'static str,
) -> MethodRouter<AppState> {
    let required = RequiredPermission {
        gate: state.auth.clone(),
        permission,
    };
    route.route_layer(middleware::from_fn_with_state(required, require_permission))
}

async fn require_permission(
    State(required): State<RequiredPermission>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let headers = req.headers().clone();
    let guarded = required.gate.guard(required.permission, forward);

    // Rejection → 401/403 (cause は gate 側でログ済み)
    Ok(guarded.call(&headers, (req, next)).await?)
}

// middleware → extractor への受け渡し
async fn forward(claims: VerifiedClaims, (mut req, next): (Request, Next)) -> Response {
    req.extensions_mut().insert(claims);
    next.run(req).await
}
