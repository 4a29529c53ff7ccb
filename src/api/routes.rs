/*
 * Responsibility
 * - URL 構造を定義
 * - route ごとに必要な permission をここで宣言する (GET /drinks と /health は公開)
 */
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::api::handlers::{
    drinks::{create_drink, delete_drink, list_drinks, list_drinks_detail, update_drink},
    health::health,
};
use crate::middleware::auth::permission;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/drinks",
            get(list_drinks).merge(permission::apply(post(create_drink), state, "post:drinks")),
        )
        .route(
            "/drinks-detail",
            permission::apply(get(list_drinks_detail), state, "get:drinks-detail"),
        )
        .route(
            "/drinks/{id}",
            permission::apply(patch(update_drink), state, "patch:drinks").merge(
                permission::apply(delete(delete_drink), state, "delete:drinks"),
            ),
        )
}
