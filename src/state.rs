/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: AuthGate (route ごとの permission middleware が使う)
 *   - drinks: DrinkRepo
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::drink_repo::DrinkRepo;
use crate::services::auth::AuthGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: AuthGate,
    pub drinks: Arc<DrinkRepo>,
}

impl AppState {
    pub fn new(auth: AuthGate, drinks: Arc<DrinkRepo>) -> Self {
        Self { auth, drinks }
    }
}
