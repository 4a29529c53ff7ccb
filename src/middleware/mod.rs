/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth::permission::apply(...) で route 単位に gate を掛ける
 */
pub mod auth;
pub mod cors;
pub mod http;
