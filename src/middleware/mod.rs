/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 各モジュールは `apply(router, ...)` を公開し、app.rs から順に適用する
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
