/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: token 検証 / cors: ブラウザ向け / http: request-id, trace, limit, timeout
 */
pub mod auth;
pub mod cors;
pub mod http;
