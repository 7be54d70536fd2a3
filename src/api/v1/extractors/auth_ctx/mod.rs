/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - 認証済みリクエストの principal を handler に提供する
 * - 検証そのものは middleware::auth::access の責務
 */

mod core;

pub use self::core::AuthCtx;
