/*
 * Responsibility
 * - store / repository が上位に伝えるエラーの定義
 * - auth core はこれを握りつぶさず、そのまま呼び出し元へ返す
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
