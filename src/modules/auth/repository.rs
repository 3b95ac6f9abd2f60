use chrono::NaiveDateTime;
use sqlx::{FromRow, PgExecutor};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

/// An access token row written by the external token issuer. This layer only
/// validates; it never creates sessions.
#[derive(Clone, Debug, FromRow)]
pub struct Session {
    pub id: i32,
    pub user_id: i32,
    pub access_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

pub async fn find_by_access_token<'e, E: PgExecutor<'e>>(
    e: E,
    access_token: String,
) -> Result<Option<Session>> {
    sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE access_token = $1")
        .bind(access_token)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred in find_by_access_token: {}", err);
            Error::UnexpectedError
        })
}
