use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use crate::modules::order::repository::Order;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "USER")]
    User,
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_ref() {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            role => Err(format!("Invalid user role: {}", role)),
        }
    }
}

impl ToString for Role {
    fn to_string(&self) -> String {
        match self {
            Role::Admin => String::from("ADMIN"),
            Role::User => String::from("USER"),
        }
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct User {
    pub id: i32,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// Flat projection served at the API boundary. Role and timestamps stay
/// internal.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password: user.password,
        }
    }
}

pub struct CreateUserPayload {
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

pub async fn create<'e, E>(db: E, payload: CreateUserPayload) -> Result<User>
where
    E: PgExecutor<'e>,
{
    match sqlx::query_as::<_, User>(
        "
        INSERT INTO users (user_name, first_name, last_name, email, password, role)
        VALUES ($1, $2, $3, $4, $5, 'USER')
        RETURNING *
        ",
    )
    .bind(payload.user_name)
    .bind(payload.first_name)
    .bind(payload.last_name)
    .bind(payload.email)
    .bind(payload.password)
    .fetch_one(db)
    .await
    {
        Ok(user) => Ok(user),
        Err(err) => {
            tracing::error!("Error occurred while creating a user: {}", err);
            Err(Error::UnexpectedError)
        }
    }
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: i32) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching user with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

pub async fn find_by_username<'e, E: PgExecutor<'e>>(
    e: E,
    user_name: String,
) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_name = $1")
        .bind(user_name)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred in find_by_username: {}", err);
            Error::UnexpectedError
        })
}

pub async fn find_many<'e, E: PgExecutor<'e>>(e: E) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id ASC")
        .fetch_all(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching users: {}", err);
            Error::UnexpectedError
        })
}

/// Orders placed by a user. An unknown id yields an empty list, not an error.
pub async fn find_orders_by_user_id<'e, E: PgExecutor<'e>>(
    e: E,
    user_id: i32,
) -> Result<Vec<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching orders for user with id {}: {}",
                user_id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn exists_by_id<'e, E: PgExecutor<'e>>(e: E, id: i32) -> Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred in exists_by_id: {}", err);
            Error::UnexpectedError
        })
}

pub async fn exists_by_username<'e, E: PgExecutor<'e>>(e: E, user_name: String) -> Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE user_name = $1)")
        .bind(user_name)
        .fetch_one(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred in exists_by_username: {}", err);
            Error::UnexpectedError
        })
}

pub struct UpdateUserPayload {
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

pub async fn update_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: i32,
    payload: UpdateUserPayload,
) -> Result<()> {
    sqlx::query(
        "
        UPDATE users SET
            user_name = $1,
            first_name = $2,
            last_name = $3,
            email = $4,
            password = $5,
            updated_at = NOW()
        WHERE
            id = $6
        ",
    )
    .bind(payload.user_name)
    .bind(payload.first_name)
    .bind(payload.last_name)
    .bind(payload.email)
    .bind(payload.password)
    .bind(id)
    .execute(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to update user with id {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
    .map(|_| ())
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(e: E, id: i32) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while trying to delete user with id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
        .map(|_| ())
}

pub fn is_admin(user: &User) -> bool {
    user.role == Role::Admin
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_user() -> User {
        User {
            id: 7,
            user_name: String::from("alice"),
            first_name: String::from("Alice"),
            last_name: String::from("Adams"),
            email: String::from("alice@example.com"),
            password: String::from("hunter2"),
            role: Role::User,
            created_at: NaiveDate::from_ymd_opt(2024, 8, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn role_parses_from_stored_text() {
        assert_eq!(Role::try_from(String::from("ADMIN")).unwrap(), Role::Admin);
        assert_eq!(Role::try_from(String::from("USER")).unwrap(), Role::User);
        assert!(Role::try_from(String::from("ROOT")).is_err());
    }

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Admin, Role::User] {
            assert_eq!(Role::try_from(role.to_string()).unwrap(), role);
        }
    }

    #[test]
    fn dto_projection_drops_role_and_timestamps() {
        let user = sample_user();
        let dto = UserDto::from(user.clone());

        assert_eq!(dto.id, user.id);
        assert_eq!(dto.user_name, user.user_name);
        assert_eq!(dto.email, user.email);
        assert_eq!(dto.password, user.password);

        let value = serde_json::to_value(&dto).unwrap();
        assert!(value.get("role").is_none());
        assert!(value.get("createdAt").is_none());
        assert_eq!(value["userName"], "alice");
    }

    #[test]
    fn admin_check_follows_role() {
        let mut user = sample_user();
        assert!(!is_admin(&user));
        user.role = Role::Admin;
        assert!(is_admin(&user));
    }
}
