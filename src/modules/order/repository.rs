use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use crate::modules::user::repository::User;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Clone, Debug, FromRow)]
pub struct Order {
    pub id: i32,
    pub order_code: String,
    pub user_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: i32,
    pub order_code: String,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_code: order.order_code,
        }
    }
}

pub struct CreateOrderPayload {
    pub order_code: String,
    pub user_id: i32,
}

pub async fn create<'e, E>(db: E, payload: CreateOrderPayload) -> Result<Order>
where
    E: PgExecutor<'e>,
{
    match sqlx::query_as::<_, Order>(
        "
        INSERT INTO orders (order_code, user_id)
        VALUES ($1, $2)
        RETURNING *
        ",
    )
    .bind(payload.order_code)
    .bind(payload.user_id)
    .fetch_one(db)
    .await
    {
        Ok(order) => Ok(order),
        Err(err) => {
            tracing::error!("Error occurred while creating an order: {}", err);
            Err(Error::UnexpectedError)
        }
    }
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: i32) -> Result<Option<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching order with id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_many<'e, E: PgExecutor<'e>>(e: E) -> Result<Vec<Order>> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY id ASC")
        .fetch_all(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching orders: {}", err);
            Error::UnexpectedError
        })
}

pub async fn exists_by_id<'e, E: PgExecutor<'e>>(e: E, id: i32) -> Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
        .bind(id)
        .fetch_one(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred in exists_by_id: {}", err);
            Error::UnexpectedError
        })
}

/// The user who placed the order, resolved through the owning side of the
/// relation.
pub async fn find_owner_by_id<'e, E: PgExecutor<'e>>(e: E, order_id: i32) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "
        SELECT
            users.*
        FROM
            users,
            orders
        WHERE
            orders.id = $1
            AND users.id = orders.user_id
        ",
    )
    .bind(order_id)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching owner of order with id {}: {}",
            order_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn attach_dish<'e, E: PgExecutor<'e>>(e: E, order_id: i32, dish_id: i32) -> Result<()> {
    sqlx::query("INSERT INTO order_dishes (order_id, dish_id) VALUES ($1, $2)")
        .bind(order_id)
        .bind(dish_id)
        .execute(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while attaching dish {} to order {}: {}",
                dish_id,
                order_id,
                err
            );
            Error::UnexpectedError
        })
        .map(|_| ())
}

pub async fn detach_dishes<'e, E: PgExecutor<'e>>(e: E, order_id: i32) -> Result<()> {
    sqlx::query("DELETE FROM order_dishes WHERE order_id = $1")
        .bind(order_id)
        .execute(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while detaching dishes from order {}: {}",
                order_id,
                err
            );
            Error::UnexpectedError
        })
        .map(|_| ())
}

pub struct UpdateOrderPayload {
    pub order_code: String,
}

pub async fn update_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: i32,
    payload: UpdateOrderPayload,
) -> Result<()> {
    sqlx::query(
        "
        UPDATE orders SET
            order_code = $1,
            updated_at = NOW()
        WHERE
            id = $2
        ",
    )
    .bind(payload.order_code)
    .bind(id)
    .execute(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while trying to update order with id {}: {}",
            id,
            err
        );
        Error::UnexpectedError
    })
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn dto_projection_drops_owner_and_timestamps() {
        let order = Order {
            id: 3,
            order_code: String::from("ORD-001"),
            user_id: 9,
            created_at: NaiveDate::from_ymd_opt(2024, 8, 15)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            updated_at: None,
        };

        let dto = OrderDto::from(order);
        let value = serde_json::to_value(&dto).unwrap();

        assert_eq!(value["id"], 3);
        assert_eq!(value["orderCode"], "ORD-001");
        assert!(value.get("userId").is_none());
        assert!(value.get("createdAt").is_none());
    }
}
