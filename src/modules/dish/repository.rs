use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use sqlx::{FromRow, PgExecutor};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Clone, Debug, FromRow)]
pub struct Dish {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub restaurant_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DishDto {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
}

impl From<Dish> for DishDto {
    fn from(dish: Dish) -> Self {
        Self {
            id: dish.id,
            name: dish.name,
            price: dish.price,
        }
    }
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: i32) -> Result<Option<Dish>> {
    sqlx::query_as::<_, Dish>("SELECT * FROM dishes WHERE id = $1")
        .bind(id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching dish with id {}: {}", id, err);
            Error::UnexpectedError
        })
}

/// Dishes referenced by an order through the join table.
pub async fn find_by_order_id<'e, E: PgExecutor<'e>>(e: E, order_id: i32) -> Result<Vec<Dish>> {
    sqlx::query_as::<_, Dish>(
        "
        SELECT
            dishes.*
        FROM
            dishes,
            order_dishes
        WHERE
            order_dishes.order_id = $1
            AND dishes.id = order_dishes.dish_id
        ",
    )
    .bind(order_id)
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching dishes for order with id {}: {}",
            order_id,
            err
        );
        Error::UnexpectedError
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::FromPrimitive;
    use chrono::NaiveDate;

    #[test]
    fn dto_projection_keeps_price_and_drops_restaurant() {
        let dish = Dish {
            id: 4,
            name: String::from("Margherita"),
            price: BigDecimal::from_u32(1250).unwrap(),
            restaurant_id: 2,
            created_at: NaiveDate::from_ymd_opt(2024, 8, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            updated_at: None,
        };

        let dto = DishDto::from(dish);
        let value = serde_json::to_value(&dto).unwrap();

        assert_eq!(value["name"], "Margherita");
        assert!(value.get("restaurantId").is_none());
    }
}
