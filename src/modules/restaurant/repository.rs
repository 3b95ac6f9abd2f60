use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Clone, Debug, FromRow)]
pub struct Restaurant {
    pub id: i32,
    pub restaurant_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDto {
    pub id: i32,
    pub restaurant_name: String,
}

impl From<Restaurant> for RestaurantDto {
    fn from(restaurant: Restaurant) -> Self {
        Self {
            id: restaurant.id,
            restaurant_name: restaurant.restaurant_name,
        }
    }
}

pub struct CreateRestaurantPayload {
    pub restaurant_name: String,
}

pub async fn create<'e, E>(db: E, payload: CreateRestaurantPayload) -> Result<Restaurant>
where
    E: PgExecutor<'e>,
{
    match sqlx::query_as::<_, Restaurant>(
        "
        INSERT INTO restaurants (restaurant_name)
        VALUES ($1)
        RETURNING *
        ",
    )
    .bind(payload.restaurant_name)
    .fetch_one(db)
    .await
    {
        Ok(restaurant) => Ok(restaurant),
        Err(err) => {
            tracing::error!("Error occurred while creating a restaurant: {}", err);
            Err(Error::UnexpectedError)
        }
    }
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: i32) -> Result<Option<Restaurant>> {
    sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE id = $1")
        .bind(id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching restaurant with id {}: {}",
                id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_many<'e, E: PgExecutor<'e>>(e: E) -> Result<Vec<Restaurant>> {
    sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants ORDER BY id ASC")
        .fetch_all(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching restaurants: {}", err);
            Error::UnexpectedError
        })
}

pub async fn exists_by_id<'e, E: PgExecutor<'e>>(e: E, id: i32) -> Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM restaurants WHERE id = $1)")
        .bind(id)
        .fetch_one(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred in exists_by_id: {}", err);
            Error::UnexpectedError
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn dto_projection_is_flat() {
        let restaurant = Restaurant {
            id: 1,
            restaurant_name: String::from("Pasta Palace"),
            created_at: NaiveDate::from_ymd_opt(2024, 8, 15)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap(),
            updated_at: None,
        };

        let dto = RestaurantDto::from(restaurant);
        let value = serde_json::to_value(&dto).unwrap();

        assert_eq!(value["id"], 1);
        assert_eq!(value["restaurantName"], "Pasta Palace");
        assert!(value.get("createdAt").is_none());
    }
}
