use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::repository::{self, RestaurantDto};
use crate::{types::Context, utils::validation};

async fn get_restaurants(State(ctx): State<Arc<Context>>) -> Response {
    match repository::find_many(&ctx.db_conn.pool).await {
        Ok(restaurants) => {
            let restaurants = restaurants
                .into_iter()
                .map(RestaurantDto::from)
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(json!(restaurants))).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch restaurants" })),
        )
            .into_response(),
    }
}

async fn get_restaurant_by_id(
    Path(restaurant_id): Path<i32>,
    State(ctx): State<Arc<Context>>,
) -> Response {
    match repository::exists_by_id(&ctx.db_conn.pool, restaurant_id).await {
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Restaurant not found" })),
        )
            .into_response(),
        Ok(true) => match repository::find_by_id(&ctx.db_conn.pool, restaurant_id).await {
            Ok(Some(restaurant)) => {
                (StatusCode::OK, Json(json!(RestaurantDto::from(restaurant)))).into_response()
            }
            Ok(None) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            )
                .into_response(),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch restaurant" })),
            )
                .into_response(),
        },
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch restaurant" })),
        )
            .into_response(),
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateRestaurantBody {
    #[validate(length(min = 1))]
    restaurant_name: String,
}

async fn create_restaurant(
    State(ctx): State<Arc<Context>>,
    body: Result<Json<CreateRestaurantBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid request body" })),
            )
                .into_response()
        }
    };

    if let Err(errors) = body.validate() {
        tracing::warn!("Failed to validate payload: {errors}");
        return validation::into_response(errors).into_response();
    }

    let restaurants = match repository::find_many(&ctx.db_conn.pool).await {
        Ok(restaurants) => restaurants,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch restaurants" })),
            )
                .into_response()
        }
    };

    if restaurants
        .iter()
        .any(|r| validation::natural_key_matches(&r.restaurant_name, &body.restaurant_name))
    {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "Restaurant already exists!" })),
        )
            .into_response();
    }

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateRestaurantPayload {
            restaurant_name: body.restaurant_name,
        },
    )
    .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Successfully created!" })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Something went wrong while saving!" })),
        )
            .into_response(),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(get_restaurants).post(create_restaurant))
        .route("/:restaurant_id", get(get_restaurant_by_id))
}
