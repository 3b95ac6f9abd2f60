use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use super::repository::{self, OrderDto};
use crate::{
    modules::{
        dish::{self, repository::DishDto},
        user::repository::UserDto,
    },
    types::Context,
    utils::validation,
};

async fn get_orders(State(ctx): State<Arc<Context>>) -> Response {
    match repository::find_many(&ctx.db_conn.pool).await {
        Ok(orders) => {
            let orders = orders.into_iter().map(OrderDto::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(json!(orders))).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch orders" })),
        )
            .into_response(),
    }
}

async fn get_order_by_id(Path(order_id): Path<i32>, State(ctx): State<Arc<Context>>) -> Response {
    match repository::exists_by_id(&ctx.db_conn.pool, order_id).await {
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Order not found" })),
        )
            .into_response(),
        Ok(true) => match repository::find_by_id(&ctx.db_conn.pool, order_id).await {
            Ok(Some(order)) => (StatusCode::OK, Json(json!(OrderDto::from(order)))).into_response(),
            Ok(None) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Order not found" })),
            )
                .into_response(),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch order" })),
            )
                .into_response(),
        },
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch order" })),
        )
            .into_response(),
    }
}

async fn get_user_from_order(
    Path(order_id): Path<i32>,
    State(ctx): State<Arc<Context>>,
) -> Response {
    match repository::exists_by_id(&ctx.db_conn.pool, order_id).await {
        Ok(false) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Order not found" })),
            )
                .into_response()
        }
        Ok(true) => (),
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch order" })),
            )
                .into_response()
        }
    }

    match repository::find_owner_by_id(&ctx.db_conn.pool, order_id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(json!(UserDto::from(user)))).into_response(),
        Ok(None) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch order owner" })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch order owner" })),
        )
            .into_response(),
    }
}

async fn get_dishes_from_order(
    Path(order_id): Path<i32>,
    State(ctx): State<Arc<Context>>,
) -> Response {
    match repository::exists_by_id(&ctx.db_conn.pool, order_id).await {
        Ok(false) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Order not found" })),
            )
                .into_response()
        }
        Ok(true) => (),
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch order" })),
            )
                .into_response()
        }
    }

    match dish::repository::find_by_order_id(&ctx.db_conn.pool, order_id).await {
        Ok(dishes) => {
            let dishes = dishes.into_iter().map(DishDto::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(json!(dishes))).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch dishes" })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderQuery {
    user_id: i32,
    dish_id: i32,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateOrderBody {
    #[validate(length(min = 1))]
    order_code: String,
}

async fn create_order(
    State(ctx): State<Arc<Context>>,
    Query(query): Query<CreateOrderQuery>,
    body: Result<Json<CreateOrderBody>, JsonRejection>,
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

    let orders = match repository::find_many(&ctx.db_conn.pool).await {
        Ok(orders) => orders,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch orders" })),
            )
                .into_response()
        }
    };

    if orders
        .iter()
        .any(|o| validation::natural_key_matches(&o.order_code, &body.order_code))
    {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "Order already exists!" })),
        )
            .into_response();
    }

    let err = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Something went wrong with saving!" })),
    );

    // An unknown dishId or userId stays a plain save failure, not a 404.
    let dish = match dish::repository::find_by_id(&ctx.db_conn.pool, query.dish_id).await {
        Ok(Some(dish)) => dish,
        Ok(None) | Err(_) => return err.into_response(),
    };

    let mut tx = match ctx.db_conn.pool.begin().await {
        Ok(tx) => tx,
        Err(err_tx) => {
            tracing::error!("Failed to start database transaction: {}", err_tx);
            return err.into_response();
        }
    };

    let order = match repository::create(
        &mut *tx,
        repository::CreateOrderPayload {
            order_code: body.order_code,
            user_id: query.user_id,
        },
    )
    .await
    {
        Ok(order) => order,
        Err(_) => return err.into_response(),
    };

    if repository::attach_dish(&mut *tx, order.id, dish.id)
        .await
        .is_err()
    {
        return err.into_response();
    }

    match tx.commit().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Successfully created!" })),
        )
            .into_response(),
        Err(err_tx) => {
            tracing::error!("Failed to commit database transaction: {}", err_tx);
            err.into_response()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOrderQuery {
    dish_id: i32,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateOrderBody {
    id: i32,
    #[validate(length(min = 1))]
    order_code: String,
}

async fn update_order(
    Path(order_id): Path<i32>,
    Query(query): Query<UpdateOrderQuery>,
    State(ctx): State<Arc<Context>>,
    body: Result<Json<UpdateOrderBody>, JsonRejection>,
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

    if order_id != body.id {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Order id mismatch" })),
        )
            .into_response();
    }

    if let Err(errors) = body.validate() {
        tracing::warn!("Failed to validate payload: {errors}");
        return validation::into_response(errors).into_response();
    }

    match repository::exists_by_id(&ctx.db_conn.pool, order_id).await {
        Ok(true) => (),
        Ok(false) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Order not found" })),
            )
                .into_response()
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch order" })),
            )
                .into_response()
        }
    }

    let err = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Something went wrong updating order!" })),
    );

    let dish = match dish::repository::find_by_id(&ctx.db_conn.pool, query.dish_id).await {
        Ok(Some(dish)) => dish,
        Ok(None) | Err(_) => return err.into_response(),
    };

    let mut tx = match ctx.db_conn.pool.begin().await {
        Ok(tx) => tx,
        Err(err_tx) => {
            tracing::error!("Failed to start database transaction: {}", err_tx);
            return err.into_response();
        }
    };

    if repository::update_by_id(
        &mut *tx,
        order_id,
        repository::UpdateOrderPayload {
            order_code: body.order_code,
        },
    )
    .await
    .is_err()
    {
        return err.into_response();
    }

    // The documented surface carries a single dish reference, so the
    // attachment is replaced wholesale.
    if repository::detach_dishes(&mut *tx, order_id).await.is_err() {
        return err.into_response();
    }

    if repository::attach_dish(&mut *tx, order_id, dish.id)
        .await
        .is_err()
    {
        return err.into_response();
    }

    match tx.commit().await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err_tx) => {
            tracing::error!("Failed to commit database transaction: {}", err_tx);
            err.into_response()
        }
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(get_orders).post(create_order))
        .route("/:order_id", get(get_order_by_id).put(update_order))
        .route("/:order_id/user", get(get_user_from_order))
        .route("/:order_id/dish", get(get_dishes_from_order))
}

// The rejection branches below run before any query is issued, so they are
// exercised against a lazy pool that never opens a connection. Branches that
// consult the store (the exists checks behind 404) need a live database and
// are not covered here.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppContext, AppEnvironment, Context};
    use crate::utils::database::DatabaseConnection;
    use axum::{body::Body, extract::FromRequest, http::Request};
    use sqlx::postgres::PgPoolOptions;

    fn test_context() -> Arc<Context> {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost:5432/checknget_test")
            .unwrap();

        Arc::new(Context {
            app: AppContext {
                host: String::from("127.0.0.1"),
                environment: AppEnvironment::Development,
                port: 8000,
                url: String::from("http://127.0.0.1:8000"),
            },
            db_conn: DatabaseConnection { pool },
        })
    }

    async fn rejected_body<T: serde::de::DeserializeOwned>() -> JsonRejection {
        Json::<T>::from_request(Request::new(Body::empty()), &())
            .await
            .err()
            .unwrap()
    }

    #[tokio::test]
    async fn update_rejects_mismatched_ids_before_touching_the_store() {
        let response = update_order(
            Path(5),
            Query(UpdateOrderQuery { dish_id: 1 }),
            State(test_context()),
            Ok(Json(UpdateOrderBody {
                id: 7,
                order_code: String::from("ORD-7"),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_rejects_missing_body() {
        let response = update_order(
            Path(5),
            Query(UpdateOrderQuery { dish_id: 1 }),
            State(test_context()),
            Err(rejected_body::<UpdateOrderBody>().await),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_rejects_missing_body() {
        let response = create_order(
            State(test_context()),
            Query(CreateOrderQuery {
                user_id: 1,
                dish_id: 1,
            }),
            Err(rejected_body::<CreateOrderBody>().await),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_rejects_blank_order_code() {
        let response = create_order(
            State(test_context()),
            Query(CreateOrderQuery {
                user_id: 1,
                dish_id: 1,
            }),
            Ok(Json(CreateOrderBody {
                order_code: String::new(),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
