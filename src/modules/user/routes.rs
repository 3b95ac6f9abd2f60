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

use super::repository::{self, UserDto};
use crate::{
    modules::{
        auth::middleware::{AdminAuth, Auth},
        order::repository::OrderDto,
    },
    types::Context,
    utils::validation,
};

async fn get_users(State(ctx): State<Arc<Context>>, _auth: AdminAuth) -> Response {
    match repository::find_many(&ctx.db_conn.pool).await {
        Ok(users) => {
            let users = users.into_iter().map(UserDto::from).collect::<Vec<_>>();
            (StatusCode::OK, Json(json!(users))).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch users" })),
        )
            .into_response(),
    }
}

async fn get_user_by_id(
    Path(user_id): Path<i32>,
    State(ctx): State<Arc<Context>>,
    _auth: AdminAuth,
) -> Response {
    match repository::exists_by_id(&ctx.db_conn.pool, user_id).await {
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        )
            .into_response(),
        Ok(true) => match repository::find_by_id(&ctx.db_conn.pool, user_id).await {
            Ok(Some(user)) => (StatusCode::OK, Json(json!(UserDto::from(user)))).into_response(),
            Ok(None) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "User not found" })),
            )
                .into_response(),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch user" })),
            )
                .into_response(),
        },
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch user" })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct UserNameQuery {
    #[serde(rename = "userName")]
    user_name: String,
}

async fn get_user_by_username(
    Query(query): Query<UserNameQuery>,
    State(ctx): State<Arc<Context>>,
    _auth: AdminAuth,
) -> Response {
    match repository::exists_by_username(&ctx.db_conn.pool, query.user_name.clone()).await {
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        )
            .into_response(),
        Ok(true) => match repository::find_by_username(&ctx.db_conn.pool, query.user_name).await {
            Ok(Some(user)) => (StatusCode::OK, Json(json!(UserDto::from(user)))).into_response(),
            Ok(None) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "User not found" })),
            )
                .into_response(),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch user" })),
            )
                .into_response(),
        },
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch user" })),
        )
            .into_response(),
    }
}

/// Reachable by any authenticated role; an unknown id yields an empty list.
async fn get_orders_by_user(
    Path(user_id): Path<i32>,
    State(ctx): State<Arc<Context>>,
    _auth: Auth,
) -> Response {
    match repository::find_orders_by_user_id(&ctx.db_conn.pool, user_id).await {
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

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateUserBody {
    #[validate(length(min = 1))]
    user_name: String,
    first_name: String,
    last_name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    password: String,
}

async fn create_user(
    State(ctx): State<Arc<Context>>,
    _auth: AdminAuth,
    body: Result<Json<CreateUserBody>, JsonRejection>,
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

    let users = match repository::find_many(&ctx.db_conn.pool).await {
        Ok(users) => users,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch users" })),
            )
                .into_response()
        }
    };

    if users
        .iter()
        .any(|u| validation::natural_key_matches(&u.user_name, &body.user_name))
    {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "User already exists!" })),
        )
            .into_response();
    }

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateUserPayload {
            user_name: body.user_name,
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            password: body.password,
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
            Json(json!({ "error": "Something went wrong with saving!" })),
        )
            .into_response(),
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateUserBody {
    id: i32,
    #[validate(length(min = 1))]
    user_name: String,
    first_name: String,
    last_name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    password: String,
}

async fn update_user(
    Path(user_id): Path<i32>,
    State(ctx): State<Arc<Context>>,
    _auth: AdminAuth,
    body: Result<Json<UpdateUserBody>, JsonRejection>,
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

    if user_id != body.id {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "User id mismatch" })),
        )
            .into_response();
    }

    if let Err(errors) = body.validate() {
        tracing::warn!("Failed to validate payload: {errors}");
        return validation::into_response(errors).into_response();
    }

    match repository::exists_by_id(&ctx.db_conn.pool, user_id).await {
        Ok(true) => (),
        Ok(false) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "User not found" })),
            )
                .into_response()
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch user" })),
            )
                .into_response()
        }
    }

    match repository::update_by_id(
        &ctx.db_conn.pool,
        user_id,
        repository::UpdateUserPayload {
            user_name: body.user_name,
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            password: body.password,
        },
    )
    .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Something went wrong updating user!" })),
        )
            .into_response(),
    }
}

async fn delete_user(
    Path(user_id): Path<i32>,
    State(ctx): State<Arc<Context>>,
    _auth: AdminAuth,
) -> Response {
    match repository::exists_by_id(&ctx.db_conn.pool, user_id).await {
        Ok(true) => (),
        Ok(false) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "User not found" })),
            )
                .into_response()
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch user" })),
            )
                .into_response()
        }
    }

    match repository::delete_by_id(&ctx.db_conn.pool, user_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Something went wrong deleting user" })),
        )
            .into_response(),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/userName", get(get_user_by_username))
        .route(
            "/:user_id",
            get(get_user_by_id).put(update_user).delete(delete_user),
        )
        .route("/:user_id/order", get(get_orders_by_user))
}

// Rejection branches return before any query runs, so a lazy pool that never
// connects is enough. The exists-backed 404 paths need a live database and
// are not covered here.
#[cfg(test)]
mod tests {
    use super::repository::{Role, User};
    use super::*;
    use crate::types::{AppContext, AppEnvironment, Context};
    use crate::utils::database::DatabaseConnection;
    use axum::{body::Body, extract::FromRequest, http::Request};
    use chrono::NaiveDate;
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

    fn admin_auth() -> AdminAuth {
        AdminAuth {
            user: User {
                id: 1,
                user_name: String::from("root"),
                first_name: String::from("Ada"),
                last_name: String::from("Admin"),
                email: String::from("admin@example.com"),
                password: String::from("hunter2"),
                role: Role::Admin,
                created_at: NaiveDate::from_ymd_opt(2024, 8, 15)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
                updated_at: None,
            },
        }
    }

    async fn rejected_body<T: serde::de::DeserializeOwned>() -> JsonRejection {
        Json::<T>::from_request(Request::new(Body::empty()), &())
            .await
            .err()
            .unwrap()
    }

    #[tokio::test]
    async fn update_rejects_mismatched_ids_before_touching_the_store() {
        let response = update_user(
            Path(5),
            State(test_context()),
            admin_auth(),
            Ok(Json(UpdateUserBody {
                id: 7,
                user_name: String::from("alice"),
                first_name: String::from("Alice"),
                last_name: String::from("Adams"),
                email: String::from("alice@example.com"),
                password: String::from("hunter2"),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_rejects_missing_body() {
        let response = update_user(
            Path(5),
            State(test_context()),
            admin_auth(),
            Err(rejected_body::<UpdateUserBody>().await),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_rejects_missing_body() {
        let response = create_user(
            State(test_context()),
            admin_auth(),
            Err(rejected_body::<CreateUserBody>().await),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_rejects_malformed_email() {
        let response = create_user(
            State(test_context()),
            admin_auth(),
            Ok(Json(CreateUserBody {
                user_name: String::from("alice"),
                first_name: String::from("Alice"),
                last_name: String::from("Adams"),
                email: String::from("not-an-email"),
                password: String::from("hunter2"),
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
