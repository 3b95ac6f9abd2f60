use super::{order, restaurant, user};
use crate::types::Context;
use axum::routing::Router;
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .nest("/order", order::get_router())
        .nest("/restaurant", restaurant::get_router())
        .nest("/user", user::get_router())
}
