pub mod handlers;
pub mod repo;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_favourites).post(handlers::create_favourite),
        )
        .route("/:id", delete(handlers::delete_favourite))
}
