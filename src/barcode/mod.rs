pub mod client;
pub mod handlers;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:code", get(handlers::lookup_barcode))
}
