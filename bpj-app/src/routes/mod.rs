pub mod catalog;
pub mod contact;
pub mod estimate;
pub mod health;

use axum::Router;

pub fn router() -> Router {
    Router::new()
        .merge(health::router())
        .merge(catalog::router())
        .merge(contact::router())
        .merge(estimate::router())
}
