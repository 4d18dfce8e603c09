use axum::{
    routing::{get, on},
    Json, Router,
};
use fleet::database::Database;
use serde::Serialize;

pub mod v1;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        format!("/api{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .nest_service("/v1", v1::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Liveness answer. `version` lets the tracking client spot a stale backend.
#[derive(Debug, Serialize)]
struct Pong {
    message: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn ping() -> Json<Pong> {
    Json(Pong {
        message: "pong!",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
