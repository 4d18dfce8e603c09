use axum::{routing::on, Router};
use fleet::database::Database;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

mod positions;
mod routes;
mod users;
mod vehicles;

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::resource!("/v1{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .nest_service("/routes", routes::routes(state.clone()))
        .nest_service("/recorridos", positions::routes(state.clone()))
        .nest_service("/users", users::routes(state.clone()))
        .nest_service("/vehicles", vehicles::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}
