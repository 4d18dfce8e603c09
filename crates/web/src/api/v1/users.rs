use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, State},
    http::{Method, StatusCode},
    routing::{get, on, post},
    Extension, Json, Router,
};
use fleet::database::Database;
use model::{
    user::{Credentials, NewUser, User},
    WithId,
};
use serde::Serialize;
use utility::let_also::LetAlso;

use crate::{
    common::{
        json_body, route_not_found, schema, CreatedResult, HateoasResult, RouteErrorResponse,
        RouteResult, VecResponse, METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/users{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/schema", get(schema::<User>))
        .route("/register", post(register::<D>))
        .route("/login", post(login::<D>))
        .route("/", get(get_users::<D>))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Serialize)]
struct LoginDto {
    message: &'static str,
    user: hateoas::Response<WithId<User>>,
}

async fn get_users<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { fleet_client }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<WithId<User>>>> {
    fleet_client
        .get_users()
        .await
        .map(|users| {
            users
                .into_iter()
                .map(|user| user_hateoas(user, base_url.clone()))
                .collect::<Vec<_>>()
                .let_owned(|data| VecResponse::non_paginated(data).hateoas().json())
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn register<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { fleet_client }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> CreatedResult<WithId<User>> {
    let new_user = json_body(body, &Method::POST, original_uri.path())?;
    fleet_client
        .register_user(new_user)
        .await
        .map(|user| (StatusCode::CREATED, user_hateoas(user, base_url).json()))
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}

async fn login<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { fleet_client }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> RouteResult<Json<LoginDto>> {
    let credentials = json_body(body, &Method::POST, original_uri.path())?;
    fleet_client
        .login(credentials)
        .await
        .map(|user| {
            Json(LoginDto {
                message: "Login successful",
                user: user_hateoas(user, base_url),
            })
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}

fn user_hateoas(user: WithId<User>, base_url: Arc<BaseUrl>) -> hateoas::Response<WithId<User>> {
    let profile = user.content.profile_id.clone();
    hateoas::Response::builder(user, base_url)
        .link("routes", super::routes::resource!("?ownerId={}", profile))
        .link("vehicles", super::vehicles::resource!("?ownerId={}", profile))
        .link("collection", resource!(""))
        .build()
}
