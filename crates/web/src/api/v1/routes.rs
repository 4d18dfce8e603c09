use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    routing::{get, on},
    Extension, Json, Router,
};
use fleet::database::Database;
use model::{
    geometry::{self, RawShape},
    route::{NewRoute, Route},
    WithId,
};
use serde::Deserialize;
use utility::{id::Id, let_also::LetAlso};

use super::positions;
use crate::{
    common::{
        json_body, route_not_found, schema, CreatedResult, HateoasResult, OwnerQuery,
        RouteErrorResponse, VecResponse, METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/routes{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/schema", get(schema::<Route>))
        .route("/:id", get(get_route::<D>))
        .route("/", get(get_routes::<D>).post(create_route::<D>))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Creation body. Unlike [`NewRoute`] the shape may still be serialized text.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteBody {
    #[serde(
        default,
        alias = "nombre_ruta",
        deserialize_with = "utility::serde::trimmed::deserialize"
    )]
    name: String,
    #[serde(default, alias = "perfil_id")]
    owner_id: String,
    shape: RawShape,
}

impl From<RouteBody> for NewRoute {
    fn from(body: RouteBody) -> Self {
        NewRoute {
            name: body.name,
            owner_id: body.owner_id,
            shape: geometry::normalize(body.shape),
        }
    }
}

async fn get_routes<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { fleet_client }): State<WebState<D>>,
    Query(query): Query<OwnerQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<WithId<Route>>>> {
    fleet_client
        .get_routes(query.owner_id())
        .await
        .map(|routes| {
            routes
                .into_iter()
                .map(|route| route_hateoas(route, base_url.clone()))
                .collect::<Vec<_>>()
                .let_owned(|data| VecResponse::non_paginated(data).hateoas().json())
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn get_route<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<i32>,
    State(WebState { fleet_client }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<WithId<Route>> {
    fleet_client
        .get_route(Id::new(id))
        .await
        .map(|route| route_hateoas(route, base_url).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn create_route<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { fleet_client }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    body: Result<Json<RouteBody>, JsonRejection>,
) -> CreatedResult<WithId<Route>> {
    let body = json_body(body, &Method::POST, original_uri.path())?;
    fleet_client
        .create_route(body.into())
        .await
        .map(|route| (StatusCode::CREATED, route_hateoas(route, base_url).json()))
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}

pub(crate) fn route_hateoas(
    route: WithId<Route>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithId<Route>> {
    let id = route.id;
    let length_km = route.content.length_km();
    hateoas::Response::builder(route, base_url)
        .link("self", resource!("/{}", id))
        .link("positions", positions::resource!("/{}/posiciones", id))
        .debug_info("lengthKm", length_km)
        .build()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use fleet::memory::MemoryDatabase;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::app;

    async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn string_shapes_are_normalized_before_storage() {
        let app = app(WebState::new(MemoryDatabase::new()));
        let (status, created) = send(
            &app,
            post(
                "/api/v1/routes",
                json!({
                    "name": " Ruta Norte ",
                    "ownerId": "p1",
                    "shape": "{\"type\":\"MultiLineString\",\"coordinates\":[[[0,0],[1,1]],[[2,2],[3,3]]]}"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["name"], "Ruta Norte");
        assert_eq!(
            created["shape"],
            json!({"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]})
        );

        let (status, listed) = send(&app, get("/api/v1/routes?ownerId=p1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
        assert_eq!(listed["data"][0]["id"], created["id"]);
        assert!(listed["data"][0]["links"][0]["href"]
            .as_str()
            .unwrap()
            .ends_with(&format!("/api/v1/routes/{}", created["id"])));
    }

    #[tokio::test]
    async fn routes_need_two_points_and_a_name() {
        let app = app(WebState::new(MemoryDatabase::new()));
        let one_point = json!({"type": "LineString", "coordinates": [[0, 0]]});
        let (status, _) = send(
            &app,
            post("/api/v1/routes", json!({"name": "x", "ownerId": "p1", "shape": one_point})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let two_points = json!({"type": "LineString", "coordinates": [[0, 0], [1, 1]]});
        let (status, _) = send(
            &app,
            post("/api/v1/routes", json!({"name": " ", "ownerId": "p1", "shape": two_points})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, post("/api/v1/routes", json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let app = app(WebState::new(MemoryDatabase::new()));
        let (status, body) = send(&app, get("/api/v1/routes/41")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "The requested item does not exist.");

        let (status, body) = send(&app, get("/api/v1/nothing/here")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["requestedUri"], "/api/v1/nothing/here");
    }

    #[tokio::test]
    async fn schema_is_published() {
        let app = app(WebState::new(MemoryDatabase::new()));
        let (status, body) = send(&app, get("/api/v1/routes/schema")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Route");
    }
}
