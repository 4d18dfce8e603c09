use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    routing::{get, on, put},
    Extension, Json, Router,
};
use fleet::database::Database;
use model::{vehicle::Vehicle, WithId};
use utility::{id::Id, let_also::LetAlso};

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
        crate::api::v1::resource!("/vehicles{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/schema", get(schema::<Vehicle>))
        .route(
            "/:id",
            put(update_vehicle::<D>).delete(delete_vehicle::<D>),
        )
        .route("/", get(get_vehicles::<D>).post(create_vehicle::<D>))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_vehicles<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { fleet_client }): State<WebState<D>>,
    Query(query): Query<OwnerQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<WithId<Vehicle>>>> {
    fleet_client
        .get_vehicles(query.owner_id())
        .await
        .map(|vehicles| {
            vehicles
                .into_iter()
                .map(|vehicle| vehicle_hateoas(vehicle, base_url.clone()))
                .collect::<Vec<_>>()
                .let_owned(|data| VecResponse::non_paginated(data).hateoas().json())
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn create_vehicle<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { fleet_client }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    body: Result<Json<Vehicle>, JsonRejection>,
) -> CreatedResult<WithId<Vehicle>> {
    let vehicle = json_body(body, &Method::POST, original_uri.path())?;
    fleet_client
        .create_vehicle(vehicle)
        .await
        .map(|vehicle| (StatusCode::CREATED, vehicle_hateoas(vehicle, base_url).json()))
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}

async fn update_vehicle<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<i32>,
    State(WebState { fleet_client }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    body: Result<Json<Vehicle>, JsonRejection>,
) -> HateoasResult<WithId<Vehicle>> {
    let vehicle = json_body(body, &Method::PUT, original_uri.path())?;
    fleet_client
        .update_vehicle(Id::new(id), vehicle)
        .await
        .map(|vehicle| vehicle_hateoas(vehicle, base_url).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::PUT)
                .with_uri(original_uri.path())
        })
}

async fn delete_vehicle<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<i32>,
    State(WebState { fleet_client }): State<WebState<D>>,
    Query(query): Query<OwnerQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<WithId<Vehicle>> {
    fleet_client
        .delete_vehicle(Id::new(id), query.owner_id())
        .await
        .map(|vehicle| vehicle_hateoas(vehicle, base_url).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::DELETE)
                .with_uri(original_uri.path())
        })
}

fn vehicle_hateoas(
    vehicle: WithId<Vehicle>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithId<Vehicle>> {
    let id = vehicle.id;
    hateoas::Response::builder(vehicle, base_url)
        .link("self", resource!("/{}", id))
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

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |body| Body::from(body.to_string())))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn truck(plate: &str, owner_id: &str) -> Value {
        json!({"plate": plate, "brand": "Chevrolet", "model": "NPR", "ownerId": owner_id})
    }

    #[tokio::test]
    async fn plates_are_normalized_and_unique() {
        let app = app(WebState::new(MemoryDatabase::new()));
        let (status, vehicle) =
            send(&app, Method::POST, "/api/v1/vehicles", Some(truck("abc 123", "p1"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(vehicle["plate"], "ABC-123");
        assert_eq!(vehicle["active"], true);

        let (status, body) =
            send(&app, Method::POST, "/api/v1/vehicles", Some(truck("ABC-123", "p2"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "An item with this plate already exists.");
    }

    #[tokio::test]
    async fn vehicles_are_listed_updated_and_deleted_per_owner() {
        let app = app(WebState::new(MemoryDatabase::new()));
        send(&app, Method::POST, "/api/v1/vehicles", Some(truck("AAA111", "p1"))).await;
        send(&app, Method::POST, "/api/v1/vehicles", Some(truck("BBB222", "p2"))).await;

        let (_, listed) = send(&app, Method::GET, "/api/v1/vehicles?ownerId=p1", None).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
        let id = listed["data"][0]["id"].as_i64().unwrap();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/vehicles/{}", id),
            Some(truck("aaa112", "p1")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["plate"], "AAA-112");

        let uri = format!("/api/v1/vehicles/{}?ownerId=p2", id);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let uri = format!("/api/v1/vehicles/{}?ownerId=p1", id);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, listed) = send(&app, Method::GET, "/api/v1/vehicles", None).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    }
}
