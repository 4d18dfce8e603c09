use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    routing::{get, on},
    Extension, Json, Router,
};
use fleet::database::Database;
use model::{
    position::{PositionReport, RecordedPosition},
    route::Route,
    WithId,
};
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
        crate::api::v1::resource!("/recorridos{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

/// Positions are grouped by run. A run is identified by the route it follows.
pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/schema", get(schema::<RecordedPosition>))
        .route(
            "/:id/posiciones",
            get(get_positions::<D>).post(report_position::<D>),
        )
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_positions<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(run_id): Path<i32>,
    State(WebState { fleet_client }): State<WebState<D>>,
    Query(query): Query<OwnerQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<WithId<RecordedPosition>>>> {
    fleet_client
        .get_positions(Id::new(run_id), query.owner_id())
        .await
        .map(|positions| {
            positions
                .into_iter()
                .map(|position| position_hateoas(position, base_url.clone()))
                .collect::<Vec<_>>()
                .let_owned(|data| VecResponse::non_paginated(data).hateoas().json())
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn report_position<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(run_id): Path<i32>,
    State(WebState { fleet_client }): State<WebState<D>>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    body: Result<Json<PositionReport>, JsonRejection>,
) -> CreatedResult<WithId<RecordedPosition>> {
    let report = json_body(body, &Method::POST, original_uri.path())?;
    fleet_client
        .report_position(Id::<Route>::new(run_id), report)
        .await
        .map(|position| {
            (
                StatusCode::CREATED,
                position_hateoas(position, base_url).json(),
            )
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })
}

fn position_hateoas(
    position: WithId<RecordedPosition>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithId<RecordedPosition>> {
    let run_id = position.content.run_id;
    hateoas::Response::builder(position, base_url)
        .link("run", resource!("/{}/posiciones", run_id))
        .link("route", super::routes::resource!("/{}", run_id))
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

    async fn send(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn app_with_route() -> Router {
        let app = app(WebState::new(MemoryDatabase::new()));
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/routes",
            json!({
                "name": "Ruta Norte",
                "ownerId": "p1",
                "shape": {"type": "LineString", "coordinates": [[-77.03, 3.88], [-77.02, 3.89]]}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        app
    }

    #[tokio::test]
    async fn positions_are_recorded_per_run() {
        let app = app_with_route().await;
        for lat in [3.881, 3.882] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/api/v1/recorridos/1/posiciones",
                json!({"lat": lat, "lon": -77.03, "ownerId": "p1"}),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["runId"], 1);
        }

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/v1/recorridos/1/posiciones?ownerId=p1",
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["lat"], 3.881);
    }

    #[tokio::test]
    async fn positions_of_unknown_runs_are_refused() {
        let app = app_with_route().await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/recorridos/9/posiciones",
            json!({"lat": 3.88, "lon": -77.03, "ownerId": "p1"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn out_of_range_positions_are_bad_requests() {
        let app = app_with_route().await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/recorridos/1/posiciones",
            json!({"lat": 93.0, "lon": -77.03, "ownerId": "p1"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
