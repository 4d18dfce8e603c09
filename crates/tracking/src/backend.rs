use std::{error, fmt, sync::Arc};

use async_trait::async_trait;
use model::{
    position::PositionReport,
    route::{NewRoute, Route, RouteRecord},
    user::User,
    WithId,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utility::id::Id;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";

#[derive(Debug, Clone)]
pub enum BackendError {
    RequestError(Arc<reqwest::Error>),
    JsonError(Arc<serde_json::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        response: Option<String>,
    },
}

impl error::Error for BackendError {}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BackendError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            BackendError::JsonError(e) => write!(f, "JSON parse error: {}", e),
            BackendError::InvalidResponse {
                status_code,
                url,
                response,
            } => match response {
                Some(text) => {
                    write!(f, "Invalid Response ({}) {}: {}", status_code, text, url)
                }
                None => write!(f, "Invalid Response({}) {}", status_code, url),
            },
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::RequestError(Arc::new(e))
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::JsonError(Arc::new(e))
    }
}

/// The server side of route tracking, as far as the client needs it.
#[async_trait]
pub trait RouteBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str)
        -> Result<WithId<User>, BackendError>;

    /// Routes of a profile, shapes already normalized.
    async fn list_routes(&self, owner_id: &str) -> Result<Vec<WithId<Route>>, BackendError>;

    async fn create_route(&self, route: &NewRoute) -> Result<WithId<Route>, BackendError>;

    async fn report_position(
        &self,
        run_id: Id<Route>,
        report: &PositionReport,
    ) -> Result<(), BackendError>;
}

/// Route lists come bare or wrapped, depending on the server.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RouteList {
    Bare(Vec<RouteRecord<i32>>),
    Data { data: Vec<RouteRecord<i32>> },
    Rutas { rutas: Vec<RouteRecord<i32>> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SingleRoute {
    Data { data: RouteRecord<i32> },
    Bare(RouteRecord<i32>),
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    user: WithId<User>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

fn into_route(record: RouteRecord<i32>) -> WithId<Route> {
    let (id, route) = record.normalize();
    WithId::new(Id::new(id), route)
}

pub fn decode_route_list(body: &str) -> Result<Vec<WithId<Route>>, BackendError> {
    let records = match serde_json::from_str::<RouteList>(body)? {
        RouteList::Bare(records) => records,
        RouteList::Data { data } => data,
        RouteList::Rutas { rutas } => rutas,
    };
    Ok(records.into_iter().map(into_route).collect())
}

pub fn decode_route(body: &str) -> Result<WithId<Route>, BackendError> {
    let record = match serde_json::from_str::<SingleRoute>(body)? {
        SingleRoute::Data { data } => data,
        SingleRoute::Bare(record) => record,
    };
    Ok(into_route(record))
}

/// Talks to the REST API of the `web` crate (or anything shaped like it).
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn body(response: reqwest::Response, url: String) -> Result<String, BackendError> {
        let status_code = response.status();
        if status_code.is_success() {
            return Ok(response.text().await?);
        }
        Err(BackendError::InvalidResponse {
            status_code,
            url,
            response: response.text().await.ok(),
        })
    }

    async fn post<B>(&self, endpoint: &str, body: &B) -> Result<String, BackendError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(endpoint);
        log::debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        Self::body(response, url).await
    }

    async fn get(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<String, BackendError> {
        let url = self.url(endpoint);
        log::debug!("GET {} {:?}", url, query);
        let response = self.client.get(&url).query(query).send().await?;
        Self::body(response, url).await
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl RouteBackend for HttpBackend {
    async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<WithId<User>, BackendError> {
        let body = self
            .post("users/login", &LoginRequest { email, password })
            .await?;
        Ok(decode::<LoginResponse>(&body)?.user)
    }

    async fn list_routes(&self, owner_id: &str) -> Result<Vec<WithId<Route>>, BackendError> {
        decode_route_list(&self.get("routes", &[("ownerId", owner_id)]).await?)
    }

    async fn create_route(&self, route: &NewRoute) -> Result<WithId<Route>, BackendError> {
        decode_route(&self.post("routes", route).await?)
    }

    async fn report_position(
        &self,
        run_id: Id<Route>,
        report: &PositionReport,
    ) -> Result<(), BackendError> {
        self.post(&format!("recorridos/{}/posiciones", run_id), report)
            .await
            .map(|_| ())
    }
}
