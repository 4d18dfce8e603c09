use async_trait::async_trait;
use chrono::{DateTime, Local};
use fleet::database::{Result, RouteRepo};
use model::{geometry::RouteShape, route::Route, WithId};
use sqlx::{prelude::FromRow, types::Json};
use utility::id::Id;

use super::DatabaseRow;
use crate::{
    queries::route::{get, get_all, insert},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

#[derive(Debug, Clone, FromRow)]
pub struct RouteRow {
    pub id: i32,
    pub name: String,
    pub owner_id: String,
    pub shape: Json<RouteShape>,
    pub created_at: DateTime<Local>,
}

impl DatabaseRow for RouteRow {
    type Model = Route;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        Route {
            name: self.name,
            owner_id: self.owner_id,
            shape: self.shape.0,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl RouteRepo for PgDatabaseAutocommit {
    async fn get_routes(&mut self, owner_id: Option<&str>) -> Result<Vec<WithId<Route>>> {
        get_all(&self.pool, owner_id).await
    }

    async fn get_route(&mut self, id: Id<Route>) -> Result<WithId<Route>> {
        get(&self.pool, id).await
    }

    async fn insert_route(&mut self, route: Route) -> Result<WithId<Route>> {
        insert(&self.pool, route).await
    }
}

#[async_trait]
impl<'a> RouteRepo for PgDatabaseTransaction<'a> {
    async fn get_routes(&mut self, owner_id: Option<&str>) -> Result<Vec<WithId<Route>>> {
        get_all(&mut *self.tx, owner_id).await
    }

    async fn get_route(&mut self, id: Id<Route>) -> Result<WithId<Route>> {
        get(&mut *self.tx, id).await
    }

    async fn insert_route(&mut self, route: Route) -> Result<WithId<Route>> {
        insert(&mut *self.tx, route).await
    }
}
