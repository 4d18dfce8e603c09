use async_trait::async_trait;
use chrono::{DateTime, Local};
use fleet::database::{PositionRepo, Result};
use model::{position::RecordedPosition, route::Route, WithId};
use sqlx::prelude::FromRow;
use utility::id::Id;

use super::DatabaseRow;
use crate::{
    queries::position::{get_by_run, insert},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

#[derive(Debug, Clone, FromRow)]
pub struct PositionRow {
    pub id: i64,
    pub run_id: i32,
    pub lat: f64,
    pub lon: f64,
    pub owner_id: String,
    pub recorded_at: DateTime<Local>,
}

impl DatabaseRow for PositionRow {
    type Model = RecordedPosition;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        RecordedPosition {
            run_id: Id::new(self.run_id),
            lat: self.lat,
            lon: self.lon,
            owner_id: self.owner_id,
            recorded_at: self.recorded_at,
        }
    }
}

#[async_trait]
impl PositionRepo for PgDatabaseAutocommit {
    async fn insert_position(
        &mut self,
        position: RecordedPosition,
    ) -> Result<WithId<RecordedPosition>> {
        insert(&self.pool, position).await
    }

    async fn get_positions(
        &mut self,
        run_id: Id<Route>,
        owner_id: Option<&str>,
    ) -> Result<Vec<WithId<RecordedPosition>>> {
        get_by_run(&self.pool, run_id, owner_id).await
    }
}

#[async_trait]
impl<'a> PositionRepo for PgDatabaseTransaction<'a> {
    async fn insert_position(
        &mut self,
        position: RecordedPosition,
    ) -> Result<WithId<RecordedPosition>> {
        insert(&mut *self.tx, position).await
    }

    async fn get_positions(
        &mut self,
        run_id: Id<Route>,
        owner_id: Option<&str>,
    ) -> Result<Vec<WithId<RecordedPosition>>> {
        get_by_run(&mut *self.tx, run_id, owner_id).await
    }
}
