use async_trait::async_trait;
use fleet::database::{Result, VehicleRepo};
use model::{vehicle::Vehicle, WithId};
use sqlx::prelude::FromRow;
use utility::id::Id;

use super::DatabaseRow;
use crate::{
    queries::vehicle::{delete, get_all, insert, update},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

#[derive(Debug, Clone, FromRow)]
pub struct VehicleRow {
    pub id: i32,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub active: bool,
    pub owner_id: String,
}

impl DatabaseRow for VehicleRow {
    type Model = Vehicle;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        Vehicle {
            plate: self.plate,
            brand: self.brand,
            model: self.model,
            active: self.active,
            owner_id: self.owner_id,
        }
    }
}

#[async_trait]
impl VehicleRepo for PgDatabaseAutocommit {
    async fn get_vehicles(
        &mut self,
        owner_id: Option<&str>,
    ) -> Result<Vec<WithId<Vehicle>>> {
        get_all(&self.pool, owner_id).await
    }

    async fn insert_vehicle(&mut self, vehicle: Vehicle) -> Result<WithId<Vehicle>> {
        insert(&self.pool, vehicle).await
    }

    async fn update_vehicle(
        &mut self,
        vehicle: WithId<Vehicle>,
    ) -> Result<WithId<Vehicle>> {
        update(&self.pool, vehicle).await
    }

    async fn delete_vehicle(
        &mut self,
        id: Id<Vehicle>,
        owner_id: Option<&str>,
    ) -> Result<WithId<Vehicle>> {
        delete(&self.pool, id, owner_id).await
    }
}

#[async_trait]
impl<'a> VehicleRepo for PgDatabaseTransaction<'a> {
    async fn get_vehicles(
        &mut self,
        owner_id: Option<&str>,
    ) -> Result<Vec<WithId<Vehicle>>> {
        get_all(&mut *self.tx, owner_id).await
    }

    async fn insert_vehicle(&mut self, vehicle: Vehicle) -> Result<WithId<Vehicle>> {
        insert(&mut *self.tx, vehicle).await
    }

    async fn update_vehicle(
        &mut self,
        vehicle: WithId<Vehicle>,
    ) -> Result<WithId<Vehicle>> {
        update(&mut *self.tx, vehicle).await
    }

    async fn delete_vehicle(
        &mut self,
        id: Id<Vehicle>,
        owner_id: Option<&str>,
    ) -> Result<WithId<Vehicle>> {
        delete(&mut *self.tx, id, owner_id).await
    }
}
