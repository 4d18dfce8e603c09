use fleet::database::Result;
use model::{vehicle::Vehicle, WithId};
use sqlx::{Executor, Postgres};
use utility::{id::Id, let_also::LetAlso};

use super::convert_error;
use crate::data_model::{vehicle::VehicleRow, with_id, with_ids};

pub async fn get_all<'c, E>(
    executor: E,
    owner_id: Option<&str>,
) -> Result<Vec<WithId<Vehicle>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT id, plate, brand, model, active, owner_id
        FROM vehicles
        WHERE $1::text IS NULL OR owner_id = $1
        ORDER BY id;
        ",
    )
    .bind(owner_id)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|vehicles: Vec<VehicleRow>| Ok(with_ids(vehicles)))
}

pub async fn insert<'c, E>(executor: E, vehicle: Vehicle) -> Result<WithId<Vehicle>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO vehicles(plate, brand, model, active, owner_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, plate, brand, model, active, owner_id;
        ",
    )
    .bind(&vehicle.plate)
    .bind(&vehicle.brand)
    .bind(&vehicle.model)
    .bind(vehicle.active)
    .bind(&vehicle.owner_id)
    .fetch_one(executor)
    .await
    .map(|row: VehicleRow| with_id(row))
    .map_err(convert_error)
}

pub async fn update<'c, E>(
    executor: E,
    vehicle: WithId<Vehicle>,
) -> Result<WithId<Vehicle>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        UPDATE vehicles
        SET plate = $2, brand = $3, model = $4, active = $5, owner_id = $6
        WHERE id = $1
        RETURNING id, plate, brand, model, active, owner_id;
        ",
    )
    .bind(vehicle.id.raw())
    .bind(&vehicle.content.plate)
    .bind(&vehicle.content.brand)
    .bind(&vehicle.content.model)
    .bind(vehicle.content.active)
    .bind(&vehicle.content.owner_id)
    .fetch_one(executor)
    .await
    .map(|row: VehicleRow| with_id(row))
    .map_err(convert_error)
}

pub async fn delete<'c, E>(
    executor: E,
    id: Id<Vehicle>,
    owner_id: Option<&str>,
) -> Result<WithId<Vehicle>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        DELETE FROM vehicles
        WHERE id = $1 AND ($2::text IS NULL OR owner_id = $2)
        RETURNING id, plate, brand, model, active, owner_id;
        ",
    )
    .bind(id.raw())
    .bind(owner_id)
    .fetch_one(executor)
    .await
    .map(|row: VehicleRow| with_id(row))
    .map_err(convert_error)
}
