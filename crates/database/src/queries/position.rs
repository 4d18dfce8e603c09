use fleet::database::Result;
use model::{position::RecordedPosition, route::Route, WithId};
use sqlx::{Executor, Postgres};
use utility::{id::Id, let_also::LetAlso};

use super::convert_error;
use crate::data_model::{position::PositionRow, with_id, with_ids};

pub async fn insert<'c, E>(
    executor: E,
    position: RecordedPosition,
) -> Result<WithId<RecordedPosition>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO positions(run_id, lat, lon, owner_id, recorded_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, run_id, lat, lon, owner_id, recorded_at;
        ",
    )
    .bind(position.run_id.raw())
    .bind(position.lat)
    .bind(position.lon)
    .bind(&position.owner_id)
    .bind(position.recorded_at)
    .fetch_one(executor)
    .await
    .map(|row: PositionRow| with_id(row))
    .map_err(convert_error)
}

pub async fn get_by_run<'c, E>(
    executor: E,
    run_id: Id<Route>,
    owner_id: Option<&str>,
) -> Result<Vec<WithId<RecordedPosition>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT id, run_id, lat, lon, owner_id, recorded_at
        FROM positions
        WHERE run_id = $1 AND ($2::text IS NULL OR owner_id = $2)
        ORDER BY recorded_at, id;
        ",
    )
    .bind(run_id.raw())
    .bind(owner_id)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|positions: Vec<PositionRow>| Ok(with_ids(positions)))
}
