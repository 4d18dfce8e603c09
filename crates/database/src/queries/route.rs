use fleet::database::Result;
use model::{route::Route, WithId};
use sqlx::{types::Json, Executor, Postgres};
use utility::{id::Id, let_also::LetAlso};

use super::convert_error;
use crate::data_model::{route::RouteRow, with_id, with_ids};

pub async fn get_all<'c, E>(
    executor: E,
    owner_id: Option<&str>,
) -> Result<Vec<WithId<Route>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT id, name, owner_id, shape, created_at
        FROM routes
        WHERE $1::text IS NULL OR owner_id = $1
        ORDER BY created_at DESC, id DESC;
        ",
    )
    .bind(owner_id)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|routes: Vec<RouteRow>| Ok(with_ids(routes)))
}

pub async fn get<'c, E>(executor: E, id: Id<Route>) -> Result<WithId<Route>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT id, name, owner_id, shape, created_at
        FROM routes
        WHERE id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_one(executor)
    .await
    .map(|row: RouteRow| with_id(row))
    .map_err(convert_error)
}

pub async fn insert<'c, E>(executor: E, route: Route) -> Result<WithId<Route>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO routes(name, owner_id, shape, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, owner_id, shape, created_at;
        ",
    )
    .bind(&route.name)
    .bind(&route.owner_id)
    .bind(Json(&route.shape))
    .bind(route.created_at)
    .fetch_one(executor)
    .await
    .map(|row: RouteRow| with_id(row))
    .map_err(convert_error)
}
