use fleet::database::{Result, UserInsert, UserWithSecret};
use model::{user::User, WithId};
use sqlx::{Executor, Postgres};
use utility::let_also::LetAlso;

use super::convert_error;
use crate::data_model::{user::UserRow, with_id, with_ids};

pub async fn insert<'c, E>(executor: E, user: UserInsert) -> Result<WithId<User>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO users(email, name, role, profile_id, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING
            id,
            email,
            name,
            role,
            COALESCE(profile_id, id::text) AS profile_id,
            password_hash;
        ",
    )
    .bind(&user.email)
    .bind(&user.name)
    .bind(user.role.as_str())
    .bind(&user.profile_id)
    .bind(&user.password_hash)
    .fetch_one(executor)
    .await
    .map(|row: UserRow| with_id(row))
    .map_err(convert_error)
}

pub async fn by_email<'c, E>(executor: E, email: &str) -> Result<UserWithSecret>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<Postgres, UserRow>(
        "
        SELECT
            id,
            email,
            name,
            role,
            COALESCE(profile_id, id::text) AS profile_id,
            password_hash
        FROM users
        WHERE LOWER(email) = LOWER($1);
        ",
    )
    .bind(email)
    .fetch_one(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|row: UserRow| {
        let password_hash = row.password_hash.clone();
        Ok(UserWithSecret {
            user: with_id(row),
            password_hash,
        })
    })
}

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<WithId<User>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id,
            email,
            name,
            role,
            COALESCE(profile_id, id::text) AS profile_id,
            password_hash
        FROM users
        ORDER BY id;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|users: Vec<UserRow>| Ok(with_ids(users)))
}
