use async_trait::async_trait;
use fleet::database::{Result, UserInsert, UserRepo, UserWithSecret};
use model::{
    user::{Role, User},
    WithId,
};
use sqlx::prelude::FromRow;
use utility::id::Id;

use super::DatabaseRow;
use crate::{
    queries::user::{by_email, get_all, insert},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
    pub profile_id: String,
    pub password_hash: String,
}

impl DatabaseRow for UserRow {
    type Model = User;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        let role = self.role.parse::<Role>().unwrap_or_else(|why| {
            log::warn!("user {} has {}, treating as plain user", self.id, why);
            Role::default()
        });
        User {
            email: self.email,
            name: self.name,
            role,
            profile_id: self.profile_id,
        }
    }
}

#[async_trait]
impl UserRepo for PgDatabaseAutocommit {
    async fn insert_user(&mut self, user: UserInsert) -> Result<WithId<User>> {
        insert(&self.pool, user).await
    }

    async fn user_by_email(&mut self, email: &str) -> Result<UserWithSecret> {
        by_email(&self.pool, email).await
    }

    async fn get_users(&mut self) -> Result<Vec<WithId<User>>> {
        get_all(&self.pool).await
    }
}

#[async_trait]
impl<'a> UserRepo for PgDatabaseTransaction<'a> {
    async fn insert_user(&mut self, user: UserInsert) -> Result<WithId<User>> {
        insert(&mut *self.tx, user).await
    }

    async fn user_by_email(&mut self, email: &str) -> Result<UserWithSecret> {
        by_email(&mut *self.tx, email).await
    }

    async fn get_users(&mut self) -> Result<Vec<WithId<User>>> {
        get_all(&mut *self.tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str) -> UserRow {
        UserRow {
            id: 7,
            email: "ana@example.com".to_owned(),
            name: "Ana".to_owned(),
            role: role.to_owned(),
            profile_id: "7".to_owned(),
            password_hash: "$argon2id$...".to_owned(),
        }
    }

    #[test]
    fn rows_keep_known_roles() {
        assert_eq!(row("driver").to_model().role, Role::Driver);
        assert_eq!(row("conductor").to_model().role, Role::Driver);
    }

    #[test]
    fn unknown_roles_fall_back_to_user() {
        assert_eq!(row("superuser").to_model().role, Role::User);
    }
}
