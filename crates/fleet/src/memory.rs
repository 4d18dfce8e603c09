//! A database kept in process memory. Used by tests and for running the
//! server without PostgreSQL.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use model::{
    position::RecordedPosition,
    route::Route,
    user::User,
    vehicle::Vehicle,
    WithId,
};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use utility::id::Id;

use crate::database::{
    Database, DatabaseAutocommit, DatabaseError, DatabaseTransaction, PositionRepo, Result,
    RouteRepo, UserInsert, UserRepo, UserWithSecret, VehicleRepo,
};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

/// Every table of the in-memory database. Ids are handed out like SQL serials:
/// increasing and never reused.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    users: IndexMap<i32, StoredUser>,
    vehicles: IndexMap<i32, Vehicle>,
    routes: IndexMap<i32, Route>,
    positions: IndexMap<i64, RecordedPosition>,
    last_user_id: i32,
    last_vehicle_id: i32,
    last_route_id: i32,
    last_position_id: i64,
}

fn owned_by(owner_id: Option<&str>, actual: &str) -> bool {
    owner_id.map_or(true, |owner| owner == actual)
}

impl Tables {
    fn insert_user(&mut self, insert: UserInsert) -> Result<WithId<User>> {
        if self.users.values().any(|u| u.user.email == insert.email) {
            return Err(DatabaseError::Conflict("email".to_owned()));
        }
        self.last_user_id += 1;
        let id = self.last_user_id;
        let user = User {
            email: insert.email,
            name: insert.name,
            role: insert.role,
            profile_id: insert.profile_id.unwrap_or_else(|| id.to_string()),
        };
        self.users.insert(
            id,
            StoredUser {
                user: user.clone(),
                password_hash: insert.password_hash,
            },
        );
        Ok(WithId::new(Id::new(id), user))
    }

    fn user_by_email(&self, email: &str) -> Result<UserWithSecret> {
        self.users
            .iter()
            .find(|(_, stored)| stored.user.email == email)
            .map(|(id, stored)| UserWithSecret {
                user: WithId::new(Id::new(*id), stored.user.clone()),
                password_hash: stored.password_hash.clone(),
            })
            .ok_or(DatabaseError::NotFound)
    }

    fn get_users(&self) -> Vec<WithId<User>> {
        self.users
            .iter()
            .map(|(id, stored)| WithId::new(Id::new(*id), stored.user.clone()))
            .collect()
    }

    fn plate_taken(&self, plate: &str, except: Option<i32>) -> bool {
        self.vehicles
            .iter()
            .any(|(id, v)| v.plate == plate && Some(*id) != except)
    }

    fn get_vehicles(&self, owner_id: Option<&str>) -> Vec<WithId<Vehicle>> {
        self.vehicles
            .iter()
            .filter(|(_, v)| owned_by(owner_id, &v.owner_id))
            .map(|(id, v)| WithId::new(Id::new(*id), v.clone()))
            .collect()
    }

    fn insert_vehicle(&mut self, vehicle: Vehicle) -> Result<WithId<Vehicle>> {
        if self.plate_taken(&vehicle.plate, None) {
            return Err(DatabaseError::Conflict("plate".to_owned()));
        }
        self.last_vehicle_id += 1;
        self.vehicles.insert(self.last_vehicle_id, vehicle.clone());
        Ok(WithId::new(Id::new(self.last_vehicle_id), vehicle))
    }

    fn update_vehicle(&mut self, vehicle: WithId<Vehicle>) -> Result<WithId<Vehicle>> {
        let id = vehicle.id.raw();
        if !self.vehicles.contains_key(&id) {
            return Err(DatabaseError::NotFound);
        }
        if self.plate_taken(&vehicle.content.plate, Some(id)) {
            return Err(DatabaseError::Conflict("plate".to_owned()));
        }
        self.vehicles.insert(id, vehicle.content.clone());
        Ok(vehicle)
    }

    fn delete_vehicle(
        &mut self,
        id: Id<Vehicle>,
        owner_id: Option<&str>,
    ) -> Result<WithId<Vehicle>> {
        match self.vehicles.get(&id.raw()) {
            Some(v) if owned_by(owner_id, &v.owner_id) => {}
            _ => return Err(DatabaseError::NotFound),
        }
        self.vehicles
            .shift_remove(&id.raw())
            .map(|vehicle| WithId::new(id, vehicle))
            .ok_or(DatabaseError::NotFound)
    }

    fn get_routes(&self, owner_id: Option<&str>) -> Vec<WithId<Route>> {
        let mut routes = self
            .routes
            .iter()
            .filter(|(_, r)| owned_by(owner_id, &r.owner_id))
            .map(|(id, r)| WithId::new(Id::new(*id), r.clone()))
            .collect::<Vec<_>>();
        routes.sort_by(|a, b| {
            b.content
                .created_at
                .cmp(&a.content.created_at)
                .then(b.id.raw().cmp(&a.id.raw()))
        });
        routes
    }

    fn get_route(&self, id: Id<Route>) -> Result<WithId<Route>> {
        self.routes
            .get(&id.raw())
            .map(|route| WithId::new(id, route.clone()))
            .ok_or(DatabaseError::NotFound)
    }

    fn insert_route(&mut self, route: Route) -> WithId<Route> {
        self.last_route_id += 1;
        self.routes.insert(self.last_route_id, route.clone());
        WithId::new(Id::new(self.last_route_id), route)
    }

    fn insert_position(&mut self, position: RecordedPosition) -> WithId<RecordedPosition> {
        self.last_position_id += 1;
        self.positions.insert(self.last_position_id, position.clone());
        WithId::new(Id::new(self.last_position_id), position)
    }

    fn get_positions(
        &self,
        run_id: Id<Route>,
        owner_id: Option<&str>,
    ) -> Vec<WithId<RecordedPosition>> {
        self.positions
            .iter()
            .filter(|(_, p)| p.run_id == run_id && owned_by(owner_id, &p.owner_id))
            .map(|(id, p)| WithId::new(Id::new(*id), p.clone()))
            .collect()
    }
}

/// Gives the repo implementations mutable access to the tables, either
/// locking per operation or through a staged transaction copy.
#[async_trait]
pub trait TableAccess: Send {
    async fn with_tables<R, F>(&mut self, f: F) -> R
    where
        R: Send,
        F: FnOnce(&mut Tables) -> R + Send;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryAutocommit {
    tables: Arc<RwLock<Tables>>,
}

/// Holds the write lock for its whole lifetime, so transactions are
/// serialized. Changes go to a copy that replaces the tables on commit.
pub struct MemoryTransaction {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl TableAccess for MemoryAutocommit {
    async fn with_tables<R, F>(&mut self, f: F) -> R
    where
        R: Send,
        F: FnOnce(&mut Tables) -> R + Send,
    {
        let mut tables = self.tables.write().await;
        f(&mut *tables)
    }
}

#[async_trait]
impl TableAccess for MemoryTransaction {
    async fn with_tables<R, F>(&mut self, f: F) -> R
    where
        R: Send,
        F: FnOnce(&mut Tables) -> R + Send,
    {
        f(&mut self.staged)
    }
}

impl DatabaseAutocommit for MemoryAutocommit {}

#[async_trait]
impl DatabaseTransaction for MemoryTransaction {
    async fn commit(mut self) -> Result<()> {
        *self.guard = self.staged;
        Ok(())
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Transaction = MemoryTransaction;
    type Autocommit = MemoryAutocommit;

    async fn transaction(&self) -> Result<Self::Transaction> {
        let guard = self.tables.clone().write_owned().await;
        let staged = guard.clone();
        Ok(MemoryTransaction { guard, staged })
    }

    fn auto(&self) -> Self::Autocommit {
        MemoryAutocommit {
            tables: self.tables.clone(),
        }
    }
}

#[async_trait]
impl<T: TableAccess> UserRepo for T {
    async fn insert_user(&mut self, user: UserInsert) -> Result<WithId<User>> {
        self.with_tables(|tables| tables.insert_user(user)).await
    }

    async fn user_by_email(&mut self, email: &str) -> Result<UserWithSecret> {
        let email = email.to_owned();
        self.with_tables(move |tables| tables.user_by_email(&email))
            .await
    }

    async fn get_users(&mut self) -> Result<Vec<WithId<User>>> {
        Ok(self.with_tables(|tables| tables.get_users()).await)
    }
}

#[async_trait]
impl<T: TableAccess> VehicleRepo for T {
    async fn get_vehicles(
        &mut self,
        owner_id: Option<&str>,
    ) -> Result<Vec<WithId<Vehicle>>> {
        let owner_id = owner_id.map(str::to_owned);
        Ok(self
            .with_tables(move |tables| tables.get_vehicles(owner_id.as_deref()))
            .await)
    }

    async fn insert_vehicle(&mut self, vehicle: Vehicle) -> Result<WithId<Vehicle>> {
        self.with_tables(|tables| tables.insert_vehicle(vehicle))
            .await
    }

    async fn update_vehicle(
        &mut self,
        vehicle: WithId<Vehicle>,
    ) -> Result<WithId<Vehicle>> {
        self.with_tables(|tables| tables.update_vehicle(vehicle))
            .await
    }

    async fn delete_vehicle(
        &mut self,
        id: Id<Vehicle>,
        owner_id: Option<&str>,
    ) -> Result<WithId<Vehicle>> {
        let owner_id = owner_id.map(str::to_owned);
        self.with_tables(move |tables| tables.delete_vehicle(id, owner_id.as_deref()))
            .await
    }
}

#[async_trait]
impl<T: TableAccess> RouteRepo for T {
    async fn get_routes(
        &mut self,
        owner_id: Option<&str>,
    ) -> Result<Vec<WithId<Route>>> {
        let owner_id = owner_id.map(str::to_owned);
        Ok(self
            .with_tables(move |tables| tables.get_routes(owner_id.as_deref()))
            .await)
    }

    async fn get_route(&mut self, id: Id<Route>) -> Result<WithId<Route>> {
        self.with_tables(move |tables| tables.get_route(id)).await
    }

    async fn insert_route(&mut self, route: Route) -> Result<WithId<Route>> {
        Ok(self.with_tables(|tables| tables.insert_route(route)).await)
    }
}

#[async_trait]
impl<T: TableAccess> PositionRepo for T {
    async fn insert_position(
        &mut self,
        position: RecordedPosition,
    ) -> Result<WithId<RecordedPosition>> {
        Ok(self
            .with_tables(|tables| tables.insert_position(position))
            .await)
    }

    async fn get_positions(
        &mut self,
        run_id: Id<Route>,
        owner_id: Option<&str>,
    ) -> Result<Vec<WithId<RecordedPosition>>> {
        let owner_id = owner_id.map(str::to_owned);
        Ok(self
            .with_tables(move |tables| tables.get_positions(run_id, owner_id.as_deref()))
            .await)
    }
}
