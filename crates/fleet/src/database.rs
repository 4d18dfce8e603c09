use std::{error, fmt, result};

use async_trait::async_trait;
use model::{
    position::RecordedPosition,
    route::Route,
    user::{Role, User},
    vehicle::Vehicle,
    WithId,
};
use utility::id::Id;

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    /// A unique constraint was violated. Carries the name of the clashing field.
    Conflict(String),
    Other(Box<dyn error::Error + Send + Sync>),
}

impl error::Error for DatabaseError {}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no matching row"),
            Self::Conflict(field) => write!(f, "duplicate value for {}", field),
            Self::Other(why) => write!(f, "database error: {}", why),
        }
    }
}

pub type Result<T> = result::Result<T, DatabaseError>;

/// A user to insert, with the password already hashed.
#[derive(Debug, Clone)]
pub struct UserInsert {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub profile_id: Option<String>,
    pub password_hash: String,
}

/// A user row together with the stored password hash.
#[derive(Debug, Clone)]
pub struct UserWithSecret {
    pub user: WithId<User>,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepo {
    /// Inserts a user. A missing `profile_id` is filled with the new user's id.
    /// Fails with `Conflict("email")` if the email is taken.
    async fn insert_user(&mut self, user: UserInsert) -> Result<WithId<User>>;

    async fn user_by_email(&mut self, email: &str) -> Result<UserWithSecret>;

    /// All users, ordered by id.
    async fn get_users(&mut self) -> Result<Vec<WithId<User>>>;
}

#[async_trait]
pub trait VehicleRepo {
    async fn get_vehicles(
        &mut self,
        owner_id: Option<&str>,
    ) -> Result<Vec<WithId<Vehicle>>>;

    async fn insert_vehicle(&mut self, vehicle: Vehicle) -> Result<WithId<Vehicle>>;

    async fn update_vehicle(
        &mut self,
        vehicle: WithId<Vehicle>,
    ) -> Result<WithId<Vehicle>>;

    /// Deletes a vehicle. When an owner is given, vehicles of other owners
    /// are treated as missing.
    async fn delete_vehicle(
        &mut self,
        id: Id<Vehicle>,
        owner_id: Option<&str>,
    ) -> Result<WithId<Vehicle>>;
}

#[async_trait]
pub trait RouteRepo {
    /// Routes ordered by creation, newest first.
    async fn get_routes(&mut self, owner_id: Option<&str>)
        -> Result<Vec<WithId<Route>>>;

    async fn get_route(&mut self, id: Id<Route>) -> Result<WithId<Route>>;

    async fn insert_route(&mut self, route: Route) -> Result<WithId<Route>>;
}

#[async_trait]
pub trait PositionRepo {
    async fn insert_position(
        &mut self,
        position: RecordedPosition,
    ) -> Result<WithId<RecordedPosition>>;

    /// Positions of a run, oldest first.
    async fn get_positions(
        &mut self,
        run_id: Id<Route>,
        owner_id: Option<&str>,
    ) -> Result<Vec<WithId<RecordedPosition>>>;
}

pub trait DatabaseOperations: UserRepo + VehicleRepo + RouteRepo + PositionRepo {}

impl<T> DatabaseOperations for T where T: UserRepo + VehicleRepo + RouteRepo + PositionRepo
{}

#[async_trait]
pub trait DatabaseTransaction: DatabaseOperations {
    async fn commit(self) -> Result<()>;
}

pub trait DatabaseAutocommit: DatabaseOperations {}

/// trait to implement a fleet database.
/// multiple concurrent accesses should be possible by e.g. cloning the database object.
#[async_trait]
pub trait Database: Clone + Send + Sync + Sized + 'static {
    type Transaction: DatabaseTransaction + Send;
    type Autocommit: DatabaseAutocommit + Send;

    async fn transaction(&self) -> Result<Self::Transaction>;

    fn auto(&self) -> Self::Autocommit;
}
