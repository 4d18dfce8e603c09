use chrono::Local;
use model::{
    geometry::RouteShape,
    position::{PositionReport, RecordedPosition},
    route::{NewRoute, Route},
    user::{Credentials, NewUser, User},
    vehicle::Vehicle,
    WithId,
};
use utility::{id::Id, let_also::LetAlso};

use crate::{
    database::{
        Database, DatabaseTransaction, PositionRepo, RouteRepo, UserInsert, UserRepo,
        VehicleRepo,
    },
    password, RequestError, RequestResult,
};

#[derive(Debug, Clone)]
pub struct Client<D>
where
    D: Database,
{
    pub database: D,
}

impl<D> Client<D>
where
    D: Database,
{
    pub fn new(database: D) -> Self {
        Self { database }
    }
}

impl<D> Client<D>
where
    D: Database,
{
    pub async fn register_user(&self, new_user: NewUser) -> RequestResult<WithId<User>> {
        if new_user.email.is_empty()
            || new_user.password.is_empty()
            || new_user.name.is_empty()
        {
            return Err(RequestError::invalid("email, password and name are required"));
        }
        let password_hash = password::hash(new_user.password).await?;
        let user = self
            .database
            .auto()
            .insert_user(UserInsert {
                email: new_user.email,
                name: new_user.name,
                role: new_user.role,
                profile_id: new_user.profile_id,
                password_hash,
            })
            .await?;
        log::info!("registered user {} ({})", user.id, user.content.email);
        Ok(user)
    }

    /// Checks the credentials. Unknown emails and wrong passwords both yield
    /// `Unauthorized`.
    pub async fn login(&self, credentials: Credentials) -> RequestResult<WithId<User>> {
        if credentials.email.is_empty() || credentials.password.is_empty() {
            return Err(RequestError::invalid("email and password are required"));
        }
        let stored = match self.database.auto().user_by_email(&credentials.email).await {
            Ok(stored) => stored,
            Err(crate::database::DatabaseError::NotFound) => {
                log::debug!("login for unknown email {}", credentials.email);
                return Err(RequestError::Unauthorized);
            }
            Err(why) => return Err(why.into()),
        };
        if password::verify(credentials.password, stored.password_hash).await? {
            Ok(stored.user)
        } else {
            log::debug!("wrong password for {}", credentials.email);
            Err(RequestError::Unauthorized)
        }
    }

    pub async fn get_users(&self) -> RequestResult<Vec<WithId<User>>> {
        Ok(self.database.auto().get_users().await?)
    }
}

impl<D> Client<D>
where
    D: Database,
{
    pub async fn get_vehicles(
        &self,
        owner_id: Option<&str>,
    ) -> RequestResult<Vec<WithId<Vehicle>>> {
        Ok(self.database.auto().get_vehicles(owner_id).await?)
    }

    pub async fn create_vehicle(&self, vehicle: Vehicle) -> RequestResult<WithId<Vehicle>> {
        let vehicle = validate_vehicle(vehicle)?;
        self.database
            .auto()
            .insert_vehicle(vehicle)
            .await?
            .let_owned(Ok)
    }

    pub async fn update_vehicle(
        &self,
        id: Id<Vehicle>,
        vehicle: Vehicle,
    ) -> RequestResult<WithId<Vehicle>> {
        let vehicle = validate_vehicle(vehicle)?;
        self.database
            .auto()
            .update_vehicle(WithId::new(id, vehicle))
            .await?
            .let_owned(Ok)
    }

    pub async fn delete_vehicle(
        &self,
        id: Id<Vehicle>,
        owner_id: Option<&str>,
    ) -> RequestResult<WithId<Vehicle>> {
        Ok(self.database.auto().delete_vehicle(id, owner_id).await?)
    }
}

fn validate_vehicle(vehicle: Vehicle) -> RequestResult<Vehicle> {
    let vehicle = vehicle.normalized();
    if vehicle.plate.is_empty() || vehicle.owner_id.trim().is_empty() {
        return Err(RequestError::invalid("plate and ownerId are required"));
    }
    Ok(vehicle)
}

impl<D> Client<D>
where
    D: Database,
{
    pub async fn get_routes(&self, owner_id: Option<&str>) -> RequestResult<Vec<WithId<Route>>> {
        Ok(self.database.auto().get_routes(owner_id).await?)
    }

    pub async fn get_route(&self, id: Id<Route>) -> RequestResult<WithId<Route>> {
        Ok(self.database.auto().get_route(id).await?)
    }

    /// Stores a route. The shape is flattened into a single line string, which
    /// needs at least two points.
    pub async fn create_route(&self, new_route: NewRoute) -> RequestResult<WithId<Route>> {
        if new_route.name.is_empty() || new_route.owner_id.trim().is_empty() {
            return Err(RequestError::invalid("name and ownerId are required"));
        }
        let points = new_route.shape.points();
        if points.len() < 2 {
            return Err(RequestError::invalid(format!(
                "a route needs at least 2 points, got {}",
                points.len()
            )));
        }
        if let Some(point) = points.iter().find(|point| !point.is_valid()) {
            return Err(RequestError::invalid(format!(
                "coordinate out of range: {:?}",
                point
            )));
        }
        let route = Route {
            name: new_route.name,
            owner_id: new_route.owner_id.trim().to_owned(),
            shape: RouteShape::LineString(points),
            created_at: Local::now(),
        };
        let route = self.database.auto().insert_route(route).await?;
        log::info!(
            "stored route {} '{}' with {} points",
            route.id,
            route.content.name,
            route.content.shape.point_count()
        );
        Ok(route)
    }
}

impl<D> Client<D>
where
    D: Database,
{
    /// Records a position of the run following route `run_id`.
    pub async fn report_position(
        &self,
        run_id: Id<Route>,
        report: PositionReport,
    ) -> RequestResult<WithId<RecordedPosition>> {
        if !report.point().is_valid() {
            return Err(RequestError::invalid(format!(
                "coordinate out of range: lat {} lon {}",
                report.lat, report.lon
            )));
        }
        let mut tx = self.database.transaction().await?;
        tx.get_route(run_id).await?;
        let recorded = tx
            .insert_position(RecordedPosition::from_report(run_id, report))
            .await?;
        tx.commit().await?;
        Ok(recorded)
    }

    pub async fn get_positions(
        &self,
        run_id: Id<Route>,
        owner_id: Option<&str>,
    ) -> RequestResult<Vec<WithId<RecordedPosition>>> {
        Ok(self.database.auto().get_positions(run_id, owner_id).await?)
    }
}
