//! Replays a stored route against the backend without a map: every map
//! command is logged, positions are reported as during a real drive.
//!
//! Usage: `replay [route-id]`. Logs in with `FLEET_EMAIL` / `FLEET_PASSWORD`
//! when both are set, otherwise works on `FLEET_PROFILE_ID`.

use std::{env, error::Error, sync::Arc};

use model::geometry::GeoPoint;
use tracking::{
    backend::{HttpBackend, RouteBackend},
    config::TrackingConfig,
    map::{Bounds, IconKind, LayerRef, MapAdapter, PathStyle},
    session::SessionContext,
    view::{PlaybackStatus, RouteView},
};
use utility::id::Id;

#[derive(Debug, Default)]
struct LoggingMap {
    last_layer: u64,
}

impl LoggingMap {
    fn next_layer(&mut self) -> LayerRef {
        self.last_layer += 1;
        LayerRef(self.last_layer)
    }
}

impl MapAdapter for LoggingMap {
    fn draw_path(&mut self, points: &[GeoPoint], style: &PathStyle) -> LayerRef {
        let layer = self.next_layer();
        log::info!("{:?}: path of {} points in {}", layer, points.len(), style.color);
        layer
    }

    fn extend_path(&mut self, layer: LayerRef, point: GeoPoint) {
        log::info!("{:?}: extended to {:?}", layer, point);
    }

    fn place_marker(&mut self, point: GeoPoint, icon: IconKind) -> LayerRef {
        let layer = self.next_layer();
        log::info!("{:?}: {:?} marker at {:?}", layer, icon, point);
        layer
    }

    fn move_marker(&mut self, layer: LayerRef, point: GeoPoint, heading: f64) {
        log::debug!("{:?}: moved to {:?} heading {:.0}°", layer, point, heading);
    }

    fn remove_layer(&mut self, layer: LayerRef) {
        log::info!("{:?}: removed", layer);
    }

    fn fit_to_bounds(&mut self, bounds: Bounds) {
        log::info!(
            "zoomed to {:?} .. {:?}",
            bounds.south_west,
            bounds.north_east
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = TrackingConfig::from_env();
    let backend: Arc<dyn RouteBackend> = Arc::new(HttpBackend::new(config.api_url.clone()));
    let session = match (env::var("FLEET_EMAIL"), env::var("FLEET_PASSWORD")) {
        (Ok(email), Ok(password)) => {
            SessionContext::login(backend.as_ref(), &email, &password).await?
        }
        _ => SessionContext::anonymous(config.profile_id.clone().unwrap_or_default()),
    };

    let mut view = RouteView::new(LoggingMap::default(), session, backend, &config.playback);
    let loaded = view.load_routes().await?;
    log::info!("{} route(s) for profile '{}'", loaded, view.session().owner_id());

    let route_id = match env::args().nth(1) {
        Some(arg) => Id::new(arg.parse()?),
        None => match view.routes().next() {
            Some(route) => route.id,
            None => return Err("no routes to replay".into()),
        },
    };

    let mut status = view.play(route_id)?;
    while status.changed().await.is_ok() {
        if let PlaybackStatus::Finished(reason) = *status.borrow() {
            log::info!("replay of route {} ended: {:?}", route_id, reason);
            break;
        }
    }
    Ok(())
}
