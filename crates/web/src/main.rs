use std::env;

use database::{DatabaseConnectionInfo, PgDatabase};
use fleet::memory::MemoryDatabase;
use tracing_subscriber::EnvFilter;
use web::{start_web_server, WebState, DEFAULT_BIND_ADDRESS};

#[tokio::main]
async fn main() {
    env_logger::init();

    // request tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    if let Err(why) = tracing::subscriber::set_global_default(subscriber) {
        log::warn!("request tracing disabled: {}", why);
    }

    let bind_address =
        env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_owned());
    let store = env::var("FLEET_STORE").unwrap_or_else(|_| "postgres".to_owned());

    let served = match store.trim().to_lowercase().as_str() {
        "memory" => {
            log::warn!("using the in-memory store, nothing is persisted");
            start_web_server(WebState::new(MemoryDatabase::new()), &bind_address).await
        }
        "postgres" => {
            let database_connection_info = DatabaseConnectionInfo::from_env()
                .expect("expected database connection info in env.");
            let database = PgDatabase::connect(database_connection_info)
                .await
                .expect("could not connect to database.");
            start_web_server(WebState::new(database), &bind_address).await
        }
        other => panic!("unknown FLEET_STORE '{}', expected 'postgres' or 'memory'", other),
    };

    if let Err(why) = served {
        log::error!("web server stopped: {}", why);
    }
}
