use std::sync::Arc;

use database::PgDatabase;
use routing::{GoogleMapsProvider, RoutingProvider};
use scheduling::executor::Executor;
use web::config::AppConfig;
use web::{start_web_server, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = AppConfig::from_env();

    let database = PgDatabase::connect(config.database)
        .await
        .expect("could not connect to database.");

    let directions = database.directions(config.direction_cache_ttl);
    let programs = database.programs();
    let tasks = database.tasks();
    let provider: Arc<dyn RoutingProvider> =
        Arc::new(GoogleMapsProvider::new(config.google_maps_api_key));

    let reaper_database = database.clone();
    let reaper_ttl = config.direction_cache_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(reaper_ttl);
        loop {
            interval.tick().await;
            match reaper_database.reap_expired_directions(reaper_ttl).await {
                Ok(count) if count > 0 => log::debug!("reaped {count} expired direction(s)"),
                Ok(_) => {}
                Err(why) => log::error!("failed to reap expired directions: {why}"),
            }
        }
    });

    let executor = Executor::new(
        tasks.clone(),
        directions.clone(),
        provider.clone(),
        programs.clone(),
        config.defaults,
        config.executor,
    );
    tokio::spawn(executor.run_forever());

    let state = WebState {
        tasks,
        directions,
        provider,
        programs,
        defaults: config.defaults,
    };

    start_web_server(state, config.port)
        .await
        .expect("web server failed");
}
