mod appointments;
mod auth;
mod config;
mod db;
mod error;
mod models;
mod notifier;
mod queue;
mod routes;
mod salons;
mod state;
#[cfg(test)]
mod testing;

use actix_web::{middleware, web, App, HttpServer};
use actix_web_httpauth::extractors::basic;

use crate::{
    auth::AUTH_REALM,
    config::Config,
    notifier::Notifier,
    state::{AppState, QueueSettings},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = Config::from_env();

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    db::seed_defaults(&pool, &config.seed).await?;

    let events = if config.event_buffer == 0 {
        log::warn!("EVENT_BUFFER=0, real-time updates are disabled");
        Notifier::disabled()
    } else {
        Notifier::new(config.event_buffer)
    };

    let state = AppState {
        db: pool,
        events,
        queue: QueueSettings {
            avg_service_minutes: config.avg_service_minutes,
        },
    };

    let address = format!("0.0.0.0:{}", config.port);
    log::info!(
        "Starting salon queue on http://{address} (avg service {} min)",
        config.avg_service_minutes
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(basic::Config::default().realm(AUTH_REALM))
            .wrap(middleware::Logger::default())
            .configure(routes::public::configure)
            .configure(routes::queue::configure)
            .configure(routes::appointments::configure)
            .configure(routes::events::configure)
            .configure(routes::admin::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
