//! Backend entry-point: wires the statistics REST API and OpenAPI docs.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::domain::cache::TtlCache;
use backend::domain::StatsService;
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::stats;
use backend::outbound::warehouse::SqlxWarehouse;
use backend::server::config::Settings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = Settings::load().map_err(std::io::Error::other)?;
    let database_url = settings
        .database_url()
        .ok_or_else(|| std::io::Error::other("DWH_DATABASE_URL is required"))?;

    // Lazy pool: the first aggregation opens connections, so startup does
    // not depend on warehouse availability.
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections())
        .connect_lazy(database_url)
        .map_err(std::io::Error::other)?;

    let clock = Arc::new(DefaultClock);
    let cache = Arc::new(TtlCache::new(
        settings.cache_ttl_seconds(),
        settings.cache_max_size(),
        clock.clone(),
    ));
    let service = Arc::new(StatsService::new(
        Arc::new(SqlxWarehouse::new(pool)),
        cache,
        clock,
        settings.archive_scan(),
    ));
    let http_state = web::Data::new(HttpState::new(service));

    let health_state = web::Data::new(HealthState::new());
    // Clone for the server factory so the probes see the shared state.
    let server_health_state = health_state.clone();
    let server_http_state = http_state.clone();
    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), server_http_state.clone())
    })
    .bind(settings.bind_addr())?;

    health_state.mark_ready();
    info!(bind_addr = settings.bind_addr(), "monitoring backend listening");
    server.run().await
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .app_data(http_state)
        .configure(stats::configure);

    let mut app = App::new()
        .app_data(health_state)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    {
        app = app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app
}
