use axum::http::Method;
use axum::{
    routing::{get, patch},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

mod config;
mod db;
mod error;
mod filters;
mod handlers;
mod models;
mod property;
mod schema;
mod validation;

use db::StoreGateway;
use property::PropertyRepository;

#[derive(Clone)]
pub struct AppState {
    repo: PropertyRepository,
}

impl AppState {
    pub fn new(gateway: StoreGateway) -> Self {
        Self {
            repo: PropertyRepository::new(gateway),
        }
    }
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let properties = Router::new()
        .route(
            "/properties",
            get(handlers::list_properties).post(handlers::create_property),
        )
        .route("/properties/search", get(handlers::search_properties))
        .route("/properties/status/:status", get(handlers::list_by_status))
        .route(
            "/properties/:id",
            get(handlers::get_property)
                .put(handlers::update_property)
                .delete(handlers::delete_property),
        )
        .route(
            "/properties/:id/status",
            patch(handlers::update_property_status),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", properties)
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = config::AppConfig::load()?;
    log::info!("Loaded config: {:?}", config);

    let gateway = StoreGateway::connect(&config.database_url, config.db_pool_size)?;
    let test_query = gateway.ping().await?;
    log::info!("Database test query result: {}", test_query);

    let addr = config.bind_address();
    log::info!("Starting server on {}", addr);

    let app = build_router(AppState::new(gateway));
    axum::serve(tokio::net::TcpListener::bind(addr.as_str()).await?, app.into_make_service()).await?;

    Ok(())
}
