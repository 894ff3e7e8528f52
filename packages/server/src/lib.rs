#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the retail radar application.
//!
//! Geocodes an address, pulls the surrounding shops from Overpass, clusters
//! them, and asks an LLM to describe the clusters. All shared state is
//! read-only after startup.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use retail_radar_ai::InsightProvider;
use retail_radar_classify::ClassifierRules;
use retail_radar_geocoder::Geocoder;
use retail_radar_population::PopulationTable;
use retail_radar_source::OverpassClient;

/// Shared application state.
pub struct AppState {
    /// Store classification keyword tables.
    pub rules: Arc<ClassifierRules>,
    /// State/LGA population lookup for insight prompts.
    pub population: Arc<PopulationTable>,
    /// Address geocoder.
    pub geocoder: Geocoder,
    /// Point-of-interest source.
    pub overpass: OverpassClient,
    /// Insight provider, `None` when no AI credentials are configured.
    pub provider: Option<Arc<dyn InsightProvider>>,
}

impl AppState {
    /// Builds the state from environment variables.
    ///
    /// `POPULATION_PATH` overrides the bundled population table; a missing
    /// or malformed file falls back to the bundled one. AI provider selection follows
    /// [`retail_radar_ai::create_provider_from_env`]; without credentials
    /// the analyze endpoint reports the provider as unavailable.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(retail_radar_geocoder::USER_AGENT)
            .build()?;

        let population = std::env::var("POPULATION_PATH").map_or_else(
            |_| PopulationTable::bundled(),
            |path| {
                PopulationTable::load(&path).unwrap_or_else(|e| {
                    log::error!("Failed to load population data from {path}, using bundled: {e}");
                    PopulationTable::bundled()
                })
            },
        );

        let provider = match retail_radar_ai::create_provider_from_env() {
            Ok(p) => {
                log::info!("Using AI provider {} ({})", p.name(), p.model());
                Some(Arc::from(p))
            }
            Err(e) => {
                log::warn!("AI insight disabled: {e}");
                None
            }
        };

        Ok(Self {
            rules: Arc::new(ClassifierRules::default()),
            population: Arc::new(population),
            geocoder: Geocoder::new(client.clone()),
            overpass: OverpassClient::from_env(client),
            provider,
        })
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/geocode", web::get().to(handlers::geocode))
            .route("/clusters", web::post().to(handlers::clusters))
            .route("/scan", web::post().to(handlers::scan))
            .route("/analyze", web::post().to(handlers::analyze)),
    );
}

/// Starts the retail radar API server.
///
/// Binds to `BIND_ADDR` (default `127.0.0.1`) and `PORT` (default `8080`).
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`) and initializes logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP client cannot be built,
/// or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let state = web::Data::new(AppState::from_env().map_err(std::io::Error::other)?);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
