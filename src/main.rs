//! Cheap Eats Backend
//!
//! REST backend for a restaurant review site with SQLite persistence,
//! Tantivy full-text search and templated transactional email.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod geo;
mod mail;
mod models;
mod search;
mod slug;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use mail::Mailer;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub mailer: Arc<Mailer>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cheap Eats Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Template dir: {:?}", config.template_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (CHEAPEATS_API_PSK). Authentication is disabled!");
    }
    if config.mail.host.is_none() {
        tracing::warn!("No MAIL_HOST configured. Outgoing email will only be logged!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    tracing::info!("Building search index...");
    let restaurants = repo.list_all_restaurants().await?;
    search.rebuild(&restaurants).await?;
    tracing::info!("Search index built with {} restaurants", restaurants.len());

    let transport = mail::transport_from_config(&config.mail)?;
    let mailer = Mailer::new(&config.template_dir, config.mail.from.clone(), transport)?;
    tracing::info!("Mail transport: {}", mailer.transport_name());

    let state = AppState {
        repo,
        search,
        mailer: Arc::new(mailer),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Restaurants
        .route(
            "/restaurants",
            get(api::list_restaurants).post(api::create_restaurant),
        )
        .route("/restaurants/near", get(api::near_restaurants))
        .route("/restaurants/slug/{slug}", get(api::get_restaurant_by_slug))
        .route(
            "/restaurants/{id}",
            get(api::get_restaurant).put(api::update_restaurant),
        )
        // Tags and rankings
        .route("/tags", get(api::list_tags))
        .route("/tags/{tag}", get(api::restaurants_by_tag))
        .route("/top", get(api::top_restaurants))
        // Reviews
        .route("/reviews/{id}", post(api::add_review))
        // Search
        .route("/search", get(api::search_restaurants))
        // Accounts
        .route("/account/register", post(api::register))
        .route("/account/login", post(api::login))
        .route("/account/logout", post(api::logout))
        .route("/account/forgot", post(api::forgot_password))
        .route("/account/reset/{token}", post(api::reset_password))
        .route("/account/flashes", get(api::take_flashes))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
