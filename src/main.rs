use axum::{extract::DefaultBodyLimit, middleware::from_fn, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use causeway_api::{config, database, middleware};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "causeway_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting Causeway API in {:?} mode", config.environment);

    if let Err(e) = database::init().await {
        tracing::error!("Failed to initialize database: {}", e);
        std::process::exit(1);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("CAUSEWAY_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Causeway API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(user_routes())
        .merge(petition_routes())
        // Global middleware: session resolution runs on every request
        .layer(from_fn(middleware::resolve_session))
        .layer(DefaultBodyLimit::max(config::config().storage.max_image_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn user_routes() -> Router {
    use axum::routing::post;
    use causeway_api::handlers::{user_image, users};

    Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/:id", get(users::view).patch(users::update))
        .route(
            "/users/:id/image",
            get(user_image::get_image)
                .post(user_image::set_image)
                .delete(user_image::delete_image),
        )
}

fn petition_routes() -> Router {
    use axum::routing::{patch, post};
    use causeway_api::handlers::{petition_image, petitions, support_tiers, supporters};

    Router::new()
        .route("/petitions", get(petitions::list).post(petitions::create))
        .route("/petitions/categories", get(petitions::categories))
        .route(
            "/petitions/:id",
            get(petitions::detail)
                .patch(petitions::edit)
                .delete(petitions::remove),
        )
        .route("/petitions/:id/supportTiers", post(support_tiers::add))
        .route(
            "/petitions/:id/supportTiers/:tierId",
            patch(support_tiers::edit).delete(support_tiers::remove),
        )
        .route(
            "/petitions/:id/supporters",
            get(supporters::list).post(supporters::add),
        )
        .route(
            "/petitions/:id/image",
            get(petition_image::get_image)
                .post(petition_image::set_image)
                .delete(petition_image::delete_image),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Causeway API",
        "version": version,
        "description": "Petition and crowdfunding platform backend",
        "endpoints": {
            "petitions": "/petitions[/:id] (GET public; mutations require a session)",
            "categories": "/petitions/categories (GET public)",
            "supportTiers": "/petitions/:id/supportTiers[/:tierId] (owner only)",
            "supporters": "/petitions/:id/supporters (GET public; POST requires a session)",
            "users": "/users/register, /users/login, /users/logout, /users/:id",
            "images": "/users/:id/image, /petitions/:id/image",
            "health": "/health (public)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
