use rusty_library_lending::{
    adapters::postgres::{
        borrow_store::BorrowStore as PostgresBorrowStore,
        catalog_store::CatalogStore as PostgresCatalogStore,
    },
    api::{handlers::AppState, router::create_router},
    application::lending::ServiceDependencies,
    ports::clock::SystemClock,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rusty_library_lending=debug,tower_http=debug,axum=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection URL
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/library".into());

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run pending migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Initialize adapters
    let catalog_store = Arc::new(PostgresCatalogStore::new(pool.clone()));
    let borrow_store = Arc::new(PostgresBorrowStore::new(pool.clone()));
    let clock = Arc::new(SystemClock);

    // Create service dependencies
    let service_deps = ServiceDependencies {
        catalog_store,
        borrow_store,
        clock,
    };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
