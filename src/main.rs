use dotenvy::dotenv;
use tracing::info;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
mod workers;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting server...");

    let config = config::settings::AppConfig::new().expect("Invalid configuration");

    let db = infrastructure::db::pool::connect_to_db(&config.database_url)
        .await
        .expect("Failed to connect to PostgreSQL");

    let queue = infrastructure::queue::rabbitmq::RabbitMqService::new(&config.amqp_url)
        .await
        .expect("Failed to connect to RabbitMQ");

    let artifacts = common::artifacts::ArtifactStore::new(&config.upload_root);

    let state = state::AppState::new(config.clone(), db, queue, artifacts);

    // The transcoder runs in-process next to the HTTP server; it owns every
    // job this instance accepts.
    tokio::spawn(workers::transcoder::start_transcoder_worker(state.clone()));

    let app = app::create_app(state).await;

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.unwrap();
}
