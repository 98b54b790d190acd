use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use survey_server::config::AppConfig;
use survey_server::database::Database;
use survey_server::handlers::AppState;
use survey_server::routes;
use survey_server::submission::uploads::UploadStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let matches = Command::new("survey-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Survey authoring and response collection service")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file")
                .value_name("FILE"),
        )
        .get_matches();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("survey_server=info")))
        .init();

    tracing::info!("Starting survey server");

    // Load configuration
    let config = match matches.get_one::<String>("config") {
        Some(path) => {
            let path = PathBuf::from(path);
            tracing::info!("Loading configuration from {}", path.display());
            AppConfig::load_from_file(&path)
        }
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    // Initialize storage
    let database = Arc::new(
        Database::new(&config.database.path).context("Failed to open the survey database")?,
    );
    tracing::info!("Database initialized at {:?}", config.database.path);

    let uploads =
        Arc::new(UploadStore::new(&config.uploads).context("Failed to prepare upload directory")?);
    tracing::info!("Uploads stored in {:?}", uploads.dir());

    let server_addr = format!("{}:{}", config.server.host, config.server.port);
    let config = Arc::new(config);
    let app_state = web::Data::new(AppState::new(database, uploads, config.clone()));

    tracing::info!("Starting HTTP server on {}", server_addr);

    let server = HttpServer::new(move || {
        let cors = config
            .cors
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .app_data(routes::json_config(&config))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes::configure_routes)
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind HTTP server to {server_addr}"))?
    .run();

    tokio::select! {
        result = server => {
            result.context("HTTP server failed")?;
            tracing::info!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
        }
    }

    Ok(())
}
