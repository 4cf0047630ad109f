//! cadenza-mr service binary

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cadenza_mr::config::{CliOverrides, Settings};
use cadenza_mr::services::{
    AudioAnalyzer, HttpAudioAnalyzer, HttpVectorIndex, SongCatalogue, SqliteCatalogue, VectorIndex,
};
use cadenza_mr::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "cadenza-mr", about = "Cadenza music recognition service")]
struct Args {
    /// Configuration file path (overrides the default lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database path (overrides config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// HTTP server port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadenza_mr=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    info!("Starting cadenza-mr (Music Recognition) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let settings = Settings::resolve(&CliOverrides {
        config: args.config,
        database: args.database,
        port: args.port,
    })?;
    info!("Database: {}", settings.database_path.display());

    let db_pool = cadenza_common::db::init_database_pool(&settings.database_path).await?;
    cadenza_mr::db::schema::initialize_schema(&db_pool).await?;
    info!("Database connection established");

    let index: Arc<dyn VectorIndex> = Arc::new(HttpVectorIndex::new(&settings.vector_db)?);

    // Startup probe: an unreachable index is fatal here rather than on the
    // first request.
    let stats = index.stats().await?;
    info!(
        total_vectors = stats.total_vector_count,
        dimensions = stats.dimension,
        "Vector index reachable"
    );
    if stats.dimension as usize != settings.vector_db.dimensions {
        warn!(
            configured = settings.vector_db.dimensions,
            index = stats.dimension,
            "Configured embedding dimension differs from the index"
        );
    }

    let audio: Arc<dyn AudioAnalyzer> = Arc::new(HttpAudioAnalyzer::new(&settings.audio_engine)?);
    let catalogue: Arc<dyn SongCatalogue> = Arc::new(SqliteCatalogue::new(db_pool));

    let settings = Arc::new(settings);
    let state = AppState::new(settings.clone(), audio, catalogue, index);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    info!("Listening on http://{}:{}", settings.host, settings.port);
    info!("Health check: http://{}:{}/health", settings.host, settings.port);

    axum::serve(listener, app).await?;

    Ok(())
}
