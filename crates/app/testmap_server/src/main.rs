//! Testmap API server binary.
//!
//! Wires the configured embedding and generation providers, the vector store
//! (PostgreSQL + pgvector, or in-memory with `--in-memory`), and serves the
//! HTTP API until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use testmap_api::config::ApiConfig;
use testmap_core::corpus::DEFAULT_EXTENSION;
use testmap_core::embedding::{self, config::EmbeddingConfig};
use testmap_core::generation::{self, config::GenerationConfig};
use testmap_core::indexing::Indexer;
use testmap_core::mapping::{MappingConfig, MappingEngine};
use testmap_core::store::VectorStore;
use testmap_core::store::memory::InMemoryVectorStore;
use testmap_core::store::postgres::{COLUMN_DIMENSIONS, PgVectorStore};
use testmap_core::workflow::WorkflowBuilder;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "testmap_server", about = "Testmap API server")]
struct Args {
    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3100")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/testmap"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Root of the automated test sources to index.
    #[arg(long, env = "TEST_DIRECTORY")]
    test_directory: Option<PathBuf>,

    /// Extension of test source files, without the dot.
    #[arg(long, env = "TEST_FILE_EXTENSION", default_value = DEFAULT_EXTENSION)]
    test_file_extension: String,

    /// JSON array of issue reports for the mapping experiment.
    #[arg(long, env = "EXPERIMENT_FILE", default_value = "bugs_frs_experiment.json")]
    experiment_file: PathBuf,

    /// Keep test vectors in process memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

impl Args {
    fn api_config(&self) -> ApiConfig {
        ApiConfig {
            bind_addr: self.bind_addr.clone(),
            test_directory: self.test_directory.clone(),
            test_file_extension: self.test_file_extension.clone(),
            experiment_file: self.experiment_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,testmap_api=debug,testmap_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let config = args.api_config();

    let mapping_config = MappingConfig::from_env()?;
    let embedding_config = EmbeddingConfig::from_env()?;
    let generation_config = GenerationConfig::from_env();

    info!(
        embedding_provider = %embedding_config.provider,
        embedding_model = %embedding_config.model,
        dimensions = embedding_config.dimensions,
        generation_provider = %generation_config.provider,
        threshold = mapping_config.similarity_threshold,
        top_k = mapping_config.top_k,
        "starting testmap_server"
    );

    let client = reqwest::Client::new();
    let embedder = embedding::provider::from_config(&client, &embedding_config)?;
    let generator = generation::provider::from_config(&client, &generation_config)?;

    let (pool, store): (_, Arc<dyn VectorStore>) = if args.in_memory {
        warn!("using in-memory vector store; indexed tests are lost on exit");
        let store = InMemoryVectorStore::new(embedding_config.dimensions);
        (None, Arc::new(store) as Arc<dyn VectorStore>)
    } else {
        if embedding_config.dimensions != COLUMN_DIMENSIONS {
            return Err(format!(
                "EMBEDDING_DIMENSIONS={} does not match the {COLUMN_DIMENSIONS}-dimension \
                 embedding column",
                embedding_config.dimensions
            )
            .into());
        }

        info!(max_connections = args.max_connections, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&args.database_url)
            .await?;

        info!("running database migrations");
        testmap_api::migrate(&pool).await?;

        let store = PgVectorStore::new(pool.clone(), COLUMN_DIMENSIONS);
        (Some(pool), Arc::new(store) as Arc<dyn VectorStore>)
    };

    let timeout = mapping_config.provider_timeout;
    let state = testmap_api::AppState {
        pool,
        config: config.clone(),
        engine: Arc::new(MappingEngine::new(
            embedder.clone(),
            generator.clone(),
            store.clone(),
            mapping_config,
        )),
        indexer: Arc::new(Indexer::new(embedder, generator.clone(), store, timeout)),
        workflows: Arc::new(WorkflowBuilder::new(generator, timeout)),
    };

    let app = testmap_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_copied_into_api_config() {
        let args = Args::try_parse_from([
            "testmap_server",
            "--bind-addr",
            "0.0.0.0:8080",
            "--max-connections",
            "12",
            "--test-directory",
            "/srv/LoginModule/Tests",
            "--test-file-extension",
            "py",
            "--experiment-file",
            "/srv/experiment.json",
        ])
        .unwrap();

        assert_eq!(args.max_connections, 12);
        let config = args.api_config();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(
            config.test_directory,
            Some(PathBuf::from("/srv/LoginModule/Tests"))
        );
        assert_eq!(config.test_file_extension, "py");
        assert_eq!(config.experiment_file, PathBuf::from("/srv/experiment.json"));
    }
}
