mod cli;

use std::path::{Path, PathBuf};

use actix_web::{web, App, HttpServer};
use clap::{Parser, Subcommand};
use kvsearch::config::{Config, DEFAULT_CONFIG_FILE};
use kvsearch::{build_embedder, seed, SearchService};

/// KVSearch - in-memory vector similarity search over text documents.
#[derive(Parser, Debug)]
#[command(name = "kvsearch", version, about)]
struct CliArgs {
    /// Path to a TOML configuration file. Defaults to ./kvsearch.toml when present.
    #[arg(short = 'c', long = "config", env = "KVSEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(short = 'l', long = "log-level", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the HTTP server (default).
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short = 'p', long)]
        port: Option<u16>,
    },
    /// Interactive session against an in-memory index.
    Repl,
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

fn io_error(err: kvsearch::Error) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

/// Builds the service and loads the configured seed documents.
fn build_service(config: &Config) -> kvsearch::Result<SearchService> {
    config.validate()?;
    let service = SearchService::new(build_embedder(&config.embedding)?);

    if config.seed.builtin {
        service.load_documents(seed::builtin_documents())?;
    }
    if let Some(path) = &config.seed.path {
        service.load_documents(seed::load_seed_file(path)?)?;
    }

    tracing::info!(documents = service.len(), dimension = service.dimension(), "Initial data loaded");
    Ok(service)
}

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    let args = CliArgs::parse();
    init_logging(&args.log_level);

    tracing::info!("Starting kvsearch v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::resolve(args.config.as_deref(), Path::new(DEFAULT_CONFIG_FILE))
        .map_err(io_error)?;

    match args.command.unwrap_or(Mode::Serve { host: None, port: None }) {
        Mode::Repl => {
            let service = build_service(&config).map_err(io_error)?;
            cli::run_repl(&service)?;
        }
        Mode::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let service = web::Data::new(build_service(&config).map_err(io_error)?);
            let addr = config.bind_addr();
            tracing::info!(%addr, "Listening");

            HttpServer::new(move || {
                App::new()
                    .app_data(service.clone())
                    .configure(kvsearch::server::config)
            })
            .bind(addr)?
            .run()
            .await?;
        }
    }

    Ok(())
}
