mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use reelid::config::{self, Config};
use reelid::metadata::{MetadataCache, SearchBackend, TmdbBackend};
use reelid::resolver::episodes::EpisodeResolver;
use reelid::resolver::records::RecordFetcher;
use reelid::resolver::Resolver;
use reelid::server::{self, AppContext};
use reelid_store::init_pool;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelid=trace,reelid_parser=debug,reelid_store=debug,tower_http=debug".to_string()
        } else {
            "reelid=debug,reelid_store=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(cli.config.as_deref(), host, port))
        }
        Commands::Resolve { names } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve_names(cli.config.as_deref(), names))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate(path.as_deref())
        }
        Commands::Version => {
            println!("reelid {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load config, apply env overrides and CLI flags, and fail loudly on
/// implausible credentials before anything touches the network.
fn load_validated_config(
    config_path: Option<&std::path::Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<Config> {
    let mut config = config::load_config_or_default(config_path)?;
    config::apply_env(&mut config);

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    config::validate_config(&config)?;
    Ok(config)
}

/// Wire the pipeline: store pool, backend client, cache, resolvers.
fn build_context(config: &Config) -> Result<AppContext> {
    tracing::info!("Initializing metadata cache at {}", config.store.path);
    let pool = init_pool(&config.store.path)?;
    let cache = MetadataCache::new(pool);

    let backend: Arc<dyn SearchBackend> = Arc::new(TmdbBackend::new(&config.backend));
    let records = RecordFetcher::new(backend.clone(), cache.clone());
    let episodes = Arc::new(EpisodeResolver::new(
        backend.clone(),
        cache,
        records.clone(),
        config.episodes.freshness_days,
    ));
    let resolver = Arc::new(Resolver::new(backend, config.funnel.clone()));

    Ok(AppContext {
        resolver,
        records,
        episodes,
        config: Arc::new(config.clone()),
    })
}

async fn serve(
    config_path: Option<&std::path::Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let config = load_validated_config(config_path, host, port)?;

    tracing::info!("Starting reelid server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let ctx = build_context(&config)?;
    server::start_server(config, ctx).await
}

async fn resolve_names(
    config_path: Option<&std::path::Path>,
    names: Vec<String>,
) -> Result<()> {
    let config = load_validated_config(config_path, None, None)?;
    let ctx = build_context(&config)?;

    let results = ctx.resolver.resolve_batch(&names).await;
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}

fn validate(path: Option<&std::path::Path>) -> Result<()> {
    let mut config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };
    config::apply_env(&mut config);

    match config::validate_config(&config) {
        Ok(()) => {
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Backend: {}", config.backend.base_url);
            println!("  Store: {}", config.store.path);
            println!("  Season freshness: {} days", config.episodes.freshness_days);
            Ok(())
        }
        Err(e) => {
            println!("✗ Configuration is invalid: {e}");
            Err(e)
        }
    }
}
