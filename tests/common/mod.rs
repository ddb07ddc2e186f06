//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires the full pipeline — TMDB backend
//! pointed at a [`wiremock`] server, in-memory metadata store, resolver,
//! episode resolver — and starts Axum on a random port for HTTP-level
//! testing.

use std::net::SocketAddr;
use std::sync::Arc;

use reelid::config::Config;
use reelid::metadata::{MetadataCache, SearchBackend, TmdbBackend};
use reelid::resolver::episodes::EpisodeResolver;
use reelid::resolver::records::RecordFetcher;
use reelid::resolver::Resolver;
use reelid::server::{create_router, AppContext};
use reelid_store::init_memory_pool;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory store and a mock retrieval backend.
pub struct TestHarness {
    pub ctx: AppContext,
}

impl TestHarness {
    /// Create a harness whose backend talks to `backend_url` (a wiremock
    /// server).
    pub fn new(backend_url: &str) -> Self {
        let mut config = Config::default();
        config.backend.api_key = "test-key-1234567890".to_string();
        config.backend.base_url = backend_url.to_string();

        let pool = init_memory_pool().expect("failed to create in-memory pool");
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

        let ctx = AppContext {
            resolver,
            records,
            episodes,
            config: Arc::new(config),
        };

        Self { ctx }
    }

    /// Create a harness and serve it on a random local port.
    pub async fn with_server(backend_url: &str) -> (Self, SocketAddr) {
        let harness = Self::new(backend_url);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("listener has no addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server died");
        });

        (harness, addr)
    }
}
