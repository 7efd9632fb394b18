//! Server lifecycle: wiring, binding and graceful shutdown.

use crate::api::{router, AppState};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::market::{MarketClient, DEFAULT_TIMEOUT};
use crate::reddit::{RedditVerifier, TokenCache, VerifierConfig};
use crate::store::{EntryStore, MemoryStore};
use crate::transport::{HttpTransport, ReqwestTransport};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Builder for a holdboard server.
pub struct ServerBuilder {
    config: AppConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    store: Option<Arc<dyn EntryStore>>,
}

impl ServerBuilder {
    /// Create a new builder with the given configuration.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            transport: None,
            store: None,
        }
    }

    /// Use `transport` for all outbound HTTP instead of a real client.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use `store` instead of the one described by the config.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn EntryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Assemble shared state without binding a socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the store cannot be created.
    pub fn build_state(self) -> Result<AppState> {
        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(
                self.config.reddit.request_timeout().max(DEFAULT_TIMEOUT),
            )?),
        };

        let store: Arc<dyn EntryStore> = match (self.store, &self.config.data_file) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(MemoryStore::open(path)?),
            (None, None) => {
                warn!("No data_file configured, entries are kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };

        let verifier = Arc::new(RedditVerifier::new(
            VerifierConfig::from(&self.config.reddit),
            Arc::clone(&transport),
            Arc::new(TokenCache::with_system_clock()),
        ));
        let market = Arc::new(MarketClient::with_transport(
            self.config.market.clone(),
            transport,
        ));

        Ok(AppState::new(self.config, store, verifier, market))
    }

    /// Build state and bind the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be built or the address cannot be bound.
    pub async fn build(self) -> Result<RunningServer> {
        info!("Building holdboard with config: {:?}", self.config);
        let listen = self.config.listen;
        let state = Arc::new(self.build_state()?);

        let listener = TcpListener::bind(listen).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(RunningServer {
            local_addr,
            listener: Some(listener),
            router: router(state),
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        })
    }
}

/// Signals a running server to stop.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    /// Request shutdown.
    pub fn shutdown(&self) {
        let _ = self.0.send(true);
    }
}

/// A bound holdboard server.
pub struct RunningServer {
    local_addr: SocketAddr,
    listener: Option<TcpListener>,
    router: Router,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RunningServer {
    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle that can stop the server from another task.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown_tx))
    }

    /// Serve until shutdown is requested or Ctrl-C is received.
    ///
    /// # Errors
    ///
    /// Returns an error if the server was already run or serving fails.
    pub async fn run(&mut self) -> Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| Error::Server("server already ran".to_string()))?;

        info!("holdboard listening on {}", self.local_addr);

        let mut shutdown_rx = self.shutdown_rx.clone();
        let shutdown_tx = Arc::clone(&self.shutdown_tx);
        let signal = async move {
            tokio::select! {
                () = stopped(&mut shutdown_rx) => {
                    info!("Shutdown signal received");
                }
                () = ctrl_c() => {
                    info!("Ctrl-C received, initiating shutdown");
                    let _ = shutdown_tx.send(true);
                }
            }
        };

        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(signal)
            .await?;

        info!("Server shutdown complete");
        Ok(())
    }

    /// Request the server to shut down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn stopped(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
