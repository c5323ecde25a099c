use crate::http::{self, AppState};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use moviedb_config::Config;
use moviedb_core::{Accounts, Catalog, InMemoryStore, MongoStore, Store};
use moviedb_identity::{Auth0Client, IdentityProvider, InMemoryDirectory};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

pub struct ServeOptions {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub in_memory: bool,
}

pub async fn run_serve(mut config: Config, options: ServeOptions) -> Result<()> {
    if let Some(bind) = options.bind {
        config.server.bind = bind;
    }
    if let Some(port) = options.port {
        config.server.port = port;
    }

    let store: Arc<dyn Store> = if options.in_memory {
        warn!("Serving from memory, nothing will be persisted");
        Arc::new(InMemoryStore::new())
    } else {
        info!(namespace = %config.database.namespace, "Connecting to MongoDB");
        let store = MongoStore::connect(&config.database)
            .await
            .map_err(|e| eyre!("Failed to connect to MongoDB: {}", e))?;
        Arc::new(store)
    };

    let identity: Arc<dyn IdentityProvider> = if !config.identity.is_configured() && options.in_memory {
        warn!("Identity provider not configured, using an empty in-memory user directory");
        Arc::new(InMemoryDirectory::new())
    } else {
        if !config.identity.is_configured() {
            warn!("Identity provider not configured, account routes will answer 502");
        }
        Arc::new(Auth0Client::new(config.identity.clone()))
    };

    let accounts = Accounts::new(identity, store.clone(), config.identity.admin_role.clone());
    let state = AppState {
        catalog: Catalog::new(store),
        accounts,
        movies_per_page: config.server.movies_per_page,
    };
    let app = http::router(state, &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .map_err(|e| eyre!("Invalid listen address {}:{}: {}", config.server.bind, config.server.port, e))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| eyre!("Failed to bind {}: {}", addr, e))?;

    info!(
        address = %addr,
        prefix = %config.server.api_prefix,
        "Listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| eyre!("Server error: {}", e))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
