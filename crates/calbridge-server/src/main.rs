//! calbridged: the calendar-sync daemon.
//!
//! Wires config, stores, and providers into a [`Dispatcher`], then serves
//! mutation requests over a Unix socket until shutdown.

use std::sync::Arc;

use tracing::{info, warn};

use calbridge_core::tracing::{TracingConfig, init_tracing};
use calbridge_providers::{
    AccessInfoStore, BoxFuture, EwsGateway, EwsProvider, EwsSession, GoogleProvider,
    HttpTransport, Office365Provider, ProviderRegistry, ReqwestTransport, SyncError, SyncResult,
    TokenRefresher,
};
use calbridge_server::{Dispatcher, ServerConfig, SignalHandler, SocketServer};
use calbridge_store::{EventStore, JsonFileEventStore};

/// Gateway used when no Exchange connector is wired in; every EWS mutation
/// fails as a configuration error, the same way a broken connector would.
struct DisabledEwsGateway;

impl EwsGateway for DisabledEwsGateway {
    fn open<'a>(
        &'a self,
        _account: &'a str,
        _password: &'a str,
        _url: &'a str,
    ) -> BoxFuture<'a, SyncResult<Box<dyn EwsSession>>> {
        Box::pin(async { Err(SyncError::configuration("EWS gateway is not configured")) })
    }
}

fn config_from_env() -> ServerConfig {
    let mut config = ServerConfig::default();
    if let Ok(path) = std::env::var("CALBRIDGE_SOCKET") {
        config.socket_path = path.into();
    }
    if let Ok(endpoint) = std::env::var("CALBRIDGE_TOKEN_ENDPOINT") {
        config.token_endpoint = endpoint;
    }
    if let Ok(path) = std::env::var("CALBRIDGE_ACCESS_INFO") {
        config.access_info_path = path.into();
    }
    if let Ok(path) = std::env::var("CALBRIDGE_STORE") {
        config.store_path = path.into();
    }
    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(TracingConfig::daemon())?;
    let config = config_from_env();

    let store: Arc<dyn EventStore> = Arc::new(JsonFileEventStore::open(&config.store_path)?);
    let access_store = Arc::new(AccessInfoStore::open(&config.access_info_path)?);
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(config.http_timeout));
    let refresher = TokenRefresher::new(config.token_endpoint.clone(), Arc::clone(&transport));

    let registry = ProviderRegistry::new()
        .with(Arc::new(GoogleProvider::new(
            config.google_calendars_url.clone(),
            Arc::clone(&transport),
            refresher.clone(),
            Arc::clone(&access_store),
        )))
        .with(Arc::new(Office365Provider::new(
            config.office365_events_url.clone(),
            Arc::clone(&transport),
            refresher,
            Arc::clone(&access_store),
        )))
        .with(Arc::new(EwsProvider::new(Arc::new(DisabledEwsGateway))));

    let dispatcher = Arc::new(Dispatcher::new(
        store,
        access_store,
        registry,
        config.max_recur_probes,
    ));

    let signals = SignalHandler::new();
    signals.spawn_listener();

    let server = SocketServer::new(config).await?;
    info!(path = %server.socket_path().display(), "calbridged ready");

    let handler_dispatcher = Arc::clone(&dispatcher);
    server
        .run_until_shutdown(
            move |mut connection| {
                let dispatcher = Arc::clone(&handler_dispatcher);
                async move {
                    loop {
                        match connection.read_request().await {
                            Ok(Some(request)) => {
                                let response = dispatcher.handle(&request).await;
                                if let Err(e) = connection.write_response(&response).await {
                                    warn!(error = %e, "Failed to write response");
                                    break;
                                }
                            }
                            Ok(None) => break,
                            Err(e) => {
                                warn!(error = %e, "Failed to read request");
                                break;
                            }
                        }
                    }
                }
            },
            signals.shutdown().wait(),
        )
        .await?;

    info!("calbridged stopped");
    Ok(())
}
