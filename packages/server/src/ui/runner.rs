//! Server startup.

use std::sync::Arc;

use axum::Router;
use tokio::{net::TcpListener, task::JoinHandle};

use crate::{
    config::{Config, RegistrationSettings},
    domain::ConnectionRegistry,
    error::ServerError,
    hub::Hub,
    infrastructure::{
        inbox::inbox,
        registrar::{HttpRegistrar, register_service},
        registry::InMemoryConnectionRegistry,
    },
    ui::{
        router::build_router,
        signal::shutdown_signal,
        state::{AppState, OriginPolicy},
    },
    usecase::DispatchMessageUseCase,
};

/// A fully wired application: router, shared state and the running hub.
pub struct App {
    pub router: Router,
    pub state: Arc<AppState>,
    pub hub: JoinHandle<()>,
}

/// Wire the registry, inbox, hub and router from `config`.
///
/// The hub task is spawned immediately, so this must run inside a Tokio runtime.
pub fn build_app(
    config: &Config,
    registration: Option<&RegistrationSettings>,
) -> Result<App, ServerError> {
    let paths = config.websocket_paths(registration)?;

    let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());
    let (inbox, receiver) = inbox(config.inbox_capacity, config.inbox_overflow_policy());

    let dispatcher =
        DispatchMessageUseCase::new(registry.clone(), config.routing, config.write_timeout());
    let hub = Hub::new(receiver, dispatcher).spawn();

    let origin_policy = OriginPolicy::from_allowed(config.allowed_origins.clone());
    if origin_policy == OriginPolicy::AllowAll {
        tracing::warn!("no allowed origins configured; accepting WebSocket upgrades from any origin");
    }

    let state = Arc::new(AppState::new(registry, inbox, origin_policy));
    let router = build_router(state.clone(), &paths);

    Ok(App { router, state, hub })
}

/// Run the server until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<(), ServerError> {
    config.validate()?;

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let registration = config.registration();
    if let Some(settings) = &registration {
        tracing::info!(
            service_name = %settings.service_name,
            service_id = %settings.service_id,
            registrar = %settings.registrar_url,
            "registering service"
        );
        let registrar = HttpRegistrar::new(settings.registrar_url.clone());
        register_service(&registrar, settings).await?;
    }

    let app = build_app(&config, registration.as_ref())?;

    tracing::info!("Starting WebSocket server at ws://{}{}", addr, config.path);
    if let Some(settings) = &registration {
        tracing::info!("Service endpoint at ws://{}{}", addr, settings.connect_path());
    }

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    app.hub.abort();
    tracing::info!("server stopped");
    Ok(())
}
