//! Application wiring and lifecycle.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use fleetcast_hub::{hub_router, run_sweeper, spawn_hub, HubHandle};
use fleetcast_route::RouteProvider;
use fleetcast_sim::SimulationOrchestrator;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::routes::{metrics_router, simulation_router};

/// Running fleetcast instance.
pub struct Application {
    config: AppConfig,
    hub: HubHandle,
    hub_task: JoinHandle<()>,
    orchestrator: Arc<SimulationOrchestrator>,
}

impl Application {
    /// Start the hub and build the simulation stack.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let (hub, hub_task) = spawn_hub(config.hub.clone());

        let routes = Arc::new(RouteProvider::http(config.route.clone())?);
        let orchestrator = Arc::new(SimulationOrchestrator::new(
            routes,
            Arc::new(hub.clone()),
            config.simulation.clone(),
        ));

        info!(
            max_connections = config.hub.max_connections,
            queue_depth = config.hub.queue_depth,
            suppress_self_echo = config.hub.suppress_self_echo,
            max_sessions = config.simulation.max_sessions,
            "Application initialized"
        );

        Ok(Self {
            config,
            hub,
            hub_task,
            orchestrator,
        })
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    pub fn orchestrator(&self) -> &Arc<SimulationOrchestrator> {
        &self.orchestrator
    }

    /// Full HTTP surface: WebSocket feed, registry views, simulations, metrics.
    pub fn router(&self) -> Router {
        hub_router(self.hub.clone())
            .merge(simulation_router(Arc::clone(&self.orchestrator)))
            .merge(metrics_router())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        let listener = TcpListener::bind(&self.config.server.bind_addr).await?;
        info!(addr = %listener.local_addr()?, "Listening");

        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        })
        .await
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// On shutdown every simulation is stopped and the hub closes all
    /// outbound queues, which ends the open WebSocket connections so the
    /// server can drain.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sweeper = tokio::spawn(run_sweeper(
            self.hub.clone(),
            self.config.hub.sweep_interval(),
        ));

        let router = self.router();
        let hub = self.hub.clone();
        let orchestrator = Arc::clone(&self.orchestrator);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                orchestrator.stop_all().await;
                if let Err(e) = hub.shutdown().await {
                    error!(error = %e, "Failed to stop hub");
                }
            })
            .await?;

        if let Err(e) = self.hub_task.await {
            error!(error = %e, "Hub task failed");
        }
        if let Err(e) = sweeper.await {
            error!(error = %e, "Sweeper task failed");
        }

        info!("Shutdown complete");
        Ok(())
    }
}
