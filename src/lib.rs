//! shelf application library
//!
//! Book and user modules plus the bootstrap that wires them into the HTTP server.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use shelf_authz::Authenticator;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Build a registry holding every application module
pub fn build_registry(settings: &Settings, authenticator: Arc<dyn Authenticator>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings, authenticator);
    registry
}

/// Run the module lifecycle around the HTTP server until Ctrl-C
pub async fn run(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let ctx = InitCtx { settings };

    registry
        .init_all(&ctx)
        .await
        .context("module initialization failed")?;
    registry
        .start_all(&ctx)
        .await
        .context("module start failed")?;

    let served = shelf_http::start_server(registry, settings, shutdown_signal()).await;

    registry.stop_all().await.context("module stop failed")?;
    served
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => {
            tracing::error!(error = %err, "unable to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
