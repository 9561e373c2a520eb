use std::sync::Arc;

use anyhow::Context;
use shelf_authz::TokenAuthenticator;
use shelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        host = %settings.server.host,
        port = settings.server.port,
        "shelf-app bootstrap starting"
    );

    let authenticator = Arc::new(TokenAuthenticator::from_settings(&settings.auth));
    let registry = shelf_app::build_registry(&settings, authenticator);

    shelf_app::run(&registry, &settings).await?;

    tracing::info!("shelf-app stopped");
    Ok(())
}
