use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_authz::TokenAuthenticator;
use shelf_kernel::settings::Settings;

/// Operate the shelf book collection service
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server until interrupted
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the merged OpenAPI document
    Openapi {
        /// Emit compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    let authenticator = Arc::new(TokenAuthenticator::from_settings(&settings.auth));

    match cli.command {
        Command::Serve { port } => {
            shelf_telemetry::init(&settings.telemetry)?;
            if let Some(port) = port {
                settings.server.port = port;
            }
            tracing::info!(env = ?settings.environment, port = settings.server.port, "shelf serve");

            let registry = shelf_app::build_registry(&settings, authenticator);
            shelf_app::run(&registry, &settings).await
        }
        Command::Openapi { compact } => {
            let registry = shelf_app::build_registry(&settings, authenticator);
            let document = shelf_http::router::openapi_document(&registry);
            let rendered = if compact {
                serde_json::to_string(&document)?
            } else {
                serde_json::to_string_pretty(&document)?
            };
            println!("{rendered}");
            Ok(())
        }
    }
}
