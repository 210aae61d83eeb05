use std::sync::Arc;

use anyhow::Context;
use folio_common::{ArticleGateway, connect_to_database};

use crate::domain::autosave::DelayPolicy;
use crate::domain::sessions::SessionRegistry;
use crate::infrastructure::AppStateImpl;
use crate::infrastructure::gateway::{HttpGateway, PostgresGateway};
use crate::infrastructure::http::{HttpServer, HttpServerConfig};
use crate::infrastructure::settings::{GatewaySettings, SessionSettings, Settings};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod domain;
mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let policy = DelayPolicy::from(&settings.autosave);

    match &settings.gateway {
        GatewaySettings::Postgres => {
            let database_settings = settings
                .database
                .as_ref()
                .context("gateway kind 'postgres' requires database settings")?;
            let database = connect_to_database(database_settings).await?;
            tracing::info!("Connected to DB");

            serve(PostgresGateway::new(database), &settings, policy).await
        }
        GatewaySettings::Http(http) => {
            let gateway = HttpGateway::new(http)?;
            tracing::info!("Using article API at {}", http.base_url);

            serve(gateway, &settings, policy).await
        }
    }
}

async fn serve<G: ArticleGateway>(
    gateway: G,
    settings: &Settings,
    policy: DelayPolicy,
) -> anyhow::Result<()> {
    let sessions = start_sessions(gateway, policy, &settings.sessions);
    let state = AppStateImpl::new(sessions);

    let server_config = HttpServerConfig {
        port: &settings.server_port,
    };
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}

fn start_sessions<G: ArticleGateway>(
    gateway: G,
    policy: DelayPolicy,
    settings: &SessionSettings,
) -> Arc<SessionRegistry<G>> {
    let sessions = Arc::new(SessionRegistry::new(gateway, policy, settings.idle_timeout()));
    sessions.start_idle_sweep(settings.sweep_interval());
    sessions
}
