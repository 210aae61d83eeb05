use crate::{
    domain::migration::Migration,
    infrastructure::{persistence::PersistenceAdapter, settings::Settings},
};
use folio_common::connect_to_database;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod domain;
pub mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = connect_to_database(&settings.database).await?;
    tracing::info!("Connected to DB");
    let persistence = PersistenceAdapter::new(database);

    // create the tables the service writes drafts into
    let migration = Migration::new(persistence);
    let applied = migration.migrate().await?;
    tracing::info!("Schema migrated, {} step(s) applied", applied);

    Ok(())
}
