//! Migrate command handler

use crate::config::Config;
use crate::db::Store;

/// Connecting applies pending migrations.
pub async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    store.ping().await?;

    println!("Database is up to date: {}", config.general.database_path);
    Ok(())
}
