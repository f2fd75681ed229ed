//! Refresh-search command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_refresh_search(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let updated = store.anuncios().refresh_search_text().await?;

    println!("Search text refreshed: {updated} listing(s) changed");
    Ok(())
}
