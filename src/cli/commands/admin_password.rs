//! Admin-password command handler

use crate::config::Config;
use crate::db::Store;

/// Username of the moderator account seeded by the migrations.
const ADMIN_USERNAME: &str = "admin";

pub async fn cmd_admin_password(config: &Config, password: &str) -> anyhow::Result<()> {
    if password.trim().is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let store = Store::new(&config.general.database_path).await?;
    store.update_admin_password(ADMIN_USERNAME, password).await?;

    println!("Password updated for '{ADMIN_USERNAME}'");
    Ok(())
}
