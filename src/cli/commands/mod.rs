mod admin_password;
mod migrate;
mod refresh_search;

pub use admin_password::cmd_admin_password;
pub use migrate::cmd_migrate;
pub use refresh_search::cmd_refresh_search;
