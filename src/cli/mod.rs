//! CLI module - Command-line interface for Clozer
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Clozer - classified ads marketplace for vehicles
#[derive(Parser, Debug)]
#[command(name = "clozer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server until Ctrl+C (default)
    #[command(alias = "daemon")]
    Serve,

    /// Apply database migrations and exit
    Migrate,

    /// Recompute the search text of every listing
    #[command(alias = "reindex")]
    RefreshSearch,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Set the password of the `admin` moderator account
    AdminPassword {
        /// New password
        password: String,
    },
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_default_and_daemon_is_an_alias() {
        assert_eq!(Cli::parse_from(["clozer"]).command, None);
        assert_eq!(
            Cli::parse_from(["clozer", "daemon"]).command,
            Some(Commands::Serve)
        );
    }

    #[test]
    fn admin_password_takes_the_password() {
        assert_eq!(
            Cli::parse_from(["clozer", "admin-password", "s3cret"]).command,
            Some(Commands::AdminPassword {
                password: "s3cret".to_string()
            })
        );
        assert!(Cli::try_parse_from(["clozer", "admin-password"]).is_err());
    }
}
