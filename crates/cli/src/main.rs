//! Marketplace CLI - session store migrations and route inspection.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! mp-cli migrate
//!
//! # Print the route table
//! mp-cli routes
//!
//! # Show what a seller gets for /orders
//! mp-cli check --role seller /orders
//!
//! # Same path without a session
//! mp-cli check --role none /orders
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the `PostgreSQL` session table
//! - `routes` - List every route with its area and menu label
//! - `check` - Evaluate the route guards for a path and session state

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Marketplace storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session store table
    Migrate,
    /// List the route table
    Routes {
        /// Only list routes in this area (`public`, `user`, `seller`, `admin`)
        #[arg(short, long)]
        area: Option<String>,
    },
    /// Show how a path is handled for a session state
    Check {
        /// Session role (`user`, `seller`, `admin`), `none` for no session,
        /// or `unresolved` for an unconfirmed token
        #[arg(short, long, default_value = "none")]
        role: String,

        /// Request path, e.g. `/orders`
        path: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::Routes { area } => commands::routes::list(area.as_deref())?,
        Commands::Check { role, path } => commands::routes::check(&role, &path)?,
    }
    Ok(())
}
