//! Store Ratings CLI - Database migrations and bootstrap tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! sr-cli migrate
//!
//! # Create the first administrator (password from RATINGS_ADMIN_PASSWORD)
//! sr-cli admin create -e admin@example.com -n "Store Ratings Administrator"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sr-cli")]
#[command(author, version, about = "Store Ratings CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage administrator accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new administrator
    Create {
        /// Administrator email address
        #[arg(short, long)]
        email: String,

        /// Display name (20-60 characters)
        #[arg(short, long)]
        name: String,

        /// Optional postal address
        #[arg(short, long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                address,
            } => {
                commands::admin::create(&email, &name, address.as_deref()).await?;
            }
        },
    }
    Ok(())
}
