//! Doações CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! doacoes-cli migrate
//!
//! # Create the first ADMIN account
//! doacoes-cli admin create --email admin@ong.org --password 's3cret-pass' --name "Ana Lima"
//!
//! # Load donors, recipients and items from a YAML file
//! doacoes-cli seed data/seed.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `DOACOES_DATABASE_URL` - `PostgreSQL` connection string (also read from `.env`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "doacoes-cli")]
#[command(author, version, about = "Doações CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load donors, recipients and items from a YAML file
    Seed {
        /// Path to the YAML file
        file: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an ADMIN account
    Create {
        /// Login email
        #[arg(short, long, default_value = "admin@admin.com")]
        email: String,

        /// Initial password
        #[arg(short, long, default_value = "admin123")]
        password: String,

        /// Full name
        #[arg(short, long, default_value = "Administrador")]
        name: String,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                password,
                name,
            } => commands::admin::create_user(&email, &password, &name).await?,
        },
        Commands::Seed { file } => commands::seed::run(&file).await?,
    }
    Ok(())
}
