//! Stockroom CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! stockroom migrate
//!
//! # Seed demo accounts, 10 users and 10 products
//! stockroom seed --users 10 --products 10
//!
//! # Create a staff user (password from STOCKROOM_NEW_USER_PASSWORD or generated)
//! stockroom user create -e admin@example.com -u admin --staff
//!
//! # Issue a read-only token for an integration
//! stockroom token create -u admin -a products:read --ttl-hours 720
//!
//! # Delete tokens that expired more than a day ago
//! stockroom token prune --hours 24
//! ```
//!
//! # Environment Variables
//!
//! - `STOCKROOM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(author, version, about = "Stockroom CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert demo accounts and factory-generated data
    Seed {
        /// Number of extra regular users
        #[arg(long, default_value_t = 0)]
        users: u32,

        /// Number of products
        #[arg(long, default_value_t = 10)]
        products: u32,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage personal access tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new active user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Username
        #[arg(short, long)]
        username: String,

        /// Grant staff rights
        #[arg(long)]
        staff: bool,

        /// Import an existing PHC-format password hash instead of a password
        #[arg(long)]
        password_hash: Option<String>,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for an existing user
    Create {
        /// Email or username of the token owner
        #[arg(short, long)]
        user: String,

        /// Ability granted to the token (repeatable; default `*`)
        #[arg(short, long = "ability")]
        abilities: Vec<String>,

        /// Hours until the token expires (default: never)
        #[arg(long)]
        ttl_hours: Option<u32>,

        /// Token name
        #[arg(long, default_value = "cli-token")]
        name: String,
    },
    /// Delete expired tokens
    Prune {
        /// Only delete tokens that expired at least this many hours ago
        #[arg(long, default_value_t = 24)]
        hours: u32,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { users, products } => commands::seed::run(users, products).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                username,
                staff,
                password_hash,
            } => {
                commands::user::create(&email, &username, staff, password_hash.as_deref()).await?;
            }
        },
        Commands::Token { action } => match action {
            TokenAction::Create {
                user,
                abilities,
                ttl_hours,
                name,
            } => commands::token::create(&user, abilities, ttl_hours, &name).await?,
            TokenAction::Prune { hours } => commands::token::prune(hours).await?,
        },
    }
    Ok(())
}
