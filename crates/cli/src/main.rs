//! Projectopia CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! projectopia migrate
//!
//! # Create one sample account per role (development only)
//! projectopia seed
//!
//! # Create an account
//! projectopia user create -e admin@uni.edu -n "Ada Admin" -r Admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Ensure the sample accounts exist
//! - `user create` - Create an account with a temporary password

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "projectopia")]
#[command(author, version, about = "Projectopia CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create the sample admin, supervisor and student accounts
    Seed,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Full name
        #[arg(short, long)]
        name: String,

        /// Role (`Admin`, `Supervisor`, `Student`)
        #[arg(short, long, default_value = "Student")]
        role: String,

        /// Phone number
        #[arg(short, long)]
        phone: Option<String>,
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
        Commands::Seed => commands::seed::sample_accounts().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                phone,
            } => {
                commands::user::create(&email, &name, &role, phone).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "projectopia",
            "user",
            "create",
            "-e",
            "ada@uni.edu",
            "-n",
            "Ada Admin",
            "-r",
            "Admin",
            "-p",
            "555-0100",
        ]);
        let Ok(Cli {
            command: Commands::User {
                action: UserAction::Create { email, role, phone, .. },
            },
        }) = cli
        else {
            panic!("expected user create");
        };
        assert_eq!(email, "ada@uni.edu");
        assert_eq!(role, "Admin");
        assert_eq!(phone.as_deref(), Some("555-0100"));
    }
}
