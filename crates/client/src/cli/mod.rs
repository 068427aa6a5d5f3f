use std::{error::Error, sync::Arc};

use clap::{Parser, Subcommand};
use tablecart::storage::FileStore;
use tablecart_client::{
    api::HttpCartApi, config::ClientConfig, context::CartContext, submission::RetryPolicy,
};

mod edit;
mod show;
mod submit;

#[derive(Debug, Parser)]
#[command(name = "tablecart", about = "Offline-first restaurant cart", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: ClientConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the local cart and its pending operations
    Show,

    /// Add a configured menu item
    Add(edit::AddArgs),

    /// Set the quantity of a line; zero or less removes it
    Update(edit::UpdateArgs),

    /// Remove a line
    Remove(edit::RemoveArgs),

    /// Empty the local cart without contacting the server
    Clear,

    /// Send pending operations to the server
    Submit(submit::SubmitArgs),

    /// Replace local lines with the server cart
    Sync,
}

impl Cli {
    /// Load configuration from `.env`, the environment and CLI arguments.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let ctx = context(&self.config)?;

        match self.command {
            Commands::Show => show::run(&ctx),
            Commands::Add(args) => edit::add(&ctx, args),
            Commands::Update(args) => edit::update(&ctx, &args),
            Commands::Remove(args) => edit::remove(&ctx, &args),
            Commands::Clear => edit::clear(&ctx),
            Commands::Submit(args) => submit::submit(&ctx, args).await,
            Commands::Sync => submit::sync(&ctx).await,
        }
    }
}

fn context(config: &ClientConfig) -> Result<CartContext, String> {
    let currency = config.storage.currency().map_err(|error| describe(&error))?;

    let api = HttpCartApi::new(config.api.http())
        .map_err(|error| format!("failed to build HTTP client: {}", describe(&error)))?;

    Ok(CartContext::new(
        config.storage.namespace(),
        Arc::new(FileStore::new(config.storage.data_dir.clone())),
        currency,
        Arc::new(api),
        RetryPolicy::from(&config.retry),
    ))
}

/// Render an error with its source chain.
pub(crate) fn describe(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

#[cfg(test)]
mod tests {
    use tablecart::cart::CartError;
    use tablecart_client::{api::ApiError, submission::SubmissionError};

    use super::*;

    #[test]
    fn describe_includes_sources() {
        let error = SubmissionError::Network {
            attempts: 3,
            source: ApiError::Status {
                status: 503,
                body: "down".to_string(),
            },
        };

        assert_eq!(
            describe(&error),
            "submission failed after 3 attempt(s): cart request failed with status 503: down"
        );
    }

    #[test]
    fn describe_without_source_is_display() {
        assert_eq!(describe(&CartError::InvalidQuantity), "quantity must be at least 1");
    }

    #[test]
    fn parses_subcommand_after_global_flags() {
        let cli = Cli::try_parse_from(["tablecart", "--session", "9", "submit", "--sync"]);

        assert!(
            matches!(cli.map(|cli| cli.command), Ok(Commands::Submit(args)) if args.sync),
            "submit --sync should parse"
        );
    }
}
