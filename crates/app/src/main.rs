use std::{io, path::PathBuf};

use clap::{Parser, Subcommand};

mod settings;

#[derive(Debug, Parser)]
#[command(name = "expense_bot", version, about = "Personal expense tracking bot for Telegram")]
struct Cli {
    /// Settings file (TOML). Defaults to `settings.toml` when present.
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Long polling (default).
    Run,
    /// Handle one update payload, read from a file or stdin.
    HandleUpdate {
        #[arg(long)]
        payload: Option<PathBuf>,
    },
    /// Deliver updates to `url` instead of polling.
    SetWebhook { url: String },
    DeleteWebhook,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "expense_bot={level},telegram_bot={level},ledger={level}",
            level = settings.app.level
        ))
        .init();

    tracing::info!(
        "Found telegram settings for owner {}, storage backend {}",
        settings.telegram.owner_id,
        settings.repository.backend
    );
    let repository = ledger::new_repository(&settings.repository)?;
    let mut builder = telegram_bot::Bot::builder()
        .token(&settings.telegram.token()?)
        .owner(telegram_bot::UserId(settings.telegram.owner_id))
        .repository(repository)
        .timezone(settings.telegram.timezone()?);
    let command = cli.command.unwrap_or(Commands::Run);
    if matches!(command, Commands::HandleUpdate { .. }) {
        builder = builder.session_file(settings.telegram.session_file());
    }
    if let Some(labels) = settings.telegram.income_descriptions {
        builder = builder.income_labels(labels);
    }
    let bot = builder.build()?;

    match command {
        Commands::Run => bot.run().await,
        Commands::HandleUpdate { payload } => {
            let body = match payload {
                Some(path) => std::fs::read_to_string(path)?,
                None => io::read_to_string(io::stdin())?,
            };
            bot.handle_payload(&body).await?;
        }
        Commands::SetWebhook { url } => bot.set_webhook(&url).await?,
        Commands::DeleteWebhook => bot.delete_webhook().await?,
    }

    Ok(())
}
