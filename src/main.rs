mod cli;
mod classify;
mod config;
mod engine;
mod errors;
mod expand;
mod inputs;
mod llm;
mod models;
mod prompts;
mod store;
mod synthesis;
mod utils;
mod writer;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .init();

    debug!(
        build = option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        git = option_env!("GIT_HASH").unwrap_or("dev"),
        "sondo starting"
    );

    let result = match cli.command {
        cli::Commands::Generate(args) => cli::generate::handle_generate(args).await,
        cli::Commands::Execute(args) => cli::execute::handle_execute(args).await,
        cli::Commands::Verify(args) => cli::verify::handle_verify(args).await,
    };

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            let exit_code = match &e {
                errors::SondoError::Config(_) => 2,
                errors::SondoError::Prompt(_) => 3,
                errors::SondoError::Authentication(_) => 4,
                errors::SondoError::Input(_) => 5,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    }
}
