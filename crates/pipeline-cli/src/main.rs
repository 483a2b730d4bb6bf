mod cli;
mod context;
mod handlers;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use context::CliContext;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Ok(log_path) = std::env::var("PIPELINE_DEBUG_LOG") {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        // stdout carries the JSON responses
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "pipeline", &mut std::io::stdout());
        return Ok(());
    }

    if let Err(e) = run(cli).await {
        tracing::debug!("Command failed: {:#}", e);
        output::output_error(&format!("{:#}", e));
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = context::resolve_config(&cli);

    match cli.command {
        Commands::Config(config_cmd) => {
            handlers::config::handle(&config, config_cmd.action)?;
        }
        Commands::Label(label_cmd) => {
            let ctx = CliContext::connect(&config)?;
            handlers::label::handle(&ctx, label_cmd.action).await?;
        }
        Commands::Board => {
            let ctx = CliContext::load(&config).await?;
            handlers::board::handle(&ctx).await?;
        }
        Commands::Stage(stage_cmd) => {
            let ctx = CliContext::load(&config).await?;
            handlers::stage::handle(&ctx, stage_cmd.action).await?;
        }
        Commands::Opportunity(opportunity_cmd) => {
            let ctx = CliContext::load(&config).await?;
            handlers::opportunity::handle(&ctx, opportunity_cmd.action).await?;
        }
        Commands::Note(note_cmd) => {
            let ctx = CliContext::load(&config).await?;
            handlers::note::handle(&ctx, note_cmd.action).await?;
        }
        Commands::Completions { .. } => {}
    }
    Ok(())
}
