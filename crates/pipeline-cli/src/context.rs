use crate::cli::{Cli, Commands, StageAction, StageCommand};
use pipeline_core::{AppConfig, PipelineError, PipelineResult};
use pipeline_remote::HttpPipelineApi;
use pipeline_sync::{BoardSettings, PipelineBoard};

/// Config file, then environment, then command-line flags.
pub fn resolve_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::load();
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.api.token = Some(token.clone());
    }
    if let Commands::Stage(StageCommand {
        action: StageAction::Delete {
            policy: Some(policy),
            ..
        },
    }) = &cli.command
    {
        config.stage_delete_policy = (*policy).into();
    }
    config
}

pub struct CliContext {
    pub board: PipelineBoard<HttpPipelineApi>,
}

impl CliContext {
    /// Build the board without fetching anything.
    pub fn connect(config: &AppConfig) -> PipelineResult<Self> {
        let api = HttpPipelineApi::new(&config.api)?;
        tracing::debug!("Using clinic API at {}", api.base_url());
        Ok(Self {
            board: PipelineBoard::new(api, BoardSettings::from(config)),
        })
    }

    /// Build the board and load the current stages and opportunities.
    pub async fn load(config: &AppConfig) -> PipelineResult<Self> {
        let ctx = Self::connect(config)?;
        ctx.board.refresh().await?;
        Ok(ctx)
    }

    /// Canonical name of a sales label, fetching the label set on first use.
    pub async fn label_name(&self, name: &str) -> PipelineResult<String> {
        if self.board.labels().is_empty() {
            self.board.load_labels().await?;
        }
        self.board
            .resolve_label(name)
            .map(|label| label.name)
            .ok_or_else(|| PipelineError::NotFound(format!("Label not found: {}", name.trim())))
    }
}
