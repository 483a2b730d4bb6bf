use crate::cli::ConfigAction;
use crate::output;
use pipeline_core::AppConfig;

const REDACTED: &str = "********";

pub fn handle(config: &AppConfig, action: ConfigAction) -> anyhow::Result<()> {
    let path = AppConfig::config_path().map(|p| p.display().to_string());
    match action {
        ConfigAction::Show => {
            let mut shown = config.clone();
            if shown.api.token.is_some() {
                shown.api.token = Some(REDACTED.to_string());
            }
            output::output_success(serde_json::json!({
                "path": path,
                "author_name": config.effective_author_name(),
                "config": shown,
            }))?;
        }
        ConfigAction::Path => {
            output::output_success(serde_json::json!({ "path": path }))?;
        }
    }
    Ok(())
}
