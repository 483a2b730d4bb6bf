use crate::cli::StageAction;
use crate::context::CliContext;
use crate::output;

pub async fn handle(ctx: &CliContext, action: StageAction) -> anyhow::Result<()> {
    match action {
        StageAction::List => {
            output::output_list(ctx.board.stages())?;
        }
        StageAction::Create { name } => {
            let stage = ctx.board.create_stage(&name).await?;
            output::output_success(&stage)?;
        }
        StageAction::Rename { id, name } => {
            let stage = ctx.board.rename_stage(id, &name).await?;
            output::output_success(&stage)?;
        }
        StageAction::Delete { id, .. } => {
            let resolution = ctx.board.delete_stage(id).await?;
            output::output_success(serde_json::json!({
                "deleted": id.to_string(),
                "resolution": resolution,
            }))?;
        }
    }
    Ok(())
}
