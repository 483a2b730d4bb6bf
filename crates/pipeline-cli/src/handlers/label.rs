use crate::cli::LabelAction;
use crate::context::CliContext;
use crate::output;

pub async fn handle(ctx: &CliContext, action: LabelAction) -> anyhow::Result<()> {
    match action {
        LabelAction::List => {
            let labels = ctx.board.load_labels().await?;
            output::output_list(labels)?;
        }
        LabelAction::Create {
            name,
            color,
            context,
        } => {
            let label = ctx
                .board
                .create_label(&name, color, context.map(Into::into))
                .await?;
            output::output_success(&label)?;
        }
    }
    Ok(())
}
