use crate::cli::NoteAction;
use crate::context::CliContext;
use crate::output;

pub async fn handle(ctx: &CliContext, action: NoteAction) -> anyhow::Result<()> {
    match action {
        NoteAction::Add {
            opportunity_id,
            body,
        } => {
            let note = ctx.board.add_note(opportunity_id, &body).await?;
            output::output_success(&note)?;
        }
    }
    Ok(())
}
