use crate::context::CliContext;
use crate::output;

pub async fn handle(ctx: &CliContext) -> anyhow::Result<()> {
    output::output_success(ctx.board.view())
}
