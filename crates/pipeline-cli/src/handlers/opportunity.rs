use crate::cli::{OpportunityAction, OpportunityCreateArgs, OpportunityUpdateArgs};
use crate::context::CliContext;
use crate::output;
use pipeline_core::PipelineError;
use pipeline_domain::{FieldUpdate, Opportunity, OpportunityDraft};

pub async fn handle(ctx: &CliContext, action: OpportunityAction) -> anyhow::Result<()> {
    match action {
        OpportunityAction::List { stage_id } => {
            let opportunities = match stage_id {
                Some(stage_id) => ctx.board.opportunities_in_stage(stage_id),
                None => ctx.board.opportunities(),
            };
            output::output_list(opportunities)?;
        }
        OpportunityAction::Show { id } => {
            let thread = ctx.board.open_opportunity(id).await?;
            let opportunity = ctx
                .board
                .opportunity(id)
                .ok_or_else(|| PipelineError::NotFound(format!("Opportunity {}", id)))?;
            output::output_success(serde_json::json!({
                "opportunity": opportunity,
                "notes": thread.notes(),
            }))?;
        }
        OpportunityAction::Create(args) => {
            let opportunity = handle_create(ctx, args).await?;
            output::output_success(&opportunity)?;
        }
        OpportunityAction::Move { id, stage_id } => {
            let opportunity = ctx.board.move_opportunity(id, stage_id).await?;
            output::output_success(&opportunity)?;
        }
        OpportunityAction::Update(args) => {
            let opportunity = handle_update(ctx, args).await?;
            output::output_success(&opportunity)?;
        }
        OpportunityAction::Delete { id } => {
            ctx.board.delete_opportunity(id).await?;
            output::output_success(serde_json::json!({"deleted": id.to_string()}))?;
        }
    }
    Ok(())
}

async fn handle_create(
    ctx: &CliContext,
    args: OpportunityCreateArgs,
) -> anyhow::Result<Opportunity> {
    let mut draft = OpportunityDraft::new(args.title);
    if let Some(description) = args.description {
        draft = draft.with_description(description);
    }
    if let Some(label) = args.label {
        draft = draft.with_label(ctx.label_name(&label).await?);
    }
    if let Some(patient_id) = args.patient_id {
        draft = draft.with_patient(patient_id);
    }
    Ok(ctx.board.create_opportunity(draft).await?)
}

async fn handle_update(
    ctx: &CliContext,
    args: OpportunityUpdateArgs,
) -> anyhow::Result<Opportunity> {
    let current = ctx
        .board
        .opportunity(args.id)
        .ok_or_else(|| PipelineError::NotFound(format!("Opportunity {}", args.id)))?;

    let label = match args.label {
        Some(name) => FieldUpdate::Set(ctx.label_name(&name).await?),
        None if args.clear_label => FieldUpdate::Clear,
        None => FieldUpdate::NoChange,
    };
    let description = match args.description {
        Some(description) => FieldUpdate::Set(description),
        None if args.clear_description => FieldUpdate::Clear,
        None => FieldUpdate::NoChange,
    };

    let mut fields = current.fields();
    if let Some(title) = args.title {
        fields.title = title;
    }
    description.apply_to(&mut fields.description);
    label.apply_to(&mut fields.label);

    Ok(ctx.board.update_opportunity(args.id, fields).await?)
}
