use super::{Command, CommandContext};
use crate::{MutationScope, Opportunity, OpportunityFields, OpportunityId, StageId};
use pipeline_core::{PipelineError, PipelineResult};

fn require_stage(context: &CommandContext, stage_id: StageId) -> PipelineResult<()> {
    if context.stages.iter().any(|s| s.id == stage_id) {
        Ok(())
    } else {
        Err(PipelineError::NotFound(format!("Stage {}", stage_id)))
    }
}

fn find_opportunity<'a>(
    context: &'a mut CommandContext,
    id: OpportunityId,
) -> PipelineResult<&'a mut Opportunity> {
    context
        .opportunities
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or_else(|| PipelineError::NotFound(format!("Opportunity {}", id)))
}

/// Add an opportunity to an existing stage
pub struct CreateOpportunity {
    pub opportunity: Opportunity,
}

impl Command for CreateOpportunity {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        require_stage(context, self.opportunity.stage_id)?;
        context.opportunities.push(self.opportunity.clone());
        Ok(())
    }

    fn scope(&self, _context: &CommandContext) -> MutationScope {
        MutationScope::new().opportunity(self.opportunity.id)
    }

    fn description(&self) -> String {
        format!("Create opportunity: '{}'", self.opportunity.title)
    }
}

/// Move an opportunity to another stage. Moving into the current stage
/// changes nothing.
pub struct MoveOpportunity {
    pub opportunity_id: OpportunityId,
    pub target_stage_id: StageId,
}

impl Command for MoveOpportunity {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        require_stage(context, self.target_stage_id)?;
        let opportunity = find_opportunity(context, self.opportunity_id)?;
        if opportunity.stage_id != self.target_stage_id {
            opportunity.move_to_stage(self.target_stage_id);
        }
        Ok(())
    }

    fn scope(&self, _context: &CommandContext) -> MutationScope {
        MutationScope::new().opportunity(self.opportunity_id)
    }

    fn description(&self) -> String {
        format!(
            "Move opportunity {} to stage {}",
            self.opportunity_id, self.target_stage_id
        )
    }
}

/// Replace the editable fields of an opportunity
pub struct UpdateOpportunity {
    pub opportunity_id: OpportunityId,
    pub fields: OpportunityFields,
}

impl Command for UpdateOpportunity {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        let opportunity = find_opportunity(context, self.opportunity_id)?;
        opportunity.apply_fields(self.fields.clone());
        Ok(())
    }

    fn scope(&self, _context: &CommandContext) -> MutationScope {
        MutationScope::new().opportunity(self.opportunity_id)
    }

    fn description(&self) -> String {
        format!("Update opportunity {}", self.opportunity_id)
    }
}

/// Remove an opportunity, closing its note thread if it is open
pub struct DeleteOpportunity {
    pub opportunity_id: OpportunityId,
}

impl Command for DeleteOpportunity {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        let pos = context
            .opportunities
            .iter()
            .position(|o| o.id == self.opportunity_id)
            .ok_or_else(|| {
                PipelineError::NotFound(format!("Opportunity {}", self.opportunity_id))
            })?;
        context.opportunities.remove(pos);
        if context.thread_is_for(self.opportunity_id) {
            *context.thread = None;
        }
        Ok(())
    }

    fn scope(&self, context: &CommandContext) -> MutationScope {
        let scope = MutationScope::new().opportunity(self.opportunity_id);
        if context.thread_is_for(self.opportunity_id) {
            scope.with_thread()
        } else {
            scope
        }
    }

    fn description(&self) -> String {
        format!("Delete opportunity {}", self.opportunity_id)
    }
}

/// Swap an opportunity for the server's copy (confirmation or refresh)
pub struct ReplaceOpportunity {
    pub opportunity_id: OpportunityId,
    pub opportunity: Opportunity,
}

impl Command for ReplaceOpportunity {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        let slot = find_opportunity(context, self.opportunity_id)?;
        *slot = self.opportunity.clone();
        if let Some(thread) = context.thread.as_mut() {
            if thread.opportunity_id == self.opportunity_id {
                thread.opportunity_id = self.opportunity.id;
            }
        }
        Ok(())
    }

    fn scope(&self, _context: &CommandContext) -> MutationScope {
        MutationScope::new().opportunity(self.opportunity_id)
    }

    fn description(&self) -> String {
        format!(
            "Confirm opportunity {} as {}",
            self.opportunity_id, self.opportunity.id
        )
    }
}
