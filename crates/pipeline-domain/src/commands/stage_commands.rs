use super::{Command, CommandContext};
use crate::{MutationScope, Stage, StageId};
use pipeline_core::{PipelineError, PipelineResult, StageDeletePolicy};

/// Add a stage to the board
pub struct CreateStage {
    pub stage: Stage,
}

impl Command for CreateStage {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        if let Some(taken) = context
            .stages
            .iter()
            .find(|s| s.order_position == self.stage.order_position)
        {
            return Err(PipelineError::Validation(format!(
                "order position {} is already used by stage '{}'",
                self.stage.order_position, taken.name
            )));
        }
        context.stages.push(self.stage.clone());
        Ok(())
    }

    fn scope(&self, _context: &CommandContext) -> MutationScope {
        MutationScope::new().stage(self.stage.id)
    }

    fn description(&self) -> String {
        format!("Create stage: '{}'", self.stage.name)
    }
}

/// Rename a stage in place
pub struct RenameStage {
    pub stage_id: StageId,
    pub name: String,
}

impl Command for RenameStage {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        let stage = context
            .stages
            .iter_mut()
            .find(|s| s.id == self.stage_id)
            .ok_or_else(|| PipelineError::NotFound(format!("Stage {}", self.stage_id)))?;
        stage.rename(self.name.clone());
        Ok(())
    }

    fn scope(&self, _context: &CommandContext) -> MutationScope {
        MutationScope::new().stage(self.stage_id)
    }

    fn description(&self) -> String {
        format!("Rename stage {} to '{}'", self.stage_id, self.name)
    }
}

/// Remove a stage, resolving the opportunities it holds per `policy`
pub struct DeleteStage {
    pub stage_id: StageId,
    pub policy: StageDeletePolicy,
}

impl Command for DeleteStage {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        let pos = context
            .stages
            .iter()
            .position(|s| s.id == self.stage_id)
            .ok_or_else(|| PipelineError::NotFound(format!("Stage {}", self.stage_id)))?;

        let members = context
            .opportunities
            .iter()
            .filter(|o| o.stage_id == self.stage_id)
            .count();

        match self.policy {
            StageDeletePolicy::Block if members > 0 => {
                return Err(PipelineError::Precondition(format!(
                    "stage '{}' still holds {} opportunities",
                    context.stages[pos].name, members
                )));
            }
            StageDeletePolicy::Block | StageDeletePolicy::Orphan => {}
            StageDeletePolicy::Cascade => {
                if let Some(thread_owner) = context.thread.as_ref().map(|t| t.opportunity_id) {
                    let owner_removed = context
                        .opportunities
                        .iter()
                        .any(|o| o.id == thread_owner && o.stage_id == self.stage_id);
                    if owner_removed {
                        *context.thread = None;
                    }
                }
                context
                    .opportunities
                    .retain(|o| o.stage_id != self.stage_id);
            }
        }

        context.stages.remove(pos);
        Ok(())
    }

    fn scope(&self, context: &CommandContext) -> MutationScope {
        let scope = MutationScope::new().stage(self.stage_id);
        if self.policy != StageDeletePolicy::Cascade {
            return scope;
        }

        let members: Vec<_> = context
            .opportunities
            .iter()
            .filter(|o| o.stage_id == self.stage_id)
            .map(|o| o.id)
            .collect();
        let closes_thread = members.iter().any(|id| context.thread_is_for(*id));
        let scope = scope.opportunities(members);
        if closes_thread {
            scope.with_thread()
        } else {
            scope
        }
    }

    fn description(&self) -> String {
        format!("Delete stage {} ({:?})", self.stage_id, self.policy)
    }
}

/// Swap a provisional stage for the server's copy
pub struct ReplaceStage {
    pub provisional_id: StageId,
    pub stage: Stage,
}

impl Command for ReplaceStage {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        let slot = context
            .stages
            .iter_mut()
            .find(|s| s.id == self.provisional_id)
            .ok_or_else(|| PipelineError::NotFound(format!("Stage {}", self.provisional_id)))?;
        *slot = self.stage.clone();

        if self.provisional_id != self.stage.id {
            for opportunity in context
                .opportunities
                .iter_mut()
                .filter(|o| o.stage_id == self.provisional_id)
            {
                opportunity.stage_id = self.stage.id;
            }
        }
        Ok(())
    }

    fn scope(&self, _context: &CommandContext) -> MutationScope {
        MutationScope::new().stage(self.provisional_id)
    }

    fn description(&self) -> String {
        format!("Confirm stage {} as {}", self.provisional_id, self.stage.id)
    }
}
