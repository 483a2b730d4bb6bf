use pipeline_core::{PipelineError, PipelineResult, StageDeletePolicy};
use pipeline_domain::commands::{
    CreateStage, DeleteOpportunity, DeleteStage, RenameStage, ReplaceStage,
};
use pipeline_domain::validation;
use pipeline_domain::{PipelineEvent, Stage, StageDeletion, StageId};
use pipeline_remote::PipelineApi;

use crate::PipelineBoard;

impl<A: PipelineApi> PipelineBoard<A> {
    /// Add a stage after every existing one.
    pub async fn create_stage(&self, name: &str) -> PipelineResult<Stage> {
        let name = validation::required("name", name)?;

        let (command, pending) = self.apply_with(|store| {
            Ok(CreateStage {
                stage: Stage::new(name.clone(), store.next_order_position()?),
            })
        })?;
        let provisional = command.stage;

        match self
            .remote(
                self.api
                    .create_stage(provisional.name.clone(), provisional.order_position),
            )
            .await
        {
            Ok(stage) => {
                self.confirm(&ReplaceStage {
                    provisional_id: provisional.id,
                    stage: stage.clone(),
                });
                tracing::info!(
                    "Created stage: {} (position {})",
                    stage.name,
                    stage.order_position
                );
                self.emit(PipelineEvent::StageCreated {
                    stage: stage.clone(),
                });
                Ok(stage)
            }
            Err(e) => Err(self.revert(pending, "Create stage", e, None).await),
        }
    }

    pub async fn rename_stage(&self, stage_id: StageId, name: &str) -> PipelineResult<Stage> {
        let name = validation::required("name", name)?;
        let (_, pending) = self.apply(RenameStage {
            stage_id,
            name: name.clone(),
        })?;

        match self.remote(self.api.rename_stage(stage_id, name)).await {
            Ok(stage) => {
                self.confirm(&ReplaceStage {
                    provisional_id: stage_id,
                    stage: stage.clone(),
                });
                tracing::info!("Renamed stage to: {}", stage.name);
                self.emit(PipelineEvent::StageRenamed {
                    stage: stage.clone(),
                });
                Ok(stage)
            }
            Err(e) => Err(self.revert(pending, "Rename stage", e, None).await),
        }
    }

    /// Delete a stage, resolving its opportunities with the configured
    /// [`StageDeletePolicy`]. Under `Block` a non-empty stage is refused
    /// before anything is sent.
    pub async fn delete_stage(&self, stage_id: StageId) -> PipelineResult<StageDeletion> {
        let policy = self.settings.stage_delete_policy;
        let mut removed = None;
        let (_, pending) = self.apply_with(|store| {
            let stage = store
                .stage(stage_id)
                .cloned()
                .ok_or_else(|| PipelineError::NotFound(format!("Stage {}", stage_id)))?;
            let members: Vec<_> = store
                .opportunities_in_stage(stage_id)
                .iter()
                .map(|o| o.id)
                .collect();
            removed = Some((stage, members));
            Ok(DeleteStage { stage_id, policy })
        })?;
        let (stage, members) = removed
            .ok_or_else(|| PipelineError::Internal("stage vanished during delete".to_string()))?;

        // a blocked delete of a non-empty stage never gets this far
        let resolution = if members.is_empty() {
            StageDeletion::Empty
        } else if policy == StageDeletePolicy::Cascade {
            StageDeletion::Cascaded(members)
        } else {
            StageDeletion::Orphaned(members)
        };

        let mut cascaded = Vec::new();
        let result = self
            .remote(async {
                if let StageDeletion::Cascaded(ids) = &resolution {
                    for &id in ids {
                        self.api.delete_opportunity(id).await?;
                        cascaded.push(id);
                    }
                }
                self.api.delete_stage(stage_id).await
            })
            .await;

        match result {
            Ok(()) => {
                tracing::info!("Deleted stage: {} ({:?})", stage.name, policy);
                self.emit(PipelineEvent::StageDeleted {
                    stage,
                    resolution: resolution.clone(),
                });
                Ok(resolution)
            }
            Err(e) => {
                let error = self.revert(pending, "Delete stage", e, None).await;
                // opportunities the server already deleted stay deleted
                for opportunity_id in cascaded {
                    self.confirm(&DeleteOpportunity { opportunity_id });
                    self.emit(PipelineEvent::OpportunityDeleted { opportunity_id });
                }
                Err(error)
            }
        }
    }
}
