use pipeline_core::{PipelineError, PipelineResult};
use pipeline_domain::commands::{
    AppendNote, CreateOpportunity, DeleteOpportunity, MoveOpportunity, ReplaceNote,
    ReplaceOpportunity, UpdateOpportunity,
};
use pipeline_domain::validation;
use pipeline_domain::{
    NewOpportunity, Note, NoteThread, Opportunity, OpportunityDraft, OpportunityFields,
    OpportunityId, OpportunityPatch, PipelineEvent, RevertedMove, StageId,
};
use pipeline_remote::PipelineApi;

use crate::PipelineBoard;

fn not_found(id: OpportunityId) -> PipelineError {
    PipelineError::NotFound(format!("Opportunity {}", id))
}

impl<A: PipelineApi> PipelineBoard<A> {
    /// Create an opportunity in the entry stage (lowest order position).
    pub async fn create_opportunity(&self, draft: OpportunityDraft) -> PipelineResult<Opportunity> {
        let draft = draft.validate()?;

        let (command, pending) = self.apply_with(|store| {
            let entry = store.entry_stage().ok_or_else(|| {
                PipelineError::Precondition(
                    "no stages: create a stage before adding opportunities".to_string(),
                )
            })?;
            Ok(CreateOpportunity {
                opportunity: Opportunity::new(draft, entry.id),
            })
        })?;
        let provisional = command.opportunity;

        let fields = NewOpportunity::from(&provisional);
        match self.remote(self.api.create_opportunity(fields)).await {
            Ok(opportunity) => {
                self.confirm(&ReplaceOpportunity {
                    opportunity_id: provisional.id,
                    opportunity: opportunity.clone(),
                });
                tracing::info!(
                    "Created opportunity: {} (id: {})",
                    opportunity.title,
                    opportunity.id
                );
                self.emit(PipelineEvent::OpportunityCreated {
                    opportunity: opportunity.clone(),
                });
                Ok(opportunity)
            }
            Err(e) => Err(self.revert(pending, "Create opportunity", e, None).await),
        }
    }

    /// Move an opportunity to another stage. Drag-and-drop and the explicit
    /// stage selector both end up here.
    ///
    /// Moving an opportunity into the stage it already belongs to returns it
    /// unchanged and sends nothing.
    pub async fn move_opportunity(
        &self,
        opportunity_id: OpportunityId,
        target_stage_id: StageId,
    ) -> PipelineResult<Opportunity> {
        let origin_stage = {
            let store = self.store.lock();
            let current = store
                .opportunity(opportunity_id)
                .ok_or_else(|| not_found(opportunity_id))?;
            if current.stage_id == target_stage_id {
                tracing::debug!("Opportunity {} is already in that stage", opportunity_id);
                return Ok(current.clone());
            }
            current.stage_id
        };

        let (_, pending) = self.apply(MoveOpportunity {
            opportunity_id,
            target_stage_id,
        })?;

        let patch = OpportunityPatch::move_to(target_stage_id);
        match self
            .remote(self.api.update_opportunity(opportunity_id, patch))
            .await
        {
            Ok(opportunity) => {
                self.confirm(&ReplaceOpportunity {
                    opportunity_id,
                    opportunity: opportunity.clone(),
                });
                tracing::info!(
                    "Moved opportunity {} from {} to {}",
                    opportunity.title,
                    origin_stage,
                    target_stage_id
                );
                self.emit(PipelineEvent::OpportunityMoved {
                    opportunity: opportunity.clone(),
                    from: origin_stage,
                    to: target_stage_id,
                });
                Ok(opportunity)
            }
            Err(e) => {
                let restore_to = RevertedMove {
                    opportunity_id,
                    origin_stage,
                };
                Err(self.revert(pending, "Move opportunity", e, Some(restore_to)).await)
            }
        }
    }

    /// Replace title, description and label.
    pub async fn update_opportunity(
        &self,
        opportunity_id: OpportunityId,
        fields: OpportunityFields,
    ) -> PipelineResult<Opportunity> {
        let fields = fields.validate()?;
        let patch = OpportunityPatch::replace_fields(&fields);
        let (_, pending) = self.apply(UpdateOpportunity {
            opportunity_id,
            fields,
        })?;

        match self
            .remote(self.api.update_opportunity(opportunity_id, patch))
            .await
        {
            Ok(opportunity) => {
                self.confirm(&ReplaceOpportunity {
                    opportunity_id,
                    opportunity: opportunity.clone(),
                });
                tracing::info!("Updated opportunity: {}", opportunity.title);
                self.emit(PipelineEvent::OpportunityUpdated {
                    opportunity: opportunity.clone(),
                });
                Ok(opportunity)
            }
            Err(e) => Err(self.revert(pending, "Update opportunity", e, None).await),
        }
    }

    /// Delete an opportunity. The server removes its notes with it.
    pub async fn delete_opportunity(&self, opportunity_id: OpportunityId) -> PipelineResult<()> {
        let (_, pending) = self.apply(DeleteOpportunity { opportunity_id })?;

        match self
            .remote(self.api.delete_opportunity(opportunity_id))
            .await
        {
            Ok(()) => {
                tracing::info!("Deleted opportunity {}", opportunity_id);
                self.emit(PipelineEvent::OpportunityDeleted { opportunity_id });
                Ok(())
            }
            Err(e) => Err(self.revert(pending, "Delete opportunity", e, None).await),
        }
    }

    /// Open an opportunity's details: fetch its current copy and its notes,
    /// and make that the open thread.
    pub async fn open_opportunity(
        &self,
        opportunity_id: OpportunityId,
    ) -> PipelineResult<NoteThread> {
        let (opportunity, notes) = self
            .remote(async {
                futures::try_join!(
                    self.api.fetch_opportunity(opportunity_id),
                    self.api.fetch_notes(opportunity_id)
                )
            })
            .await?;

        let mut store = self.store.lock();
        if store.opportunity(opportunity_id).is_some() {
            store.execute(&ReplaceOpportunity {
                opportunity_id,
                opportunity,
            })?;
        }
        store.load_notes(opportunity_id, notes);
        tracing::debug!("Opened opportunity {}", opportunity_id);
        Ok(store
            .thread()
            .cloned()
            .unwrap_or_else(|| NoteThread::new(opportunity_id, Vec::new())))
    }

    pub fn close_opportunity(&self) {
        self.store.lock().close_thread();
    }

    /// Append a note. It shows up at once in the open thread if it belongs
    /// to that opportunity.
    pub async fn add_note(&self, opportunity_id: OpportunityId, body: &str) -> PipelineResult<Note> {
        let body = validation::required("note", body)?;
        let provisional = Note::new(
            opportunity_id,
            Some(self.settings.author_name.clone()),
            body.clone(),
        );
        let provisional_id = provisional.id;
        let (_, pending) = self.apply(AppendNote { note: provisional })?;

        match self
            .remote(self.api.create_note(opportunity_id, body))
            .await
        {
            Ok(note) => {
                self.confirm(&ReplaceNote {
                    note_id: provisional_id,
                    note: note.clone(),
                });
                tracing::info!("Added note to opportunity {}", opportunity_id);
                self.emit(PipelineEvent::NoteAdded { note: note.clone() });
                Ok(note)
            }
            Err(e) => Err(self.revert(pending, "Add note", e, None).await),
        }
    }
}
