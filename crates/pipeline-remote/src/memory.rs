//! An in-process stand-in for the clinic API.
//!
//! Assigns its own ids and timestamps like the real server, records every
//! call, and can be told to fail or stall specific operations so rollback
//! paths can be exercised without a network.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use pipeline_core::{PipelineError, PipelineResult};
use pipeline_domain::{
    Label, LabelFilter, NewLabel, NewOpportunity, Note, Opportunity, OpportunityId,
    OpportunityPatch, Stage, StageId,
};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::PipelineApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    FetchStages,
    FetchOpportunities,
    FetchOpportunity,
    FetchNotes,
    CreateStage,
    RenameStage,
    DeleteStage,
    CreateOpportunity,
    UpdateOpportunity,
    DeleteOpportunity,
    CreateNote,
    FetchLabels,
    CreateLabel,
}

impl ApiOperation {
    pub fn is_write(self) -> bool {
        !matches!(
            self,
            ApiOperation::FetchStages
                | ApiOperation::FetchOpportunities
                | ApiOperation::FetchOpportunity
                | ApiOperation::FetchNotes
                | ApiOperation::FetchLabels
        )
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A failure queued for one future call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    NotFound(String),
    Transport(String),
}

impl InjectedFailure {
    fn into_error(self) -> PipelineError {
        match self {
            InjectedFailure::NotFound(msg) => PipelineError::NotFound(msg),
            InjectedFailure::Transport(msg) => PipelineError::Transport(msg),
        }
    }
}

#[derive(Default)]
struct ServerState {
    stages: Vec<Stage>,
    opportunities: Vec<Opportunity>,
    notes: Vec<Note>,
    labels: Vec<Label>,
}

#[derive(Default)]
struct Faults {
    failures: Vec<(ApiOperation, InjectedFailure)>,
    delays: Vec<(ApiOperation, Duration)>,
}

pub struct InMemoryApi {
    state: Mutex<ServerState>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<ApiOperation>>,
    author: Option<String>,
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServerState::default()),
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(Vec::new()),
            author: None,
        }
    }

    /// Name stamped on notes this server creates, as the real API does
    /// from the session user.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Seed a stage directly, bypassing the call log.
    pub fn seed_stage(&self, name: &str, order_position: i32) -> Stage {
        let stage = Stage {
            id: Uuid::new_v4(),
            name: name.to_string(),
            order_position,
        };
        self.state.lock().stages.push(stage.clone());
        stage
    }

    pub fn seed_opportunity(&self, title: &str, stage_id: StageId) -> Opportunity {
        let now = Utc::now();
        let opportunity = Opportunity {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            label: None,
            stage_id,
            patient_id: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().opportunities.push(opportunity.clone());
        opportunity
    }

    pub fn seed_note(&self, note: Note) {
        self.state.lock().notes.push(note);
    }

    pub fn seed_label(&self, label: Label) {
        self.state.lock().labels.push(label);
    }

    /// Make the next call to `operation` fail. Failures queue up in order.
    pub fn fail_next(&self, operation: ApiOperation, failure: InjectedFailure) {
        self.faults.lock().failures.push((operation, failure));
    }

    /// Make the next call to `operation` sleep for `delay` before answering.
    pub fn delay_next(&self, operation: ApiOperation, delay: Duration) {
        self.faults.lock().delays.push((operation, delay));
    }

    pub fn calls(&self) -> Vec<ApiOperation> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, operation: ApiOperation) -> usize {
        self.calls.lock().iter().filter(|c| **c == operation).count()
    }

    pub fn write_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_write()).count()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.state.lock().stages.clone()
    }

    pub fn opportunities(&self) -> Vec<Opportunity> {
        self.state.lock().opportunities.clone()
    }

    pub fn notes(&self) -> Vec<Note> {
        self.state.lock().notes.clone()
    }

    /// Record the call, then apply any queued delay or failure for it.
    async fn enter(&self, operation: ApiOperation) -> PipelineResult<()> {
        self.calls.lock().push(operation);

        let (delay, failure) = {
            let mut faults = self.faults.lock();
            let delay = take_first(&mut faults.delays, operation);
            let failure = take_first(&mut faults.failures, operation);
            (delay, failure)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(failure) => {
                tracing::debug!("Injected failure for {}", operation);
                Err(failure.into_error())
            }
            None => Ok(()),
        }
    }
}

fn take_first<T>(queue: &mut Vec<(ApiOperation, T)>, operation: ApiOperation) -> Option<T> {
    let pos = queue.iter().position(|(op, _)| *op == operation)?;
    Some(queue.remove(pos).1)
}

fn missing(kind: &str, id: Uuid) -> PipelineError {
    PipelineError::NotFound(format!("{} {}", kind, id))
}

#[async_trait]
impl PipelineApi for InMemoryApi {
    async fn fetch_stages(&self) -> PipelineResult<Vec<Stage>> {
        self.enter(ApiOperation::FetchStages).await?;
        Ok(self.stages())
    }

    async fn fetch_opportunities(&self) -> PipelineResult<Vec<Opportunity>> {
        self.enter(ApiOperation::FetchOpportunities).await?;
        Ok(self.opportunities())
    }

    async fn fetch_opportunity(&self, id: OpportunityId) -> PipelineResult<Opportunity> {
        self.enter(ApiOperation::FetchOpportunity).await?;
        self.state
            .lock()
            .opportunities
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| missing("Opportunity", id))
    }

    async fn fetch_notes(&self, opportunity_id: OpportunityId) -> PipelineResult<Vec<Note>> {
        self.enter(ApiOperation::FetchNotes).await?;
        // newest first, like the real endpoint
        let mut notes: Vec<_> = self
            .state
            .lock()
            .notes
            .iter()
            .filter(|n| n.opportunity_id == opportunity_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn create_stage(&self, name: String, order_position: i32) -> PipelineResult<Stage> {
        self.enter(ApiOperation::CreateStage).await?;
        let stage = Stage {
            id: Uuid::new_v4(),
            name,
            order_position,
        };
        self.state.lock().stages.push(stage.clone());
        Ok(stage)
    }

    async fn rename_stage(&self, id: StageId, name: String) -> PipelineResult<Stage> {
        self.enter(ApiOperation::RenameStage).await?;
        let mut state = self.state.lock();
        let stage = state
            .stages
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| missing("Stage", id))?;
        stage.name = name;
        Ok(stage.clone())
    }

    async fn delete_stage(&self, id: StageId) -> PipelineResult<()> {
        self.enter(ApiOperation::DeleteStage).await?;
        let mut state = self.state.lock();
        let before = state.stages.len();
        state.stages.retain(|s| s.id != id);
        if state.stages.len() == before {
            return Err(missing("Stage", id));
        }
        Ok(())
    }

    async fn create_opportunity(&self, fields: NewOpportunity) -> PipelineResult<Opportunity> {
        self.enter(ApiOperation::CreateOpportunity).await?;
        let mut state = self.state.lock();
        if !state.stages.iter().any(|s| s.id == fields.stage_id) {
            return Err(missing("Stage", fields.stage_id));
        }
        let now = Utc::now();
        let opportunity = Opportunity {
            id: Uuid::new_v4(),
            title: fields.title,
            description: fields.description,
            label: fields.label,
            stage_id: fields.stage_id,
            patient_id: fields.patient_id,
            created_at: now,
            updated_at: now,
        };
        state.opportunities.push(opportunity.clone());
        Ok(opportunity)
    }

    async fn update_opportunity(
        &self,
        id: OpportunityId,
        patch: OpportunityPatch,
    ) -> PipelineResult<Opportunity> {
        self.enter(ApiOperation::UpdateOpportunity).await?;
        let mut state = self.state.lock();
        if let Some(stage_id) = patch.stage_id {
            if !state.stages.iter().any(|s| s.id == stage_id) {
                return Err(missing("Stage", stage_id));
            }
        }
        let opportunity = state
            .opportunities
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| missing("Opportunity", id))?;

        if let Some(title) = patch.title {
            opportunity.title = title;
        }
        patch.description.apply_to(&mut opportunity.description);
        patch.label.apply_to(&mut opportunity.label);
        if let Some(stage_id) = patch.stage_id {
            opportunity.stage_id = stage_id;
        }
        opportunity.updated_at = Utc::now();
        Ok(opportunity.clone())
    }

    async fn delete_opportunity(&self, id: OpportunityId) -> PipelineResult<()> {
        self.enter(ApiOperation::DeleteOpportunity).await?;
        let mut state = self.state.lock();
        let before = state.opportunities.len();
        state.opportunities.retain(|o| o.id != id);
        if state.opportunities.len() == before {
            return Err(missing("Opportunity", id));
        }
        state.notes.retain(|n| n.opportunity_id != id);
        Ok(())
    }

    async fn create_note(
        &self,
        opportunity_id: OpportunityId,
        body: String,
    ) -> PipelineResult<Note> {
        self.enter(ApiOperation::CreateNote).await?;
        let mut state = self.state.lock();
        if !state.opportunities.iter().any(|o| o.id == opportunity_id) {
            return Err(missing("Opportunity", opportunity_id));
        }
        let note = Note::new(opportunity_id, self.author.clone(), body);
        state.notes.push(note.clone());
        Ok(note)
    }

    async fn fetch_labels(&self, filter: LabelFilter) -> PipelineResult<Vec<Label>> {
        self.enter(ApiOperation::FetchLabels).await?;
        Ok(self
            .state
            .lock()
            .labels
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }

    async fn create_label(&self, label: NewLabel) -> PipelineResult<Label> {
        self.enter(ApiOperation::CreateLabel).await?;
        let label = Label {
            id: Uuid::new_v4(),
            name: label.name,
            color: label.color,
            context: label.context,
        };
        self.state.lock().labels.push(label.clone());
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let api = InMemoryApi::new();
        api.fail_next(
            ApiOperation::FetchStages,
            InjectedFailure::Transport("connection reset".to_string()),
        );

        assert!(matches!(
            api.fetch_stages().await,
            Err(PipelineError::Transport(_))
        ));
        assert!(api.fetch_stages().await.is_ok());
        assert_eq!(api.call_count(ApiOperation::FetchStages), 2);
    }

    #[tokio::test]
    async fn test_failure_targets_only_its_operation() {
        let api = InMemoryApi::new();
        api.fail_next(
            ApiOperation::DeleteStage,
            InjectedFailure::NotFound("gone".to_string()),
        );

        let stage = api.create_stage("Novo".to_string(), 1).await.unwrap();
        assert_eq!(api.stages(), vec![stage.clone()]);
        assert!(matches!(
            api.delete_stage(stage.id).await,
            Err(PipelineError::NotFound(_))
        ));
        assert_eq!(api.stages().len(), 1);
    }

    #[tokio::test]
    async fn test_update_applies_partial_patch() {
        let api = InMemoryApi::new();
        let novo = api.seed_stage("Novo", 1);
        let fechado = api.seed_stage("Fechado", 2);
        let lead = api.seed_opportunity("Lead", novo.id);

        let moved = api
            .update_opportunity(lead.id, OpportunityPatch::move_to(fechado.id))
            .await
            .unwrap();
        assert_eq!(moved.stage_id, fechado.id);
        assert_eq!(moved.title, "Lead");
    }

    #[tokio::test]
    async fn test_delete_opportunity_cascades_notes() {
        let api = InMemoryApi::new().with_author("Ana");
        let novo = api.seed_stage("Novo", 1);
        let lead = api.seed_opportunity("Lead", novo.id);
        let note = api.create_note(lead.id, "oi".to_string()).await.unwrap();
        assert_eq!(note.author_display(), "Ana");

        api.delete_opportunity(lead.id).await.unwrap();
        assert!(api.notes().is_empty());
    }

    #[tokio::test]
    async fn test_notes_come_back_newest_first() {
        let api = InMemoryApi::new();
        let novo = api.seed_stage("Novo", 1);
        let lead = api.seed_opportunity("Lead", novo.id);
        for minute in 0..3 {
            let mut note = Note::new(lead.id, None, format!("note {minute}"));
            note.created_at = chrono::DateTime::from_timestamp(minute * 60, 0).unwrap();
            api.seed_note(note);
        }

        let notes = api.fetch_notes(lead.id).await.unwrap();
        let bodies: Vec<_> = notes.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["note 2", "note 1", "note 0"]);
    }

    #[test]
    fn test_operation_kinds() {
        assert!(ApiOperation::UpdateOpportunity.is_write());
        assert!(!ApiOperation::FetchLabels.is_write());
        assert_eq!(ApiOperation::CreateNote.to_string(), "CreateNote");
    }
}
