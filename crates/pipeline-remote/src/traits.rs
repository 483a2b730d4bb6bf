use async_trait::async_trait;
use pipeline_core::PipelineResult;
use pipeline_domain::{
    Label, LabelFilter, NewLabel, NewOpportunity, Note, Opportunity, OpportunityId,
    OpportunityPatch, Stage, StageId,
};

/// The remote source of truth for the board.
///
/// Reads replace whole collections. Writes return the server's copy of the
/// entity, with server-assigned ids and timestamps. Any call may fail with
/// `NotFound` or `Transport`; callers treat both the same way.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    async fn fetch_stages(&self) -> PipelineResult<Vec<Stage>>;

    async fn fetch_opportunities(&self) -> PipelineResult<Vec<Opportunity>>;

    async fn fetch_opportunity(&self, id: OpportunityId) -> PipelineResult<Opportunity>;

    async fn fetch_notes(&self, opportunity_id: OpportunityId) -> PipelineResult<Vec<Note>>;

    async fn create_stage(&self, name: String, order_position: i32) -> PipelineResult<Stage>;

    async fn rename_stage(&self, id: StageId, name: String) -> PipelineResult<Stage>;

    async fn delete_stage(&self, id: StageId) -> PipelineResult<()>;

    async fn create_opportunity(&self, fields: NewOpportunity) -> PipelineResult<Opportunity>;

    /// Partial update. A move sends only the stage reference.
    async fn update_opportunity(
        &self,
        id: OpportunityId,
        patch: OpportunityPatch,
    ) -> PipelineResult<Opportunity>;

    /// Deleting an opportunity also deletes its notes server-side.
    async fn delete_opportunity(&self, id: OpportunityId) -> PipelineResult<()>;

    async fn create_note(&self, opportunity_id: OpportunityId, body: String)
        -> PipelineResult<Note>;

    async fn fetch_labels(&self, filter: LabelFilter) -> PipelineResult<Vec<Label>>;

    async fn create_label(&self, label: NewLabel) -> PipelineResult<Label>;
}
