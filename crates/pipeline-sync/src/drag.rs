use pipeline_core::{PipelineError, PipelineResult};
use pipeline_domain::{DragState, DropOutcome, OpportunityId, StageId};
use pipeline_remote::PipelineApi;

use crate::PipelineBoard;

impl<A: PipelineApi> PipelineBoard<A> {
    /// Pick up an opportunity card.
    pub fn begin_drag(&self, opportunity_id: OpportunityId) -> PipelineResult<()> {
        let opportunity = self
            .opportunity(opportunity_id)
            .ok_or_else(|| PipelineError::NotFound(format!("Opportunity {}", opportunity_id)))?;
        self.drag.lock().begin(&opportunity);
        Ok(())
    }

    /// Pointer entered a stage's drop area. Returns whether it is now the
    /// highlighted target.
    pub fn hover(&self, stage_id: StageId) -> bool {
        self.drag.lock().hover(stage_id)
    }

    pub fn leave(&self, stage_id: StageId) {
        self.drag.lock().leave(stage_id);
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.lock().state()
    }

    /// Abort the gesture. Nothing is sent.
    pub fn cancel_drag(&self) -> DropOutcome {
        self.drag.lock().cancel()
    }

    /// Release the card over `stage_id`. A drop on another stage moves the
    /// opportunity there; a failed move is rolled back and reported with
    /// the card's origin stage.
    pub async fn drop_on(&self, stage_id: StageId) -> PipelineResult<DropOutcome> {
        let outcome = self.drag.lock().drop_on(stage_id);
        if let DropOutcome::Move {
            opportunity_id, to, ..
        } = outcome
        {
            self.move_opportunity(opportunity_id, to).await?;
        }
        Ok(outcome)
    }
}
