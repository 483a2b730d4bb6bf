//! Point-in-time capture of the board.
//!
//! A `PipelineSnapshot` holds everything the store shows: stages,
//! opportunities and the open note thread. It is taken right before an
//! optimistic change so the change can be undone if the server rejects it.

use crate::{Note, NoteId, NoteThread, Opportunity, OpportunityId, Stage, StageId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    #[serde(default)]
    pub stages: Vec<Stage>,

    #[serde(default)]
    pub opportunities: Vec<Opportunity>,

    /// Note thread of the opportunity whose details were open, if any.
    #[serde(default)]
    pub thread: Option<NoteThread>,
}

impl PipelineSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty() && self.opportunities.is_empty() && self.thread.is_none()
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn opportunity(&self, id: OpportunityId) -> Option<&Opportunity> {
        self.opportunities.iter().find(|o| o.id == id)
    }

    pub fn notes(&self) -> &[Note] {
        self.thread.as_ref().map(|t| t.notes()).unwrap_or(&[])
    }
}

/// The entities a single mutation touched. Rolling back restores exactly
/// these from the mutation's own snapshot, so another mutation that is still
/// in flight keeps its optimistic state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationScope {
    pub stages: Vec<StageId>,
    pub opportunities: Vec<OpportunityId>,
    pub notes: Vec<NoteId>,
    /// Restore the open thread wholesale (it was closed by the mutation).
    pub thread: bool,
}

impl MutationScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, id: StageId) -> Self {
        self.stages.push(id);
        self
    }

    pub fn opportunity(mut self, id: OpportunityId) -> Self {
        self.opportunities.push(id);
        self
    }

    pub fn opportunities(mut self, ids: impl IntoIterator<Item = OpportunityId>) -> Self {
        self.opportunities.extend(ids);
        self
    }

    pub fn note(mut self, id: NoteId) -> Self {
        self.notes.push(id);
        self
    }

    pub fn with_thread(mut self) -> Self {
        self.thread = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
            && self.opportunities.is_empty()
            && self.notes.is_empty()
            && !self.thread
    }
}
