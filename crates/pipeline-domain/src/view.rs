//! Render-ready projection of the store and the drag tracker.

use crate::{DragTracker, NoteThread, Opportunity, OpportunityId, PipelineStore, Stage};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageColumn {
    pub stage: Stage,
    pub opportunities: Vec<Opportunity>,
    /// Drop-target highlight for the current drag gesture.
    pub highlighted: bool,
}

impl StageColumn {
    pub fn len(&self) -> usize {
        self.opportunities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub columns: Vec<StageColumn>,
    /// Opportunities left behind by an orphaning stage delete. No column
    /// shows them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orphaned: Vec<Opportunity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dragging: Option<OpportunityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<NoteThread>,
}

impl BoardView {
    pub fn project(store: &PipelineStore, drag: &DragTracker) -> Self {
        let columns = store
            .stages()
            .into_iter()
            .map(|stage| StageColumn {
                stage: stage.clone(),
                opportunities: store
                    .opportunities_in_stage(stage.id)
                    .into_iter()
                    .cloned()
                    .collect(),
                highlighted: drag.is_highlighted(stage.id),
            })
            .collect();

        Self {
            columns,
            orphaned: store.orphaned_opportunities().into_iter().cloned().collect(),
            dragging: drag.dragged_opportunity(),
            thread: store.thread().cloned(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&StageColumn> {
        self.columns.iter().find(|c| c.stage.name == name)
    }

    pub fn total_opportunities(&self) -> usize {
        self.columns.iter().map(StageColumn::len).sum::<usize>() + self.orphaned.len()
    }
}
