//! Drag-and-drop gesture tracking.
//!
//! A gesture starts when a card is picked up and ends on drop or cancel.
//! While it lasts the tracker knows which opportunity is in flight, which
//! stage it came from and which stage, if any, is highlighted as the drop
//! target. The origin stage is never highlighted.

use crate::{Opportunity, OpportunityId, StageId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        opportunity_id: OpportunityId,
        origin_stage: StageId,
    },
    HoveringTarget {
        opportunity_id: OpportunityId,
        origin_stage: StageId,
        target: StageId,
    },
}

/// Why a finished gesture produced no move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMoveReason {
    /// Dropped back onto the stage it came from.
    SameStage,
    /// The gesture was aborted.
    Cancelled,
    /// There was no gesture in progress.
    NotDragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Move {
        opportunity_id: OpportunityId,
        from: StageId,
        to: StageId,
    },
    NoMove(NoMoveReason),
}

#[derive(Debug, Clone, Default)]
pub struct DragTracker {
    state: DragState,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != DragState::Idle
    }

    pub fn dragged_opportunity(&self) -> Option<OpportunityId> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { opportunity_id, .. }
            | DragState::HoveringTarget { opportunity_id, .. } => Some(opportunity_id),
        }
    }

    pub fn origin_stage(&self) -> Option<StageId> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { origin_stage, .. }
            | DragState::HoveringTarget { origin_stage, .. } => Some(origin_stage),
        }
    }

    pub fn highlighted_stage(&self) -> Option<StageId> {
        match self.state {
            DragState::HoveringTarget { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn is_highlighted(&self, stage_id: StageId) -> bool {
        self.highlighted_stage() == Some(stage_id)
    }

    /// Pick up `opportunity`. Starting over while a gesture is in progress
    /// abandons the previous one.
    pub fn begin(&mut self, opportunity: &Opportunity) {
        if self.is_active() {
            tracing::debug!("Drag restarted before the previous one finished");
        }
        self.state = DragState::Dragging {
            opportunity_id: opportunity.id,
            origin_stage: opportunity.stage_id,
        };
    }

    /// The pointer is over `stage_id`'s drop area. Returns whether that
    /// stage is now highlighted.
    pub fn hover(&mut self, stage_id: StageId) -> bool {
        let (opportunity_id, origin_stage) = match self.state {
            DragState::Idle => return false,
            DragState::Dragging {
                opportunity_id,
                origin_stage,
            }
            | DragState::HoveringTarget {
                opportunity_id,
                origin_stage,
                ..
            } => (opportunity_id, origin_stage),
        };

        self.state = if stage_id == origin_stage {
            DragState::Dragging {
                opportunity_id,
                origin_stage,
            }
        } else {
            DragState::HoveringTarget {
                opportunity_id,
                origin_stage,
                target: stage_id,
            }
        };
        stage_id != origin_stage
    }

    /// The pointer left `stage_id`'s bounds without dropping. Clears the
    /// highlight if it was on that stage; the gesture continues.
    pub fn leave(&mut self, stage_id: StageId) {
        if let DragState::HoveringTarget {
            opportunity_id,
            origin_stage,
            target,
        } = self.state
        {
            if target == stage_id {
                self.state = DragState::Dragging {
                    opportunity_id,
                    origin_stage,
                };
            }
        }
    }

    /// Release the card over `stage_id`, ending the gesture.
    pub fn drop_on(&mut self, stage_id: StageId) -> DropOutcome {
        let previous = std::mem::take(&mut self.state);
        match previous {
            DragState::Idle => DropOutcome::NoMove(NoMoveReason::NotDragging),
            DragState::Dragging {
                opportunity_id,
                origin_stage,
            }
            | DragState::HoveringTarget {
                opportunity_id,
                origin_stage,
                ..
            } => {
                if stage_id == origin_stage {
                    DropOutcome::NoMove(NoMoveReason::SameStage)
                } else {
                    DropOutcome::Move {
                        opportunity_id,
                        from: origin_stage,
                        to: stage_id,
                    }
                }
            }
        }
    }

    /// Abort the gesture. Never has side effects beyond resetting to idle.
    pub fn cancel(&mut self) -> DropOutcome {
        let previous = std::mem::take(&mut self.state);
        if previous == DragState::Idle {
            DropOutcome::NoMove(NoMoveReason::NotDragging)
        } else {
            DropOutcome::NoMove(NoMoveReason::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpportunityDraft;
    use uuid::Uuid;

    fn picked_up() -> (DragTracker, Opportunity) {
        let opportunity = Opportunity::new(OpportunityDraft::new("Lead"), Uuid::new_v4());
        let mut tracker = DragTracker::new();
        tracker.begin(&opportunity);
        (tracker, opportunity)
    }

    #[test]
    fn test_begin_captures_origin() {
        let (tracker, opportunity) = picked_up();
        assert_eq!(
            tracker.state(),
            DragState::Dragging {
                opportunity_id: opportunity.id,
                origin_stage: opportunity.stage_id,
            }
        );
        assert_eq!(tracker.dragged_opportunity(), Some(opportunity.id));
        assert_eq!(tracker.origin_stage(), Some(opportunity.stage_id));
    }

    #[test]
    fn test_hover_origin_never_highlights() {
        let (mut tracker, opportunity) = picked_up();
        assert!(!tracker.hover(opportunity.stage_id));
        assert_eq!(tracker.highlighted_stage(), None);
        assert!(matches!(tracker.state(), DragState::Dragging { .. }));
    }

    #[test]
    fn test_hover_other_stage_highlights() {
        let (mut tracker, _) = picked_up();
        let target = Uuid::new_v4();
        assert!(tracker.hover(target));
        assert!(tracker.is_highlighted(target));
    }

    #[test]
    fn test_hover_back_over_origin_clears_highlight() {
        let (mut tracker, opportunity) = picked_up();
        tracker.hover(Uuid::new_v4());
        tracker.hover(opportunity.stage_id);
        assert_eq!(tracker.highlighted_stage(), None);
        assert!(tracker.is_active());
    }

    #[test]
    fn test_hover_while_idle_is_ignored() {
        let mut tracker = DragTracker::new();
        assert!(!tracker.hover(Uuid::new_v4()));
        assert_eq!(tracker.state(), DragState::Idle);
    }

    #[test]
    fn test_leave_keeps_drag_active() {
        let (mut tracker, _) = picked_up();
        let target = Uuid::new_v4();
        tracker.hover(target);
        tracker.leave(target);
        assert_eq!(tracker.highlighted_stage(), None);
        assert!(tracker.is_active());
    }

    #[test]
    fn test_leave_other_stage_keeps_highlight() {
        let (mut tracker, _) = picked_up();
        let target = Uuid::new_v4();
        tracker.hover(target);
        tracker.leave(Uuid::new_v4());
        assert!(tracker.is_highlighted(target));
    }

    #[test]
    fn test_drop_on_other_stage_moves() {
        let (mut tracker, opportunity) = picked_up();
        let target = Uuid::new_v4();
        tracker.hover(target);

        let outcome = tracker.drop_on(target);
        assert_eq!(
            outcome,
            DropOutcome::Move {
                opportunity_id: opportunity.id,
                from: opportunity.stage_id,
                to: target,
            }
        );
        assert_eq!(tracker.state(), DragState::Idle);
    }

    #[test]
    fn test_drop_without_highlight_still_moves() {
        let (mut tracker, _) = picked_up();
        let target = Uuid::new_v4();
        assert!(matches!(tracker.drop_on(target), DropOutcome::Move { to, .. } if to == target));
    }

    #[test]
    fn test_drop_on_origin_is_no_move() {
        let (mut tracker, opportunity) = picked_up();
        assert_eq!(
            tracker.drop_on(opportunity.stage_id),
            DropOutcome::NoMove(NoMoveReason::SameStage)
        );
        assert!(!tracker.is_active());
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let (mut tracker, _) = picked_up();
        tracker.hover(Uuid::new_v4());
        assert_eq!(
            tracker.cancel(),
            DropOutcome::NoMove(NoMoveReason::Cancelled)
        );
        assert_eq!(tracker.state(), DragState::Idle);
        assert_eq!(
            tracker.cancel(),
            DropOutcome::NoMove(NoMoveReason::NotDragging)
        );
    }

    #[test]
    fn test_drop_while_idle() {
        let mut tracker = DragTracker::new();
        assert_eq!(
            tracker.drop_on(Uuid::new_v4()),
            DropOutcome::NoMove(NoMoveReason::NotDragging)
        );
    }
}
