use super::{Command, CommandContext};
use crate::{MutationScope, Note, NoteId};
use pipeline_core::{PipelineError, PipelineResult};

/// Append a note to an opportunity. The note only becomes visible if that
/// opportunity's thread is the open one.
pub struct AppendNote {
    pub note: Note,
}

impl Command for AppendNote {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        let opportunity_id = self.note.opportunity_id;
        if !context.opportunities.iter().any(|o| o.id == opportunity_id) {
            return Err(PipelineError::NotFound(format!(
                "Opportunity {}",
                opportunity_id
            )));
        }
        if let Some(thread) = context.thread.as_mut() {
            if thread.opportunity_id == opportunity_id {
                thread.append(self.note.clone());
            }
        }
        Ok(())
    }

    fn scope(&self, _context: &CommandContext) -> MutationScope {
        MutationScope::new().note(self.note.id)
    }

    fn description(&self) -> String {
        format!("Add note to opportunity {}", self.note.opportunity_id)
    }
}

/// Swap a provisional note for the server's copy
pub struct ReplaceNote {
    pub note_id: NoteId,
    pub note: Note,
}

impl Command for ReplaceNote {
    fn execute(&self, context: &mut CommandContext) -> PipelineResult<()> {
        if let Some(thread) = context.thread.as_mut() {
            if thread.opportunity_id == self.note.opportunity_id
                && !thread.replace(self.note_id, self.note.clone())
                && !thread.notes().iter().any(|n| n.id == self.note.id)
            {
                thread.append(self.note.clone());
            }
        }
        Ok(())
    }

    fn scope(&self, _context: &CommandContext) -> MutationScope {
        MutationScope::new().note(self.note_id)
    }

    fn description(&self) -> String {
        format!("Confirm note {} as {}", self.note_id, self.note.id)
    }
}
