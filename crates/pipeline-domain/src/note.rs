use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::opportunity::OpportunityId;

pub type NoteId = Uuid;

const FALLBACK_AUTHOR: &str = "Usuário";

/// A comment on an opportunity. Notes are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub opportunity_id: OpportunityId,
    #[serde(rename = "user_name", default)]
    pub author: Option<String>,
    #[serde(rename = "content")]
    pub body: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Provisional note shown while the server round-trip is pending.
    pub fn new(opportunity_id: OpportunityId, author: Option<String>, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            opportunity_id,
            author,
            body,
            created_at: Utc::now(),
        }
    }

    pub fn author_display(&self) -> &str {
        self.author.as_deref().unwrap_or(FALLBACK_AUTHOR)
    }
}

/// The note history of the opportunity whose details are open, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteThread {
    pub opportunity_id: OpportunityId,
    notes: Vec<Note>,
}

impl NoteThread {
    pub fn new(opportunity_id: OpportunityId, mut notes: Vec<Note>) -> Self {
        notes.retain(|n| n.opportunity_id == opportunity_id);
        notes.sort_by_key(|n| n.created_at);
        Self {
            opportunity_id,
            notes,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Insert after every note created at or before `note`.
    pub fn append(&mut self, note: Note) {
        let at = self
            .notes
            .partition_point(|n| n.created_at <= note.created_at);
        self.notes.insert(at, note);
    }

    /// Swap the note with `id` for `note`, keeping timestamp order. Returns
    /// false if there was nothing to replace.
    pub fn replace(&mut self, id: NoteId, note: Note) -> bool {
        match self.notes.iter().position(|n| n.id == id) {
            Some(pos) => {
                self.notes.remove(pos);
                self.append(note);
                true
            }
            None => false,
        }
    }

    pub(crate) fn notes_mut(&mut self) -> &mut Vec<Note> {
        &mut self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_at(opportunity_id: OpportunityId, body: &str, minutes: i64) -> Note {
        let mut note = Note::new(opportunity_id, None, body.to_string());
        note.created_at = DateTime::from_timestamp(minutes * 60, 0).unwrap();
        note
    }

    #[test]
    fn test_thread_sorts_oldest_first() {
        let opp = Uuid::new_v4();
        let thread = NoteThread::new(
            opp,
            vec![
                note_at(opp, "third", 30),
                note_at(opp, "first", 10),
                note_at(opp, "second", 20),
            ],
        );
        let bodies: Vec<_> = thread.notes().iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_thread_drops_foreign_notes() {
        let opp = Uuid::new_v4();
        let thread = NoteThread::new(
            opp,
            vec![note_at(opp, "mine", 1), note_at(Uuid::new_v4(), "other", 2)],
        );
        assert_eq!(thread.len(), 1);
    }

    #[test]
    fn test_append_keeps_order_with_equal_timestamps() {
        let opp = Uuid::new_v4();
        let mut thread = NoteThread::new(opp, vec![note_at(opp, "a", 5)]);
        thread.append(note_at(opp, "b", 5));
        thread.append(note_at(opp, "early", 1));

        let bodies: Vec<_> = thread.notes().iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["early", "a", "b"]);
    }

    #[test]
    fn test_replace_provisional_note() {
        let opp = Uuid::new_v4();
        let provisional = note_at(opp, "draft", 50);
        let provisional_id = provisional.id;
        let mut thread = NoteThread::new(opp, vec![note_at(opp, "old", 1), provisional]);

        let confirmed = note_at(opp, "draft", 40);
        let confirmed_id = confirmed.id;
        assert!(thread.replace(provisional_id, confirmed));
        assert_eq!(thread.notes()[1].id, confirmed_id);
        assert!(!thread.replace(provisional_id, note_at(opp, "x", 1)));
    }

    #[test]
    fn test_server_field_names() {
        let opp = Uuid::new_v4();
        let json = format!(
            r#"{{"id": "{}", "opportunity_id": "{}", "user_name": "Dra. Ana", "content": "Ligou", "created_at": "2025-03-01T12:00:00Z"}}"#,
            Uuid::new_v4(),
            opp
        );
        let note: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(note.author_display(), "Dra. Ana");
        assert_eq!(note.body, "Ligou");
    }

    #[test]
    fn test_author_fallback() {
        let note = Note::new(Uuid::new_v4(), None, "Oi".to_string());
        assert_eq!(note.author_display(), "Usuário");
    }
}
