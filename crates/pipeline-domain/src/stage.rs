use pipeline_core::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type StageId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    #[serde(default)]
    pub order_position: i32,
}

impl Stage {
    /// Build a stage with a provisional client-side id. The server assigns
    /// the real one when the creation is confirmed.
    pub fn new(name: String, order_position: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            order_position,
        }
    }

    pub fn rename(&mut self, name: String) {
        self.name = name;
    }
}

/// Stages in board order. Ties on position fall back to the id so that
/// rendering is stable.
pub fn sorted_stages(stages: &[Stage]) -> Vec<&Stage> {
    let mut sorted: Vec<_> = stages.iter().collect();
    sorted.sort_by_key(|s| (s.order_position, s.id));
    sorted
}

/// Position for a newly appended stage: one past the highest, or 1 on an
/// empty board. Fails if the highest position is already `i32::MAX`.
pub fn next_order_position(stages: &[Stage]) -> PipelineResult<i32> {
    let last = stages.iter().map(|s| s.order_position).max().unwrap_or(0);
    last.checked_add(1).ok_or_else(|| {
        PipelineError::Precondition(format!(
            "no order position left after {}: renumber the stages first",
            last
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_order_position_empty_board() {
        assert_eq!(next_order_position(&[]).unwrap(), 1);
    }

    #[test]
    fn test_next_order_position_skips_gaps() {
        let stages = vec![
            Stage::new("Novo".to_string(), 1),
            Stage::new("Fechado".to_string(), 7),
            Stage::new("Contato".to_string(), 3),
        ];
        assert_eq!(next_order_position(&stages).unwrap(), 8);
    }

    #[test]
    fn test_next_order_position_at_max_is_precondition() {
        let stages = vec![Stage::new("Fechado".to_string(), i32::MAX)];
        assert!(matches!(
            next_order_position(&stages),
            Err(PipelineError::Precondition(_))
        ));
    }

    #[test]
    fn test_sorted_stages_by_position() {
        let stages = vec![
            Stage::new("Fechado".to_string(), 2),
            Stage::new("Novo".to_string(), 1),
        ];
        let sorted = sorted_stages(&stages);
        assert_eq!(sorted[0].name, "Novo");
        assert_eq!(sorted[1].name, "Fechado");
    }

    #[test]
    fn test_sorted_stages_breaks_ties_by_id() {
        let mut a = Stage::new("A".to_string(), 1);
        let mut b = Stage::new("B".to_string(), 1);
        a.id = Uuid::from_u128(2);
        b.id = Uuid::from_u128(1);
        let stages = vec![a, b];

        let sorted = sorted_stages(&stages);
        assert_eq!(sorted[0].name, "B");
        assert_eq!(sorted[1].name, "A");
    }

    #[test]
    fn test_deserialize_without_position() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"id": "{}", "name": "Novo"}}"#, id);
        let stage: Stage = serde_json::from_str(&json).unwrap();
        assert_eq!(stage.order_position, 0);
    }
}
