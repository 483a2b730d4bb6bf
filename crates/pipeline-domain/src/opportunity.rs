use chrono::{DateTime, Utc};
use pipeline_core::PipelineResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::field_update::FieldUpdate;
use crate::stage::StageId;
use crate::validation;

pub type OpportunityId = Uuid;
pub type PatientId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form label name, resolved against the label set for display.
    #[serde(default)]
    pub label: Option<String>,
    pub stage_id: StageId,
    #[serde(default)]
    pub patient_id: Option<PatientId>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Opportunity {
    /// Build an opportunity with a provisional id inside `stage_id`.
    pub fn new(draft: OpportunityDraft, stage_id: StageId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            label: draft.label,
            stage_id,
            patient_id: draft.patient_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn move_to_stage(&mut self, stage_id: StageId) {
        self.stage_id = stage_id;
        self.updated_at = Utc::now();
    }

    pub fn apply_fields(&mut self, fields: OpportunityFields) {
        self.title = fields.title;
        self.description = fields.description;
        self.label = fields.label;
        self.updated_at = Utc::now();
    }

    pub fn fields(&self) -> OpportunityFields {
        OpportunityFields {
            title: self.title.clone(),
            description: self.description.clone(),
            label: self.label.clone(),
        }
    }
}

/// User input for a new opportunity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpportunityDraft {
    pub title: String,
    pub description: Option<String>,
    pub label: Option<String>,
    pub patient_id: Option<PatientId>,
}

impl OpportunityDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_patient(mut self, patient_id: PatientId) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    /// Normalize and check the draft.
    pub fn validate(self) -> PipelineResult<Self> {
        Ok(Self {
            title: validation::required("title", &self.title)?,
            description: validation::description(self.description)?,
            label: validation::optional(self.label),
            patient_id: self.patient_id,
        })
    }
}

/// The editable fields of an opportunity. An update replaces all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpportunityFields {
    pub title: String,
    pub description: Option<String>,
    pub label: Option<String>,
}

impl OpportunityFields {
    pub fn validate(self) -> PipelineResult<Self> {
        Ok(Self {
            title: validation::required("title", &self.title)?,
            description: validation::description(self.description)?,
            label: validation::optional(self.label),
        })
    }
}

/// Request body for creating an opportunity remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOpportunity {
    pub title: String,
    pub description: Option<String>,
    pub stage_id: StageId,
    pub patient_id: Option<PatientId>,
    pub label: Option<String>,
}

impl From<&Opportunity> for NewOpportunity {
    fn from(opportunity: &Opportunity) -> Self {
        Self {
            title: opportunity.title.clone(),
            description: opportunity.description.clone(),
            stage_id: opportunity.stage_id,
            patient_id: opportunity.patient_id,
            label: opportunity.label.clone(),
        }
    }
}

/// Request body for a partial remote update. Moves send only `stage_id`;
/// detail edits send title, description and label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpportunityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "FieldUpdate::is_no_change")]
    pub description: FieldUpdate<String>,
    #[serde(skip_serializing_if = "FieldUpdate::is_no_change")]
    pub label: FieldUpdate<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<StageId>,
}

impl OpportunityPatch {
    pub fn move_to(stage_id: StageId) -> Self {
        Self {
            stage_id: Some(stage_id),
            ..Default::default()
        }
    }

    pub fn replace_fields(fields: &OpportunityFields) -> Self {
        Self {
            title: Some(fields.title.clone()),
            description: fields.description.clone().into(),
            label: fields.label.clone().into(),
            stage_id: None,
        }
    }
}
