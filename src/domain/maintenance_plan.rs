// Maintenance plan domain model - the record persisted by the plan store
use super::projection::{Projection, SchedulePlan};
use super::schedule::Frequency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenancePlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub equipment_id: String,
    pub frequency: Frequency,
    pub next_maintenance_date: DateTime<Utc>,
}

impl MaintenancePlan {
    /// Build the record to persist. `None` when the projection has no
    /// upcoming occurrence.
    pub fn from_projection(
        equipment_id: &str,
        plan: &SchedulePlan,
        projection: &Projection,
    ) -> Option<Self> {
        projection.next_occurrence.map(|next| Self {
            id: None,
            equipment_id: equipment_id.to_string(),
            frequency: plan.frequency,
            next_maintenance_date: next,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
