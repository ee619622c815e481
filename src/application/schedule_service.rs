// Maintenance schedule service - previews projections and saves plans
use crate::application::plan_repository::MaintenancePlanRepository;
use crate::domain::maintenance_plan::MaintenancePlan;
use crate::domain::projection::{project, project_plan, PlanInput, Projection, ProjectionSettings};
use crate::domain::schedule::{reminder_date, ScheduleError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("equipment id must not be empty")]
    MissingEquipmentId,

    #[error("start date, frequency unit and frequency interval are all required")]
    IncompletePlan,

    #[error("no maintenance occurrence falls after {0}")]
    NoUpcomingOccurrence(DateTime<Utc>),

    #[error("plan store error: {0:#}")]
    Repository(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlan {
    pub plan: MaintenancePlan,
    pub projection: Projection,
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOverview {
    pub plan: MaintenancePlan,
    pub reminder_date: Option<DateTime<Utc>>,
}

/// One lock per equipment id; saves for the same equipment run one at a time
type EquipmentLocks = Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>;

#[derive(Clone)]
pub struct MaintenanceScheduleService {
    repository: Arc<dyn MaintenancePlanRepository>,
    settings: ProjectionSettings,
    save_locks: EquipmentLocks,
}

impl MaintenanceScheduleService {
    pub fn new(repository: Arc<dyn MaintenancePlanRepository>, settings: ProjectionSettings) -> Self {
        Self {
            repository,
            settings,
            save_locks: EquipmentLocks::default(),
        }
    }

    async fn equipment_lock(&self, equipment_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.save_locks.lock().await;
        locks.entry(equipment_id.to_string()).or_default().clone()
    }

    pub fn preview(&self, input: &PlanInput, now: DateTime<Utc>) -> Result<Projection, ScheduleError> {
        let projection = project(input, now, &self.settings)?;
        tracing::debug!(
            "Projected {} occurrences, next: {:?}",
            projection.occurrences.len(),
            projection.next_occurrence
        );
        Ok(projection)
    }

    /// Create the equipment's plan, or update it in place if one already exists.
    pub async fn save_plan(
        &self,
        equipment_id: &str,
        input: &PlanInput,
        now: DateTime<Utc>,
    ) -> Result<SavedPlan, ServiceError> {
        let equipment_id = require_equipment_id(equipment_id)?;
        let plan = input.parse()?.ok_or(ServiceError::IncompletePlan)?;
        let projection = project_plan(&plan, now, &self.settings)?;

        let record = MaintenancePlan::from_projection(equipment_id, &plan, &projection)
            .ok_or(ServiceError::NoUpcomingOccurrence(now))?;

        // Lookup and write must not interleave with another save for the same equipment
        let lock = self.equipment_lock(equipment_id).await;
        let _guard = lock.lock().await;

        let existing = self.repository.find_by_equipment(equipment_id).await?;
        let (plan, created) = match existing {
            Some(MaintenancePlan { id: Some(id), .. }) => {
                tracing::info!(
                    "Updating maintenance plan {} for {}: {} next on {}",
                    id, equipment_id, record.frequency, record.next_maintenance_date
                );
                (self.repository.update(&id, record).await?, false)
            }
            Some(MaintenancePlan { id: None, .. }) => {
                return Err(ServiceError::Repository(anyhow::anyhow!(
                    "stored maintenance plan for {} has no id",
                    equipment_id
                )));
            }
            None => {
                tracing::info!(
                    "Creating maintenance plan for {}: {} next on {}",
                    equipment_id, record.frequency, record.next_maintenance_date
                );
                (self.repository.create(record).await?, true)
            }
        };

        Ok(SavedPlan {
            plan,
            projection,
            created,
        })
    }

    pub async fn get_plan(&self, equipment_id: &str) -> Result<Option<PlanOverview>, ServiceError> {
        let equipment_id = require_equipment_id(equipment_id)?;
        let plan = self.repository.find_by_equipment(equipment_id).await?;

        Ok(plan.map(|plan| {
            let reminder_date =
                reminder_date(Some(plan.next_maintenance_date), self.settings.reminder_lead_days);
            PlanOverview {
                plan,
                reminder_date,
            }
        }))
    }
}

fn require_equipment_id(equipment_id: &str) -> Result<&str, ServiceError> {
    let trimmed = equipment_id.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::MissingEquipmentId);
    }
    Ok(trimmed)
}
