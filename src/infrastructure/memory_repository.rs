// In-memory plan store, used when no backend is configured
use crate::application::plan_repository::MaintenancePlanRepository;
use crate::domain::maintenance_plan::MaintenancePlan;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryPlanRepository {
    plans: RwLock<HashMap<String, MaintenancePlan>>,
    next_id: AtomicU64,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.plans.read().await.len()
    }
}

#[async_trait]
impl MaintenancePlanRepository for InMemoryPlanRepository {
    async fn find_by_equipment(&self, equipment_id: &str) -> Result<Option<MaintenancePlan>> {
        let plans = self.plans.read().await;
        Ok(plans
            .values()
            .find(|plan| plan.equipment_id == equipment_id)
            .cloned())
    }

    async fn create(&self, plan: MaintenancePlan) -> Result<MaintenancePlan> {
        let mut plans = self.plans.write().await;
        if plans.values().any(|stored| stored.equipment_id == plan.equipment_id) {
            anyhow::bail!("equipment {} already has a maintenance plan", plan.equipment_id);
        }

        let id = format!("plan-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let plan = plan.with_id(id.clone());

        plans.insert(id, plan.clone());
        Ok(plan)
    }

    async fn update(&self, id: &str, plan: MaintenancePlan) -> Result<MaintenancePlan> {
        let mut plans = self.plans.write().await;
        let Some(slot) = plans.get_mut(id) else {
            anyhow::bail!("maintenance plan {} does not exist", id);
        };

        *slot = plan.with_id(id);
        Ok(slot.clone())
    }
}
