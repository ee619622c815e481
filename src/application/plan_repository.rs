// Repository trait for maintenance plan persistence
use crate::domain::maintenance_plan::MaintenancePlan;
use async_trait::async_trait;

#[async_trait]
pub trait MaintenancePlanRepository: Send + Sync {
    /// The plan currently attached to an equipment unit, if any
    async fn find_by_equipment(&self, equipment_id: &str) -> anyhow::Result<Option<MaintenancePlan>>;

    /// Store a new plan; the returned record carries the assigned id
    async fn create(&self, plan: MaintenancePlan) -> anyhow::Result<MaintenancePlan>;

    /// Replace an existing plan in place
    async fn update(&self, id: &str, plan: MaintenancePlan) -> anyhow::Result<MaintenancePlan>;
}
