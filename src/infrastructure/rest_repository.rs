// REST plan store - talks to the fleet management backend
use crate::application::plan_repository::MaintenancePlanRepository;
use crate::domain::maintenance_plan::MaintenancePlan;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct RestPlanRepository {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl RestPlanRepository {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    fn plans_url(&self) -> String {
        format!("{}/maintenance-plans", self.base_url)
    }

    fn lookup_url(&self, equipment_id: &str) -> String {
        format!(
            "{}?equipmentId={}",
            self.plans_url(),
            urlencoding::encode(equipment_id)
        )
    }

    fn plan_url(&self, id: &str) -> String {
        format!("{}/{}", self.plans_url(), urlencoding::encode(id))
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to plan backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Plan backend request failed with status {}: {}", status, body);
        }

        response
            .json::<T>()
            .await
            .context("Failed to parse plan backend response")
    }
}

#[async_trait]
impl MaintenancePlanRepository for RestPlanRepository {
    async fn find_by_equipment(&self, equipment_id: &str) -> Result<Option<MaintenancePlan>> {
        let url = self.lookup_url(equipment_id);
        tracing::debug!("Looking up maintenance plan: {}", url);

        let plans: Vec<MaintenancePlan> = self.execute(self.client.get(&url)).await?;
        Ok(plans.into_iter().next())
    }

    async fn create(&self, plan: MaintenancePlan) -> Result<MaintenancePlan> {
        let url = self.plans_url();
        self.execute(self.client.post(&url).json(&plan))
            .await
            .with_context(|| format!("Failed to create plan for {}", plan.equipment_id))
    }

    async fn update(&self, id: &str, plan: MaintenancePlan) -> Result<MaintenancePlan> {
        let url = self.plan_url(id);
        self.execute(self.client.put(&url).json(&plan))
            .await
            .with_context(|| format!("Failed to update plan {}", id))
    }
}
