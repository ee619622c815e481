use crate::domain::projection::ProjectionSettings;
use crate::domain::schedule::{DEFAULT_OCCURRENCE_LIMIT, DEFAULT_REMINDER_LEAD_DAYS};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub backend: BackendSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleSettings {
    #[serde(default = "default_occurrence_limit")]
    pub occurrence_limit: usize,
    #[serde(default = "default_reminder_lead_days")]
    pub reminder_lead_days: u32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            occurrence_limit: DEFAULT_OCCURRENCE_LIMIT,
            reminder_lead_days: DEFAULT_REMINDER_LEAD_DAYS,
        }
    }
}

fn default_occurrence_limit() -> usize {
    DEFAULT_OCCURRENCE_LIMIT
}

fn default_reminder_lead_days() -> u32 {
    DEFAULT_REMINDER_LEAD_DAYS
}

impl ScheduleSettings {
    pub fn projection(&self) -> ProjectionSettings {
        ProjectionSettings {
            occurrence_limit: self.occurrence_limit,
            reminder_lead_days: self.reminder_lead_days,
        }
    }
}

/// Where maintenance plans are persisted. Without a base URL plans are kept in memory.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BackendSettings {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

/// Load `config/scheduler.toml` (optional) overlaid with `SCHEDULER__*` environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/scheduler").required(false))
        .add_source(config::Environment::with_prefix("SCHEDULER").separator("__"))
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    validate(&app_config)?;
    Ok(app_config)
}

fn validate(app_config: &AppConfig) -> anyhow::Result<()> {
    if app_config.schedule.occurrence_limit == 0 {
        anyhow::bail!("schedule.occurrence_limit must be at least 1");
    }
    Ok(())
}
