// Domain layer - Recurring maintenance schedules
pub mod maintenance_plan;
pub mod projection;
pub mod schedule;
