// Application layer - Use cases and repository seams
pub mod plan_repository;
pub mod schedule_service;
