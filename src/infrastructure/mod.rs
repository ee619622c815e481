// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_response;
pub mod memory_repository;
pub mod rest_repository;
