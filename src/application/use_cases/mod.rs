pub mod reconcile_repositories;
pub mod reconcile_repository;
