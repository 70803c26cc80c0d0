pub mod multi_repository_config;
pub mod observed_state;
pub mod plan;
pub mod repository_config;
pub mod validation;
