/// Infrastructure layer modules
///
/// This layer provides concrete implementations for external system interactions:
/// - Hosting API access (GitHub REST client, in-memory implementation)
/// - File system operations (desired-state YAML loading)
pub mod filesystem;
pub mod github;

// Re-export commonly used types
pub use filesystem::config_store::{ConfigStore, LoadedConfig};
pub use github::{
    api::{ApiError, RepoRef, RepositoryApi},
    client::{ClientConfig, GitHubClient},
    memory::InMemoryRepositoryApi,
};
