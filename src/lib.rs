//! # repoconf - Declarative Repository Configuration
//!
//! `repoconf` reconciles the configuration of hosted git repositories with a
//! desired state declared in YAML. It follows a Validate / Plan / Apply
//! workflow: check the file, compute the changes needed against the live
//! state, then perform them.
//!
//! ## Features
//!
//! - **Repository Settings**: Description, visibility, topics and feature toggles
//! - **Branch Protection**: Review requirements, status checks and push restrictions
//! - **Access Control**: Collaborator and team permissions
//! - **Webhooks**: Endpoint URLs, events and activation
//! - **Multi-Repository Files**: Shared defaults and per-repository failure isolation
//! - **Destructive Change Detection**: Plans flag changes that lose access or data
//!
//! ## Quick Start
//!
//! 1. Describe the desired state (`repos.yml`):
//!
//! ```yaml
//! version: "1"
//! defaults:
//!   private: true
//!   topics: ["internal"]
//! repositories:
//!   - name: api
//!     description: "Public API"
//!     collaborators:
//!       - username: alice
//!         permission: write
//!   - name: web
//!     branch_protection:
//!       - pattern: main
//!         required_reviews: 2
//! ```
//!
//! 2. Validate and review the plan:
//!
//! ```bash
//! repoconf validate repos.yml
//! repoconf --owner acme plan repos.yml
//! ```
//!
//! 3. Apply it:
//!
//! ```bash
//! repoconf --owner acme apply repos.yml
//! ```
//!
//! ## Architecture
//!
//! - [`domain`]: Desired/observed state, change plans and the diff engine
//! - [`application`]: Validation services and reconciliation use cases
//! - [`infrastructure`]: Configuration loading and the hosting API clients
//! - [`presentation`]: CLI interface and output rendering
//! - [`common`]: Shared error handling
//!
//! ## Domain Model
//!
//! - [`domain::entities::repository_config::RepositoryConfig`]: Desired state of one repository
//! - [`domain::entities::multi_repository_config::MultiRepositoryConfig`]: Many repositories with shared defaults
//! - [`domain::entities::observed_state::ObservedState`]: Live state read from the API
//! - [`domain::entities::plan::ReconciliationPlan`]: Ordered changes for one repository
//! - [`domain::value_objects::permission::Permission`]: Ordered access level
//!
//! ## Error Handling
//!
//! - [`common::error::ConformError`]: Main error type with detailed context
//! - [`common::result::ConformResult`]: Type alias for `Result<T, ConformError>`
//!
//! ## Examples
//!
//! ### Planning Against an In-Memory Backend
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use repoconf::application::use_cases::reconcile_repositories::MultiRepositoryReconciler;
//! use repoconf::domain::entities::multi_repository_config::MultiRepositoryConfig;
//! use repoconf::domain::entities::repository_config::RepositoryConfig;
//! use repoconf::infrastructure::InMemoryRepositoryApi;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = MultiRepositoryConfig::new(vec![
//!     RepositoryConfig::new("api").with_private(true),
//!     RepositoryConfig::new("web").with_topics(["frontend"]),
//! ]);
//!
//! let reconciler = MultiRepositoryReconciler::new(Arc::new(InMemoryRepositoryApi::new()), "acme");
//! let planned = reconciler.plan_all(&config, None).await?;
//!
//! println!("{} change(s) planned", planned.result.change_count());
//! # Ok(())
//! # }
//! ```
//!
//! ### Loading a Desired-State File
//!
//! ```rust,no_run
//! use repoconf::infrastructure::ConfigStore;
//! use std::path::Path;
//!
//! # async fn example() -> repoconf::Result<()> {
//! let loaded = ConfigStore::new().load(Path::new("repos.yml")).await?;
//! let config = loaded.into_multi();
//!
//! for name in config.names() {
//!     println!("Repository: {}", name);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types for convenience
pub use crate::common::error::ConformError;
pub use crate::common::result::ConformResult as Result;
