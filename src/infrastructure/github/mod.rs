//! Hosting API access.
//!
//! [`api::RepositoryApi`] is the seam the reconcilers depend on;
//! [`client::GitHubClient`] talks to GitHub and
//! [`memory::InMemoryRepositoryApi`] keeps everything in process.

pub mod api;
pub mod client;
pub mod memory;
