//! Shared domain types for repogate.
//!
//! Every transport adapter (command line, HTTP) serialises exactly these
//! shapes, so the JSON contract stays identical no matter which runtime the
//! caller talks to.

pub mod constants;
pub mod state;
pub mod verdict;

pub use state::{PersistedRepoRecord, RepositoryEntry, RepositoryState};
pub use verdict::{HealthVerdict, HealthyReport, UnhealthyReport};
