//! Repository resolution and trust boundary.
//!
//! ## Overview
//!
//! Given a user-supplied path, decide whether it is an allowed, well-formed
//! project root, and keep the "active / recent repository" state on disk in
//! step with that decision. Both transport adapters (the CLI and the HTTP
//! server) call [`service::RepositoryService`]; nothing here knows about
//! either transport.
//!
//! ## Module Map
//!
//! ```text
//!  caller ──> service.rs  (RepositoryService: validate/persist/restore/remove)
//!               │
//!               ├─> health.rs  (HealthEvaluator)
//!               │     ├─> guard.rs        (PathGuard, AllowedRoots)
//!               │     ├─> locator.rs      (ConfigLocator, bounded BFS)
//!               │     └─> interpreter.rs  (output_folder line scan)
//!               │
//!               ├─> store.rs   (StateStore trait, JsonFileStore)
//!               └─> docs.rs    (devDocs reader, guarded)
//! ```
//!
//! ## Error Model
//!
//! | Condition                        | Representation                       |
//! |----------------------------------|--------------------------------------|
//! | empty / relative input           | `RepoPathError::Invalid` (400)       |
//! | outside every allowed root       | `RepoPathError::Forbidden` (403)     |
//! | repo incomplete, config unreadable | `HealthVerdict::Unhealthy` (422)   |
//! | state file cannot be written     | `StoreError` (500)                   |

pub mod docs;
pub mod guard;
pub mod health;
pub mod interpreter;
pub mod locator;
pub mod service;
pub mod store;

pub use guard::{AllowedRoots, PathGuard};
pub use service::{PersistOutcome, RemoveOutcome, RepositoryService, RestoreOutcome};
pub use store::{JsonFileStore, StateStore};
