//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `repo`          | `Validate`, `Persist`, `Restore`, `Remove`, `List`, `Roots` |
//! | `docs`          | `Doc`, `Status`                                    |
//! | `serve`         | `Serve`                                            |
//!
//! Responses go to stdout as pretty JSON. Exit codes: 0 ok, 2 unhealthy or
//! nothing to restore, 1 any error.

pub mod docs;
pub mod output;
pub mod repo;
pub mod serve;

pub use docs::{cmd_doc, cmd_status};
pub use repo::{cmd_list, cmd_persist, cmd_remove, cmd_restore, cmd_roots, cmd_validate};
pub use serve::cmd_serve;
