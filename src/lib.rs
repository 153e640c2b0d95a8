pub mod config;
pub mod errors;
pub mod repo;
pub mod server;
pub mod telemetry;
pub mod util;

pub use repo::RepositoryService;
