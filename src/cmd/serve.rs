//! HTTP API server command - `repogate serve`.

use std::process::ExitCode;

use anyhow::Result;
use repogate::config::AppConfig;

pub async fn cmd_serve(config: AppConfig) -> Result<ExitCode> {
    repogate::server::start_server(config).await?;
    Ok(ExitCode::SUCCESS)
}
