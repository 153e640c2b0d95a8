use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use repogate::RepositoryService;
use repogate::config::{AppConfig, CliOverrides};

mod cmd;

#[derive(Parser)]
#[command(name = "repogate")]
#[command(version, about = "Validate, remember and restore BMAD project repositories")]
pub struct Cli {
    /// Debug logging (overrides RUST_LOG and settings.toml)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// App data root holding repository-state.json and settings.toml
    #[arg(long, global = true, env = "BMAD_APP_DATA_DIR")]
    pub app_data_dir: Option<PathBuf>,

    /// Extra allowed root (repeatable)
    #[arg(long = "allow", global = true, value_name = "PATH")]
    pub allow: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a repository without touching stored state
    Validate {
        path: String,
        /// Display name echoed in the verdict
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Evaluate and remember (healthy) or forget (unhealthy) a repository
    Persist {
        path: String,
        /// Display name stored with the repository
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Re-validate PATH, or the active repository when omitted
    Restore { path: Option<String> },
    /// Forget a repository
    Remove { path: String },
    /// Show the active and recent repositories
    List,
    /// Show the effective allowed roots
    Roots,
    /// Read a document under a repository's devDocs folder
    Doc { repo: String, relative: String },
    /// Read a repository's workflow status document
    Status { repo: String },
    /// Start the HTTP API
    Serve {
        /// Port to serve on
        #[arg(short, long, env = "REPOGATE_PORT")]
        port: Option<u16>,

        /// Host to bind
        #[arg(long, env = "REPOGATE_HOST")]
        host: Option<String>,

        /// Enable dev mode (CORS permissive for a local UI dev server)
        #[arg(long)]
        dev: bool,
    },
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            app_data_dir: self.app_data_dir.clone(),
            allow: self.allow.clone(),
            verbose: self.verbose,
            ..Default::default()
        };
        if let Commands::Serve { port, host, dev } = &self.command {
            overrides.port = *port;
            overrides.host = host.clone();
            overrides.dev = *dev;
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.overrides()).context("Failed to load configuration")?;
    let _log_guard = repogate::telemetry::init_logging(&config.log)?;

    let service = RepositoryService::with_app_data(config.allowed_roots(), &config.app_data_root);

    let code = match &cli.command {
        Commands::Validate { path, name } => cmd::cmd_validate(&service, path, name.clone()).await?,
        Commands::Persist { path, name } => cmd::cmd_persist(&service, path, name.clone()).await?,
        Commands::Restore { path } => cmd::cmd_restore(&service, path.as_deref()).await?,
        Commands::Remove { path } => cmd::cmd_remove(&service, path).await?,
        Commands::List => cmd::cmd_list(&service).await?,
        Commands::Roots => cmd::cmd_roots(&service)?,
        Commands::Doc { repo, relative } => cmd::cmd_doc(&service, repo, relative).await?,
        Commands::Status { repo } => cmd::cmd_status(&service, repo).await?,
        Commands::Serve { .. } => cmd::cmd_serve(config).await?,
    };

    Ok(code)
}
