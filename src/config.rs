//! Layered application configuration.
//!
//! Settings are resolved defaults → `{appData}/settings.toml` → environment →
//! command-line flags. The settings file is optional but must parse when
//! present; unknown keys are rejected.
//!
//! # Settings File Format
//!
//! ```toml
//! [roots]
//! allow = ["/srv/projects", "~/work"]
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3141
//! dev = false
//!
//! [logging]
//! level = "info"
//! json = false
//! file = true   # {appData}/logs/repogate.log
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::repo::guard::{self, AllowedRoots};
use crate::telemetry::LogSettings;

pub const APP_DATA_ENV: &str = "BMAD_APP_DATA_DIR";
pub const HOST_ENV: &str = "REPOGATE_HOST";
pub const PORT_ENV: &str = "REPOGATE_PORT";
pub const LOG_ENV: &str = "RUST_LOG";

pub const APP_DATA_DIR_NAME: &str = ".bmadapp";
pub const SETTINGS_FILE_NAME: &str = "settings.toml";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3141;
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── settings.toml ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootsSection {
    /// Extra allowed roots on top of home and the working directory.
    #[serde(default)]
    pub allow: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Permissive CORS for a local UI dev server.
    #[serde(default)]
    pub dev: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub file: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsToml {
    #[serde(default)]
    pub roots: RootsSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl SettingsToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse settings.toml")
    }

    /// Settings from `{app_data_root}/settings.toml`, or defaults when absent.
    pub fn load_or_default(app_data_root: &Path) -> Result<Self> {
        let path = app_data_root.join(SETTINGS_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

// ── Command-line layer ────────────────────────────────────────────────

/// Values supplied on the command line; `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub app_data_dir: Option<PathBuf>,
    pub allow: Vec<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dev: bool,
    pub verbose: bool,
}

// ── Effective configuration ───────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_data_root: PathBuf,
    pub settings: SettingsToml,
    pub host: String,
    pub port: u16,
    pub dev: bool,
    pub log: LogSettings,
    env_allow: Vec<PathBuf>,
    cli_allow: Vec<PathBuf>,
}

impl AppConfig {
    /// Resolve against the process environment.
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        Self::resolve(cli, |key| std::env::var_os(key))
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve<F>(cli: &CliOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let env_str = |key: &str| {
            env(key)
                .map(|v| v.to_string_lossy().trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let app_data_root = cli
            .app_data_dir
            .clone()
            .or_else(|| env_str(APP_DATA_ENV).map(PathBuf::from))
            .unwrap_or_else(default_app_data_root);

        let settings = SettingsToml::load_or_default(&app_data_root)?;

        let host = cli
            .host
            .clone()
            .or_else(|| env_str(HOST_ENV))
            .or_else(|| settings.server.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let env_port = match env_str(PORT_ENV) {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .with_context(|| format!("{PORT_ENV} is not a valid port: {raw}"))?,
            ),
            None => None,
        };
        let port = cli
            .port
            .or(env_port)
            .or(settings.server.port)
            .unwrap_or(DEFAULT_PORT);

        let filter = if cli.verbose {
            "debug".to_string()
        } else {
            env_str(LOG_ENV)
                .or_else(|| settings.logging.level.clone())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
        };
        let log = LogSettings {
            filter,
            json: settings.logging.json,
            dir: settings.logging.file.then(|| app_data_root.join("logs")),
        };

        let env_allow = env(guard::ALLOWLIST_ENV)
            .map(|value| guard::parse_allowlist(&value))
            .unwrap_or_default();

        Ok(Self {
            dev: cli.dev || settings.server.dev,
            app_data_root,
            settings,
            host,
            port,
            log,
            env_allow,
            cli_allow: cli.allow.clone(),
        })
    }

    /// Roots from home, cwd, the settings file, the environment and `--allow`.
    pub fn allowed_roots(&self) -> AllowedRoots {
        self.roots_with(self.env_allow.clone())
    }

    /// Recompute the roots, re-reading the allowlist from the live environment.
    pub fn refreshed_roots(&self) -> AllowedRoots {
        self.roots_with(guard::env_sources())
    }

    fn roots_with(&self, env_allow: Vec<PathBuf>) -> AllowedRoots {
        let mut sources = guard::default_sources();
        sources.extend(self.settings.roots.allow.iter().map(|p| expand_home(p)));
        sources.extend(env_allow);
        sources.extend(self.cli_allow.iter().cloned());
        AllowedRoots::new(sources)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.app_data_root.join(SETTINGS_FILE_NAME)
    }
}

/// `~/.bmadapp`, or `.bmadapp` in the working directory without a home.
pub fn default_app_data_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(APP_DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(APP_DATA_DIR_NAME))
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
