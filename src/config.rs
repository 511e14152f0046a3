//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--namespace`, `--latency-ms`, `--no-mouse`, etc.)
//! 2. Explicit `--config` file
//! 3. `$FP_CONFIG` environment variable (path to config file)
//! 4. Project-local `.folder-picker.toml` in the current working directory
//! 5. Global `~/.config/folder-picker/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Namespace opened at startup (defaults to the first one).
    pub namespace: Option<String>,
    /// JSON fixture served instead of the built-in demo tree.
    pub fixture: Option<String>,
}

/// Picker behaviour.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PickerConfig {
    /// Typeahead buffer reset interval in milliseconds.
    pub typeahead_timeout_ms: Option<u64>,
    /// Rows moved by Page Up / Page Down.
    pub page_size: Option<usize>,
    /// Restrict search to the selected folder.
    pub scoped_search: Option<bool>,
}

/// Folder service settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Artificial delay added to every listing.
    pub latency_ms: Option<u64>,
}

/// Log output.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. "info" or "folder_picker=debug".
    pub level: Option<String>,
    /// Log file. Logging is off when unset.
    pub file: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark" or "light".
    pub scheme: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub picker: PickerConfig,
    pub service: ServiceConfig,
    pub log: LogConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default typeahead reset interval in milliseconds.
pub const DEFAULT_TYPEAHEAD_TIMEOUT_MS: u64 = crate::picker::nav::DEFAULT_TYPEAHEAD_TIMEOUT_MS;
/// Default Page Up / Page Down step.
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("FP_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".folder-picker.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("folder-picker").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: other.general.mouse.or(self.general.mouse),
                namespace: other
                    .general
                    .namespace
                    .clone()
                    .or(self.general.namespace),
                fixture: other.general.fixture.clone().or(self.general.fixture),
            },
            picker: PickerConfig {
                typeahead_timeout_ms: other
                    .picker
                    .typeahead_timeout_ms
                    .or(self.picker.typeahead_timeout_ms),
                page_size: other.picker.page_size.or(self.picker.page_size),
                scoped_search: other.picker.scoped_search.or(self.picker.scoped_search),
            },
            service: ServiceConfig {
                latency_ms: other.service.latency_ms.or(self.service.latency_ms),
            },
            log: LogConfig {
                level: other.log.level.clone().or(self.log.level),
                file: other.log.file.clone().or(self.log.file),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Whether mouse support is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.general.namespace.as_deref()
    }

    pub fn fixture_path(&self) -> Option<PathBuf> {
        self.general.fixture.as_ref().map(PathBuf::from)
    }

    pub fn typeahead_timeout(&self) -> Duration {
        Duration::from_millis(
            self.picker
                .typeahead_timeout_ms
                .unwrap_or(DEFAULT_TYPEAHEAD_TIMEOUT_MS),
        )
    }

    /// Page step, never zero.
    pub fn page_size(&self) -> usize {
        self.picker.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    pub fn scoped_search(&self) -> bool {
        self.picker.scoped_search.unwrap_or(true)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.service.latency_ms.unwrap_or(0))
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.file.as_ref().map(PathBuf::from)
    }

    /// Theme scheme: "dark" or "light".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
