//! Shared configuration for graphform tools.
//!
//! TOML defaults and named project profiles, layered with `GRAPHFORM_*`
//! environment overrides, and translation to `graphform_core::StoreConfig`.
//! The CLI adds flag-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use graphform_core::StoreConfig;

/// Service endpoint types accepted for `endpoints`.
pub const ENDPOINT_TYPES: &[&str] = &["private", "public", "public-and-private"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named project profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: None,
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Document file used when `--file` is not given.
    pub document: Option<PathBuf>,

    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_zones")]
    pub zones: i64,

    #[serde(default = "default_endpoints")]
    pub endpoints: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            document: None,
            prefix: String::new(),
            region: default_region(),
            zones: default_zones(),
            endpoints: default_endpoints(),
            tags: Vec::new(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_region() -> String {
    StoreConfig::default().region
}
fn default_zones() -> i64 {
    StoreConfig::default().zones
}
fn default_endpoints() -> String {
    StoreConfig::default().endpoints
}

/// A named project: its document and seed overrides.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Path to the project's document file.
    pub document: Option<PathBuf>,

    pub prefix: Option<String>,

    pub region: Option<String>,

    pub zones: Option<i64>,

    pub endpoints: Option<String>,

    pub tags: Option<Vec<String>>,
}

impl Config {
    /// Profile named `name`, falling back to `default_profile`. `Ok(None)`
    /// when neither names one.
    pub fn profile(&self, name: Option<&str>) -> Result<Option<(&str, &Profile)>, ConfigError> {
        let Some(name) = name.or(self.default_profile.as_deref()) else {
            return Ok(None);
        };
        self.profiles
            .get_key_value(name)
            .map(|(name, profile)| Some((name.as_str(), profile)))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.to_owned(),
            })
    }

    /// Seed values for a fresh store: profile overrides on top of
    /// `[defaults]`, validated.
    pub fn store_config(&self, profile: Option<&str>) -> Result<StoreConfig, ConfigError> {
        let defaults = &self.defaults;
        let empty = Profile::default();
        let profile = self
            .profile(profile)?
            .map_or(&empty, |(_, profile)| profile);

        let config = StoreConfig {
            prefix: profile.prefix.as_ref().unwrap_or(&defaults.prefix).clone(),
            region: profile.region.as_ref().unwrap_or(&defaults.region).clone(),
            zones: profile.zones.unwrap_or(defaults.zones),
            tags: profile.tags.as_ref().unwrap_or(&defaults.tags).clone(),
            endpoints: profile
                .endpoints
                .as_ref()
                .unwrap_or(&defaults.endpoints)
                .clone(),
        };
        validate(&config)?;
        Ok(config)
    }

    /// Document path from the selected profile, else `[defaults]`.
    pub fn document_path(&self, profile: Option<&str>) -> Result<Option<PathBuf>, ConfigError> {
        let from_profile = self
            .profile(profile)?
            .and_then(|(_, profile)| profile.document.clone());
        Ok(from_profile.or_else(|| self.defaults.document.clone()))
    }
}

fn validate(config: &StoreConfig) -> Result<(), ConfigError> {
    if !(1..=3).contains(&config.zones) {
        return Err(ConfigError::Validation {
            field: "zones".into(),
            reason: format!("expected 1 to 3, got {}", config.zones),
        });
    }
    if config.region.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "region".into(),
            reason: "must not be empty".into(),
        });
    }
    if !ENDPOINT_TYPES.contains(&config.endpoints.as_str()) {
        return Err(ConfigError::Validation {
            field: "endpoints".into(),
            reason: format!(
                "expected one of {}, got '{}'",
                ENDPOINT_TYPES.join(", "),
                config.endpoints
            ),
        });
    }
    Ok(())
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "graphform", "graphform").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("graphform");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GRAPHFORM_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    fn load(jail: &Jail) -> figment::error::Result<Config> {
        load_config_from(&jail.directory().join("config.toml")).map_err(|e| e.to_string().into())
    }

    #[test]
    fn missing_file_yields_store_defaults() {
        Jail::expect_with(|jail| {
            let config = load(jail)?;
            assert_eq!(config.store_config(None).unwrap(), StoreConfig::default());
            assert_eq!(config.defaults.output, "table");
            Ok(())
        });
    }

    #[test]
    fn profile_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "edge"

                [defaults]
                prefix = "slz"
                region = "eu-de"
                tags = ["team:core"]

                [profiles.edge]
                document = "edge.json"
                zones = 2
                "#,
            )?;
            let config = load(jail)?;
            let store = config.store_config(None).unwrap();
            assert_eq!(store.prefix, "slz");
            assert_eq!(store.region, "eu-de");
            assert_eq!(store.zones, 2);
            assert_eq!(store.tags, ["team:core"]);
            assert_eq!(
                config.document_path(None).unwrap(),
                Some(PathBuf::from("edge.json"))
            );
            Ok(())
        });
    }

    #[test]
    fn environment_wins_over_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[defaults]\nregion = \"eu-de\"\n")?;
            jail.set_env("GRAPHFORM_DEFAULTS__REGION", "jp-tok");
            jail.set_env("GRAPHFORM_DEFAULTS__ZONES", "1");
            let store = load(jail)?.store_config(None).unwrap();
            assert_eq!(store.region, "jp-tok");
            assert_eq!(store.zones, 1);
            Ok(())
        });
    }

    #[test]
    fn invalid_seed_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[defaults]\nzones = 5\n")?;
            let err = load(jail)?.store_config(None).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "zones"));
            Ok(())
        });
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let err = Config::default().store_config(Some("nope")).unwrap_err();
        assert_eq!(err.to_string(), "no profile named 'nope'");
    }

    #[test]
    fn saved_config_loads_back() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("nested").join("config.toml");
            let mut config = Config::default();
            config.defaults.prefix = "acme".into();
            config.profiles.insert("dev".into(), Profile::default());
            save_config_to(&path, &config).unwrap();

            let loaded = load_config_from(&path).unwrap();
            assert_eq!(loaded.defaults.prefix, "acme");
            assert!(loaded.profiles.contains_key("dev"));
            Ok(())
        });
    }
}
