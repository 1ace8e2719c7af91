//! CLI-side configuration: `GlobalOpts`-aware wrappers over
//! `graphform_config`. Core only ever sees the resulting `StoreConfig`.

use std::path::PathBuf;

pub use graphform_config::{Config, config_path, load_config, save_config};
use graphform_core::StoreConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Document file used when neither `--file` nor the config names one.
pub const DEFAULT_DOCUMENT: &str = "graphform.json";

/// Seed values and document location resolved from config + flags.
#[derive(Debug)]
pub struct Resolved {
    pub store: StoreConfig,
    pub document: PathBuf,
}

/// Resolve the active profile: `--profile` flag, then `default_profile`.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config()?;
    resolve_with(&cfg, global)
}

pub fn resolve_with(cfg: &Config, global: &GlobalOpts) -> Result<Resolved, CliError> {
    let profile = global.profile.as_deref();
    let store = cfg.store_config(profile)?;
    let document = match &global.file {
        Some(path) => path.clone(),
        None => cfg
            .document_path(profile)?
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT)),
    };
    tracing::debug!(document = %document.display(), ?profile, "resolved configuration");
    Ok(Resolved { store, document })
}
