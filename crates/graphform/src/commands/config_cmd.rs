//! Config subcommand handlers.

use serde::Serialize;

use graphform_core::StoreConfig;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// What `config show` prints: the file as loaded plus the values a new
/// document would be seeded with under the active profile.
#[derive(Debug, Serialize)]
struct Shown<'a> {
    path: String,
    document: String,
    store: StoreConfig,
    config: &'a Config,
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!("{} already exists (use --force)", path.display()),
                });
            }
            let written = config::save_config(&Config::default())?;
            output::status(&format!("Wrote {}", written.display()), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let resolved = config::resolve_with(&cfg, global)?;
            let shown = Shown {
                path: config::config_path().display().to_string(),
                document: resolved.document.display().to_string(),
                store: resolved.store,
                config: &cfg,
            };
            let out = output::render_single(&global.output, &shown, show_detail, |s| {
                s.path.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

fn show_detail(shown: &Shown<'_>) -> String {
    let store = &shown.store;
    let mut lines = vec![
        format!("Config:    {}", shown.path),
        format!("Document:  {}", shown.document),
        format!(
            "Prefix:    {}",
            if store.prefix.is_empty() { "-" } else { &store.prefix }
        ),
        format!("Region:    {}", store.region),
        format!("Zones:     {}", store.zones),
        format!("Endpoints: {}", store.endpoints),
    ];
    if !store.tags.is_empty() {
        lines.push(format!("Tags:      {}", store.tags.join(", ")));
    }
    let profiles: Vec<&str> = shown.config.profiles.keys().map(String::as_str).collect();
    if !profiles.is_empty() {
        lines.push(format!("Profiles:  {}", profiles.join(", ")));
    }
    lines.join("\n")
}
