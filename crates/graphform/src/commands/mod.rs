//! Command dispatch: bridges CLI args -> store operations -> output formatting.

pub mod config_cmd;
pub mod document;
pub mod records;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a document-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Init { force } => document::init(force, global),
        Command::Check => document::check(global),
        Command::Reconcile { dry_run } => document::reconcile(dry_run, global),
        Command::Export => document::export(global),
        Command::Collections => records::collections(global),
        Command::List { path } => records::list(&path, global),
        Command::Show { path, name } => records::show(&path, &name, global),
        Command::Create { path, json, at } => records::create(&path, &json, at, global),
        Command::Delete { path, name } => records::delete(&path, &name, global),
        Command::Rename { path, old, new } => records::rename(&path, &old, &new, global),
        Command::Move { path, from, to } => records::move_record(&path, from, to, global),
        Command::Set {
            path,
            name,
            field,
            value,
        } => records::set(&path, &name, &field, &value, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
