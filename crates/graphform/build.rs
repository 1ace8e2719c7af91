//! Render man pages and shell completions for `graphform` into `OUT_DIR`.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::Shell;

// cli.rs only depends on clap, so it compiles here on its own. Its
// argument fields are never read in this context.
#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir: PathBuf = env::var_os("OUT_DIR")
        .ok_or_else(|| io::Error::other("OUT_DIR not set by Cargo"))?
        .into();
    let mut cmd = cli::Cli::command();
    cmd.build();

    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;
    write_pages(&cmd, &man_dir, "graphform")?;

    let completion_dir = out_dir.join("completions");
    fs::create_dir_all(&completion_dir)?;
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        clap_complete::generate_to(shell, &mut cmd, "graphform", &completion_dir)?;
    }
    Ok(())
}

/// One page per command: `graphform.1`, `graphform-config-show.1`, ...
fn write_pages(cmd: &clap::Command, dir: &Path, name: &str) -> io::Result<()> {
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd.clone().name(name.to_owned())).render(&mut page)?;
    fs::write(dir.join(format!("{name}.1")), page)?;

    for sub in cmd
        .get_subcommands()
        .filter(|sub| !sub.is_hide_set() && sub.get_name() != "help")
    {
        write_pages(sub, dir, &format!("{name}-{}", sub.get_name()))?;
    }
    Ok(())
}
