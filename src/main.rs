use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;

use ssh_identity_switch::rewrite::{rewrite, Settings};
use ssh_identity_switch::{codec, paths};

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse_from(cli::normalize_args(std::env::args_os()));
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let home = paths::home_dir()?;
    let cwd = std::env::current_dir().context("failed to determine the working directory")?;
    let path = paths::resolve_config_path(&cli.config, &home, &cwd);

    let text = paths::read_config(&path)?;
    let mut config = codec::decode(&text)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.list {
        write!(out, "{config}")?;
        return Ok(());
    }

    let mut registrar = cli.registrar()?;
    let settings = Settings {
        identity: cli
            .identity
            .context("no identity file given on the command line")?,
        pattern: cli.host,
        home,
    };

    let summary = rewrite(&mut config, &settings, registrar.as_mut(), &mut out)?;
    let encoded = codec::encode(&config);

    if cli.dry_run {
        log::warn!("dry run: {} left unchanged", path.display());
        write!(out, "{encoded}")?;
        return Ok(());
    }

    paths::write_config(&path, &encoded)?;
    log::info!(
        "rewrote {} IdentityFile entries in {} blocks of {}",
        summary.rewritten,
        summary.visited,
        path.display()
    );
    Ok(())
}
