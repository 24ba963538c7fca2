use std::ffi::OsString;

use clap::{Parser, ValueEnum};

use ssh_identity_switch::agent::Agent;
use ssh_identity_switch::registrar::{DryRun, SshAdd};
use ssh_identity_switch::rewrite::DEFAULT_PATTERN;
use ssh_identity_switch::{Registrar, Result};

/// Point IdentityFile entries in an ssh config at a new key and add that
/// key to the agent.
#[derive(Parser, Debug)]
#[command(name = "ssh-identity-switch", version)]
pub struct Cli {
    /// Pattern selecting the Host blocks to edit. With the default `*`,
    /// blocks matching `*` themselves (such as `Host *`) are left alone.
    #[arg(long, default_value = DEFAULT_PATTERN)]
    pub host: String,

    /// Print the config file and exit
    #[arg(long)]
    pub list: bool,

    /// Config file; `./` paths are relative to the working directory,
    /// other relative paths to the home directory
    #[arg(long, default_value = ".ssh/config")]
    pub config: String,

    /// How the new key is added to the agent
    #[arg(long, value_enum, default_value_t = RegistrarKind::SshAdd)]
    pub registrar: RegistrarKind,

    /// Program run by the ssh-add registrar
    #[arg(long, default_value = "ssh-add", env = "SSH_IDENTITY_SWITCH_SSH_ADD")]
    pub ssh_add: String,

    /// Flag passed to the ssh-add program before the key path; empty for none
    #[arg(long, default_value = "-K", allow_hyphen_values = true)]
    pub ssh_add_flag: String,

    /// Show the result without registering keys or writing the file
    #[arg(long)]
    pub dry_run: bool,

    /// File name of the key under ~/.ssh
    #[arg(required_unless_present = "list")]
    pub identity: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum RegistrarKind {
    /// Run the ssh-add program
    #[default]
    SshAdd,
    /// Speak the agent protocol on SSH_AUTH_SOCK
    Agent,
}

impl Cli {
    pub fn registrar(&self) -> Result<Box<dyn Registrar>> {
        if self.dry_run {
            return Ok(Box::new(DryRun));
        }
        Ok(match self.registrar {
            RegistrarKind::SshAdd => Box::new(SshAdd::new(
                &self.ssh_add,
                Some(self.ssh_add_flag.clone()),
            )),
            RegistrarKind::Agent => Box::new(Agent::from_env()?),
        })
    }
}

const LONG_FLAGS: &[&str] = &[
    "help",
    "version",
    "host",
    "list",
    "config",
    "registrar",
    "ssh-add",
    "ssh-add-flag",
    "dry-run",
];

/// Accepts single-dash long flags (`-host foo`, `-list`, `-config=x`) by
/// rewriting them to their `--` form. Everything after `--` is left alone.
pub fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut positional_only = false;
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| {
            if index == 0 || positional_only {
                return arg;
            }
            if arg == "--" {
                positional_only = true;
                return arg;
            }
            match arg.to_str().filter(|a| is_single_dash_long_flag(a)) {
                Some(flag) => OsString::from(format!("-{flag}")),
                None => arg,
            }
        })
        .collect()
}

fn is_single_dash_long_flag(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    let name = rest.split('=').next().unwrap_or(rest);
    LONG_FLAGS.contains(&name)
}
