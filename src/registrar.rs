use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::{Error, Result};

/// Registers a private key with whatever holds keys for the user, usually
/// the ssh agent.
pub trait Registrar {
    fn register(&mut self, identity: &Path) -> Result<()>;
}

impl<F> Registrar for F
where
    F: FnMut(&Path) -> Result<()>,
{
    fn register(&mut self, identity: &Path) -> Result<()> {
        self(identity)
    }
}

/// Runs `ssh-add <flag> <identity>` and waits for it. Standard streams are
/// inherited so passphrase prompts reach the terminal; only the exit status
/// is inspected.
#[derive(Debug, Clone)]
pub struct SshAdd {
    program: OsString,
    flag: Option<String>,
}

impl SshAdd {
    pub fn new(program: impl Into<OsString>, flag: Option<String>) -> SshAdd {
        SshAdd {
            program: program.into(),
            flag: flag.filter(|f| !f.is_empty()),
        }
    }
}

impl Registrar for SshAdd {
    fn register(&mut self, identity: &Path) -> Result<()> {
        let program = self.program.to_string_lossy().into_owned();
        let mut command = Command::new(&self.program);
        command.args(&self.flag).arg(identity);
        log::debug!("running {command:?}");

        let status = command.status().map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(Error::Registration { program, status });
        }
        log::info!("registered {} with {program}", identity.display());
        Ok(())
    }
}

/// Registers nothing; used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRun;

impl Registrar for DryRun {
    fn register(&mut self, identity: &Path) -> Result<()> {
        log::warn!("dry run: not registering {}", identity.display());
        Ok(())
    }
}
