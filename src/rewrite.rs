//! The selection and mutation pass over a decoded [`Config`].

use std::io::Write;
use std::path::PathBuf;

use crate::config::{BlockKind, Host, Node};
use crate::paths::identity_path;
use crate::registrar::Registrar;
use crate::{Config, Error, Result};

/// The operator's selection when `--host` is not given.
pub const DEFAULT_PATTERN: &str = "*";

const IDENTITY_FILE: &str = "IdentityFile";

/// Everything the pass needs to know, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// File name of the key under `<home>/.ssh`.
    pub identity: String,
    /// Selection pattern, see [`is_selected`].
    pub pattern: String,
    pub home: PathBuf,
}

impl Settings {
    pub fn identity_path(&self) -> PathBuf {
        identity_path(&self.home, &self.identity)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Blocks that were in scope.
    pub visited: usize,
    /// `IdentityFile` entries overwritten.
    pub rewritten: usize,
}

/// Decides whether `host` is in scope for `pattern`.
///
/// With the default pattern `*` every block that itself matches the name
/// `*` (`Host *`, the implicit leading block) is left out, so an unqualified
/// run never touches the fallback block. Any other pattern selects the
/// blocks that match it. `Match` blocks are never selected.
pub fn is_selected(host: &Host, pattern: &str) -> bool {
    if host.kind() == BlockKind::Match {
        return false;
    }
    if pattern == DEFAULT_PATTERN {
        !host.matches(DEFAULT_PATTERN)
    } else {
        host.matches(pattern)
    }
}

/// Points every `IdentityFile` of every selected block at
/// `<home>/.ssh/<identity>` and registers that key once per entry.
///
/// Each visited block is written to `trace` after its entries are handled.
/// The first registration error stops the pass; entries already rewritten
/// stay rewritten in `config` and keys already registered stay registered.
pub fn rewrite(
    config: &mut Config,
    settings: &Settings,
    registrar: &mut dyn Registrar,
    trace: &mut dyn Write,
) -> Result<Summary> {
    let identity = settings.identity_path();
    let value = identity.to_string_lossy();
    let mut summary = Summary::default();

    for host in config.hosts.iter_mut() {
        if !is_selected(host, &settings.pattern) {
            continue;
        }
        summary.visited += 1;

        for node in host.nodes.iter_mut() {
            let Node::KeyValue(kv) = node else {
                continue;
            };
            if !kv.key().eq_ignore_ascii_case(IDENTITY_FILE) {
                continue;
            }
            log::info!("{} -> {value}", kv.value());
            kv.set_value(&value)?;
            summary.rewritten += 1;
            registrar.register(&identity)?;
        }

        write_trace(trace, host)?;
    }

    Ok(summary)
}

fn write_trace(trace: &mut dyn Write, host: &Host) -> Result<()> {
    let text = host.to_string();
    let result = if text.ends_with('\n') {
        trace.write_all(text.as_bytes())
    } else {
        writeln!(trace, "{text}")
    };
    result.map_err(|e| Error::io("failed to write progress", e))
}
