use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Mode given to a config file this tool creates. Existing files keep theirs.
pub const CONFIG_MODE: u32 = 0o644;

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(Error::HomeDir)
}

/// Where the key named `identity` lives: `<home>/.ssh/<identity>`.
pub fn identity_path(home: &Path, identity: &str) -> PathBuf {
    home.join(".ssh").join(identity)
}

/// Resolves the `--config` argument. `./x` is taken relative to `cwd`, `~/x`
/// and other relative paths relative to `home`; absolute paths are kept.
pub fn resolve_config_path(raw: &str, home: &Path, cwd: &Path) -> PathBuf {
    if raw.starts_with("./") {
        cwd.join(raw)
    } else if let Some(rest) = raw.strip_prefix("~/") {
        home.join(rest)
    } else {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            home.join(path)
        }
    }
}

pub fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))
}

/// Overwrites `path` with `contents` in a single write. There is no
/// temporary file or rename.
pub fn write_config(path: &Path, contents: &str) -> Result<()> {
    let context = || format!("failed to write {}", path.display());
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, CONFIG_MODE);

    let mut file = options.open(path).map_err(|e| Error::io(context(), e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| Error::io(context(), e))?;
    log::debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
