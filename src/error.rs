use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not determine the home directory")]
    HomeDir,
    #[error("{context}: {source}")]
    IO {
        context: String,
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Decode { line: usize, message: String },
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    Registration { program: String, status: ExitStatus },
    #[error("cannot write {0:?} into the config: it contains a double quote")]
    UnquotableValue(String),
    #[error("SSH_AUTH_SOCK is not set")]
    AgentSocketUnset,
    #[error("the agent refused the key")]
    AgentFailure,
    #[error("unknown message type {0} from agent")]
    UnknownMessageType(u8),
    #[error("invalid data from agent{}", .0.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    InvalidData(Option<String>),
    #[error("{} is encrypted, use the ssh-add registrar for it", .0.display())]
    EncryptedKey(PathBuf),
    #[error(transparent)]
    SshKey(#[from] ssh_key::Error),
    #[error(transparent)]
    Encoding(#[from] ssh_encoding::Error),
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error::IO {
            context: context.into(),
            source,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("I/O error", e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
