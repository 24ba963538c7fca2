//! A minimal ssh-agent client, enough to add a private key over the socket
//! named by `SSH_AUTH_SOCK` without going through `ssh-add`.

use std::fmt::{Debug, Formatter};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use bytes::{Buf, BytesMut};
use ssh_encoding::Encode;
use ssh_key::PrivateKey;

use crate::registrar::Registrar;
use crate::{Error, Result};

type MessageTypeId = u8;
// https://datatracker.ietf.org/doc/html/draft-miller-ssh-agent-04#section-5.1
const SSH_AGENTC_ADD_IDENTITY: MessageTypeId = 17;
const SSH_AGENT_FAILURE: MessageTypeId = 5;
const SSH_AGENT_SUCCESS: MessageTypeId = 6;

const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;

pub trait ReadWrite: Read + Write {}

#[cfg(unix)]
impl ReadWrite for std::os::unix::net::UnixStream {}

pub struct Client {
    socket: Box<dyn ReadWrite>,
}

#[derive(Debug, PartialEq)]
pub(crate) enum ReadMessage {
    Failure,
    Success,
}

impl Client {
    /// Constructs a Client connected to a unix socket referenced by the
    /// path socket.
    #[cfg(unix)]
    pub fn connect(path: &Path) -> Result<Client> {
        let socket = std::os::unix::net::UnixStream::connect(path)
            .map_err(|e| Error::io(format!("failed to connect to {}", path.display()), e))?;
        Ok(Client::with_read_write(Box::new(socket)))
    }

    #[cfg(not(unix))]
    pub fn connect(path: &Path) -> Result<Client> {
        Err(Error::io(
            format!("failed to connect to {}", path.display()),
            std::io::ErrorKind::Unsupported.into(),
        ))
    }

    pub fn with_read_write(socket: Box<dyn ReadWrite>) -> Client {
        Client { socket }
    }

    /// Hands `key` to the agent, like `ssh-add KEY`.
    pub fn add_identity(&mut self, key: &PrivateKey) -> Result<()> {
        write_add_identity(&mut self.socket, key)?;
        match read_message(&mut self.socket)? {
            ReadMessage::Success => Ok(()),
            ReadMessage::Failure => Err(Error::AgentFailure),
        }
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish()
    }
}

/// Registers keys by talking to the agent directly.
#[derive(Debug, Clone)]
pub struct Agent {
    socket: PathBuf,
}

impl Agent {
    pub fn new(socket: impl Into<PathBuf>) -> Agent {
        Agent {
            socket: socket.into(),
        }
    }

    pub fn from_env() -> Result<Agent> {
        std::env::var_os("SSH_AUTH_SOCK")
            .filter(|path| !path.is_empty())
            .map(Agent::new)
            .ok_or(Error::AgentSocketUnset)
    }
}

impl Registrar for Agent {
    fn register(&mut self, identity: &Path) -> Result<()> {
        let key = read_key(identity)?;
        Client::connect(&self.socket)?.add_identity(&key)?;
        log::info!("added {} to the agent", identity.display());
        Ok(())
    }
}

/// Reads an unencrypted OpenSSH private key.
pub fn read_key(path: &Path) -> Result<PrivateKey> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;
    let key = PrivateKey::from_openssh(bytes)?;
    if key.is_encrypted() {
        return Err(Error::EncryptedKey(path.to_path_buf()));
    }
    Ok(key)
}

pub(crate) fn write_add_identity(output: &mut dyn Write, key: &PrivateKey) -> Result<()> {
    let mut buf: Vec<u8> = vec![SSH_AGENTC_ADD_IDENTITY];
    key.key_data().encode(&mut buf)?;
    key.comment().encode(&mut buf)?;

    let len = u32::try_from(buf.len())
        .map_err(|_| Error::InvalidData(Some("message too large to send".to_string())))?;
    output.write_all(&len.to_be_bytes())?;
    output.write_all(&buf)?;
    output.flush()?;
    Ok(())
}

pub(crate) fn read_message(input: &mut dyn Read) -> Result<ReadMessage> {
    let mut header = [0u8; 5];
    input.read_exact(&mut header)?;
    let mut header = &header[..];
    let len = header.get_u32();
    let t = header.get_u8();

    if len == 0 {
        return Err(Error::InvalidData(Some("empty message".to_string())));
    }
    if len > MAX_MESSAGE_SIZE {
        // refusing to allocate more than MAX_MESSAGE_SIZE
        return Err(Error::InvalidData(Some(format!(
            "Refusing to read message with size larger than {MAX_MESSAGE_SIZE}"
        ))));
    }
    let mut body = BytesMut::zeroed(len as usize - 1);
    input.read_exact(body.as_mut())?;

    match t {
        SSH_AGENT_FAILURE => Ok(ReadMessage::Failure),
        SSH_AGENT_SUCCESS => Ok(ReadMessage::Success),
        _ => Err(Error::UnknownMessageType(t)),
    }
}

#[cfg(test)]
mod test {
    use super::{read_message, ReadMessage};
    use crate::testutil::reader;
    use crate::Error;

    #[test]
    fn test_read_message_failure() {
        let result =
            read_message(&mut reader(b"\0\0\0\x01\x05")).expect("failed to read_message()");
        assert_eq!(result, ReadMessage::Failure);
    }

    #[test]
    fn test_read_message_success() {
        let result =
            read_message(&mut reader(b"\0\0\0\x01\x06")).expect("failed to read_message()");
        assert_eq!(result, ReadMessage::Success);
    }

    #[test]
    fn test_read_message_unknown() {
        match read_message(&mut reader(b"\0\0\0\x01\xff")) {
            Err(Error::UnknownMessageType(0xff)) => (),
            _ => panic!("did not receive expected error UnknownMessageType"),
        }
    }

    #[test]
    fn test_read_overly_long_message_length() {
        match read_message(&mut reader(b"\x01\0\0\x01\xff")) {
            Err(Error::InvalidData(Some(msg))) => assert_eq!(
                msg,
                "Refusing to read message with size larger than 1048576"
            ),
            _ => panic!("did not receive expected error InvalidData"),
        }
    }

    #[test]
    fn test_read_empty_message() {
        assert!(matches!(
            read_message(&mut reader(b"\0\0\0\0\x06")),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_read_truncated_message() {
        assert!(matches!(
            read_message(&mut reader(b"\0\0\0\x05\x06\0")),
            Err(Error::IO { .. })
        ));
    }
}
