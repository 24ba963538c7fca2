use ssh_identity_switch::agent::ReadWrite;
use std::io::{Cursor, Read, Write};

/// Stands in for the agent socket: replays `response` and, when dropped,
/// asserts that exactly `expected` was written.
pub struct MockSocket {
    expected: Vec<u8>,
    response: Cursor<Vec<u8>>,
    output: Vec<u8>,
}

impl Read for MockSocket {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.response.read(buf)
    }
}

impl Write for MockSocket {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.output.flush()
    }
}

impl Drop for MockSocket {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            assert_eq!(self.expected, self.output)
        }
    }
}

impl ReadWrite for MockSocket {}

impl MockSocket {
    pub fn new(expected: Vec<u8>, response: &[u8]) -> MockSocket {
        MockSocket {
            expected,
            response: Cursor::new(response.to_vec()),
            output: Vec::new(),
        }
    }
}
