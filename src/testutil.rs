use std::io::Cursor;

pub const SAMPLE: &str = "# Global settings
AddKeysToAgent yes

Host *
    IdentityFile ~/.ssh/old_key
    ServerAliveInterval 60

Host example.com www.example.com
    HostName 93.184.216.34
    IdentityFile ~/.ssh/old_key
";

pub fn reader(data: &'static [u8]) -> Cursor<&'static [u8]> {
    Cursor::new(data)
}
