//! In-memory form of an ssh client config.
//!
//! Every element keeps the exact text it was decoded from (indentation,
//! separators, trailing comments, line endings) so that an unmodified
//! [`Config`] encodes back to the bytes it was read from.

use std::fmt::{self, Display, Formatter};

use wildmatch::WildMatch;

use crate::codec;
use crate::{Error, Result};

/// An ordered sequence of blocks. The first block is always the implicit
/// one holding whatever precedes the first `Host` or `Match` line.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub hosts: Vec<Host>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Host,
    Match,
}

/// The keyword line that opens a block, kept as written.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Header {
    pub(crate) line: Line,
    pub(crate) keyword: String,
    pub(crate) separator: String,
    pub(crate) arguments: String,
}

/// Text surrounding the meaningful part of a line.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Line {
    pub(crate) leading: String,
    pub(crate) trailing: String,
    pub(crate) eol: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    kind: BlockKind,
    patterns: Vec<Pattern>,
    header: Option<Header>,
    pub nodes: Vec<Node>,
}

impl Host {
    pub(crate) fn implicit() -> Host {
        Host {
            kind: BlockKind::Host,
            patterns: vec![Pattern::new("*")],
            header: None,
            nodes: Vec::new(),
        }
    }

    pub(crate) fn with_header(kind: BlockKind, patterns: Vec<Pattern>, header: Header) -> Host {
        Host {
            kind,
            patterns,
            header: Some(header),
            nodes: Vec::new(),
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// True for the block of directives that precede the first `Host` line.
    pub fn is_implicit(&self) -> bool {
        self.header.is_none()
    }

    pub(crate) fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Reports whether `name` selects this block under ssh's rules: no
    /// negated pattern may match, and at least one plain pattern must.
    /// `Match` blocks never match a name.
    pub fn matches(&self, name: &str) -> bool {
        if self.kind == BlockKind::Match {
            return false;
        }
        let mut matched = false;
        for pattern in &self.patterns {
            if pattern.matches(name) {
                if pattern.negated {
                    return false;
                }
                matched = true;
            }
        }
        matched
    }
}

impl Display for Host {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        codec::write_host(f, self)
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.hosts.iter().try_for_each(|host| codec::write_host(f, host))
    }
}

/// A single `Host` pattern: `*` matches any run of characters, `?` exactly
/// one, and a leading `!` negates the pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    glob: String,
    matcher: WildMatch,
    negated: bool,
}

impl Pattern {
    pub fn new(text: &str) -> Pattern {
        let (glob, negated) = match text.strip_prefix('!') {
            Some(glob) => (glob, true),
            None => (text, false),
        };
        Pattern {
            glob: glob.to_string(),
            matcher: WildMatch::new(glob),
            negated,
        }
    }

    /// Glob match of `name` against this pattern, ignoring negation.
    pub fn matches(&self, name: &str) -> bool {
        self.matcher.matches(name)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.glob == other.glob && self.negated == other.negated
    }
}

impl Eq for Pattern {}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!")?;
        }
        write!(f, "{}", self.glob)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    KeyValue(KeyValue),
    Empty(Empty),
}

/// A `Key value` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    key: String,
    value: String,
    pub(crate) raw_value: String,
    pub(crate) separator: String,
    pub(crate) line: Line,
}

impl KeyValue {
    pub(crate) fn new(key: String, raw_value: String, separator: String, line: Line) -> KeyValue {
        KeyValue {
            key,
            value: unquote(&raw_value),
            raw_value,
            separator,
            line,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value with surrounding quotes removed.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the value, quoting it when it contains whitespace. The
    /// indentation, separator and trailing comment of the line are kept.
    /// ssh has no escape for `"`, so values containing one are refused.
    pub fn set_value(&mut self, value: &str) -> Result<()> {
        if value.contains('"') {
            return Err(Error::UnquotableValue(value.to_string()));
        }
        self.raw_value = if value.contains(char::is_whitespace) {
            format!("\"{value}\"")
        } else {
            value.to_string()
        };
        self.value = value.to_string();
        Ok(())
    }
}

/// A blank or comment-only line, passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Empty {
    pub(crate) text: String,
    pub(crate) eol: String,
}

impl Empty {
    pub fn comment(&self) -> Option<&str> {
        self.text.trim_start().strip_prefix('#')
    }
}

fn unquote(raw: &str) -> String {
    raw.replace('"', "")
}
