use std::fmt::{self, Write};

use crate::config::{BlockKind, Empty, Header, Host, KeyValue, Line, Node, Pattern};
use crate::{Config, Error, Result};

/// Decodes the text of an ssh client config. Nothing is normalised: the
/// result encodes back to exactly `input`.
pub fn decode(input: &str) -> Result<Config> {
    let mut hosts = vec![Host::implicit()];

    for (index, raw) in input.split_inclusive('\n').enumerate() {
        let line_no = index + 1;
        let (content, eol) = split_eol(raw);
        let body = content.trim_start();
        let leading = &content[..content.len() - body.len()];

        if body.is_empty() || body.starts_with('#') {
            push_node(
                &mut hosts,
                Node::Empty(Empty {
                    text: content.to_string(),
                    eol: eol.to_string(),
                }),
            );
            continue;
        }

        let directive = split_directive(body, line_no)?;
        let line = Line {
            leading: leading.to_string(),
            trailing: directive.trailing.to_string(),
            eol: eol.to_string(),
        };

        let kind = if directive.key.eq_ignore_ascii_case("host") {
            BlockKind::Host
        } else if directive.key.eq_ignore_ascii_case("match") {
            BlockKind::Match
        } else {
            push_node(
                &mut hosts,
                Node::KeyValue(KeyValue::new(
                    directive.key.to_string(),
                    directive.value.to_string(),
                    directive.separator.to_string(),
                    line,
                )),
            );
            continue;
        };

        let patterns = match kind {
            BlockKind::Host => split_arguments(directive.value).map(Pattern::new).collect(),
            BlockKind::Match => Vec::new(),
        };
        hosts.push(Host::with_header(
            kind,
            patterns,
            Header {
                line,
                keyword: directive.key.to_string(),
                separator: directive.separator.to_string(),
                arguments: directive.value.to_string(),
            },
        ));
    }

    log::debug!("decoded {} blocks", hosts.len());
    Ok(Config { hosts })
}

/// Encodes a config back to text.
pub fn encode(config: &Config) -> String {
    config.to_string()
}

pub(crate) fn write_host(out: &mut impl Write, host: &Host) -> fmt::Result {
    if let Some(header) = host.header() {
        write_line(
            out,
            &header.line,
            format_args!("{}{}{}", header.keyword, header.separator, header.arguments),
        )?;
    }
    host.nodes.iter().try_for_each(|node| write_node(out, node))
}

fn write_node(out: &mut impl Write, node: &Node) -> fmt::Result {
    match node {
        Node::KeyValue(kv) => write_line(
            out,
            &kv.line,
            format_args!("{}{}{}", kv.key(), kv.separator, kv.raw_value),
        ),
        Node::Empty(empty) => write!(out, "{}{}", empty.text, empty.eol),
    }
}

fn write_line(out: &mut impl Write, line: &Line, body: fmt::Arguments<'_>) -> fmt::Result {
    write!(out, "{}{}{}{}", line.leading, body, line.trailing, line.eol)
}

fn push_node(hosts: &mut [Host], node: Node) {
    // decode() seeds the implicit block, so there is always a last block
    if let Some(host) = hosts.last_mut() {
        host.nodes.push(node);
    }
}

fn split_eol(raw: &str) -> (&str, &str) {
    if let Some(content) = raw.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = raw.strip_suffix('\n') {
        (content, "\n")
    } else {
        (raw, "")
    }
}

struct Directive<'a> {
    key: &'a str,
    separator: &'a str,
    value: &'a str,
    trailing: &'a str,
}

/// Splits `Key value # comment` (or `Key=value`) into its parts. `body` has
/// no leading whitespace.
fn split_directive(body: &str, line_no: usize) -> Result<Directive<'_>> {
    let key_end = body
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(body.len());
    let key = &body[..key_end];
    if key.is_empty() {
        return decode_error(line_no, "missing keyword");
    }

    let rest = &body[key_end..];
    let after_space = rest.trim_start();
    let after_equals = after_space.strip_prefix('=').unwrap_or(after_space);
    let value_and_trailing = after_equals.trim_start();
    let separator = &rest[..rest.len() - value_and_trailing.len()];

    let comment_start = find_comment(value_and_trailing, line_no)?;
    let value = value_and_trailing[..comment_start].trim_end();
    if value.is_empty() {
        return decode_error(line_no, &format!("missing value for {key}"));
    }

    Ok(Directive {
        key,
        separator,
        value,
        trailing: &value_and_trailing[value.len()..],
    })
}

/// Byte offset of a trailing `#` comment: a `#` outside quotes that follows
/// whitespace. Returns the length of `text` when there is none.
fn find_comment(text: &str, line_no: usize) -> Result<usize> {
    let mut quoted = false;
    let mut previous_is_space = false;
    for (i, c) in text.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '#' if !quoted && previous_is_space => return Ok(i),
            _ => {}
        }
        previous_is_space = c.is_whitespace();
    }
    if quoted {
        return decode_error(line_no, "unterminated quote");
    }
    Ok(text.len())
}

/// Splits whitespace-separated arguments, treating a quoted run as one.
fn split_arguments(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }
        let (argument, remainder) = match rest.strip_prefix('"') {
            Some(inner) => {
                let end = inner.find('"').unwrap_or(inner.len());
                (&inner[..end], inner.get(end + 1..).unwrap_or(""))
            }
            None => {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                (&rest[..end], &rest[end..])
            }
        };
        rest = remainder;
        Some(argument)
    })
}

fn decode_error<T>(line: usize, message: &str) -> Result<T> {
    Err(Error::Decode {
        line,
        message: message.to_string(),
    })
}

#[cfg(test)]
mod test {
    use crate::codec::{decode, encode, split_arguments};
    use crate::config::BlockKind;
    use crate::testutil::SAMPLE;
    use crate::{Error, Node};

    fn key_values(node: &Node) -> Option<(&str, &str)> {
        match node {
            Node::KeyValue(kv) => Some((kv.key(), kv.value())),
            Node::Empty(_) => None,
        }
    }

    #[test]
    fn test_decode_blocks() {
        let config = decode(SAMPLE).expect("failed to decode");
        assert_eq!(config.hosts.len(), 3);

        let implicit = &config.hosts[0];
        assert!(implicit.is_implicit());
        assert_eq!(
            implicit.nodes.iter().filter_map(key_values).collect::<Vec<_>>(),
            vec![("AddKeysToAgent", "yes")]
        );

        let example = &config.hosts[2];
        assert_eq!(example.kind(), BlockKind::Host);
        assert_eq!(
            example.patterns().iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            vec!["example.com", "www.example.com"]
        );
        assert_eq!(
            example.nodes.iter().filter_map(key_values).collect::<Vec<_>>(),
            vec![("HostName", "93.184.216.34"), ("IdentityFile", "~/.ssh/old_key")]
        );
    }

    #[test]
    fn test_encode_is_lossless() {
        let inputs = [
            SAMPLE,
            "",
            "\n\n",
            "Host a\r\n\tIdentityFile=~/.ssh/a\r\n",
            "Host a\n  IdentityFile = \"~/.ssh/with space\"   # trailing\n",
            "host lower\n    identityfile ~/.ssh/x",
            "Match host *.internal exec \"true\"\n  User admin\n",
            "# only a comment\n   \n",
        ];
        for input in inputs {
            let config = decode(input).expect("failed to decode");
            assert_eq!(encode(&config), input);
        }
    }

    #[test]
    fn test_decode_comment_node() {
        let config = decode("# header comment\nHost a\n").unwrap();
        match &config.hosts[0].nodes[0] {
            Node::Empty(empty) => assert_eq!(empty.comment(), Some(" header comment")),
            _ => panic!("expected a comment node"),
        }
    }

    #[test]
    fn test_decode_missing_value() {
        match decode("Host a\n  IdentityFile\n") {
            Err(Error::Decode { line, message }) => {
                assert_eq!(line, 2);
                assert_eq!(message, "missing value for IdentityFile");
            }
            other => panic!("did not receive expected decode error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_unterminated_quote() {
        match decode("IdentityFile \"~/.ssh/key\n") {
            Err(Error::Decode { line: 1, message }) => assert_eq!(message, "unterminated quote"),
            other => panic!("did not receive expected decode error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_keyword() {
        assert!(matches!(
            decode("Host a\n  = value\n"),
            Err(Error::Decode { line: 2, .. })
        ));
    }

    #[test]
    fn test_split_arguments() {
        assert_eq!(
            split_arguments("a  \"b c\" d").collect::<Vec<_>>(),
            vec!["a", "b c", "d"]
        );
    }
}
