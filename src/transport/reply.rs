//! Relay replies, read back after each command

use std::fmt::{self, Display, Formatter};

use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::char,
    combinator::{eof, map_res, value},
    IResult, Parser,
};

use super::escape_crlf;
use crate::config::Acceptance;

/// `DDD` followed by `-` when more lines follow, or by a space or nothing on the
/// last line
fn reply_line(input: &str) -> IResult<&str, (u16, bool)> {
    (
        map_res(
            take_while_m_n(3, 3, |c: char| c.is_ascii_digit()),
            |digits: &str| digits.parse::<u16>(),
        ),
        alt((
            value(true, char('-')),
            value(false, char(' ')),
            value(false, eof),
        )),
    )
        .parse(input)
}

/// The bytes a relay sent back for one command
///
/// A reply is only kept long enough to check its code and to quote it in a
/// diagnostic.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Reply {
    raw: Vec<u8>,
    code: Option<u16>,
    complete: bool,
}

impl Reply {
    /// The bytes as received
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Number of bytes received
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Tells if nothing was received
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The code of the last well-formed reply line
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// Tells if the final line of a reply was received
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Tells if the decimal form of `code` occurs anywhere in the reply
    pub fn contains_code(&self, code: u16) -> bool {
        let needle = code.to_string();
        self.raw
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    /// Checks the reply against the code a command expects
    pub fn accepts(&self, code: u16, acceptance: Acceptance) -> bool {
        match acceptance {
            Acceptance::Contains => self.contains_code(code),
            Acceptance::Leading => self.complete && self.code == Some(code),
        }
    }

    /// Appends a received line, returns true when no more lines belong to this reply
    pub(crate) fn push_line(&mut self, line: &[u8]) -> bool {
        self.raw.extend_from_slice(line);

        let text = String::from_utf8_lossy(line);
        match reply_line(text.trim_end_matches(['\r', '\n'])) {
            Ok((_, (code, more))) => {
                self.code = Some(code);
                self.complete = !more;
                self.complete
            }
            // Not an SMTP reply line, there is nothing sensible left to wait for
            Err(_) => true,
        }
    }
}

impl Display for Reply {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&escape_crlf(String::from_utf8_lossy(&self.raw).trim_end()))
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        let mut reply = Reply::default();
        for line in text.split_inclusive('\n') {
            if reply.push_line(line.as_bytes()) {
                break;
            }
        }
        reply
    }
}
