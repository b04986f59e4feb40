//! Transparency for the DATA phase
//!
//! See [RFC 5321, section 4.5.2](https://tools.ietf.org/html/rfc5321#section-4.5.2):
//! a line starting with `.` gets an extra `.` so that the relay does not take it
//! for the end of the message.

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Position {
    LineStart,
    AfterCr,
    InLine,
}

/// Doubles leading dots, line by line
#[derive(Clone, Copy, Debug)]
pub(crate) struct DotStuffing {
    position: Position,
}

impl Default for DotStuffing {
    /// The body follows the blank line closing the header block
    fn default() -> Self {
        Self {
            position: Position::LineStart,
        }
    }
}

impl DotStuffing {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn encode(&mut self, frame: &[u8], buf: &mut Vec<u8>) {
        buf.reserve(frame.len());
        for &byte in frame {
            if byte == b'.' && self.position == Position::LineStart {
                buf.push(b'.');
            }
            buf.push(byte);
            self.position = match (self.position, byte) {
                (_, b'\r') => Position::AfterCr,
                (Position::AfterCr, b'\n') => Position::LineStart,
                _ => Position::InLine,
            };
        }
    }
}
