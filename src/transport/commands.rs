//! SMTP commands

use std::fmt::{self, Display, Formatter};

use super::Step;

/// Reply code accepting `MAIL` and `RCPT`, and the message itself
pub const MAIL_OK: u16 = 250;
/// Reply code inviting the client to send the message after `DATA`
pub const GO_AHEAD: u16 = 354;
/// Reply code acknowledging `QUIT`
pub const GOODBYE: u16 = 221;

/// A command line and the reply code it expects
///
/// The line is the concatenation of a fixed prefix, a variable body and a fixed
/// suffix carrying the CRLF terminator.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Command {
    step: Step,
    prefix: &'static str,
    body: String,
    suffix: &'static str,
    expected: u16,
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix, self.body, self.suffix)
    }
}

impl Command {
    /// Creates a command from its parts
    pub fn new<T: Into<String>>(
        step: Step,
        prefix: &'static str,
        body: T,
        suffix: &'static str,
        expected: u16,
    ) -> Command {
        Command {
            step,
            prefix,
            body: body.into(),
            suffix,
            expected,
        }
    }

    /// Creates a MAIL command
    pub fn mail(sender: &str) -> Command {
        Command::new(Step::Mail, "MAIL From:<", sender, ">\r\n", MAIL_OK)
    }

    /// Creates a RCPT command
    pub fn rcpt(recipient: &str) -> Command {
        Command::new(Step::Rcpt, "RCPT To:<", recipient, ">\r\n", MAIL_OK)
    }

    /// Creates a DATA command
    pub fn data() -> Command {
        Command::new(Step::Data, "", "DATA", "\r\n", GO_AHEAD)
    }

    /// Creates a QUIT command
    pub fn quit() -> Command {
        Command::new(Step::Quit, "", "QUIT", "\r\n", GOODBYE)
    }

    /// The session step this command drives
    pub fn step(&self) -> Step {
        self.step
    }

    /// The reply code that accepts this command
    pub fn expected_code(&self) -> u16 {
        self.expected
    }
}
