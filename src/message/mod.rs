//! Message composition
//!
//! A [`Message`] is rendered into the two frames written after `DATA` was accepted:
//!
//! * the header block, one CRLF terminated line per header followed by a blank line
//! * the body, followed by the `\r\n.\r\n` terminator
//!
//! ```rust
//! use std::time::{Duration, SystemTime};
//! use relaymail::{message::MessageComposer, Config, Message};
//!
//! let message = Message::builder()
//!     .from("nobody@domain.tld")
//!     .to("hei@domain.tld")
//!     .reply_to("yuin@domain.tld")
//!     .subject("Happy new year")
//!     .body("Be happy!");
//!
//! let composer = MessageComposer::new(&Config::default().mailer("relaymail"));
//! let date = SystemTime::UNIX_EPOCH + Duration::from_secs(784887151);
//! let frames = composer.compose(&message, date);
//!
//! assert_eq!(
//!     String::from_utf8_lossy(frames.header()),
//!     concat!(
//!         "Date: Tue, 15 Nov 1994 08:12:31 +0000\r\n",
//!         "From: nobody@domain.tld\r\n",
//!         "To: hei@domain.tld\r\n",
//!         "Subject: Happy new year\r\n",
//!         "X-Mailer: relaymail\r\n",
//!         "Reply-To: yuin@domain.tld\r\n",
//!         "Content-Type: text/html\r\n",
//!         "\r\n",
//!     )
//! );
//! assert_eq!(frames.body(), b"Be happy!");
//! assert_eq!(frames.terminator(), b"\r\n.\r\n");
//! ```

use std::{fmt::Write as _, time::SystemTime};

use mime::Mime;

use self::codec::DotStuffing;
pub use self::date::Date;
use crate::config::Config;

mod codec;
mod date;

/// Marks the end of the message body
pub const TERMINATOR: &[u8] = b"\r\n.\r\n";

/// The single message sent by a session
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Message {
    from: String,
    to: String,
    reply_to: String,
    subject: String,
    body: String,
}

impl Message {
    /// Creates a new default message builder
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Sender address, used for `MAIL From:` and the `From` header
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Recipient address, used for `RCPT To:` and the `To` header
    pub fn to(&self) -> &str {
        &self.to
    }

    /// `Reply-To` address
    pub fn reply_to(&self) -> &str {
        &self.reply_to
    }

    /// Subject line
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Message body, sent as is apart from dot-stuffing
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Builds a [`Message`], the body comes last and completes it
#[derive(Clone, Debug, Default)]
pub struct MessageBuilder {
    from: String,
    to: String,
    reply_to: String,
    subject: String,
}

impl MessageBuilder {
    /// Creates a new default message builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender address
    pub fn from<T: Into<String>>(mut self, from: T) -> Self {
        self.from = from.into();
        self
    }

    /// Set the recipient address
    pub fn to<T: Into<String>>(mut self, to: T) -> Self {
        self.to = to.into();
        self
    }

    /// Set the `Reply-To` address
    pub fn reply_to<T: Into<String>>(mut self, reply_to: T) -> Self {
        self.reply_to = reply_to.into();
        self
    }

    /// Set the subject
    pub fn subject<T: Into<String>>(mut self, subject: T) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the body and build the message
    pub fn body<T: Into<String>>(self, body: T) -> Message {
        Message {
            from: self.from,
            to: self.to,
            reply_to: self.reply_to,
            subject: self.subject,
            body: body.into(),
        }
    }
}

/// The bytes written during the DATA phase
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Frames {
    header: Vec<u8>,
    body: Vec<u8>,
}

impl Frames {
    /// Header block, including the closing blank line
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Body, dot-stuffed if enabled
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// End of data marker
    pub fn terminator(&self) -> &'static [u8] {
        TERMINATOR
    }

    /// Header, body and terminator as a single buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.len() + self.body.len() + TERMINATOR.len());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.body);
        out.extend_from_slice(TERMINATOR);
        out
    }
}

/// Renders messages with the configured content type and mailer name
#[derive(Clone, Debug)]
pub struct MessageComposer {
    content_type: Mime,
    mailer: String,
    dot_stuffing: bool,
}

impl MessageComposer {
    /// Creates a composer from the session configuration
    pub fn new(config: &Config) -> Self {
        Self {
            content_type: config.content_type.clone(),
            mailer: config.mailer.clone(),
            dot_stuffing: config.dot_stuffing,
        }
    }

    /// Renders `message` as sent at `date`
    ///
    /// Output only depends on the arguments: the same message and date always give
    /// the same bytes.
    pub fn compose(&self, message: &Message, date: SystemTime) -> Frames {
        Frames {
            header: self.header(message, date).into_bytes(),
            body: self.body(message),
        }
    }

    fn header(&self, message: &Message, date: SystemTime) -> String {
        let mut header = String::with_capacity(256);
        // Writing into a String cannot fail
        let _ = write!(
            header,
            "Date: {}\r\nFrom: {}\r\nTo: {}\r\nSubject: {}\r\nX-Mailer: {}\r\nReply-To: {}\r\nContent-Type: {}\r\n\r\n",
            Date::new(date),
            message.from,
            message.to,
            message.subject,
            self.mailer,
            message.reply_to,
            self.content_type,
        );
        header
    }

    fn body(&self, message: &Message) -> Vec<u8> {
        if self.dot_stuffing {
            let mut out = Vec::with_capacity(message.body.len());
            DotStuffing::new().encode(message.body.as_bytes(), &mut out);
            out
        } else {
            message.body.as_bytes().to_vec()
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    fn message(body: &str) -> Message {
        Message::builder()
            .from("user@localhost")
            .to("root@localhost")
            .reply_to("noreply@localhost")
            .subject("Hello")
            .body(body)
    }

    fn date() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(784887151)
    }

    #[test]
    fn header_lines_in_order() {
        let composer = MessageComposer::new(&Config::default().mailer("test mailer"));
        let frames = composer.compose(&message("Hello World!"), date());

        assert_eq!(
            String::from_utf8(frames.header().to_vec()).unwrap(),
            "Date: Tue, 15 Nov 1994 08:12:31 +0000\r\n\
             From: user@localhost\r\n\
             To: root@localhost\r\n\
             Subject: Hello\r\n\
             X-Mailer: test mailer\r\n\
             Reply-To: noreply@localhost\r\n\
             Content-Type: text/html\r\n\
             \r\n"
        );
        assert_eq!(frames.body(), b"Hello World!");
    }

    #[test]
    fn content_type_follows_config() {
        let composer = MessageComposer::new(&Config::default().content_type(mime::TEXT_PLAIN));
        let frames = composer.compose(&message("plain"), date());
        let header = String::from_utf8(frames.header().to_vec()).unwrap();
        assert!(header.contains("\r\nContent-Type: text/plain\r\n\r\n"));
    }

    #[test]
    fn compose_is_idempotent() {
        let composer = MessageComposer::new(&Config::default());
        let message = message("line one\r\n.line two\r\n");
        assert_eq!(
            composer.compose(&message, date()).to_bytes(),
            composer.compose(&message, date()).to_bytes()
        );
    }

    #[test]
    fn terminator_ends_every_body() {
        let composer = MessageComposer::new(&Config::default());
        for body in ["", "text", "text\r\n", "text\r\n.", "text\r\n.\r", "text\r\n.\r\n"] {
            let bytes = composer.compose(&message(body), date()).to_bytes();
            assert!(bytes.ends_with(b"\r\n.\r\n"), "body {body:?}");
        }
    }

    #[test]
    fn embedded_terminator_is_escaped() {
        let composer = MessageComposer::new(&Config::default());
        let frames = composer.compose(&message("before\r\n.\r\nafter"), date());
        assert_eq!(frames.body(), b"before\r\n..\r\nafter");
    }

    #[test]
    fn raw_body_without_dot_stuffing() {
        let composer = MessageComposer::new(&Config::default().dot_stuffing(false));
        let frames = composer.compose(&message(".raw"), date());
        assert_eq!(frames.body(), b".raw");
    }
}
