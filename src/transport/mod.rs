//! The SMTP session, from relay lookup to connection teardown.
//!
//! The client speaks the legacy dialogue a cooperative relay accepts without
//! greeting negotiation:
//!
//! ```text
//! S: 220 relay.example.com ready
//! C: MAIL From:<user@example.com>
//! S: 250 OK
//! C: RCPT To:<user@example.org>
//! S: 250 OK
//! C: DATA
//! S: 354 Start mail input
//! C: <header block> <body> \r\n.\r\n
//! S: 250 queued
//! C: QUIT
//! S: 221 Bye
//! ```
//!
//! Each piece can be driven on its own. Here is a whole transaction over an
//! in-memory relay:
//!
//! ```rust
//! use std::time::SystemTime;
//! use relaymail::{
//!     message::MessageComposer,
//!     transport::{mock::MockRelay, RelayAddress, Session, SMTP_PORT},
//!     Config, Message,
//! };
//!
//! let relay = MockRelay::accepting();
//! let config = Config::default();
//! let address = RelayAddress::new("localhost", ([127, 0, 0, 1], SMTP_PORT).into());
//! let message = Message::builder()
//!     .from("user@example.com")
//!     .to("user@example.org")
//!     .reply_to("user@example.com")
//!     .subject("Test")
//!     .body("Test email");
//! let frames = MessageComposer::new(&config).compose(&message, SystemTime::now());
//!
//! let mut session = Session::open(&relay, address, &config).unwrap();
//! session.transaction(&message, &frames).unwrap();
//! session.close().unwrap();
//! assert_eq!(relay.closes(), 1);
//! ```

pub use self::{
    channel::CommandChannel,
    commands::Command,
    net::{Connector, SmtpStream, TcpConnector},
    reply::Reply,
    resolver::{RelayAddress, Resolve, SystemResolver},
    session::{Session, Stage, Step},
};

mod channel;
pub mod commands;
#[doc(hidden)]
pub mod mock;
mod net;
mod reply;
mod resolver;
mod session;

/// Default smtp port
pub const SMTP_PORT: u16 = 25;

/// Returns the string replacing all the CRLF with "\<CRLF\>"
/// Used for debug displays
pub(crate) fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}
