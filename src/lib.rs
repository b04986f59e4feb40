//! Relaymail sends exactly one email per call to an SMTP relay.
//!
//! It speaks the legacy SMTP dialogue (no `EHLO`, no `AUTH`, no TLS) directly over
//! a TCP connection and is meant to be called from a host that only cares whether
//! the message left or not:
//!
//! * resolve the relay host name
//! * connect on port 25 and read the greeting
//! * `MAIL From:`, `RCPT To:`, `DATA`, message, `QUIT`
//! * close the connection, whatever happened before
//!
//! ## Usage
//!
//! The simplest entry point mirrors what a database function or a script binding
//! would expose: six optional strings in, an optional boolean out. A missing
//! argument yields `None` and nothing is sent.
//!
//! ```rust,no_run
//! let sent = relaymail::send_mail(
//!     Some("mail.example.com"),
//!     Some("alerts@example.com"),
//!     Some("oncall@example.com"),
//!     Some("noreply@example.com"),
//!     Some("Disk almost full"),
//!     Some("<p>/var is at 97%</p>"),
//! );
//! assert_eq!(sent, Some(true));
//! ```
//!
//! When the failing phase matters, use a [`Mailer`] directly:
//!
//! ```rust,no_run
//! use relaymail::{Config, Mailer, Message};
//!
//! let mailer = Mailer::new(Config::default().port(2525));
//! let message = Message::builder()
//!     .from("alerts@example.com")
//!     .to("oncall@example.com")
//!     .reply_to("noreply@example.com")
//!     .subject("Disk almost full")
//!     .body("/var is at 97%");
//!
//! if let Err(err) = mailer.send("mail.example.com", &message) {
//!     eprintln!("not sent, failed at {:?}: {err}", err.step());
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/crate/relaymail/0.1.0")]
#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    unused_import_braces,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
mod mailer;
pub mod message;
pub mod notify;
pub mod transport;

pub use crate::{
    config::{Acceptance, Config},
    error::Error,
    mailer::{send_mail, DefaultNotifier, Mailer},
    message::{Message, MessageBuilder},
    notify::{Notifier, Severity},
};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
