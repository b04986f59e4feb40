//! Fixed parameters of a relay session
//!
//! Everything the session would otherwise hard-code (port, reply buffer size,
//! content type, mailer identification) lives here and is handed to the
//! [`Mailer`](crate::Mailer) when it is built.

use std::time::Duration;

use mime::Mime;

use crate::transport::SMTP_PORT;

/// Default upper bound on the bytes read for one reply
pub const DEFAULT_MAX_REPLY_LEN: usize = 4096;

/// Default value of the `X-Mailer` header
pub const DEFAULT_MAILER: &str = concat!("relaymail ", env!("CARGO_PKG_VERSION"));

/// How a reply is matched against the code a command expects
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub enum Acceptance {
    /// The code appears anywhere in the reply bytes
    #[default]
    Contains,
    /// The final line of a complete reply starts with the code
    Leading,
}

/// Session configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) port: u16,
    pub(crate) max_reply_len: usize,
    pub(crate) content_type: Mime,
    pub(crate) mailer: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) acceptance: Acceptance,
    pub(crate) dot_stuffing: bool,
    pub(crate) strict_addresses: bool,
}

impl Default for Config {
    /// Port 25, 4 KiB replies, `text/html`, no timeout, substring acceptance,
    /// dot-stuffing on, envelope addresses only checked for framing
    fn default() -> Self {
        Self {
            port: SMTP_PORT,
            max_reply_len: DEFAULT_MAX_REPLY_LEN,
            content_type: mime::TEXT_HTML,
            mailer: DEFAULT_MAILER.to_owned(),
            timeout: None,
            acceptance: Acceptance::default(),
            dot_stuffing: true,
            strict_addresses: false,
        }
    }
}

impl Config {
    /// Set the relay port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the maximum number of bytes read for a single reply
    ///
    /// Reading stops once the limit is reached even if the reply is not complete.
    /// The rest of a line cut by the limit is discarded. A zero limit is raised to
    /// one byte.
    pub fn max_reply_len(mut self, max_reply_len: usize) -> Self {
        self.max_reply_len = max_reply_len.max(1);
        self
    }

    /// Set the `Content-Type` of every message
    pub fn content_type(mut self, content_type: Mime) -> Self {
        self.content_type = content_type;
        self
    }

    /// Set the `X-Mailer` header value
    pub fn mailer<T: Into<String>>(mut self, mailer: T) -> Self {
        self.mailer = mailer.into();
        self
    }

    /// Set a timeout for connect, reads and writes
    ///
    /// `None`, the default, blocks until the relay answers or drops the connection.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the reply acceptance rule
    pub fn acceptance(mut self, acceptance: Acceptance) -> Self {
        self.acceptance = acceptance;
        self
    }

    /// Enable or disable doubling of leading dots in body lines
    pub fn dot_stuffing(mut self, dot_stuffing: bool) -> Self {
        self.dot_stuffing = dot_stuffing;
        self
    }

    /// Require envelope addresses to be valid `local@domain` addresses
    ///
    /// Off by default: bare local users such as `postgres` are forwarded as is.
    /// Characters breaking a command line are rejected either way.
    pub fn strict_addresses(mut self, strict_addresses: bool) -> Self {
        self.strict_addresses = strict_addresses;
        self
    }

    /// The relay port
    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// The maximum number of bytes read for a single reply
    pub fn get_max_reply_len(&self) -> usize {
        self.max_reply_len
    }

    /// The `Content-Type` of every message
    pub fn get_content_type(&self) -> &Mime {
        &self.content_type
    }

    /// The `X-Mailer` header value
    pub fn get_mailer(&self) -> &str {
        &self.mailer
    }

    /// The connect/read/write timeout
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The reply acceptance rule
    pub fn get_acceptance(&self) -> Acceptance {
        self.acceptance
    }

    /// Whether leading dots are doubled
    pub fn get_dot_stuffing(&self) -> bool {
        self.dot_stuffing
    }

    /// Whether envelope addresses must be valid `local@domain` addresses
    pub fn get_strict_addresses(&self) -> bool {
        self.strict_addresses
    }
}
