//! Error and result type for relay sessions

use std::{error::Error as StdError, fmt};

use crate::{transport::Step, BoxError};

// Inspired by https://github.com/seanmonstar/reqwest/blob/a8566383168c0ef06c21f38cbc9213af6ff6db31/src/error.rs

/// The errors that may occur while sending a message to the relay
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
            }),
        }
    }

    /// Returns true if an envelope address was rejected before connecting
    pub fn is_address(&self) -> bool {
        matches!(self.inner.kind, Kind::Address)
    }

    /// Returns true if a header value would break the header block
    pub fn is_header(&self) -> bool {
        matches!(self.inner.kind, Kind::Header)
    }

    /// Returns true if the relay host name could not be resolved
    pub fn is_resolution(&self) -> bool {
        matches!(self.inner.kind, Kind::Resolution)
    }

    /// Returns true if the connection to the relay could not be opened
    pub fn is_connection(&self) -> bool {
        matches!(self.inner.kind, Kind::Connection)
    }

    /// Returns true if a command got no reply, or a reply without the expected code
    pub fn is_protocol(&self) -> bool {
        matches!(self.inner.kind, Kind::Protocol(_))
    }

    /// Returns true if the header, body or terminator could not be written
    pub fn is_transport_write(&self) -> bool {
        matches!(self.inner.kind, Kind::TransportWrite)
    }

    /// Returns true if releasing the connection failed
    pub fn is_close(&self) -> bool {
        matches!(self.inner.kind, Kind::Close)
    }

    /// Returns true if the error is caused by a timeout
    pub fn is_timeout(&self) -> bool {
        let mut source = self.source();

        while let Some(err) = source {
            if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
                return matches!(
                    io_err.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                );
            }

            source = err.source();
        }

        false
    }

    /// The session step that failed, for protocol and message write errors
    pub fn step(&self) -> Option<Step> {
        match self.inner.kind {
            Kind::Protocol(step) => Some(step),
            Kind::TransportWrite => Some(Step::Message),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    /// Sender, recipient or reply-to address unusable in a command frame
    Address,
    /// Header value containing a line break
    Header,
    /// Host name lookup failed or returned nothing
    Resolution,
    /// Socket creation, connect or greeting failed
    Connection,
    /// Unexpected or absent reply code
    Protocol(Step),
    /// Header, body or terminator write failed
    TransportWrite,
    /// Releasing the connection failed
    Close,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("relaymail::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Address => f.write_str("invalid address")?,
            Kind::Header => f.write_str("invalid header value")?,
            Kind::Resolution => f.write_str("could not resolve relay host")?,
            Kind::Connection => f.write_str("could not connect to relay")?,
            Kind::Protocol(step) => write!(f, "protocol error during {step}")?,
            Kind::TransportWrite => f.write_str("could not send message")?,
            Kind::Close => f.write_str("could not close connection")?,
        };

        if let Some(ref e) = self.inner.source {
            write!(f, ": {e}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| {
            let r: &(dyn std::error::Error + 'static) = &**e;
            r
        })
    }
}

pub(crate) fn address<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Address, Some(e))
}

pub(crate) fn header<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Header, Some(e))
}

pub(crate) fn resolution<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Resolution, Some(e))
}

pub(crate) fn connection<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connection, Some(e))
}

pub(crate) fn protocol<E: Into<BoxError>>(step: Step, e: E) -> Error {
    Error::new(Kind::Protocol(step), Some(e))
}

pub(crate) fn transport_write<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::TransportWrite, Some(e))
}

pub(crate) fn close<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Close, Some(e))
}
