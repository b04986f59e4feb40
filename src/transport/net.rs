//! Opening and closing the byte stream to the relay

use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpStream},
    time::Duration,
};

use socket2::{Domain, Protocol, Socket, Type};

use super::RelayAddress;

/// A connected stream that can be explicitly released
pub trait SmtpStream: Read + Write {
    /// Releases the connection, reporting failures instead of swallowing them
    fn close(&mut self) -> io::Result<()>;
}

impl SmtpStream for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // The relay already tore the connection down
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            result => result,
        }
    }
}

/// A trait for the concept of opening a stream to the relay
pub trait Connector {
    /// The stream type produced
    type Stream: SmtpStream;

    /// Opens a connection to the given relay
    fn connect(&self, relay: &RelayAddress) -> io::Result<Self::Stream>;
}

impl<C: Connector + ?Sized> Connector for &C {
    type Stream = C::Stream;

    fn connect(&self, relay: &RelayAddress) -> io::Result<Self::Stream> {
        (**self).connect(relay)
    }
}

/// Plain TCP connections
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector {
    timeout: Option<Duration>,
}

impl TcpConnector {
    /// Creates a connector, `timeout` applies to connect, reads and writes
    pub fn new(timeout: Option<Duration>) -> TcpConnector {
        TcpConnector { timeout }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, relay: &RelayAddress) -> io::Result<TcpStream> {
        let addr = relay.socket_addr();
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

        match self.timeout {
            Some(timeout) => socket.connect_timeout(&addr.into(), timeout)?,
            None => socket.connect(&addr.into())?,
        }

        let stream = TcpStream::from(socket);
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        Ok(stream)
    }
}
