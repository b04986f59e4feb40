use std::{
    fmt::{self, Display, Formatter},
    io,
    net::{SocketAddr, ToSocketAddrs},
};

/// A relay host name together with the address it resolved to
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct RelayAddress {
    host: String,
    addr: SocketAddr,
}

impl RelayAddress {
    /// Pairs a host name with its resolved socket address
    pub fn new<T: Into<String>>(host: T, addr: SocketAddr) -> RelayAddress {
        RelayAddress {
            host: host.into(),
            addr,
        }
    }

    /// The host name the address was resolved from
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The address to connect to
    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    /// The port to connect to
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl Display for RelayAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.host, self.addr)
    }
}

/// Host name lookup
pub trait Resolve {
    /// Returns the address to use for `host` on `port`
    fn resolve(&self, host: &str, port: u16) -> io::Result<SocketAddr>;
}

impl<R: Resolve + ?Sized> Resolve for &R {
    fn resolve(&self, host: &str, port: u16) -> io::Result<SocketAddr> {
        (**self).resolve(host, port)
    }
}

/// Uses the system resolver and keeps the first address, whatever its family
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, host: &str, port: u16) -> io::Result<SocketAddr> {
        (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {host}"),
            )
        })
    }
}
