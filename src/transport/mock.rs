//! A scripted, in-memory relay
//!
//! [`MockRelay`] hands out [`MockStream`]s which serve the queued replies, one per
//! read once the previous one is used up, and record everything the client writes
//! along with the close calls.

use std::{
    collections::VecDeque,
    io::{self, Cursor, Read, Write},
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use super::{Connector, RelayAddress, Resolve, SmtpStream};

/// What the client did to a mock stream
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Event {
    /// Bytes handed to a single `write` call
    Write(Vec<u8>),
    /// A call to [`SmtpStream::close`]
    Close,
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Vec<u8>>,
    events: Vec<Event>,
    connects: usize,
    refuse: bool,
    fail_close: bool,
    fail_write: Option<usize>,
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hands out streams sharing one script
#[derive(Clone, Debug, Default)]
pub struct MockRelay {
    script: Arc<Mutex<Script>>,
}

impl MockRelay {
    /// A relay with nothing to say
    pub fn new() -> MockRelay {
        MockRelay::default()
    }

    /// A relay accepting every step of a transaction
    pub fn accepting() -> MockRelay {
        MockRelay::new()
            .reply("220 relay.example.com ESMTP ready\r\n")
            .reply("250 2.1.0 Sender ok\r\n")
            .reply("250 2.1.5 Recipient ok\r\n")
            .reply("354 End data with <CR><LF>.<CR><LF>\r\n")
            .reply("250 2.0.0 Ok: queued as 4F2A1\r\n")
            .reply("221 2.0.0 Bye\r\n")
    }

    /// Queues the bytes served by the next read
    pub fn reply(self, reply: &str) -> MockRelay {
        lock(&self.script)
            .replies
            .push_back(reply.as_bytes().to_vec());
        self
    }

    /// Makes every connection attempt fail
    pub fn refusing(self) -> MockRelay {
        lock(&self.script).refuse = true;
        self
    }

    /// Makes the write with the given index, counting from zero, fail
    pub fn failing_write(self, index: usize) -> MockRelay {
        lock(&self.script).fail_write = Some(index);
        self
    }

    /// Makes closing a stream report an error
    pub fn failing_close(self) -> MockRelay {
        lock(&self.script).fail_close = true;
        self
    }

    /// Number of connection attempts, refused ones included
    pub fn connects(&self) -> usize {
        lock(&self.script).connects
    }

    /// Number of close calls
    pub fn closes(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == Event::Close)
            .count()
    }

    /// Writes and closes, in order
    pub fn events(&self) -> Vec<Event> {
        lock(&self.script).events.clone()
    }

    /// Every write, in order
    pub fn frames(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Write(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                Event::Close => None,
            })
            .collect()
    }

    /// All written bytes, concatenated
    pub fn written(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Write(bytes) => Some(bytes),
                Event::Close => None,
            })
            .flatten()
            .collect()
    }
}

impl Connector for MockRelay {
    type Stream = MockStream;

    fn connect(&self, _relay: &RelayAddress) -> io::Result<MockStream> {
        let mut script = lock(&self.script);
        script.connects += 1;
        if script.refuse {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ));
        }

        Ok(MockStream {
            script: Arc::clone(&self.script),
            pending: Cursor::new(Vec::new()),
        })
    }
}

/// A stream connected to a [`MockRelay`]
#[derive(Debug)]
pub struct MockStream {
    script: Arc<Mutex<Script>>,
    pending: Cursor<Vec<u8>>,
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.position() as usize >= self.pending.get_ref().len() {
            match lock(&self.script).replies.pop_front() {
                Some(reply) => self.pending = Cursor::new(reply),
                None => return Ok(0),
            }
        }
        self.pending.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, msg: &[u8]) -> io::Result<usize> {
        let mut script = lock(&self.script);
        let writes = script
            .events
            .iter()
            .filter(|event| matches!(event, Event::Write(_)))
            .count();
        if script.fail_write == Some(writes) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        }

        script.events.push(Event::Write(msg.to_vec()));
        Ok(msg.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SmtpStream for MockStream {
    fn close(&mut self) -> io::Result<()> {
        let mut script = lock(&self.script);
        script.events.push(Event::Close);
        if script.fail_close {
            Err(io::Error::new(io::ErrorKind::Other, "close failed"))
        } else {
            Ok(())
        }
    }
}

/// Resolves every host to a fixed address, or to nothing, and counts lookups
#[derive(Debug, Default)]
pub struct MockResolver {
    addr: Option<SocketAddr>,
    lookups: AtomicUsize,
}

impl MockResolver {
    /// A resolver answering `addr`, with the requested port, for every host
    pub fn new(addr: SocketAddr) -> MockResolver {
        MockResolver {
            addr: Some(addr),
            lookups: AtomicUsize::new(0),
        }
    }

    /// A resolver that never finds anything
    pub fn failing() -> MockResolver {
        MockResolver::default()
    }

    /// Number of lookups
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Resolve for MockResolver {
    fn resolve(&self, host: &str, port: u16) -> io::Result<SocketAddr> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match self.addr {
            Some(addr) => Ok(SocketAddr::new(addr.ip(), port)),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {host}"),
            )),
        }
    }
}
