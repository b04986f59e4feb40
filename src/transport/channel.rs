use std::io::{self, BufRead, BufReader, Read, Write};

#[cfg(feature = "tracing")]
use super::escape_crlf;
use super::{Command, Reply};
use crate::{
    config::{Acceptance, Config},
    error::{self, Error},
};

/// Writes command lines and reads the replies to them
#[derive(Debug)]
pub struct CommandChannel<S> {
    stream: BufReader<S>,
    max_reply_len: usize,
    acceptance: Acceptance,
}

impl<S: Read + Write> CommandChannel<S> {
    /// Wraps a connected stream
    pub fn new(stream: S, config: &Config) -> CommandChannel<S> {
        CommandChannel {
            stream: BufReader::new(stream),
            max_reply_len: config.max_reply_len,
            acceptance: config.acceptance,
        }
    }

    /// Sends a command and checks the reply for the code it expects
    ///
    /// A failed write, an empty reply and a reply without the expected code are all
    /// reported as a protocol error for the command's step.
    pub fn send(&mut self, command: &Command) -> Result<Reply, Error> {
        let step = command.step();
        self.write(command.to_string().as_bytes())
            .map_err(|e| error::protocol(step, e))?;
        let reply = self.read_reply().map_err(|e| error::protocol(step, e))?;

        if reply.accepts(command.expected_code(), self.acceptance) {
            Ok(reply)
        } else if reply.is_empty() {
            Err(error::protocol(step, "no reply from relay"))
        } else {
            Err(error::protocol(
                step,
                format!("expected {}, got \"{}\"", command.expected_code(), reply),
            ))
        }
    }

    /// Writes raw bytes to the relay
    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.get_mut().write_all(bytes)?;
        self.stream.get_mut().flush()?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Wrote: {}", escape_crlf(&String::from_utf8_lossy(bytes)));
        Ok(())
    }

    /// Reads one reply
    ///
    /// Lines are accumulated until the last line of the reply, the end of the
    /// stream, a line that is not a reply line, or the configured size limit.
    /// A line cut by the limit is read to its end and the excess dropped, so the
    /// next reply starts on a line boundary.
    pub fn read_reply(&mut self) -> io::Result<Reply> {
        let mut reply = Reply::default();
        let mut line = Vec::with_capacity(128);

        loop {
            let remaining = self.max_reply_len.saturating_sub(reply.len());
            if remaining == 0 {
                break;
            }

            line.clear();
            let read = (&mut self.stream)
                .take(remaining as u64)
                .read_until(b'\n', &mut line)?;
            if read == 0 {
                break;
            }
            if read == remaining && !line.ends_with(b"\n") {
                self.skip_line()?;
            }

            #[cfg(feature = "tracing")]
            tracing::debug!("<< {}", escape_crlf(&String::from_utf8_lossy(&line)));
            if reply.push_line(&line) {
                break;
            }
        }

        Ok(reply)
    }

    /// Discards input up to and including the next line feed
    fn skip_line(&mut self) -> io::Result<()> {
        loop {
            let buf = self.stream.fill_buf()?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&byte| byte == b'\n') {
                Some(end) => {
                    self.stream.consume(end + 1);
                    return Ok(());
                }
                None => {
                    let len = buf.len();
                    self.stream.consume(len);
                }
            }
        }
    }

    /// Gets a reference to the underlying stream
    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }

    /// Gets a mutable reference to the underlying stream
    pub fn get_mut(&mut self) -> &mut S {
        self.stream.get_mut()
    }
}
