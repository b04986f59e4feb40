use std::fmt::{self, Display, Formatter};

use super::{Command, CommandChannel, Connector, RelayAddress, SmtpStream};
use crate::{
    config::Config,
    error::{self, Error},
    message::{Frames, Message},
};

/// A step of the transaction that can fail once connected
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Step {
    /// `MAIL From:`
    Mail,
    /// `RCPT To:`
    Rcpt,
    /// `DATA`
    Data,
    /// Header block, body and terminator
    Message,
    /// `QUIT`
    Quit,
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Mail => "MAIL",
            Step::Rcpt => "RCPT",
            Step::Data => "DATA",
            Step::Message => "message",
            Step::Quit => "QUIT",
        })
    }
}

/// How far a session got
///
/// The stage only moves forward when the previous step succeeded.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Debug)]
pub enum Stage {
    /// Greeting consumed
    Connected,
    /// `MAIL` accepted
    SenderAccepted,
    /// `RCPT` accepted
    RecipientAccepted,
    /// `DATA` accepted, the relay waits for the message
    DataReady,
    /// Message and terminator written
    MessageSent,
    /// `QUIT` accepted
    QuitAccepted,
}

impl Stage {
    fn after(step: Step) -> Stage {
        match step {
            Step::Mail => Stage::SenderAccepted,
            Step::Rcpt => Stage::RecipientAccepted,
            Step::Data => Stage::DataReady,
            Step::Message => Stage::MessageSent,
            Step::Quit => Stage::QuitAccepted,
        }
    }
}

/// One connection to the relay, from greeting to close
///
/// The connection is released exactly once: by [`Session::close`], which reports
/// failures, or when the session is dropped without having been closed.
#[derive(Debug)]
pub struct Session<S: SmtpStream> {
    channel: CommandChannel<S>,
    relay: RelayAddress,
    stage: Stage,
    closed: bool,
}

impl<S: SmtpStream> Session<S> {
    /// Connects to the relay and consumes its greeting
    pub fn open<C>(
        connector: &C,
        relay: RelayAddress,
        config: &Config,
    ) -> Result<Session<S>, Error>
    where
        C: Connector<Stream = S> + ?Sized,
    {
        let stream = connector.connect(&relay).map_err(error::connection)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("connected to {}", relay);
        let mut session = Session {
            channel: CommandChannel::new(stream, config),
            relay,
            stage: Stage::Connected,
            closed: false,
        };

        // The greeting is not checked
        let _greeting = session.channel.read_reply().map_err(error::connection)?;
        #[cfg(feature = "tracing")]
        tracing::debug!("greeting from {}: {}", session.relay, _greeting);
        Ok(session)
    }

    /// The relay this session is connected to
    pub fn relay(&self) -> &RelayAddress {
        &self.relay
    }

    /// The last stage reached
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Runs `MAIL`, `RCPT`, `DATA`, the message and `QUIT`
    ///
    /// Stops at the first failing step; nothing belonging to a later step is sent.
    pub fn transaction(&mut self, message: &Message, frames: &Frames) -> Result<(), Error> {
        self.command(Command::mail(message.from()))?;
        self.command(Command::rcpt(message.to()))?;
        self.command(Command::data())?;
        self.message(frames)?;
        self.command(Command::quit())?;
        Ok(())
    }

    /// Sends a command, advancing the stage if it is accepted
    pub fn command(&mut self, command: Command) -> Result<(), Error> {
        self.channel.send(&command)?;
        self.stage = Stage::after(command.step());
        Ok(())
    }

    /// Writes the header block, the body and the terminator
    ///
    /// The relay's answer to the terminator is read and discarded.
    pub fn message(&mut self, frames: &Frames) -> Result<(), Error> {
        self.channel
            .write(frames.header())
            .map_err(error::transport_write)?;
        self.channel
            .write(frames.body())
            .map_err(error::transport_write)?;
        self.channel
            .write(frames.terminator())
            .map_err(error::transport_write)?;

        // Queue id or rejection, the session goes on to QUIT either way
        let _reply = self.channel.read_reply();
        #[cfg(feature = "tracing")]
        match &_reply {
            Ok(reply) => tracing::debug!("message reply: {}", reply),
            Err(err) => tracing::debug!("could not read message reply: {}", err),
        }

        self.stage = Stage::after(Step::Message);
        Ok(())
    }

    /// Releases the connection
    pub fn close(mut self) -> Result<(), Error> {
        self.release().map_err(error::close)
    }

    fn release(&mut self) -> std::io::Result<()> {
        self.closed = true;

        #[cfg(feature = "tracing")]
        tracing::debug!("closing connection to {}", self.relay);
        self.channel.get_mut().close()
    }
}

impl<S: SmtpStream> Drop for Session<S> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.release();
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::SystemTime;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        message::MessageComposer,
        transport::mock::{Event, MockRelay},
    };

    fn address() -> RelayAddress {
        RelayAddress::new("localhost", ([127, 0, 0, 1], 25).into())
    }

    fn message() -> Message {
        Message::builder()
            .from("user@localhost")
            .to("root@localhost")
            .reply_to("user@localhost")
            .subject("Hello")
            .body("Hello World!")
    }

    fn frames(config: &Config) -> Frames {
        MessageComposer::new(config).compose(&message(), SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn full_transaction() {
        let relay = MockRelay::accepting();
        let config = Config::default();

        let mut session = Session::open(&relay, address(), &config).unwrap();
        assert_eq!(session.stage(), Stage::Connected);
        session.transaction(&message(), &frames(&config)).unwrap();
        assert_eq!(session.stage(), Stage::QuitAccepted);
        session.close().unwrap();

        assert_eq!(relay.connects(), 1);
        assert_eq!(relay.closes(), 1);
    }

    #[test]
    fn stage_stops_at_failure() {
        let relay = MockRelay::new()
            .reply("220 ready\r\n")
            .reply("250 ok\r\n")
            .reply("452 too many recipients\r\n");
        let config = Config::default();

        let mut session = Session::open(&relay, address(), &config).unwrap();
        let err = session
            .transaction(&message(), &frames(&config))
            .unwrap_err();
        assert_eq!(err.step(), Some(Step::Rcpt));
        assert_eq!(session.stage(), Stage::SenderAccepted);
        drop(session);

        assert_eq!(relay.closes(), 1);
        assert_eq!(
            relay.frames(),
            vec!["MAIL From:<user@localhost>\r\n", "RCPT To:<root@localhost>\r\n"]
        );
    }

    #[test]
    fn dropped_session_is_closed_once() {
        let relay = MockRelay::accepting();
        let session = Session::open(&relay, address(), &Config::default()).unwrap();
        drop(session);

        assert_eq!(relay.closes(), 1);
        assert_eq!(relay.events(), vec![Event::Close]);
    }

    #[test]
    fn close_failure_is_reported() {
        let relay = MockRelay::accepting().failing_close();
        let session = Session::open(&relay, address(), &Config::default()).unwrap();

        let err = session.close().unwrap_err();
        assert!(err.is_close());
        assert_eq!(relay.closes(), 1);
    }

    #[test]
    fn refused_connection() {
        let relay = MockRelay::accepting().refusing();
        let err = Session::open(&relay, address(), &Config::default()).unwrap_err();

        assert!(err.is_connection());
        assert_eq!(relay.connects(), 1);
        assert_eq!(relay.closes(), 0);
    }

    #[test]
    fn message_reply_is_not_checked() {
        let relay = MockRelay::new()
            .reply("220 ready\r\n")
            .reply("554 rejected\r\n");
        let config = Config::default();

        let mut session = Session::open(&relay, address(), &config).unwrap();
        session.message(&frames(&config)).unwrap();
        assert_eq!(session.stage(), Stage::MessageSent);
        assert!(relay.written().ends_with(b"Hello World!\r\n.\r\n"));
    }
}
