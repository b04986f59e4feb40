use std::time::SystemTime;

use email_address::EmailAddress;

#[cfg(not(feature = "tracing"))]
use crate::notify::NoopNotifier;
#[cfg(feature = "tracing")]
use crate::notify::TracingNotifier;
use crate::{
    config::Config,
    error::{self, Error},
    message::{Message, MessageComposer},
    notify::{Notifier, Severity},
    transport::{Connector, RelayAddress, Resolve, Session, SystemResolver, TcpConnector},
};

/// The notifier used by [`Mailer::new`]: `tracing` events when the feature is
/// enabled, nothing otherwise
#[cfg(feature = "tracing")]
pub type DefaultNotifier = TracingNotifier;
/// The notifier used by [`Mailer::new`]: `tracing` events when the feature is
/// enabled, nothing otherwise
#[cfg(not(feature = "tracing"))]
pub type DefaultNotifier = NoopNotifier;

/// Sends one message per call through a relay
///
/// Every call resolves the relay, opens its own connection and closes it before
/// returning. Nothing is shared between calls.
#[derive(Debug, Clone)]
pub struct Mailer<R = SystemResolver, C = TcpConnector, N = DefaultNotifier> {
    config: Config,
    composer: MessageComposer,
    resolver: R,
    connector: C,
    notifier: N,
}

impl Mailer {
    /// Creates a mailer using the system resolver, plain TCP connections and the
    /// default notifier
    pub fn new(config: Config) -> Mailer {
        let connector = TcpConnector::new(config.timeout);
        Mailer {
            composer: MessageComposer::new(&config),
            config,
            resolver: SystemResolver,
            connector,
            notifier: DefaultNotifier::default(),
        }
    }
}

impl Default for Mailer {
    fn default() -> Self {
        Mailer::new(Config::default())
    }
}

impl<R, C, N> Mailer<R, C, N> {
    /// Replaces the host name resolver
    pub fn resolver<R2: Resolve>(self, resolver: R2) -> Mailer<R2, C, N> {
        Mailer {
            config: self.config,
            composer: self.composer,
            resolver,
            connector: self.connector,
            notifier: self.notifier,
        }
    }

    /// Replaces the connector
    pub fn connector<C2: Connector>(self, connector: C2) -> Mailer<R, C2, N> {
        Mailer {
            config: self.config,
            composer: self.composer,
            resolver: self.resolver,
            connector,
            notifier: self.notifier,
        }
    }

    /// Replaces the notifier
    pub fn notifier<N2: Notifier>(self, notifier: N2) -> Mailer<R, C, N2> {
        Mailer {
            config: self.config,
            composer: self.composer,
            resolver: self.resolver,
            connector: self.connector,
            notifier,
        }
    }

    /// The configuration this mailer was built with
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<R, C, N> Mailer<R, C, N>
where
    R: Resolve,
    C: Connector,
    N: Notifier,
{
    /// Sends `message` through `relay`
    ///
    /// On failure the error tells which phase failed; the same information has
    /// already been handed to the notifier.
    pub fn send(&self, relay: &str, message: &Message) -> Result<(), Error> {
        let result = self.deliver(relay, message, SystemTime::now());
        match result {
            Ok(()) => self.notifier.notice(Severity::Notice, "message sent"),
            Err(_) => self
                .notifier
                .notice(Severity::Warning, "message not sent, check the parameters"),
        }
        result
    }

    /// Sends a message built from six optional values
    ///
    /// Returns `None` without touching the network if any value is missing,
    /// otherwise whether the message was sent.
    pub fn send_mail(
        &self,
        relay: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        reply_to: Option<&str>,
        subject: Option<&str>,
        body: Option<&str>,
    ) -> Option<bool> {
        let message = Message::builder()
            .from(from?)
            .to(to?)
            .reply_to(reply_to?)
            .subject(subject?)
            .body(body?);

        Some(self.send(relay?, &message).is_ok())
    }

    fn deliver(&self, relay: &str, message: &Message, date: SystemTime) -> Result<(), Error> {
        check_message(message, self.config.strict_addresses).map_err(|e| self.report(e))?;

        let addr = self
            .resolver
            .resolve(relay, self.config.port)
            .map_err(|e| self.report(error::resolution(format!("{relay}: {e}"))))?;
        let relay = RelayAddress::new(relay, addr);

        #[cfg(feature = "tracing")]
        tracing::debug!("resolved relay {}", relay);
        let frames = self.composer.compose(message, date);
        let mut session = Session::open(&self.connector, relay, &self.config)
            .map_err(|e| self.report(e))?;

        let outcome = session
            .transaction(message, &frames)
            .map_err(|e| self.report(e));
        let closed = session.close().map_err(|e| self.report(e));

        outcome.and(closed)
    }

    fn report(&self, err: Error) -> Error {
        self.notifier.notice(Severity::Error, &err.to_string());
        err
    }
}

/// Rejects values that would break a command line or the header block
fn check_message(message: &Message, strict: bool) -> Result<(), Error> {
    for address in [message.from(), message.to()] {
        check_envelope_address(address, strict)?;
    }
    // Only written as a header, display names are fine
    if has_line_break(message.reply_to()) {
        return Err(error::address(format!(
            "Reply-To {:?} contains a line break",
            message.reply_to()
        )));
    }
    if has_line_break(message.subject()) {
        return Err(error::header(format!(
            "subject {:?} contains a line break",
            message.subject()
        )));
    }
    Ok(())
}

/// Rejects addresses that cannot be placed between angle brackets in a command
fn check_envelope_address(address: &str, strict: bool) -> Result<(), Error> {
    if address.contains(['\r', '\n', '<', '>']) || (strict && !EmailAddress::is_valid(address)) {
        return Err(error::address(format!("{address:?} is not a valid address")));
    }
    Ok(())
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// Sends one message with the default [`Mailer`]
///
/// Returns `None` without touching the network if any value is missing, otherwise
/// whether the message was sent. Diagnostics go to the default notifier.
pub fn send_mail(
    relay: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    reply_to: Option<&str>,
    subject: Option<&str>,
    body: Option<&str>,
) -> Option<bool> {
    Mailer::default().send_mail(relay, from, to, reply_to, subject, body)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        notify::{NoopNotifier, Notices},
        transport::mock::{MockRelay, MockResolver},
    };

    fn message() -> Message {
        Message::builder()
            .from("user@localhost")
            .to("root@localhost")
            .reply_to("user@localhost")
            .subject("Hello")
            .body("Hello World!")
    }

    fn date() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(784887151)
    }

    #[test]
    fn delivers_with_fixed_date() {
        let relay = MockRelay::accepting();
        let resolver = MockResolver::new(([127, 0, 0, 1], 0).into());
        let notices = Notices::new();
        let mailer = Mailer::new(Config::default().mailer("test"))
            .resolver(&resolver)
            .connector(&relay)
            .notifier(&notices);

        mailer.deliver("relay", &message(), date()).unwrap();

        let frames = relay.frames();
        assert_eq!(frames.len(), 7);
        assert_eq!(
            frames[3],
            "Date: Tue, 15 Nov 1994 08:12:31 +0000\r\n\
             From: user@localhost\r\n\
             To: root@localhost\r\n\
             Subject: Hello\r\n\
             X-Mailer: test\r\n\
             Reply-To: user@localhost\r\n\
             Content-Type: text/html\r\n\
             \r\n"
        );
        assert!(notices.entries().is_empty());
    }

    #[test]
    fn invalid_address_is_rejected_before_lookup() {
        let relay = MockRelay::accepting();
        let resolver = MockResolver::new(([127, 0, 0, 1], 0).into());
        let notices = Notices::new();
        let mailer = Mailer::default()
            .resolver(&resolver)
            .connector(&relay)
            .notifier(&notices);
        let message = Message::builder()
            .from("user@localhost>\r\nRCPT To:<victim@example.com")
            .to("root@localhost")
            .reply_to("user@localhost")
            .subject("Hello")
            .body("Hello World!");

        let err = mailer.send("relay", &message).unwrap_err();
        assert!(err.is_address());
        assert_eq!(resolver.lookups(), 0);
        assert_eq!(relay.connects(), 0);
        assert_eq!(notices.entries().len(), 2);
    }

    #[test]
    fn envelope_address_values() {
        assert!(check_envelope_address("user@localhost", false).is_ok());
        assert!(check_envelope_address("postgres", false).is_ok());
        assert!(check_envelope_address("", false).is_ok());
        assert!(check_envelope_address("a@b>", false).is_err());
        assert!(check_envelope_address("a@b\r\nRSET", false).is_err());

        assert!(check_envelope_address("first.last@example.com", true).is_ok());
        assert!(check_envelope_address("postgres", true).is_err());
        assert!(check_envelope_address("", true).is_err());
    }

    #[test]
    fn local_users_and_display_names_are_sent() {
        let relay = MockRelay::accepting();
        let resolver = MockResolver::new(([127, 0, 0, 1], 0).into());
        let mailer = Mailer::new(Config::default().mailer("test"))
            .resolver(&resolver)
            .connector(&relay)
            .notifier(NoopNotifier);
        let message = Message::builder()
            .from("postgres")
            .to("root")
            .reply_to("Support <support@example.com>")
            .subject("Hello")
            .body("Hello World!");

        mailer.deliver("relay", &message, date()).unwrap();

        let frames = relay.frames();
        assert_eq!(frames[0], "MAIL From:<postgres>\r\n");
        assert_eq!(frames[1], "RCPT To:<root>\r\n");
        assert!(frames[3].contains("\r\nReply-To: Support <support@example.com>\r\n"));
    }

    #[test]
    fn strict_addresses_reject_local_users() {
        let relay = MockRelay::accepting();
        let resolver = MockResolver::new(([127, 0, 0, 1], 0).into());
        let mailer = Mailer::new(Config::default().strict_addresses(true))
            .resolver(&resolver)
            .connector(&relay)
            .notifier(NoopNotifier);
        let message = Message::builder()
            .from("postgres")
            .to("root@localhost")
            .reply_to("Support <support@example.com>")
            .subject("Hello")
            .body("Hello World!");

        let err = mailer.send("relay", &message).unwrap_err();
        assert!(err.is_address());
        assert_eq!(relay.connects(), 0);
    }

    #[test]
    fn line_break_in_subject_is_rejected() {
        let relay = MockRelay::accepting();
        let resolver = MockResolver::new(([127, 0, 0, 1], 0).into());
        let notices = Notices::new();
        let mailer = Mailer::default()
            .resolver(&resolver)
            .connector(&relay)
            .notifier(&notices);
        let message = Message::builder()
            .from("user@localhost")
            .to("root@localhost")
            .reply_to("user@localhost")
            .subject("Hi\r\n.\r\nRSET")
            .body("Hello World!");

        let err = mailer.send("relay", &message).unwrap_err();
        assert!(err.is_header());
        assert_eq!(resolver.lookups(), 0);
        assert_eq!(relay.connects(), 0);
        assert!(relay.written().is_empty());
        assert_eq!(notices.entries()[0].0, Severity::Error);
    }

    #[test]
    fn line_break_in_reply_to_is_rejected() {
        let relay = MockRelay::accepting();
        let resolver = MockResolver::new(([127, 0, 0, 1], 0).into());
        let mailer = Mailer::default()
            .resolver(&resolver)
            .connector(&relay)
            .notifier(NoopNotifier);
        let message = Message::builder()
            .from("user@localhost")
            .to("root@localhost")
            .reply_to("user@localhost\r\nBcc: victim@example.com")
            .subject("Hello")
            .body("Hello World!");

        assert!(mailer.send("relay", &message).unwrap_err().is_address());
        assert_eq!(relay.connects(), 0);
    }
}
