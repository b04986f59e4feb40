//! Diagnostic notices
//!
//! A send returns a single success or failure. Which phase failed, and why, is
//! reported on the side as notices: a severity and a human readable message handed
//! to a [`Notifier`].

use std::{
    fmt::{self, Display, Formatter},
    sync::{Mutex, PoisonError},
};

/// Importance of a notice
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Debug)]
pub enum Severity {
    /// Informational, e.g. the message was accepted
    Notice,
    /// The call failed, see the preceding error notices
    Warning,
    /// A phase of the session failed
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

/// Receives the notices emitted during a send
pub trait Notifier {
    /// Handle a single notice
    fn notice(&self, severity: Severity, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notice(&self, severity: Severity, message: &str) {
        (**self).notice(severity, message)
    }
}

/// Drops every notice
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notice(&self, _severity: Severity, _message: &str) {}
}

/// Forwards notices to `tracing` events
#[cfg(feature = "tracing")]
#[cfg_attr(docsrs, doc(cfg(feature = "tracing")))]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[cfg(feature = "tracing")]
impl Notifier for TracingNotifier {
    fn notice(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Notice => tracing::info!("{}", message),
            Severity::Warning => tracing::warn!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }
    }
}

/// Keeps notices in memory, in emission order
#[derive(Debug, Default)]
pub struct Notices {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl Notices {
    /// Creates an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the recorded notices
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns the recorded notices
    pub fn take(&self) -> Vec<(Severity, String)> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for Notices {
    fn notice(&self, severity: Severity, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, message.to_owned()));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn notices_are_recorded_in_order() {
        let notices = Notices::new();
        let notifier: &dyn Notifier = &notices;
        notifier.notice(Severity::Error, "could not resolve relay host");
        (&notices).notice(Severity::Warning, "message not sent");

        assert_eq!(
            notices.take(),
            vec![
                (Severity::Error, "could not resolve relay host".to_owned()),
                (Severity::Warning, "message not sent".to_owned()),
            ]
        );
        assert!(notices.entries().is_empty());
    }

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Notice.to_string(), "NOTICE");
        assert_eq!(Severity::Error.to_string(), "ERROR");
    }
}
