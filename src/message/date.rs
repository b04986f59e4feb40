use std::{
    fmt::{self, Display, Formatter},
    time::SystemTime,
};

use httpdate::HttpDate;

/// Message `Date` header value
///
/// Defined in [RFC2822](https://tools.ietf.org/html/rfc2822#section-3.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date(HttpDate);

impl Date {
    /// Build a `Date` from [`SystemTime`]
    pub fn new(st: SystemTime) -> Self {
        Self(st.into())
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = self.0.to_string();
        // httpdate always ends with ` GMT`, messages carry a numeric zone
        match s.strip_suffix(" GMT") {
            Some(stamp) => write!(f, "{stamp} +0000"),
            None => f.write_str(&s),
        }
    }
}

impl From<SystemTime> for Date {
    fn from(st: SystemTime) -> Self {
        Self::new(st)
    }
}
