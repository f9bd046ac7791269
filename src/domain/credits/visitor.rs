//! Visitor usage counter, carried in a client cookie.
//!
//! The counter is advisory only: it is client-controlled and trivially
//! resettable, so it acts as a soft throttle for anonymous traffic, never as
//! a security boundary. Anything unparseable is treated as zero.

use std::fmt;

/// Name of the cookie carrying the anonymous usage counter.
pub const VISITOR_COOKIE_NAME: &str = "visitor_usage";

/// Cookie lifetime: 30 days.
pub const VISITOR_COOKIE_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// Number of anonymous analyses recorded in the visitor's cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitorUsage(u32);

impl VisitorUsage {
    /// Creates a counter at the given value.
    pub fn new(count: u32) -> Self {
        Self(count)
    }

    /// Parses the counter from a raw `Cookie` request header value.
    ///
    /// Missing cookie, garbage, or negative values all resolve to zero - a
    /// tampered cookie just resets the soft throttle, which is acceptable.
    pub fn from_cookie_header(header: Option<&str>) -> Self {
        let Some(header) = header else {
            return Self(0);
        };
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if name.trim() == VISITOR_COOKIE_NAME {
                let count = value.trim().parse::<i64>().unwrap_or(0).max(0);
                return Self(count.min(i64::from(u32::MAX)) as u32);
            }
        }
        Self(0)
    }

    /// Current counter value.
    pub fn count(&self) -> u32 {
        self.0
    }

    /// Counter after recording one more successful analysis.
    pub fn incremented(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// `Set-Cookie` header value persisting this counter for 30 days.
    pub fn set_cookie_value(&self) -> String {
        format!(
            "{}={}; Max-Age={}; Path=/; SameSite=Lax",
            VISITOR_COOKIE_NAME, self.0, VISITOR_COOKIE_MAX_AGE_SECS
        )
    }
}

impl fmt::Display for VisitorUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
