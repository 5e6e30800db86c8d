//! Logical timestamps identifying operations and items.
//!
//! A [`Timestamp`] is a `(site, counter)` pair. Each site owns a counter that
//! only ever grows, so a timestamp uniquely identifies one operation in the
//! whole system. Timestamps are totally ordered by counter first and site id
//! second, which gives every replica the same tie-break for concurrent work.
//!
//! # Example
//!
//! ```
//! use crdt_array::Timestamp;
//!
//! let a = Timestamp::new("s1", 1);
//! let b = Timestamp::new("s2", 1);
//! let c = Timestamp::new("s1", 2);
//!
//! assert!(a < b); // same counter, site id breaks the tie
//! assert!(b < c); // counter takes precedence
//! assert_eq!(a.to_string(), "s1:1");
//! assert_eq!("s1:1".parse::<Timestamp>().unwrap(), a);
//! ```

use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

/// Identifier of an [`Item`](crate::Item).
///
/// An item's id is derived from the timestamp of the insert that created it
/// and renders as `"<site>:<counter>"`.
pub type ItemId = Timestamp;

/// An immutable `(site, counter)` pair. The counter is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TimestampRepr"))]
pub struct Timestamp {
    #[cfg_attr(feature = "serde", serde(rename = "siteId"))]
    site: String,
    counter: u64,
}

impl Timestamp {
    /// Create a timestamp.
    ///
    /// # Panics
    ///
    /// Panics if `counter` is zero.
    pub fn new(site: impl Into<String>, counter: u64) -> Self {
        assert!(counter >= 1, "timestamp counter must be at least 1");
        Self {
            site: site.into(),
            counter,
        }
    }

    /// Create a timestamp, returning `None` if `counter` is zero.
    pub fn try_new(site: impl Into<String>, counter: u64) -> Option<Self> {
        (counter >= 1).then(|| Self {
            site: site.into(),
            counter,
        })
    }

    /// The site that originated this timestamp.
    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }

    /// The per-site counter value.
    #[must_use]
    pub fn counter(&self) -> u64 {
        self.counter
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.counter
            .cmp(&other.counter)
            .then_with(|| self.site.cmp(&other.site))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.site, self.counter)
    }
}

/// Error returned when parsing an [`ItemId`] from its string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    /// The input has no `:` separating site and counter.
    MissingSeparator,
    /// The site part is empty.
    EmptySite,
    /// The counter part is not a positive integer.
    InvalidCounter(String),
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator => write!(f, "item id is missing the ':' separator"),
            Self::EmptySite => write!(f, "item id has an empty site"),
            Self::InvalidCounter(raw) => write!(f, "invalid item counter: {raw:?}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseIdError {}

impl FromStr for Timestamp {
    type Err = ParseIdError;

    /// Parse `"<site>:<counter>"`. The split happens at the last `:` because
    /// derived site ids (such as forks) may contain the separator themselves.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (site, counter) = s.rsplit_once(':').ok_or(ParseIdError::MissingSeparator)?;
        if site.is_empty() {
            return Err(ParseIdError::EmptySite);
        }
        let counter = counter
            .parse::<u64>()
            .ok()
            .filter(|c| *c >= 1)
            .ok_or_else(|| ParseIdError::InvalidCounter(counter.into()))?;
        Ok(Self {
            site: site.into(),
            counter,
        })
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct TimestampRepr {
    #[serde(rename = "siteId")]
    site: String,
    counter: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<TimestampRepr> for Timestamp {
    type Error = &'static str;

    fn try_from(repr: TimestampRepr) -> Result<Self, Self::Error> {
        Timestamp::try_new(repr.site, repr.counter).ok_or("timestamp counter must be at least 1")
    }
}
