use alloc::string::String;
use core::fmt;

/// Error raised when external input cannot become document state.
///
/// A failed decode never touches the target document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The input is not a well-formed snapshot or update.
    Malformed(String),
    /// A version vector entry is unusable.
    InvalidVersion {
        /// The offending site id.
        site: String,
        /// Its counter.
        counter: u64,
    },
    /// An update record is missing the item data its kind requires.
    InvalidItem(String),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "invalid state: {msg}"),
            Self::InvalidVersion { site, counter } => {
                write!(f, "invalid state: bad version entry {site:?} = {counter}")
            }
            Self::InvalidItem(msg) => write!(f, "invalid item: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StateError {}
