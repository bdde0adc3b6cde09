//! Engine-level error type.

use storage::FlashError;

/// Superset of the flash adapter's two medium errors (§7), adding the
/// internal-corruption/fatal cases that only the engine can detect:
/// an unexpected header value or an impossible page census (`Corrupt`),
/// a pack whose migrated working set does not fit on a fresh page
/// (`Full`), and a key outside the valid range (`InvalidKey`).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The flash adapter reported an error or timeout.
    Flash(FlashError),
    /// A page header held a value other than ERASED, ACTIVE or COPY, or
    /// the page census did not match any recognized boot state.
    Corrupt,
    /// A pack could not fit the migrated working set on a fresh page.
    Full,
    /// `key` was `EMPTY_KEY` or greater than `MAX_KEY`.
    InvalidKey,
}

impl From<FlashError> for Error {
    fn from(e: FlashError) -> Self {
        Error::Flash(e)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Flash(e) => write!(f, "flash error: {}", e),
            Error::Corrupt => write!(f, "page directory is in an impossible state"),
            Error::Full => write!(f, "working set does not fit on a freshly erased page"),
            Error::InvalidKey => write!(f, "key is reserved or out of range"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
