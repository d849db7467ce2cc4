//! Error type returned by the filesystem engine.
//!
//! `spec.md` §7 defines the source's contract as a signed return code:
//! positive for success, `0` for a declined-by-invariant operation, and a
//! small set of negative codes otherwise. [`TfsError::code`] reproduces that
//! numbering for any caller (the shell, eventually) that still wants it.

use std::fmt;

/// An error produced by a TupoFS operation.
#[derive(Debug, thiserror::Error)]
pub enum TfsError {
    /// A path component is missing, names something of the wrong kind (a
    /// file where a directory was expected), or a path string failed to
    /// parse. Also used for a full parent directory and for cross-directory
    /// rename, which the source never implemented.
    #[error("does not exist")]
    NotFound,
    /// No free inode or no free data block was available.
    #[error("no space left")]
    OutOfSpace,
    /// Reserved for creating at an empty path (the root). See `create`'s
    /// doc comment for why a name collision inside a directory is *not*
    /// reported this way.
    #[error("already exists")]
    AlreadyExists,
    /// A bitmap or path index was out of the addressable range.
    #[error("index out of range")]
    OutOfRange,
    /// The operation was declined by an invariant, e.g. deleting a
    /// non-empty directory. Corresponds to the source's `0` return.
    #[error("busy")]
    Busy,
    /// The backing store I/O failed outright.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TfsError {
    /// Maps this error back onto `spec.md` §7's signed integer contract.
    pub fn code(&self) -> i32 {
        match self {
            TfsError::NotFound => -2,
            TfsError::OutOfSpace => -3,
            TfsError::AlreadyExists => -4,
            TfsError::OutOfRange => -3,
            TfsError::Busy => 0,
            TfsError::Io(_) => -1,
        }
    }
}

/// A human-readable rendering of a legacy numeric return code, matching
/// `TFS_GetError` from the source.
pub struct LegacyCode(pub i32);

impl fmt::Display for LegacyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            return write!(f, "success");
        }
        match self.0 {
            -2 => write!(f, "does not exist"),
            -3 => write!(f, "no space left"),
            -4 => write!(f, "already exists"),
            other => write!(f, "unknown error code {other}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, TfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_matches_legacy_contract() {
        assert_eq!(TfsError::NotFound.code(), -2);
        assert_eq!(TfsError::OutOfSpace.code(), -3);
        assert_eq!(TfsError::AlreadyExists.code(), -4);
        assert_eq!(TfsError::OutOfRange.code(), -3);
        assert_eq!(TfsError::Busy.code(), 0);
        let io_err = TfsError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(io_err.code(), -1);
    }

    #[test]
    fn legacy_code_display_matches_tfs_get_error() {
        assert_eq!(LegacyCode(4).to_string(), "success");
        assert_eq!(LegacyCode(-2).to_string(), "does not exist");
        assert_eq!(LegacyCode(-3).to_string(), "no space left");
        assert_eq!(LegacyCode(-4).to_string(), "already exists");
        assert_eq!(LegacyCode(-1).to_string(), "unknown error code -1");
    }
}
