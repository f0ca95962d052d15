use snafu::{Backtrace, Snafu};

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

pub use crate::parsing::{Error as ParsingError, RemainingError};

/// Broad classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed packet, S2K specifier or S-expression.
    Format,
    /// Unknown or unsupported public key, symmetric, hash or S2K algorithm.
    UnsupportedAlgorithm,
    /// Checksum or hash mismatch after decryption, usually a wrong passphrase.
    Integrity,
    /// Failure reported by one of the underlying crypto crates.
    Crypto,
    /// Failure reading from or writing to a stream.
    Io,
}

/// Error types
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid format: {message}"))]
    InvalidFormat { message: String },
    #[snafu(display("unsupported algorithm: {message}"))]
    UnsupportedAlgorithm { message: String },
    #[snafu(display("unsupported string to key type: {typ}"))]
    UnsupportedS2kType { typ: u8 },
    #[snafu(display("unsupported key version: {version}"))]
    UnsupportedVersion { version: u8 },
    #[snafu(display("integrity check failed: {message}"))]
    Integrity { message: String },
    #[snafu(transparent)]
    PacketParsing { source: ParsingError },
    #[snafu(transparent)]
    Rsa { source: rsa::errors::Error },
    #[snafu(transparent)]
    Dsa { source: signature::Error },
    #[snafu(transparent)]
    EllipticCurve { source: elliptic_curve::Error },
    #[snafu(transparent)]
    Argon2 { source: argon2::Error },
    #[snafu(display("cfb: invalid key iv length"))]
    CfbInvalidKeyIvLength,
    #[snafu(display("unpadding failed"))]
    Unpad,
    #[snafu(display("SHA1 hash collision detected"))]
    Sha1HashCollision,
    #[snafu(transparent)]
    IO {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

impl Error {
    /// Returns the family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidFormat { .. } | Error::PacketParsing { .. } | Error::Unpad => {
                ErrorKind::Format
            }
            Error::UnsupportedAlgorithm { .. }
            | Error::UnsupportedS2kType { .. }
            | Error::UnsupportedVersion { .. } => ErrorKind::UnsupportedAlgorithm,
            Error::Integrity { .. } => ErrorKind::Integrity,
            Error::Rsa { .. }
            | Error::Dsa { .. }
            | Error::EllipticCurve { .. }
            | Error::Argon2 { .. }
            | Error::CfbInvalidKeyIvLength
            | Error::Sha1HashCollision => ErrorKind::Crypto,
            Error::IO { .. } => ErrorKind::Io,
        }
    }

    /// Shorthand for `kind() == ErrorKind::Integrity`.
    pub fn is_integrity(&self) -> bool {
        self.kind() == ErrorKind::Integrity
    }
}

impl From<cipher::InvalidLength> for Error {
    fn from(_: cipher::InvalidLength) -> Error {
        Error::CfbInvalidKeyIvLength
    }
}

impl From<block_padding::UnpadError> for Error {
    fn from(_: block_padding::UnpadError) -> Error {
        Error::Unpad
    }
}

macro_rules! unsupported_err {
    ($e:expr) => {
        return Err($crate::errors::Error::UnsupportedAlgorithm { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::UnsupportedAlgorithm { message: format!($fmt, $($arg)+) })
    };
}

macro_rules! integrity_err {
    ($e:expr) => {
        $crate::errors::Error::Integrity { message: $e.to_string() }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::Integrity { message: format!($fmt, $($arg)+) }
    };
}

macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::Error::InvalidFormat { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::InvalidFormat { message: format!($fmt, $($arg)+) })
    };
}

macro_rules! format_err {
    ($e:expr) => {
        $crate::errors::Error::InvalidFormat { message: $e.to_string() }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::InvalidFormat { message: format!($fmt, $($arg)+) }
    };
}

macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            $crate::errors::bail!($e);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)+) => {
        if !($cond) {
            $crate::errors::bail!($fmt, $($arg)+);
        }
    };
}

macro_rules! ensure_eq {
    ($left:expr, $right:expr) => ({
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    $crate::errors::bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`"#, left_val, right_val)
                }
            }
        }
    });
    ($left:expr, $right:expr, $($arg:tt)+) => ({
        match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    $crate::errors::bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`: {}"#, left_val, right_val,
                           format_args!($($arg)+))
                }
            }
        }
    });
}

pub(crate) use {bail, ensure, ensure_eq, format_err, integrity_err, unsupported_err};

#[cfg(test)]
mod tests {
    use super::*;

    fn fails_format() -> Result<()> {
        ensure!(1 + 1 == 3, "math is broken: {}", 2);
        Ok(())
    }

    fn fails_eq() -> Result<()> {
        ensure_eq!(1u8, 2u8, "mismatch");
        Ok(())
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(fails_format().unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(fails_eq().unwrap_err().kind(), ErrorKind::Format);
        assert!(integrity_err!("bad checksum").is_integrity());
        assert_eq!(
            Error::UnsupportedS2kType { typ: 42 }.kind(),
            ErrorKind::UnsupportedAlgorithm
        );
        assert_eq!(
            Error::from(cipher::InvalidLength).kind(),
            ErrorKind::Crypto
        );
    }

    #[test]
    fn test_error_display() {
        let err = fails_format().unwrap_err();
        assert_eq!(err.to_string(), "invalid format: math is broken: 2");
    }
}
