//! Keys assembled from the lower level pieces.
//!
//! [`SecretKey`] is the entry point: it protects secret material under a
//! passphrase, extracts it again, changes the passphrase and imports GnuPG
//! exports.

mod secret_key;

pub use self::secret_key::{SecretKey, SecretKeyConfig};
