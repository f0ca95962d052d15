//! # pgp-secret
//!
//! Protection of OpenPGP secret keys: turning private key material into the
//! passphrase protected body of a secret key packet and back.
//!
//! - [`types::StringToKey`] derives symmetric keys from passphrases
//!   (simple, salted, iterated and salted, Argon2).
//! - [`types::SecretMaterial`] encodes the private values of RSA, DSA,
//!   Elgamal, ECDSA, ECDH and legacy EdDSA keys.
//! - [`types::params::cipher`] encrypts the material, including the per
//!   field IV chaining of version 3 keys.
//! - [`composed::SecretKey`] ties these together and also imports the
//!   `protected-private-key` S-expressions of GnuPG.
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use pgp_secret::composed::{SecretKey, SecretKeyConfig};
//! use pgp_secret::types::{EddsaSecretKey, Passphrase, PrivateKey};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(0);
//! let signing_key = ed25519_dalek::SigningKey::from_bytes(&[7u8; 32]);
//! let key = PrivateKey::EdDsa(EddsaSecretKey::Ed25519(signing_key));
//!
//! let secret = SecretKey::from_private_key(
//!     &mut rng,
//!     &key,
//!     Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
//!     &SecretKeyConfig::default(),
//!     &Passphrase::utf8("correct horse"),
//!     true,
//! )
//! .unwrap();
//!
//! assert!(secret.extract_private_key_utf8("correct horse").unwrap().is_some());
//! assert!(secret.extract_private_key_utf8("wrong").unwrap_err().is_integrity());
//! ```

#![forbid(unsafe_code)]

pub mod composed;
pub mod crypto;
pub mod errors;
pub mod gnupg;
pub mod packet;
pub mod parsing;
pub mod ser;
pub mod types;

pub use self::composed::{SecretKey, SecretKeyConfig};
pub use self::errors::{Error, ErrorKind, Result};
pub use self::ser::Serialize;
pub use self::types::{Passphrase, PrivateKey, SecretMaterial, StringToKey};
