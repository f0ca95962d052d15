use std::str::FromStr;

use digest::DynDigest;
use md5::Md5;
use num_enum::{FromPrimitive, IntoPrimitive};
use ripemd::Ripemd160;
use sha1_checked::Sha1;

use crate::errors::{unsupported_err, Error, Result};

/// Available hash algorithms.
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-hash-algorithms>
#[derive(
    Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive, Hash, derive_more::Display,
)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
#[repr(u8)]
pub enum HashAlgorithm {
    #[cfg_attr(test, proptest(skip))]
    #[display("NONE")]
    None = 0,
    #[display("MD5")]
    Md5 = 1,
    #[display("SHA1")]
    Sha1 = 2,
    #[display("RIPEMD160")]
    Ripemd160 = 3,

    #[display("SHA256")]
    Sha256 = 8,
    #[display("SHA384")]
    Sha384 = 9,
    #[display("SHA512")]
    Sha512 = 10,
    #[display("SHA224")]
    Sha224 = 11,
    #[display("SHA3-256")]
    Sha3_256 = 12,
    #[display("SHA3-512")]
    Sha3_512 = 14,

    #[num_enum(catch_all)]
    #[display("Other({_0})")]
    Other(#[cfg_attr(test, proptest(strategy = "111u8.."))] u8),
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

impl zeroize::DefaultIsZeroes for HashAlgorithm {}

impl FromStr for HashAlgorithm {
    type Err = Error;

    /// Parses the names used by GnuPG and in [`Display`](std::fmt::Display).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "ripemd160" | "rmd160" => Ok(Self::Ripemd160),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            "sha224" => Ok(Self::Sha224),
            "sha3-256" => Ok(Self::Sha3_256),
            "sha3-512" => Ok(Self::Sha3_512),
            _ => unsupported_err!("unknown hash {:?}", s),
        }
    }
}

impl HashAlgorithm {
    /// Create a new hasher.
    pub fn new_hasher(self) -> Result<Box<dyn DynDigest>> {
        match self {
            HashAlgorithm::Md5 => Ok(Box::<Md5>::default()),
            HashAlgorithm::Sha1 => Ok(Box::<Sha1>::default()),
            HashAlgorithm::Ripemd160 => Ok(Box::<Ripemd160>::default()),
            HashAlgorithm::Sha256 => Ok(Box::<sha2::Sha256>::default()),
            HashAlgorithm::Sha384 => Ok(Box::<sha2::Sha384>::default()),
            HashAlgorithm::Sha512 => Ok(Box::<sha2::Sha512>::default()),
            HashAlgorithm::Sha224 => Ok(Box::<sha2::Sha224>::default()),
            HashAlgorithm::Sha3_256 => Ok(Box::<sha3::Sha3_256>::default()),
            HashAlgorithm::Sha3_512 => Ok(Box::<sha3::Sha3_512>::default()),
            _ => unsupported_err!("hasher {:?}", self),
        }
    }

    /// Returns the expected digest size for the given algorithm.
    pub fn digest_size(self) -> Option<usize> {
        use digest::Digest;

        let size = match self {
            HashAlgorithm::Md5 => <Md5 as Digest>::output_size(),
            HashAlgorithm::Sha1 => <Sha1 as Digest>::output_size(),
            HashAlgorithm::Ripemd160 => <Ripemd160 as Digest>::output_size(),
            HashAlgorithm::Sha256 => <sha2::Sha256 as Digest>::output_size(),
            HashAlgorithm::Sha384 => <sha2::Sha384 as Digest>::output_size(),
            HashAlgorithm::Sha512 => <sha2::Sha512 as Digest>::output_size(),
            HashAlgorithm::Sha224 => <sha2::Sha224 as Digest>::output_size(),
            HashAlgorithm::Sha3_256 => <sha3::Sha3_256 as Digest>::output_size(),
            HashAlgorithm::Sha3_512 => <sha3::Sha3_512 as Digest>::output_size(),
            _ => return None,
        };
        Some(size)
    }

    /// MD5, SHA-1 and RIPEMD-160 must not be used for new S2K specifiers.
    pub fn is_weak(self) -> bool {
        matches!(
            self,
            HashAlgorithm::Md5 | HashAlgorithm::Sha1 | HashAlgorithm::Ripemd160
        )
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn test_display_parse_hash() {
        assert_eq!(HashAlgorithm::None.to_string(), "NONE".to_string());
        assert_eq!(HashAlgorithm::Sha256.to_string(), "SHA256".to_string());
        assert_eq!(HashAlgorithm::Sha3_512, "SHA3-512".parse().unwrap());
        assert_eq!(HashAlgorithm::Sha1, "sha1".parse().unwrap());
        assert!("whirlpool".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_digest() {
        let mut hasher = HashAlgorithm::Md5.new_hasher().unwrap();
        hasher.update(b"hello");
        assert_eq!(
            &hasher.finalize()[..],
            hex!("5d41402abc4b2a76b9719d911017c592")
        );
        assert_eq!(HashAlgorithm::Sha1.digest_size(), Some(20));
        assert_eq!(HashAlgorithm::Other(99).digest_size(), None);
        assert!(HashAlgorithm::Other(99).new_hasher().is_err());
    }

    #[test]
    fn test_hasher_streams() {
        for alg in [
            HashAlgorithm::Md5,
            HashAlgorithm::Sha1,
            HashAlgorithm::Ripemd160,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha3_512,
        ] {
            let mut split = alg.new_hasher().unwrap();
            split.update(b"hel");
            split.update(b"lo");
            let mut whole = alg.new_hasher().unwrap();
            whole.update(b"hello");

            let split = split.finalize();
            assert_eq!(Some(split.len()), alg.digest_size());
            assert_eq!(split, whole.finalize());
        }
    }
}
