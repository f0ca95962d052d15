use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use chrono::{DateTime, TimeZone, Utc};
use log::warn;

use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{bail, ensure, format_err, unsupported_err, Error, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{ensure_supported, KeyVersion, PublicParams};

/// The public fields that open every key packet.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-public-key-packet-formats>
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PublicKey {
    version: KeyVersion,
    algorithm: PublicKeyAlgorithm,
    created_at: DateTime<Utc>,
    expiration: Option<u16>,
    public_params: PublicParams,
}

impl PublicKey {
    /// Creates the public key fields, checking that they fit together.
    ///
    /// Version 2 and 3 keys must be RSA and carry an expiration in days,
    /// version 4 keys must not.
    pub fn new(
        version: KeyVersion,
        algorithm: PublicKeyAlgorithm,
        created_at: DateTime<Utc>,
        expiration: Option<u16>,
        public_params: PublicParams,
    ) -> Result<Self> {
        match version {
            KeyVersion::V2 | KeyVersion::V3 => {
                if !algorithm.is_rsa() {
                    unsupported_err!(
                        "invalid algorithm {:?} for key version {:?}",
                        algorithm,
                        version
                    );
                }
                ensure!(
                    expiration.is_some(),
                    "version {:?} keys carry an expiration",
                    version
                );
                warn!("creating a legacy version {:?} key", version);
            }
            KeyVersion::V4 => {
                ensure!(
                    expiration.is_none(),
                    "version 4 keys carry no expiration field"
                );
            }
            KeyVersion::V5 | KeyVersion::V6 | KeyVersion::Other(_) => {
                return Err(Error::UnsupportedVersion {
                    version: version.into(),
                });
            }
        }

        ensure_supported(algorithm)?;
        ensure!(
            public_params.matches_algorithm(algorithm),
            "public parameters do not match algorithm {:?}",
            algorithm
        );

        // only whole seconds are stored
        let created_at = u32::try_from(created_at.timestamp())
            .ok()
            .and_then(|secs| Utc.timestamp_opt(i64::from(secs), 0).single())
            .ok_or_else(|| format_err!("creation time {} does not fit a key packet", created_at))?;

        Ok(PublicKey {
            version,
            algorithm,
            created_at,
            expiration,
            public_params,
        })
    }

    /// Parses the public fields of a key packet, leaving the rest of `i` untouched.
    pub fn try_from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let version = KeyVersion::from(i.read_u8("key version")?);
        if !matches!(version, KeyVersion::V2 | KeyVersion::V3 | KeyVersion::V4) {
            return Err(Error::UnsupportedVersion {
                version: version.into(),
            });
        }

        let created_at = i.read_be_u32("key creation time")?;
        let Some(created_at) = Utc.timestamp_opt(i64::from(created_at), 0).single() else {
            bail!("invalid created at timestamp");
        };
        let expiration = if version.is_legacy() {
            Some(i.read_be_u16("key expiration")?)
        } else {
            None
        };
        let algorithm = PublicKeyAlgorithm::from(i.read_u8("public key algorithm")?);
        let public_params = PublicParams::try_from_buf(algorithm, &mut i)?;

        Self::new(version, algorithm, created_at, expiration, public_params)
    }

    pub fn version(&self) -> KeyVersion {
        self.version
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    /// Validity in days, only present on version 2 and 3 keys.
    pub fn expiration(&self) -> Option<u16> {
        self.expiration
    }

    pub fn public_params(&self) -> &PublicParams {
        &self.public_params
    }
}

impl Serialize for PublicKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.version.into())?;
        // range checked in `new`
        writer.write_u32::<BigEndian>(self.created_at.timestamp() as u32)?;
        if let Some(expiration) = self.expiration {
            writer.write_u16::<BigEndian>(expiration)?;
        }
        writer.write_u8(self.algorithm.into())?;
        self.public_params.to_writer(writer)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        let mut sum = 1 + 4 + 1;
        if self.expiration.is_some() {
            sum += 2;
        }
        sum + self.public_params.write_len()
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::errors::ErrorKind;
    use crate::types::MpiBytes;

    fn rsa_params() -> PublicParams {
        PublicParams::Rsa {
            n: MpiBytes::from_slice(&hex!("c35b")),
            e: MpiBytes::from_slice(&hex!("010001")),
        }
    }

    #[test]
    fn test_v4_roundtrip() {
        let created = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let key = PublicKey::new(
            KeyVersion::V4,
            PublicKeyAlgorithm::RSA,
            created,
            None,
            rsa_params(),
        )
        .unwrap();

        let raw = key.to_bytes().unwrap();
        assert_eq!(raw, hex!("04 6553f100 01 0010c35b 0011010001"));
        assert_eq!(key.write_len(), raw.len());
        assert_eq!(PublicKey::try_from_buf(&raw[..]).unwrap(), key);
    }

    #[test]
    fn test_v3_expiration() {
        let raw = hex!("03 6553f100 016d 01 0010c35b 0011010001");
        let key = PublicKey::try_from_buf(&raw[..]).unwrap();
        assert_eq!(key.version(), KeyVersion::V3);
        assert_eq!(key.expiration(), Some(365));
        assert_eq!(key.to_bytes().unwrap(), raw);
    }

    #[test]
    fn test_rejects_invalid_combinations() {
        let created = Utc.timestamp_opt(0, 0).unwrap();
        let err = PublicKey::new(
            KeyVersion::V3,
            PublicKeyAlgorithm::DSA,
            created,
            Some(0),
            PublicParams::Dsa {
                p: MpiBytes::from_slice(&[23]),
                q: MpiBytes::from_slice(&[11]),
                g: MpiBytes::from_slice(&[4]),
                y: MpiBytes::from_slice(&[2]),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedAlgorithm);

        assert!(PublicKey::new(
            KeyVersion::V4,
            PublicKeyAlgorithm::DSA,
            created,
            None,
            rsa_params()
        )
        .is_err());

        let err = PublicKey::try_from_buf(&hex!("05 00000000 01")[..]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { version: 5 }));
    }
}
