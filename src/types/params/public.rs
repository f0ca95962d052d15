use std::io;

use byteorder::WriteBytesExt;
use bytes::Buf;

use crate::crypto::ecc_curve::ECCCurve;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{bail, ensure_eq, format_err, unsupported_err, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::MpiBytes;

/// Public parameters of the algorithms whose secret material can be protected.
///
/// Points and integers are kept in their wire form, the curve arithmetic
/// happens in [`crate::types::PrivateKey`] when a key is reconstructed.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum PublicParams {
    Rsa {
        n: MpiBytes,
        e: MpiBytes,
    },
    Dsa {
        p: MpiBytes,
        q: MpiBytes,
        g: MpiBytes,
        y: MpiBytes,
    },
    Elgamal {
        p: MpiBytes,
        g: MpiBytes,
        y: MpiBytes,
    },
    Ecdsa {
        curve: ECCCurve,
        p: MpiBytes,
    },
    Ecdh {
        curve: ECCCurve,
        p: MpiBytes,
        hash: HashAlgorithm,
        alg_sym: SymmetricKeyAlgorithm,
    },
    EdDsaLegacy {
        curve: ECCCurve,
        q: MpiBytes,
    },
}

impl PublicParams {
    /// Parses the public parameters of a key with the given algorithm.
    pub fn try_from_buf<B: Buf>(typ: PublicKeyAlgorithm, mut i: B) -> Result<Self> {
        match typ {
            PublicKeyAlgorithm::RSA
            | PublicKeyAlgorithm::RSAEncrypt
            | PublicKeyAlgorithm::RSASign => {
                let n = MpiBytes::from_buf(&mut i)?;
                let e = MpiBytes::from_buf(&mut i)?;
                Ok(PublicParams::Rsa { n, e })
            }
            PublicKeyAlgorithm::DSA => {
                let p = MpiBytes::from_buf(&mut i)?;
                let q = MpiBytes::from_buf(&mut i)?;
                let g = MpiBytes::from_buf(&mut i)?;
                let y = MpiBytes::from_buf(&mut i)?;
                Ok(PublicParams::Dsa { p, q, g, y })
            }
            PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalEncrypt => {
                let p = MpiBytes::from_buf(&mut i)?;
                let g = MpiBytes::from_buf(&mut i)?;
                let y = MpiBytes::from_buf(&mut i)?;
                Ok(PublicParams::Elgamal { p, g, y })
            }
            PublicKeyAlgorithm::ECDSA => {
                let curve = read_curve(&mut i)?;
                let p = MpiBytes::from_buf(&mut i)?;
                Ok(PublicParams::Ecdsa { curve, p })
            }
            PublicKeyAlgorithm::ECDH => {
                let curve = read_curve(&mut i)?;
                let p = MpiBytes::from_buf(&mut i)?;

                // KDF parameters
                let len = i.read_u8("kdf length")?;
                ensure_eq!(len, 3, "invalid kdf parameter length");
                let reserved = i.read_u8("kdf reserved")?;
                ensure_eq!(reserved, 1, "invalid kdf parameter version");
                let hash = i.read_u8("kdf hash")?.into();
                let alg_sym = i.read_u8("kdf sym")?.into();

                Ok(PublicParams::Ecdh {
                    curve,
                    p,
                    hash,
                    alg_sym,
                })
            }
            PublicKeyAlgorithm::EdDSALegacy => {
                let curve = read_curve(&mut i)?;
                let q = MpiBytes::from_buf(&mut i)?;
                Ok(PublicParams::EdDsaLegacy { curve, q })
            }
            _ => unsupported_err!("public key algorithm {:?}", typ),
        }
    }

    /// Does `alg` describe keys with these parameters?
    pub fn matches_algorithm(&self, alg: PublicKeyAlgorithm) -> bool {
        match self {
            PublicParams::Rsa { .. } => alg.is_rsa(),
            PublicParams::Dsa { .. } => alg == PublicKeyAlgorithm::DSA,
            PublicParams::Elgamal { .. } => alg.is_elgamal(),
            PublicParams::Ecdsa { .. } => alg == PublicKeyAlgorithm::ECDSA,
            PublicParams::Ecdh { .. } => alg == PublicKeyAlgorithm::ECDH,
            PublicParams::EdDsaLegacy { .. } => alg == PublicKeyAlgorithm::EdDSALegacy,
        }
    }

    pub fn curve(&self) -> Option<&ECCCurve> {
        match self {
            PublicParams::Ecdsa { curve, .. }
            | PublicParams::Ecdh { curve, .. }
            | PublicParams::EdDsaLegacy { curve, .. } => Some(curve),
            _ => None,
        }
    }
}

/// Reads a length prefixed curve OID.
fn read_curve<B: Buf>(i: &mut B) -> Result<ECCCurve> {
    let len = i.read_u8("curve oid length")?;
    if len == 0 || len == 0xFF {
        bail!("invalid curve oid length {}", len);
    }
    let oid = i.read_take(usize::from(len), "curve oid")?;

    ECCCurve::from_oid(&oid).ok_or_else(|| format_err!("invalid curve oid {}", hex::encode(&oid)))
}

fn write_curve<W: io::Write>(curve: &ECCCurve, writer: &mut W) -> Result<()> {
    let oid = curve.oid();
    let oid = oid.as_bytes();
    writer.write_u8(oid.len() as u8)?;
    writer.write_all(oid)?;
    Ok(())
}

impl Serialize for PublicParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            PublicParams::Rsa { n, e } => {
                n.to_writer(writer)?;
                e.to_writer(writer)?;
            }
            PublicParams::Dsa { p, q, g, y } => {
                p.to_writer(writer)?;
                q.to_writer(writer)?;
                g.to_writer(writer)?;
                y.to_writer(writer)?;
            }
            PublicParams::Elgamal { p, g, y } => {
                p.to_writer(writer)?;
                g.to_writer(writer)?;
                y.to_writer(writer)?;
            }
            PublicParams::Ecdsa { curve, p } => {
                write_curve(curve, writer)?;
                p.to_writer(writer)?;
            }
            PublicParams::Ecdh {
                curve,
                p,
                hash,
                alg_sym,
            } => {
                write_curve(curve, writer)?;
                p.to_writer(writer)?;
                writer.write_u8(0x03)?; // len of the following fields
                writer.write_u8(0x01)?; // fixed tag
                writer.write_u8((*hash).into())?;
                writer.write_u8((*alg_sym).into())?;
            }
            PublicParams::EdDsaLegacy { curve, q } => {
                write_curve(curve, writer)?;
                q.to_writer(writer)?;
            }
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        let oid_len = |curve: &ECCCurve| 1 + curve.oid().as_bytes().len();

        match self {
            PublicParams::Rsa { n, e } => n.write_len() + e.write_len(),
            PublicParams::Dsa { p, q, g, y } => {
                p.write_len() + q.write_len() + g.write_len() + y.write_len()
            }
            PublicParams::Elgamal { p, g, y } => p.write_len() + g.write_len() + y.write_len(),
            PublicParams::Ecdsa { curve, p } => oid_len(curve) + p.write_len(),
            PublicParams::Ecdh { curve, p, .. } => oid_len(curve) + p.write_len() + 4,
            PublicParams::EdDsaLegacy { curve, q } => oid_len(curve) + q.write_len(),
        }
    }
}
