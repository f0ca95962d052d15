use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use num_bigint::{BigUint, ModInverse};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::ecc_curve::ECCCurve;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{bail, ensure, format_err, unsupported_err, Result};
use crate::types::mpi::{bit_size, mpi_slice, pad_key, strip_leading_zeros};
use crate::types::params::PublicParams;

/// Algorithm specific private key material.
///
/// All values are unsigned big-endian integers without leading zeros, except
/// for the EdDSA seed which keeps the fixed size of its curve. Scalars of the
/// Montgomery curves are held in their OpenPGP (big-endian) order, use
/// [`SecretMaterial::to_native_bytes`] for the little-endian form.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, derive_more::Debug)]
pub enum SecretMaterial {
    Rsa {
        #[debug("***")]
        d: Vec<u8>,
        #[debug("***")]
        p: Vec<u8>,
        #[debug("***")]
        q: Vec<u8>,
    },
    Dsa {
        #[debug("***")]
        x: Vec<u8>,
    },
    Elgamal {
        #[debug("***")]
        x: Vec<u8>,
    },
    Ecdsa {
        #[debug("***")]
        d: Vec<u8>,
    },
    Ecdh {
        #[debug("***")]
        d: Vec<u8>,
    },
    EdDsaLegacy {
        #[debug("***")]
        seed: Vec<u8>,
    },
}

fn minimal(v: &[u8]) -> Vec<u8> {
    strip_leading_zeros(v).to_vec()
}

/// Fails for algorithms whose material this crate cannot encode.
pub(crate) fn ensure_supported(alg: PublicKeyAlgorithm) -> Result<()> {
    match alg {
        PublicKeyAlgorithm::RSA
        | PublicKeyAlgorithm::RSAEncrypt
        | PublicKeyAlgorithm::RSASign
        | PublicKeyAlgorithm::DSA
        | PublicKeyAlgorithm::Elgamal
        | PublicKeyAlgorithm::ElgamalEncrypt
        | PublicKeyAlgorithm::ECDSA
        | PublicKeyAlgorithm::ECDH
        | PublicKeyAlgorithm::EdDSALegacy => Ok(()),
        _ => unsupported_err!("secret key material for {:?}", alg),
    }
}

impl SecretMaterial {
    pub fn rsa(d: &[u8], p: &[u8], q: &[u8]) -> Self {
        Self::Rsa {
            d: minimal(d),
            p: minimal(p),
            q: minimal(q),
        }
    }

    pub fn dsa(x: &[u8]) -> Self {
        Self::Dsa { x: minimal(x) }
    }

    pub fn elgamal(x: &[u8]) -> Self {
        Self::Elgamal { x: minimal(x) }
    }

    pub fn ecdsa(d: &[u8]) -> Self {
        Self::Ecdsa { d: minimal(d) }
    }

    /// ECDH scalar in OpenPGP order, see [`SecretMaterial::from_native`] for X25519/X448.
    pub fn ecdh(d: &[u8]) -> Self {
        Self::Ecdh { d: minimal(d) }
    }

    pub fn eddsa_legacy(seed: &[u8]) -> Self {
        Self::EdDsaLegacy {
            seed: seed.to_vec(),
        }
    }

    /// Builds material from the form the algorithm's own libraries use.
    ///
    /// X25519 and X448 scalars are little-endian, everything else is big-endian.
    pub fn from_native(alg: PublicKeyAlgorithm, curve: &ECCCurve, native: &[u8]) -> Result<Self> {
        match alg {
            PublicKeyAlgorithm::ECDH if curve.is_montgomery() => {
                let Some(size) = curve.secret_key_length() else {
                    unsupported_err!("curve {}", curve);
                };
                ensure!(
                    native.len() == size,
                    "{} scalar must be {} bytes, got {}",
                    curve,
                    size,
                    native.len()
                );
                let mut be = Zeroizing::new(native.to_vec());
                be.reverse();
                Ok(Self::ecdh(&be))
            }
            PublicKeyAlgorithm::ECDH => Ok(Self::ecdh(native)),
            PublicKeyAlgorithm::ECDSA => Ok(Self::ecdsa(native)),
            PublicKeyAlgorithm::EdDSALegacy => Ok(Self::eddsa_legacy(native)),
            _ => unsupported_err!("native scalar form for {:?}", alg),
        }
    }

    /// Returns the single scalar in the form the curve's libraries use:
    /// little-endian for X25519/X448, fixed size big-endian otherwise.
    pub fn to_native_bytes(&self, curve: &ECCCurve) -> Result<Zeroizing<Vec<u8>>> {
        let Some(size) = curve.secret_key_length() else {
            unsupported_err!("curve {}", curve);
        };

        match self {
            Self::Ecdh { d } if curve.is_montgomery() => {
                let mut le = Zeroizing::new(pad_key(d, size)?);
                le.reverse();
                Ok(le)
            }
            Self::Ecdh { d } | Self::Ecdsa { d } => Ok(Zeroizing::new(pad_key(d, size)?)),
            Self::EdDsaLegacy { seed } => Ok(Zeroizing::new(pad_key(
                strip_leading_zeros(seed),
                size,
            )?)),
            _ => bail!("{:?} material has no curve scalar", self.algorithm()),
        }
    }

    /// The public key algorithm family this material belongs to.
    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            Self::Rsa { .. } => PublicKeyAlgorithm::RSA,
            Self::Dsa { .. } => PublicKeyAlgorithm::DSA,
            Self::Elgamal { .. } => PublicKeyAlgorithm::ElgamalEncrypt,
            Self::Ecdsa { .. } => PublicKeyAlgorithm::ECDSA,
            Self::Ecdh { .. } => PublicKeyAlgorithm::ECDH,
            Self::EdDsaLegacy { .. } => PublicKeyAlgorithm::EdDSALegacy,
        }
    }

    /// Can this material be stored in a key with the given algorithm?
    pub fn matches_algorithm(&self, alg: PublicKeyAlgorithm) -> bool {
        match self {
            Self::Rsa { .. } => alg.is_rsa(),
            Self::Elgamal { .. } => alg.is_elgamal(),
            _ => self.algorithm() == alg,
        }
    }

    /// Decodes the packet form of the material.
    ///
    /// `i` holds exactly the MPIs, without any checksum or hash.
    pub fn try_from_slice(
        mut i: &[u8],
        alg: PublicKeyAlgorithm,
        public_params: &PublicParams,
    ) -> Result<Self> {
        ensure_supported(alg)?;
        ensure!(
            public_params.matches_algorithm(alg),
            "inconsistent key state: {:?} with {:?} parameters",
            alg,
            public_params
        );

        let material = match public_params {
            PublicParams::Rsa { .. } => {
                let d = mpi_slice(&mut i)?;
                let p = mpi_slice(&mut i)?;
                let q = mpi_slice(&mut i)?;
                // u is recomputed by the rsa crate
                let _u = mpi_slice(&mut i)?;
                Self::rsa(d, p, q)
            }
            PublicParams::Dsa { .. } => Self::dsa(mpi_slice(&mut i)?),
            PublicParams::Elgamal { .. } => Self::elgamal(mpi_slice(&mut i)?),
            PublicParams::Ecdsa { curve, .. } => {
                let d = mpi_slice(&mut i)?;
                check_scalar_len(curve, d)?;
                Self::ecdsa(d)
            }
            PublicParams::Ecdh { curve, .. } => {
                let d = mpi_slice(&mut i)?;
                check_scalar_len(curve, d)?;
                Self::ecdh(d)
            }
            PublicParams::EdDsaLegacy { curve, .. } => {
                let seed = mpi_slice(&mut i)?;
                let size = match curve {
                    ECCCurve::Ed25519 | ECCCurve::Ed448 => curve
                        .secret_key_length()
                        .ok_or_else(|| format_err!("no seed size for {}", curve))?,
                    _ => unsupported_err!("eddsa legacy over {}", curve),
                };
                Self::EdDsaLegacy {
                    seed: pad_key(seed, size)?,
                }
            }
        };

        ensure!(
            i.is_empty(),
            "failed to process full secret key material: {} bytes left",
            i.len()
        );

        Ok(material)
    }

    /// Encodes the material as its sequence of MPIs.
    pub fn encode(&self) -> Result<Zeroizing<Vec<u8>>> {
        let mut out = Zeroizing::new(Vec::with_capacity(self.write_len()?));
        self.to_writer(&mut *out)?;
        Ok(out)
    }

    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Self::Rsa { d, p, q } => {
                let u = rsa_u(p, q)?;
                write_mpi(writer, d)?;
                write_mpi(writer, p)?;
                write_mpi(writer, q)?;
                write_mpi(writer, &u)?;
            }
            Self::Dsa { x } | Self::Elgamal { x } => write_mpi(writer, x)?,
            Self::Ecdsa { d } | Self::Ecdh { d } => write_mpi(writer, d)?,
            Self::EdDsaLegacy { seed } => write_mpi(writer, seed)?,
        }
        Ok(())
    }

    fn write_len(&self) -> Result<usize> {
        let len = |v: &[u8]| 2 + strip_leading_zeros(v).len();

        Ok(match self {
            Self::Rsa { d, p, q } => len(d) + len(p) + len(q) + len(&rsa_u(p, q)?),
            Self::Dsa { x } | Self::Elgamal { x } => len(x),
            Self::Ecdsa { d } | Self::Ecdh { d } => len(d),
            Self::EdDsaLegacy { seed } => len(seed),
        })
    }
}

fn check_scalar_len(curve: &ECCCurve, d: &[u8]) -> Result<()> {
    if let Some(size) = curve.secret_key_length() {
        ensure!(
            d.len() <= size,
            "secret scalar of {} bytes is too large for {}",
            d.len(),
            curve
        );
    }
    Ok(())
}

/// `u = p^-1 mod q`, as stored in OpenPGP RSA keys.
fn rsa_u(p: &[u8], q: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let p = Zeroizing::new(BigUint::from_bytes_be(p));
    let q = Zeroizing::new(BigUint::from_bytes_be(q));
    ensure!(*q > BigUint::from(1u8), "invalid rsa prime q");
    let u = BigUint::clone(&p)
        .mod_inverse(&*q)
        .and_then(|u| u.to_biguint())
        .ok_or_else(|| format_err!("invalid rsa primes: p has no inverse mod q"))?;
    let u = Zeroizing::new(u);

    Ok(Zeroizing::new(u.to_bytes_be()))
}

/// Writes a big-endian magnitude as MPI, without copying it anywhere else.
fn write_mpi<W: io::Write>(writer: &mut W, value: &[u8]) -> Result<()> {
    let value = strip_leading_zeros(value);
    let bits = bit_size(value);
    let Ok(bits) = u16::try_from(bits) else {
        bail!("mpi of {} bits is too large", bits);
    };
    writer.write_u16::<BigEndian>(bits)?;
    writer.write_all(value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;
    use crate::crypto::hash::HashAlgorithm;
    use crate::crypto::sym::SymmetricKeyAlgorithm;
    use crate::types::MpiBytes;

    fn ecdh_params(curve: ECCCurve) -> PublicParams {
        PublicParams::Ecdh {
            curve,
            p: MpiBytes::from_slice(&[0x40; 33]),
            hash: HashAlgorithm::Sha256,
            alg_sym: SymmetricKeyAlgorithm::AES128,
        }
    }

    fn dsa_params() -> PublicParams {
        PublicParams::Dsa {
            p: MpiBytes::from_slice(&[23]),
            q: MpiBytes::from_slice(&[11]),
            g: MpiBytes::from_slice(&[4]),
            y: MpiBytes::from_slice(&[8]),
        }
    }

    #[test]
    fn test_curve25519_native_roundtrip() {
        let native = hex!("a8abababababababababababababababababababababababababababababab6b");
        let material =
            SecretMaterial::from_native(PublicKeyAlgorithm::ECDH, &ECCCurve::Curve25519, &native)
                .unwrap();

        let SecretMaterial::Ecdh { ref d } = material else {
            panic!("expected ecdh material");
        };
        // the MPI holds the reversed scalar
        assert_eq!(d[0], 0x6b);
        assert_eq!(d[31], 0xa8);

        let encoded = material.encode().unwrap();
        assert_eq!(&encoded[..2], &[0x00, 0xff]);

        let decoded = SecretMaterial::try_from_slice(
            &encoded,
            PublicKeyAlgorithm::ECDH,
            &ecdh_params(ECCCurve::Curve25519),
        )
        .unwrap();
        assert_eq!(decoded, material);
        assert_eq!(
            &decoded.to_native_bytes(&ECCCurve::Curve25519).unwrap()[..],
            &native[..]
        );
    }

    #[test]
    fn test_curve448_native_size() {
        let native = [0x42u8; 56];
        let material =
            SecretMaterial::from_native(PublicKeyAlgorithm::ECDH, &ECCCurve::Curve448, &native)
                .unwrap();
        assert_eq!(
            &material.to_native_bytes(&ECCCurve::Curve448).unwrap()[..],
            &native[..]
        );
        assert!(SecretMaterial::from_native(
            PublicKeyAlgorithm::ECDH,
            &ECCCurve::Curve448,
            &native[..32]
        )
        .is_err());
    }

    #[test]
    fn test_eddsa_seed_padding() {
        let params = PublicParams::EdDsaLegacy {
            curve: ECCCurve::Ed25519,
            q: MpiBytes::from_slice(&[0x40; 33]),
        };
        // 31 byte seed, the leading zero got lost in the MPI
        let mut seed = vec![0u8];
        seed.extend_from_slice(&[0x17; 31]);
        let encoded = SecretMaterial::eddsa_legacy(&seed).encode().unwrap();
        assert_eq!(encoded.len(), 2 + 31);

        let decoded =
            SecretMaterial::try_from_slice(&encoded, PublicKeyAlgorithm::EdDSALegacy, &params)
                .unwrap();
        assert_eq!(decoded, SecretMaterial::eddsa_legacy(&seed));

        // 33 bytes do not fit
        let mut too_long = vec![0x01, 0x08];
        too_long.extend_from_slice(&[0xff; 33]);
        let err =
            SecretMaterial::try_from_slice(&too_long, PublicKeyAlgorithm::EdDSALegacy, &params)
                .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Format);
    }

    #[test]
    fn test_rsa_u_is_recomputed() {
        // p = 11, q = 13, d arbitrary: u = 11^-1 mod 13 = 6
        let material = SecretMaterial::rsa(&[0x07], &[11], &[13]);
        let encoded = material.encode().unwrap();
        assert_eq!(
            &encoded[..],
            &[0x00, 0x03, 0x07, 0x00, 0x04, 11, 0x00, 0x04, 13, 0x00, 0x03, 6]
        );

        // a wrong u is ignored
        let mut tampered = encoded.to_vec();
        tampered[11] = 5;
        let params = PublicParams::Rsa {
            n: MpiBytes::from_slice(&[143]),
            e: MpiBytes::from_slice(&[7]),
        };
        let decoded =
            SecretMaterial::try_from_slice(&tampered, PublicKeyAlgorithm::RSA, &params).unwrap();
        assert_eq!(decoded, material);
    }

    #[test]
    fn test_trailing_data_and_mismatch() {
        let encoded = SecretMaterial::dsa(&[5]).encode().unwrap();
        let mut trailing = encoded.to_vec();
        trailing.push(0);
        assert!(
            SecretMaterial::try_from_slice(&trailing, PublicKeyAlgorithm::DSA, &dsa_params())
                .is_err()
        );

        // declared algorithm does not match the parameters
        assert!(
            SecretMaterial::try_from_slice(&encoded, PublicKeyAlgorithm::ECDSA, &dsa_params())
                .is_err()
        );

        for alg in [
            PublicKeyAlgorithm::DiffieHellman,
            PublicKeyAlgorithm::X25519,
            PublicKeyAlgorithm::X448,
            PublicKeyAlgorithm::Ed25519,
            PublicKeyAlgorithm::Ed448,
            PublicKeyAlgorithm::Unknown(99),
        ] {
            assert_eq!(
                SecretMaterial::try_from_slice(&encoded, alg, &dsa_params())
                    .unwrap_err()
                    .kind(),
                crate::errors::ErrorKind::UnsupportedAlgorithm
            );
        }
    }

    #[test]
    fn test_debug_hides_material() {
        let material = SecretMaterial::ecdsa(&[1, 2, 3]);
        assert_eq!(format!("{material:?}"), "Ecdsa { d: *** }");
    }

    proptest! {
        #[test]
        fn dsa_material_roundtrip(x in proptest::collection::vec(any::<u8>(), 1..64)) {
            let material = SecretMaterial::dsa(&x);
            let encoded = material.encode()?;
            let decoded = SecretMaterial::try_from_slice(&encoded, PublicKeyAlgorithm::DSA, &dsa_params())?;
            prop_assert_eq!(decoded, material);
        }
    }
}
