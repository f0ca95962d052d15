use elliptic_curve::sec1::ToEncodedPoint;
use num_bigint::BigUint;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::ecc_curve::ECCCurve;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{bail, ensure, integrity_err, unsupported_err, Result};
use crate::types::{MpiBytes, PublicParams, SecretMaterial};

/// A private key recovered from a secret key packet, ready for use with the
/// algorithm's own crate.
#[derive(Clone, derive_more::Debug)]
pub enum PrivateKey {
    Rsa(#[debug("***")] rsa::RsaPrivateKey),
    Dsa(#[debug("***")] dsa::SigningKey),
    Elgamal(ElgamalSecretKey),
    Ecdsa(EcdsaSecretKey),
    Ecdh(EcdhSecretKey),
    EdDsa(EddsaSecretKey),
}

/// Elgamal has no RustCrypto implementation, the group and exponent are kept as numbers.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, derive_more::Debug)]
pub struct ElgamalSecretKey {
    p: BigUint,
    g: BigUint,
    #[debug("***")]
    x: BigUint,
}

impl ElgamalSecretKey {
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn g(&self) -> &BigUint {
        &self.g
    }

    pub fn x(&self) -> &BigUint {
        &self.x
    }

    /// The public value `g^x mod p`.
    pub fn y(&self) -> BigUint {
        self.g.modpow(&self.x, &self.p)
    }
}

#[derive(Clone, derive_more::Debug)]
pub enum EcdsaSecretKey {
    P256(#[debug("***")] p256::SecretKey),
    P384(#[debug("***")] p384::SecretKey),
    P521(#[debug("***")] p521::SecretKey),
    Secp256k1(#[debug("***")] k256::SecretKey),
    /// A curve without an implementation here, the scalar is big-endian.
    Other {
        curve: ECCCurve,
        #[debug("***")]
        secret: Zeroizing<Vec<u8>>,
    },
}

#[derive(Clone, derive_more::Debug)]
pub enum EcdhSecretKey {
    Curve25519(#[debug("***")] x25519_dalek::StaticSecret),
    P256(#[debug("***")] p256::SecretKey),
    P384(#[debug("***")] p384::SecretKey),
    P521(#[debug("***")] p521::SecretKey),
    /// A curve without an implementation here, in the curve's native byte order.
    Other {
        curve: ECCCurve,
        #[debug("***")]
        secret: Zeroizing<Vec<u8>>,
    },
}

#[derive(Clone, derive_more::Debug)]
pub enum EddsaSecretKey {
    Ed25519(#[debug("***")] ed25519_dalek::SigningKey),
    /// Ed448 seed of 57 bytes.
    Other {
        curve: ECCCurve,
        #[debug("***")]
        seed: Zeroizing<Vec<u8>>,
    },
}

impl EcdsaSecretKey {
    pub fn curve(&self) -> ECCCurve {
        match self {
            Self::P256(_) => ECCCurve::P256,
            Self::P384(_) => ECCCurve::P384,
            Self::P521(_) => ECCCurve::P521,
            Self::Secp256k1(_) => ECCCurve::Secp256k1,
            Self::Other { curve, .. } => curve.clone(),
        }
    }
}

impl EcdhSecretKey {
    pub fn curve(&self) -> ECCCurve {
        match self {
            Self::Curve25519(_) => ECCCurve::Curve25519,
            Self::P256(_) => ECCCurve::P256,
            Self::P384(_) => ECCCurve::P384,
            Self::P521(_) => ECCCurve::P521,
            Self::Other { curve, .. } => curve.clone(),
        }
    }
}

impl EddsaSecretKey {
    pub fn curve(&self) -> ECCCurve {
        match self {
            Self::Ed25519(_) => ECCCurve::Ed25519,
            Self::Other { curve, .. } => curve.clone(),
        }
    }
}

fn big(v: &[u8]) -> BigUint {
    BigUint::from_bytes_be(v)
}

/// Big-endian bytes of a secret number, wiped on drop.
fn secret_bytes(v: &BigUint) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(v.to_bytes_be())
}

/// Uncompressed SEC1 point, or the 0x40 prefixed native point of the 25519 curves.
fn prefixed_native(point: &[u8]) -> MpiBytes {
    let mut p = Vec::with_capacity(point.len() + 1);
    p.push(0x40);
    p.extend_from_slice(point);
    MpiBytes::from_slice(&p)
}

/// Default KDF parameters for a new ECDH key, following RFC 9580.
fn ecdh_kdf_defaults(curve: &ECCCurve) -> (HashAlgorithm, SymmetricKeyAlgorithm) {
    match curve {
        ECCCurve::P384 | ECCCurve::BrainpoolP384r1 => {
            (HashAlgorithm::Sha384, SymmetricKeyAlgorithm::AES192)
        }
        ECCCurve::P521 | ECCCurve::BrainpoolP512r1 | ECCCurve::Curve448 => {
            (HashAlgorithm::Sha512, SymmetricKeyAlgorithm::AES256)
        }
        _ => (HashAlgorithm::Sha256, SymmetricKeyAlgorithm::AES128),
    }
}

impl PrivateKey {
    /// The OpenPGP algorithm a v4 key packet for this key uses.
    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            PrivateKey::Rsa(_) => PublicKeyAlgorithm::RSA,
            PrivateKey::Dsa(_) => PublicKeyAlgorithm::DSA,
            PrivateKey::Elgamal(_) => PublicKeyAlgorithm::ElgamalEncrypt,
            PrivateKey::Ecdsa(_) => PublicKeyAlgorithm::ECDSA,
            PrivateKey::Ecdh(_) => PublicKeyAlgorithm::ECDH,
            PrivateKey::EdDsa(_) => PublicKeyAlgorithm::EdDSALegacy,
        }
    }

    /// Builds the usable key from decoded material and the matching public parameters.
    pub fn from_material(material: &SecretMaterial, public: &PublicParams) -> Result<Self> {
        let key = match (material, public) {
            (SecretMaterial::Rsa { d, p, q }, PublicParams::Rsa { n, e }) => {
                let key = rsa::RsaPrivateKey::from_components(
                    n.into(),
                    e.into(),
                    big(d),
                    vec![big(p), big(q)],
                )?;
                PrivateKey::Rsa(key)
            }
            (SecretMaterial::Dsa { x }, PublicParams::Dsa { p, q, g, y }) => {
                let components = dsa::Components::from_components(p.into(), q.into(), g.into())?;
                let verifying = dsa::VerifyingKey::from_components(components, y.into())?;
                let key = dsa::SigningKey::from_components(verifying, big(x))?;
                PrivateKey::Dsa(key)
            }
            (SecretMaterial::Elgamal { x }, PublicParams::Elgamal { p, g, .. }) => {
                PrivateKey::Elgamal(ElgamalSecretKey {
                    p: p.into(),
                    g: g.into(),
                    x: big(x),
                })
            }
            (material @ SecretMaterial::Ecdsa { .. }, PublicParams::Ecdsa { curve, .. }) => {
                let secret = material.to_native_bytes(curve)?;
                let key = match curve {
                    ECCCurve::P256 => EcdsaSecretKey::P256(p256::SecretKey::from_slice(&secret)?),
                    ECCCurve::P384 => EcdsaSecretKey::P384(p384::SecretKey::from_slice(&secret)?),
                    ECCCurve::P521 => EcdsaSecretKey::P521(p521::SecretKey::from_slice(&secret)?),
                    ECCCurve::Secp256k1 => {
                        EcdsaSecretKey::Secp256k1(k256::SecretKey::from_slice(&secret)?)
                    }
                    _ => EcdsaSecretKey::Other {
                        curve: curve.clone(),
                        secret,
                    },
                };
                PrivateKey::Ecdsa(key)
            }
            (material @ SecretMaterial::Ecdh { .. }, PublicParams::Ecdh { curve, .. }) => {
                let secret = material.to_native_bytes(curve)?;
                let key = match curve {
                    ECCCurve::Curve25519 => {
                        let mut raw = [0u8; 32];
                        raw.copy_from_slice(&secret);
                        let key = x25519_dalek::StaticSecret::from(raw);
                        raw.zeroize();
                        EcdhSecretKey::Curve25519(key)
                    }
                    ECCCurve::P256 => EcdhSecretKey::P256(p256::SecretKey::from_slice(&secret)?),
                    ECCCurve::P384 => EcdhSecretKey::P384(p384::SecretKey::from_slice(&secret)?),
                    ECCCurve::P521 => EcdhSecretKey::P521(p521::SecretKey::from_slice(&secret)?),
                    _ => EcdhSecretKey::Other {
                        curve: curve.clone(),
                        secret,
                    },
                };
                PrivateKey::Ecdh(key)
            }
            (
                material @ SecretMaterial::EdDsaLegacy { .. },
                PublicParams::EdDsaLegacy { curve, .. },
            ) => {
                let seed = material.to_native_bytes(curve)?;
                let key = match curve {
                    ECCCurve::Ed25519 => {
                        let mut raw = [0u8; 32];
                        raw.copy_from_slice(&seed);
                        let key = ed25519_dalek::SigningKey::from_bytes(&raw);
                        raw.zeroize();
                        EddsaSecretKey::Ed25519(key)
                    }
                    _ => EddsaSecretKey::Other {
                        curve: curve.clone(),
                        seed,
                    },
                };
                PrivateKey::EdDsa(key)
            }
            _ => bail!(
                "inconsistent key state: {:?} material with {:?}",
                material.algorithm(),
                public
            ),
        };

        Ok(key)
    }

    /// Extracts the secret values in their OpenPGP form.
    pub fn to_material(&self) -> Result<SecretMaterial> {
        let material = match self {
            PrivateKey::Rsa(key) => {
                let primes = key.primes();
                ensure!(
                    primes.len() == 2,
                    "rsa keys with {} primes can not be stored",
                    primes.len()
                );
                SecretMaterial::rsa(
                    &secret_bytes(key.d()),
                    &secret_bytes(&primes[0]),
                    &secret_bytes(&primes[1]),
                )
            }
            PrivateKey::Dsa(key) => SecretMaterial::dsa(&secret_bytes(key.x())),
            PrivateKey::Elgamal(key) => SecretMaterial::elgamal(&secret_bytes(&key.x)),
            PrivateKey::Ecdsa(key) => match key {
                EcdsaSecretKey::P256(k) => SecretMaterial::ecdsa(&k.to_bytes()),
                EcdsaSecretKey::P384(k) => SecretMaterial::ecdsa(&k.to_bytes()),
                EcdsaSecretKey::P521(k) => SecretMaterial::ecdsa(&k.to_bytes()),
                EcdsaSecretKey::Secp256k1(k) => SecretMaterial::ecdsa(&k.to_bytes()),
                EcdsaSecretKey::Other { secret, .. } => SecretMaterial::ecdsa(secret),
            },
            PrivateKey::Ecdh(key) => {
                let curve = key.curve();
                match key {
                    EcdhSecretKey::Curve25519(k) => {
                        let native = Zeroizing::new(k.to_bytes());
                        SecretMaterial::from_native(
                            PublicKeyAlgorithm::ECDH,
                            &curve,
                            &native[..],
                        )?
                    }
                    EcdhSecretKey::P256(k) => SecretMaterial::ecdh(&k.to_bytes()),
                    EcdhSecretKey::P384(k) => SecretMaterial::ecdh(&k.to_bytes()),
                    EcdhSecretKey::P521(k) => SecretMaterial::ecdh(&k.to_bytes()),
                    EcdhSecretKey::Other { secret, .. } => SecretMaterial::from_native(
                        PublicKeyAlgorithm::ECDH,
                        &curve,
                        secret,
                    )?,
                }
            }
            PrivateKey::EdDsa(key) => match key {
                EddsaSecretKey::Ed25519(k) => {
                    SecretMaterial::eddsa_legacy(&Zeroizing::new(k.to_bytes())[..])
                }
                EddsaSecretKey::Other { seed, .. } => SecretMaterial::eddsa_legacy(seed),
            },
        };

        Ok(material)
    }

    /// Computes the public parameters of this key.
    ///
    /// ECDH keys take their KDF parameters from `kdf`, or the RFC 9580 defaults for the curve.
    pub fn public_params(
        &self,
        kdf: Option<(HashAlgorithm, SymmetricKeyAlgorithm)>,
    ) -> Result<PublicParams> {
        let params = match self {
            PrivateKey::Rsa(key) => PublicParams::Rsa {
                n: key.n().into(),
                e: key.e().into(),
            },
            PrivateKey::Dsa(key) => {
                let verifying = key.verifying_key();
                let c = verifying.components();
                PublicParams::Dsa {
                    p: c.p().into(),
                    q: c.q().into(),
                    g: c.g().into(),
                    y: verifying.y().into(),
                }
            }
            PrivateKey::Elgamal(key) => PublicParams::Elgamal {
                p: key.p().into(),
                g: key.g().into(),
                y: key.y().into(),
            },
            PrivateKey::Ecdsa(key) => {
                let p = match key {
                    EcdsaSecretKey::P256(k) => k.public_key().to_encoded_point(false).as_bytes().to_vec(),
                    EcdsaSecretKey::P384(k) => k.public_key().to_encoded_point(false).as_bytes().to_vec(),
                    EcdsaSecretKey::P521(k) => k.public_key().to_encoded_point(false).as_bytes().to_vec(),
                    EcdsaSecretKey::Secp256k1(k) => {
                        k.public_key().to_encoded_point(false).as_bytes().to_vec()
                    }
                    EcdsaSecretKey::Other { curve, .. } => {
                        unsupported_err!("public key computation on {}", curve)
                    }
                };
                PublicParams::Ecdsa {
                    curve: key.curve(),
                    p: MpiBytes::from_slice(&p),
                }
            }
            PrivateKey::Ecdh(key) => {
                let curve = key.curve();
                let p = match key {
                    EcdhSecretKey::Curve25519(k) => {
                        prefixed_native(x25519_dalek::PublicKey::from(k).as_bytes())
                    }
                    EcdhSecretKey::P256(k) => {
                        MpiBytes::from_slice(k.public_key().to_encoded_point(false).as_bytes())
                    }
                    EcdhSecretKey::P384(k) => {
                        MpiBytes::from_slice(k.public_key().to_encoded_point(false).as_bytes())
                    }
                    EcdhSecretKey::P521(k) => {
                        MpiBytes::from_slice(k.public_key().to_encoded_point(false).as_bytes())
                    }
                    EcdhSecretKey::Other { curve, .. } => {
                        unsupported_err!("public key computation on {}", curve)
                    }
                };
                let (hash, alg_sym) = kdf.unwrap_or_else(|| ecdh_kdf_defaults(&curve));
                PublicParams::Ecdh {
                    curve,
                    p,
                    hash,
                    alg_sym,
                }
            }
            PrivateKey::EdDsa(key) => match key {
                EddsaSecretKey::Ed25519(k) => PublicParams::EdDsaLegacy {
                    curve: ECCCurve::Ed25519,
                    q: prefixed_native(k.verifying_key().as_bytes()),
                },
                EddsaSecretKey::Other { curve, .. } => {
                    unsupported_err!("public key computation on {}", curve)
                }
            },
        };

        Ok(params)
    }

    /// Checks that this key belongs to `public`.
    pub fn verify_public(&self, public: &PublicParams) -> Result<()> {
        let kdf = match public {
            PublicParams::Ecdh { hash, alg_sym, .. } => Some((*hash, *alg_sym)),
            _ => None,
        };
        let derived = self.public_params(kdf)?;
        if &derived != public {
            return Err(integrity_err!(
                "secret key does not match its public key"
            ));
        }
        Ok(())
    }
}
